use crate::logger;
use crate::platform::Host;
use crate::sleep::{Clock, Sleeper};
use crate::types::Rect;

/// Everything an operation may touch while it runs for one tick.
pub struct TickContext<'a> {
    pub host: &'a mut dyn Host,
    pub clock: &'a dyn Clock,
    pub sleeper: &'a dyn Sleeper,
}

/// Result of resuming an operation once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Suspended until the next tick
    Pending,
    /// Finished with the given result; must not be resumed again
    Complete(bool),
}

/// A long-running automation, advanced one tick at a time.
pub trait Operation {
    fn resume(&mut self, cx: &mut TickContext<'_>) -> Step;

    /// Rectangles the operation is working through, for progress rendering.
    fn feedback(&self) -> &[Rect] {
        &[]
    }
}

/// Single-slot host for the one operation allowed to run at a time.
#[derive(Default)]
pub struct Scheduler {
    current: Option<Box<dyn Operation>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    /// Install the operation built by `factory`. Refused while another
    /// operation is in flight; the factory is then never called.
    pub fn start<F, O>(&mut self, factory: F) -> bool
    where
        F: FnOnce() -> O,
        O: Operation + 'static,
    {
        if self.current.is_some() {
            logger::warn_p("transfer", "an operation is already running, ignoring trigger");
            return false;
        }
        self.current = Some(Box::new(factory()));
        true
    }

    /// Advance the active operation by one step. Returns its result when it
    /// completes during this call; the slot is empty again afterwards.
    pub fn resume(&mut self, cx: &mut TickContext<'_>) -> Option<bool> {
        let op = self.current.as_mut()?;
        match op.resume(cx) {
            Step::Pending => None,
            Step::Complete(result) => {
                self.current = None;
                Some(result)
            }
        }
    }

    /// Snapshot published by the in-flight operation; empty when idle.
    pub fn feedback(&self) -> &[Rect] {
        match &self.current {
            Some(op) => op.feedback(),
            None => &[],
        }
    }
}

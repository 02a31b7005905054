pub mod button;
pub mod error;
pub mod filter;
pub mod grid;
pub mod logger;
pub mod lua_rt;
pub mod orchestrator;
pub mod platform;
pub mod scheduler;
pub mod sequencer;
pub mod settings;
pub mod sleep;
pub mod types;

pub use error::{Error, FilterError, Result};

//! Memoized filter compilation.
//!
//! Entries are keyed by the exact source text and never evicted: editing the
//! text simply produces a new key. Failures are cached like successes so a bad
//! filter is compiled once, not once per frame.

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::FilterError;
use crate::logger;
use crate::lua_rt::{FilterEngine, LuaPredicate};
use crate::types::ItemRecord;

/// Outcome of compiling one filter text.
#[derive(Debug)]
pub struct CompiledFilter {
    source: String,
    outcome: Result<LuaPredicate, FilterError>,
}

impl CompiledFilter {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn predicate(&self) -> Option<&LuaPredicate> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&FilterError> {
        self.outcome.as_ref().err()
    }
}

pub struct FilterCache {
    engine: FilterEngine,
    entries: HashMap<String, Rc<CompiledFilter>>,
    compiles: usize,
}

impl FilterCache {
    pub fn new() -> Result<Self, FilterError> {
        Ok(Self::with_engine(FilterEngine::new()?))
    }

    pub fn with_engine(engine: FilterEngine) -> Self {
        Self { engine, entries: HashMap::new(), compiles: 0 }
    }

    /// Cached result for `source`, compiling it on first use.
    pub fn get_or_compile(&mut self, source: &str) -> Rc<CompiledFilter> {
        if let Some(found) = self.entries.get(source) {
            return Rc::clone(found);
        }

        self.compiles += 1;
        let outcome = self.engine.compile(source);
        if let Err(e) = &outcome {
            logger::warn_p("filter", &format!("filter did not compile: {}", e));
        }
        let compiled = Rc::new(CompiledFilter { source: source.to_string(), outcome });
        self.entries.insert(source.to_string(), Rc::clone(&compiled));
        compiled
    }

    /// Match one item. A predicate that fails on this item is logged and
    /// counts as no match.
    pub fn evaluate(&self, predicate: &LuaPredicate, item: &ItemRecord) -> bool {
        match self.engine.evaluate(predicate, item) {
            Ok(matched) => matched,
            Err(e) => {
                logger::error_p("filter", &e.to_string());
                false
            }
        }
    }

    /// How many distinct texts have gone through the engine
    pub fn compile_count(&self) -> usize {
        self.compiles
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack(name: &str, size: Option<u32>) -> ItemRecord {
        ItemRecord {
            name: name.to_string(),
            stack_size: size,
            width: 1,
            height: 1,
            ..ItemRecord::default()
        }
    }

    #[test]
    fn test_same_text_returns_cached_object() {
        let mut cache = FilterCache::new().unwrap();
        let a = cache.get_or_compile("item.item_level > 70");
        let b = cache.get_or_compile("item.item_level > 70");

        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(cache.compile_count(), 1);
        assert!(a.predicate().is_some());
    }

    #[test]
    fn test_compile_failure_is_cached() {
        let mut cache = FilterCache::new().unwrap();
        let a = cache.get_or_compile("item.name ==");
        let b = cache.get_or_compile("item.name ==");

        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(cache.compile_count(), 1);
        assert!(matches!(a.error(), Some(FilterError::Syntax(_))));
        assert!(a.predicate().is_none());
    }

    #[test]
    fn test_edited_text_is_a_new_entry() {
        let mut cache = FilterCache::new().unwrap();
        cache.get_or_compile("item.width == 1");
        cache.get_or_compile("item.width == 2");
        cache.get_or_compile("item.width == 1 ");

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.compile_count(), 3);
    }

    #[test]
    fn test_failing_item_does_not_stop_the_batch() {
        let mut cache = FilterCache::new().unwrap();
        let filter = cache.get_or_compile("item.stack_size >= 10");
        let predicate = filter.predicate().unwrap();

        let items = [
            stack("Chaos Orb", Some(20)),
            stack("Ring", None),
            stack("Divine Orb", Some(12)),
            stack("Amulet", None),
            stack("Exalted Orb", Some(3)),
        ];
        let matched: Vec<&str> = items
            .iter()
            .filter(|item| cache.evaluate(predicate, item))
            .map(|item| item.name.as_str())
            .collect();

        assert_eq!(matched, vec!["Chaos Orb", "Divine Orb"]);
    }

    #[test]
    fn test_runaway_filter_matches_nothing() {
        let mut cache = FilterCache::new().unwrap();
        let filter = cache.get_or_compile(
            r#"item.name == "Chaos Orb" or (function() while true do end end)()"#,
        );
        let predicate = filter.predicate().unwrap();

        let items = [stack("Chaos Orb", Some(20)), stack("Ring", None), stack("Chaos Orb", Some(4))];
        let matched = items.iter().filter(|item| cache.evaluate(predicate, item)).count();
        assert_eq!(matched, 2);
    }
}

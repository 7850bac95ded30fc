//! Compiled selector cache.

use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use scraper::Selector;
use thiserror::Error;

/// A selector string that could not be compiled.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid selector `{selector}`: {reason}")]
pub struct SelectorError {
    pub selector: String,
    pub reason: String,
}

static COMPILED: OnceLock<DashMap<String, Arc<Selector>>> = OnceLock::new();

/// Compile `source`, reusing an earlier compilation of the same text.
pub fn compile(source: &str) -> Result<Arc<Selector>, SelectorError> {
    let cache = COMPILED.get_or_init(DashMap::new);
    if let Some(hit) = cache.get(source) {
        return Ok(hit.value().clone());
    }

    let selector = Selector::parse(source).map_err(|e| SelectorError {
        selector: source.to_string(),
        reason: e.to_string(),
    })?;
    let selector = Arc::new(selector);
    cache.insert(source.to_string(), selector.clone());
    Ok(selector)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_reuses_entry() {
        let a = compile("div.match-header > a").unwrap();
        let b = compile("div.match-header > a").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_invalid_selector() {
        let err = compile("div >> [").unwrap_err();
        assert_eq!(err.selector, "div >> [");
    }
}

//! Ordered pattern table.
//!
//! # Design Decisions
//! - Patterns are anchored, so they match the whole identifier
//! - First match in registration order wins
//! - Re-registering a pattern keeps its position and replaces the target

use regex::Regex;

/// Handle to a registered route, stable for the router's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Stage(pub(crate) usize);

impl Stage {
    pub fn index(self) -> usize {
        self.0
    }
}

struct Route<H> {
    pattern: String,
    regex: Regex,
    target: H,
}

/// Routes in registration order.
pub struct Router<H> {
    routes: Vec<Route<H>>,
}

impl<H> Default for Router<H> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<H: Clone> Router<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `target` under `pattern`.
    ///
    /// Returns the stage and whether an existing route was replaced.
    pub fn insert(&mut self, pattern: &str, target: H) -> Result<(Stage, bool), regex::Error> {
        let regex = Regex::new(&format!("^(?:{pattern})$"))?;

        if let Some(index) = self.routes.iter().position(|r| r.pattern == pattern) {
            let route = &mut self.routes[index];
            route.regex = regex;
            route.target = target;
            return Ok((Stage(index), true));
        }

        self.routes.push(Route {
            pattern: pattern.to_string(),
            regex,
            target,
        });
        Ok((Stage(self.routes.len() - 1), false))
    }

    /// First route matching `id`: its stage, pattern and target.
    pub fn resolve(&self, id: &str) -> Option<(Stage, &str, H)> {
        self.routes
            .iter()
            .enumerate()
            .find(|(_, r)| r.regex.is_match(id))
            .map(|(i, r)| (Stage(i), r.pattern.as_str(), r.target.clone()))
    }

    pub fn get(&self, stage: Stage) -> Option<(&str, H)> {
        self.routes
            .get(stage.0)
            .map(|r| (r.pattern.as_str(), r.target.clone()))
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|r| r.pattern.as_str())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

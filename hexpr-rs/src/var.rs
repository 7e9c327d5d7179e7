//! Variable store.
//!
//! Variables are created by assignment and live until the host removes
//! them.  Names are case-sensitive; an element of an array variable is
//! stored under its full name, e.g. `ARR[2]`.

use std::collections::HashMap;

use crate::expr::Value;

/// Named values that persist between evaluations.
#[derive(Debug, Default, Clone)]
pub struct VarStore {
    vars: HashMap<String, Value>,
}

impl VarStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or overwrite) a variable.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Get a variable that holds an integer.
    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.vars.get(name)?.as_int()
    }

    /// Remove a variable.  Returns `true` if it existed.
    pub fn unset(&mut self, name: &str) -> bool {
        self.vars.remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn clear(&mut self) {
        self.vars.clear();
    }

    /// Iterate over all variables in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.vars.iter()
    }

    /// All variables ordered by name.
    pub fn sorted(&self) -> Vec<(&String, &Value)> {
        let mut all: Vec<_> = self.vars.iter().collect();
        all.sort_by(|a, b| a.0.cmp(b.0));
        all
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! Assignments, fragments and resolved configurations.

use indexmap::IndexMap;
use ktree::Value;

/// An explicit `symbol = value` pair from a fragment or the minimizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Symbol name without the `CONFIG_` prefix.
    pub symbol: String,
    /// Assigned value.
    pub value: Value,
}

impl Assignment {
    /// Assign `value` to `symbol`.
    pub fn new(symbol: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            symbol: symbol.into(),
            value: value.into(),
        }
    }
}

/// A named group of assignments, one per symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// File-safe name; empty for the remainder.
    pub name: String,
    /// Human-readable section label.
    pub label: String,
    /// Assignments in tree declaration order.
    pub assignments: Vec<Assignment>,
}

impl Fragment {
    /// Whether this is the catch-all remainder.
    pub fn is_remainder(&self) -> bool {
        self.name.is_empty()
    }

    /// Number of assigned symbols.
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Whether the fragment assigns nothing.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// Values of every visible symbol, in declaration order.
///
/// Produced fresh by each resolution and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedConfig {
    values: IndexMap<String, Value>,
}

impl ResolvedConfig {
    /// Value of `symbol`, if visible.
    pub fn get(&self, symbol: &str) -> Option<&Value> {
        self.values.get(symbol)
    }

    /// Whether `symbol` is visible.
    pub fn contains(&self, symbol: &str) -> bool {
        self.values.contains_key(symbol)
    }

    /// Number of visible symbols.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no symbol is visible.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Symbols and values in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Every value as an explicit assignment.
    pub fn to_assignments(&self) -> Vec<Assignment> {
        self.iter()
            .map(|(symbol, value)| Assignment::new(symbol, value.clone()))
            .collect()
    }
}

impl FromIterator<(String, Value)> for ResolvedConfig {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

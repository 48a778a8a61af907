use std::{cmp::Ordering, fmt};

/// A variable or function name.
///
/// Derived equality is exact; use [`Symbol::matches`] when the comparison must
/// honour the `case_sensitive` setting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, other: &Symbol, case_sensitive: bool) -> bool {
        self.compare(other, case_sensitive) == Ordering::Equal
    }

    pub fn matches_str(&self, other: &str, case_sensitive: bool) -> bool {
        if case_sensitive {
            self.0 == other
        } else {
            self.0.to_lowercase() == other.to_lowercase()
        }
    }

    pub fn compare(&self, other: &Symbol, case_sensitive: bool) -> Ordering {
        if case_sensitive {
            self.0.cmp(&other.0)
        } else {
            self.0
                .chars()
                .flat_map(char::to_lowercase)
                .cmp(other.0.chars().flat_map(char::to_lowercase))
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

//! Named, optionally valued arguments.
//!
//! Used for both macro definitions (`+define+NAME=VALUE`) and runtime
//! arguments / plusargs (`+NAME=VALUE`).

use std::fmt;

use serde::{Deserialize, Serialize};

/// A `(name, optional value)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamedArg {
    /// Argument name.
    pub name: String,
    /// Optional value; `None` renders as a bare flag.
    pub value: Option<String>,
}

impl NamedArg {
    /// Creates a bare flag with no value.
    #[must_use]
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// Creates a valued argument.
    #[must_use]
    pub fn valued(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// Renders as a runtime argument: `+name` or `+name=value`.
    #[must_use]
    pub fn to_plusarg(&self) -> String {
        format!("+{self}")
    }

    /// Renders as a macro definition: `+define+name` or `+define+name=value`.
    #[must_use]
    pub fn to_define(&self) -> String {
        format!("+define+{self}")
    }
}

impl fmt::Display for NamedArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "{}={}", self.name, v),
            None => write!(f, "{}", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_flags_and_values() {
        assert_eq!(NamedArg::flag("WAVES").to_define(), "+define+WAVES");
        assert_eq!(NamedArg::valued("WIDTH", "32").to_define(), "+define+WIDTH=32");
        assert_eq!(NamedArg::flag("verbose").to_plusarg(), "+verbose");
        assert_eq!(NamedArg::valued("seed", "7").to_plusarg(), "+seed=7");
    }
}

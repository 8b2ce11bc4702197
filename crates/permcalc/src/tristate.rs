//! Three-valued outcome of a permission lookup.

use serde::{Deserialize, Serialize};

/// `True`, `False`, or `Undefined` ("no assignment speaks to this").
///
/// `Undefined` is the neutral value: it yields to any defined value when
/// sources are merged, and it never converts to a boolean without an
/// explicit default supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tristate {
    True,
    False,
    #[default]
    Undefined,
}

impl Tristate {
    pub fn from_bool(value: bool) -> Self {
        if value {
            Tristate::True
        } else {
            Tristate::False
        }
    }

    /// Collapse to a boolean, using `default` for `Undefined`.
    pub fn as_bool_or(self, default: bool) -> bool {
        match self {
            Tristate::True => true,
            Tristate::False => false,
            Tristate::Undefined => default,
        }
    }

    pub fn is_defined(self) -> bool {
        self != Tristate::Undefined
    }

    /// Merge in priority order: `self` wins unless it is `Undefined`.
    pub fn or(self, other: Tristate) -> Tristate {
        match self {
            Tristate::Undefined => other,
            defined => defined,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tristate::True => "true",
            Tristate::False => "false",
            Tristate::Undefined => "undefined",
        }
    }
}

impl From<bool> for Tristate {
    fn from(value: bool) -> Self {
        Tristate::from_bool(value)
    }
}

impl std::fmt::Display for Tristate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

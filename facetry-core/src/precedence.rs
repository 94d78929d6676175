//! Precedence levels for facets
//!
//! When two factories contribute a facet with the same tag to one holder,
//! the precedence decides which of them stays visible. The levels form a
//! total order; a later contribution wins unless it is strictly lower.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Precedence determines which of two facets with the same tag wins
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precedence {
    /// Installed only so that some facet is present
    Fallback = 0,

    /// Derived from naming conventions or from other facets
    Inferred = 1,

    /// Declared through a marker on the feature
    Default = 2,

    /// Declared explicitly enough to override a plain marker
    High = 3,

    /// Installed by event-driven extensions, overrides everything
    Event = 4,
}

impl Precedence {
    pub const ALL: &'static [Precedence] = &[
        Precedence::Fallback,
        Precedence::Inferred,
        Precedence::Default,
        Precedence::High,
        Precedence::Event,
    ];

    /// Returns true if a facet at this precedence may replace one at `other`
    pub fn overrides(&self, other: Precedence) -> bool {
        *self >= other
    }

    /// Returns true if this precedence came from an explicit declaration
    pub fn is_explicit(&self) -> bool {
        *self >= Precedence::Default
    }

    /// Returns the weaker of two precedences
    pub fn min(self, other: Precedence) -> Precedence {
        if self < other { self } else { other }
    }

    /// Returns the stronger of two precedences
    pub fn max(self, other: Precedence) -> Precedence {
        if self > other { self } else { other }
    }
}

impl Default for Precedence {
    fn default() -> Self {
        Precedence::Default
    }
}

impl fmt::Display for Precedence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precedence::Fallback => write!(f, "fallback"),
            Precedence::Inferred => write!(f, "inferred"),
            Precedence::Default => write!(f, "default"),
            Precedence::High => write!(f, "high"),
            Precedence::Event => write!(f, "event"),
        }
    }
}

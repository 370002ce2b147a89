//! Binding options and safety limits
//!
//! Options are threaded through every recursive call as a value; there is
//! no process-wide binding state.

use serde::Deserialize;

/// Default nesting limit for records and containers
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Options for a single bind
///
/// Deserializable so it can sit inside an application's own config file:
///
/// ```yaml
/// binding:
///   strict: false
///   max_depth: 16
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BindOptions {
    /// Fail on input keys that match no declared field.
    /// Lenient mode skips them; every other error stays fatal.
    pub strict: bool,

    /// Maximum nesting of records and containers below the root record
    pub max_depth: usize,
}

impl Default for BindOptions {
    fn default() -> Self {
        Self {
            strict: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl BindOptions {
    /// Strict binding with the default depth limit
    pub fn strict() -> Self {
        Self::default()
    }

    /// Skip unknown keys instead of failing
    pub fn lenient() -> Self {
        Self {
            strict: false,
            ..Self::default()
        }
    }

    /// Options suitable for testing (shallow limit)
    pub fn testing() -> Self {
        Self {
            strict: true,
            max_depth: 8,
        }
    }

    /// Builder-style strictness override
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Builder-style depth override
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

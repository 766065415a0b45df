//! Engine configuration.
//!
//! Every field has a default, so a partial TOML file such as
//!
//! ```toml
//! max_nesting_depth = 16
//! empty_product = "one"
//! ```
//!
//! deserializes into a complete [`EngineConfig`].

use serde::{Deserialize, Serialize};

/// Default bound on innermost-first rewrite passes.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 32;

/// What MIN/MAX return when no numeric values remain after range expansion.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyExtremum {
    #[default]
    Zero,
    Error,
}

/// What PRODUCT returns for an empty argument list.
///
/// `Zero` keeps stored formulas rendering the way they always have;
/// `One` is the multiplicative identity.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyProduct {
    #[default]
    Zero,
    One,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub max_nesting_depth: usize,
    pub empty_min_max: EmptyExtremum,
    pub empty_product: EmptyProduct,
    /// Fail with `MalformedReference` instead of degrading bad references to zero.
    pub strict_references: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            empty_min_max: EmptyExtremum::Zero,
            empty_product: EmptyProduct::Zero,
            strict_references: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_stored_formula_behavior() {
        let config = EngineConfig::default();
        assert_eq!(config.max_nesting_depth, 32);
        assert_eq!(config.empty_min_max, EmptyExtremum::Zero);
        assert_eq!(config.empty_product, EmptyProduct::Zero);
        assert!(!config.strict_references);
    }
}

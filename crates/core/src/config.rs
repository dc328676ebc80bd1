//! Tunable constants for every stage of the pipeline.
//!
//! Defaults reproduce the calibrated behaviour; a TOML file may override any
//! subset of fields:
//!
//! ```toml
//! [reassembly]
//! gap_factor = 1.5
//!
//! [thresholds]
//! h1 = 7.5
//!
//! [lexicon]
//! mode = "extend"
//! likely = ["scope"]
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::lexicon::{Lexicon, LexiconConfig};
use crate::score::{ScoringConfig, Thresholds};

/// Multiple of the profiled inter-word gap within which two neighbouring
/// fragments are still considered part of the same phrase.
pub const DEFAULT_GAP_FACTOR: f32 = 1.3;

/// Gap used for font sizes that have no multi-word fragment to profile.
/// Large enough to merge anything on the line.
pub const DEFAULT_FALLBACK_GAP: f32 = 100.0;

/// Headings are short; longer phrases are body text.
pub const DEFAULT_MAX_WORDS: usize = 9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReassemblyConfig {
    pub gap_factor: f32,
    pub fallback_gap: f32,
    pub max_words: usize,
    /// When set, line groups bucket `y` by this tolerance instead of
    /// requiring exact equality.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_tolerance: Option<f32>,
}

impl Default for ReassemblyConfig {
    fn default() -> Self {
        ReassemblyConfig {
            gap_factor: DEFAULT_GAP_FACTOR,
            fallback_gap: DEFAULT_FALLBACK_GAP,
            max_words: DEFAULT_MAX_WORDS,
            y_tolerance: None,
        }
    }
}

impl ReassemblyConfig {
    /// Largest gap allowed between neighbours for a profiled gap `avg_gap`.
    pub fn tolerance(&self, avg_gap: f32) -> f32 {
        avg_gap * self.gap_factor
    }
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineConfig {
    pub reassembly: ReassemblyConfig,
    pub scoring: ScoringConfig,
    pub thresholds: Thresholds,
    pub lexicon: LexiconConfig,
}

impl OutlineConfig {
    /// Parse and validate a TOML document. Missing fields keep their defaults.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let config: OutlineConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.thresholds.validate()?;
        positive("reassembly.gap_factor", self.reassembly.gap_factor)?;
        positive("reassembly.fallback_gap", self.reassembly.fallback_gap)?;
        positive("scoring.tier_tolerance", self.scoring.tier_tolerance)?;
        if let Some(tol) = self.reassembly.y_tolerance {
            positive("reassembly.y_tolerance", tol)?;
        }
        Ok(())
    }

    /// The lexicon this configuration selects: the built-in word lists,
    /// extended or replaced by the `[lexicon]` section.
    pub fn build_lexicon(&self) -> Lexicon {
        self.lexicon.apply(Lexicon::builtin())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config = OutlineConfig::from_toml("").unwrap();
        assert_eq!(config, OutlineConfig::default());
    }

    #[test]
    fn test_partial_override_keeps_other_defaults() {
        let config = OutlineConfig::from_toml(
            r#"
            [reassembly]
            gap_factor = 2.0

            [thresholds]
            h1 = 8.0
            "#,
        )
        .unwrap();
        assert_eq!(config.reassembly.gap_factor, 2.0);
        assert_eq!(config.reassembly.max_words, DEFAULT_MAX_WORDS);
        assert_eq!(config.thresholds.h1, 8.0);
        assert_eq!(config.thresholds.h2, Thresholds::default().h2);
    }

    #[test]
    fn test_rejects_non_monotonic_thresholds() {
        let err = OutlineConfig::from_toml(
            r#"
            [thresholds]
            h1 = 3.0
            h2 = 5.0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidThresholds { .. }));
    }

    #[test]
    fn test_rejects_non_positive_gap_factor() {
        let err = OutlineConfig::from_toml("[reassembly]\ngap_factor = 0.0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::NonPositive {
                field: "reassembly.gap_factor",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        assert!(matches!(
            OutlineConfig::from_toml("[reassembly").unwrap_err(),
            ConfigError::Parse(_)
        ));
    }

    #[test]
    fn test_to_toml_round_trips_defaults() {
        let text = OutlineConfig::default().to_toml().unwrap();
        assert_eq!(
            OutlineConfig::from_toml(&text).unwrap(),
            OutlineConfig::default()
        );
    }

    #[test]
    fn test_tolerance_scales_gap() {
        let r = ReassemblyConfig::default();
        assert!((r.tolerance(10.0) - 13.0).abs() < 1e-4);
    }
}

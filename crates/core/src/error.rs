use thiserror::Error;

/// Errors raised while loading an [`OutlineConfig`](crate::config::OutlineConfig)
/// or a [`Lexicon`](crate::lexicon::Lexicon) from TOML.
///
/// Extraction itself never fails; only user-supplied configuration can.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Cannot serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Thresholds must satisfy h1 >= h2 >= h3 (got h1={h1}, h2={h2}, h3={h3})")]
    InvalidThresholds { h1: f32, h2: f32, h3: f32 },

    #[error("{field} must be positive (got {value})")]
    NonPositive { field: &'static str, value: f32 },
}

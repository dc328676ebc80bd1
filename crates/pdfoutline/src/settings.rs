use std::path::Path;

use outline_core::{OutlineConfig, OutlineExtractor};

use crate::prelude::{println, *};

/// Load the configuration named by `--config`, or the defaults.
pub fn load_config(path: Option<&Path>) -> Result<OutlineConfig> {
    let Some(path) = path else {
        return Ok(OutlineConfig::default());
    };
    let source = std::fs::read_to_string(path)
        .wrap_err_with(|| f!("cannot read config {}", path.display()))?;
    let config = OutlineConfig::from_toml(&source)
        .wrap_err_with(|| f!("invalid config {}", path.display()))?;
    log::debug!("loaded config from {}", path.display());
    Ok(config)
}

pub fn extractor(global: &crate::Global) -> Result<OutlineExtractor> {
    Ok(OutlineExtractor::new(load_config(global.config.as_deref())?))
}

pub async fn run(global: crate::Global) -> Result<()> {
    let config = load_config(global.config.as_deref())?;
    println!("{}", config.to_toml()?);
    Ok(())
}

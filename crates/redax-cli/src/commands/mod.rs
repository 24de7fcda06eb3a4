pub mod config;
pub mod rules;
pub mod run;
pub mod status;

use redax_config::Config;
use std::path::PathBuf;

/// Copy of `config` with command-line values taking precedence
pub fn with_overrides(
    config: &Config,
    converter: Option<PathBuf>,
    staging_dir: Option<PathBuf>,
) -> Config {
    let mut config = config.clone();
    if converter.is_some() {
        config.converter.path = converter;
    }
    if staging_dir.is_some() {
        config.staging.dir = staging_dir;
    }
    config
}

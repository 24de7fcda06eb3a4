use anyhow::Result;
use redax_config::Config;
use std::path::Path;

pub fn handle(config: &Config, explicit: Option<&Path>, path_only: bool) -> Result<()> {
    let path = explicit.map(Path::to_path_buf).unwrap_or_else(Config::config_path);

    if path_only {
        println!("{}", path.display());
        return Ok(());
    }

    println!("# {}", path.display());
    print!("{}", toml::to_string_pretty(config)?);

    Ok(())
}

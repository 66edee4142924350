//! Configuration command.

use std::path::Path;

use crate::config::{self, Config};

use super::load_config;

/// Print the effective configuration, or write the defaults with `init`
pub fn cmd_config(path: Option<&Path>, init: bool) -> anyhow::Result<()> {
    if init {
        let written = match path {
            Some(path) => {
                if path.exists() {
                    anyhow::bail!("Config file already exists: {}", path.display());
                }
                config::save_to(&Config::default(), path)?;
                path.to_path_buf()
            }
            None => {
                if let Some(existing) = config::config_path().filter(|p| p.exists()) {
                    anyhow::bail!("Config file already exists: {}", existing.display());
                }
                config::save(&Config::default())?
            }
        };
        println!("Wrote default configuration to {}", written.display());
        return Ok(());
    }

    let effective = load_config(path);
    match path.map(Path::to_path_buf).or_else(config::config_path) {
        Some(p) => println!("# {}", p.display()),
        None => println!("# no config directory"),
    }
    print!("{}", toml::to_string_pretty(&effective)?);
    Ok(())
}

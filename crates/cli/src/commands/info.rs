//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::InfoArgs;

#[derive(Serialize)]
struct RelayInfo {
    version: String,
    config_path: String,
    effective: contracts::RelayConfig,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    let config = if args.config.exists() {
        config_loader::ConfigLoader::load_from_path(&args.config)
            .with_context(|| format!("Failed to load config from {}", args.config.display()))?
    } else {
        contracts::RelayConfig::default()
    };

    let info = RelayInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        config_path: args.config.display().to_string(),
        effective: config,
    };

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&info).context("Failed to serialize info")?
        );
    } else {
        println!("statrelay {}", info.version);
        println!("config: {}", info.config_path);
        println!(
            "{}",
            config_loader::ConfigLoader::to_toml(&info.effective)
                .context("Failed to render effective configuration")?
        );
    }

    Ok(())
}

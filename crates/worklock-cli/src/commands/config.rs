//! Show the merged configuration

use colored::*;

use crate::config::WorklockConfig;
use crate::display;

pub fn show_config(config: &WorklockConfig) -> anyhow::Result<()> {
    display::banner("Configuration");
    display::field("Network", &config.network);
    display::field("Provider", config.provider_uri.as_deref().unwrap_or("(none)"));
    display::field(
        "Registry",
        &config
            .registry_filepath
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none)".to_string()),
    );
    display::field("POA", &config.poa.to_string());

    println!();
    println!("  {}", "Merged configuration".bright_white().bold());
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

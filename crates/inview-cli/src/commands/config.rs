use std::path::Path;

use anyhow::Result;

use inview_core::AppConfig;

pub fn run(
    config: &AppConfig,
    override_path: Option<&Path>,
    path_only: bool,
    init: bool,
) -> Result<()> {
    let config_path = override_path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::config_path);

    if path_only {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config already exists: {}", config_path.display());
        } else {
            AppConfig::default().save_to(&config_path)?;
            println!("Wrote default config to {}", config_path.display());
        }
        return Ok(());
    }

    println!("# {}", config_path.display());
    print!("{}", config.to_toml()?);
    Ok(())
}

pub mod config;
pub mod info;
pub mod install;

use anyhow::Result;
use oneclick::Config;

/// Load the config, applying a `--slug` override if given
pub fn load_config(slug: Option<String>) -> Result<Config> {
    let mut config = Config::load()?;
    if let Some(slug) = slug {
        config.modpack.slug = Some(slug);
    }
    Ok(config)
}

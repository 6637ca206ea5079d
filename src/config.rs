//! User configuration management
//!
//! Configuration is stored in TOML format at `~/.oneclick/config.toml`.
//! Every section is optional; a missing file yields the defaults, which
//! point at the public Modrinth and Fabric Meta hosts.
//!
//! # Examples
//!
//! ```no_run
//! use oneclick::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = Config::load()?;
//! println!("Package host: {}", config.hosts.package_url);
//!
//! config.set("modpack.slug", "my-pack")?;
//! config.save()?;
//! # Ok(())
//! # }
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// User configuration file (`~/.oneclick/config.toml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Which modpack to install
    #[serde(default)]
    pub modpack: ModpackConfig,

    /// Package and loader host URLs
    #[serde(default)]
    pub hosts: HostsConfig,

    /// Mod loader settings
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Download retry and verification policy
    #[serde(default)]
    pub download: DownloadConfig,

    /// Launcher profile settings
    #[serde(default)]
    pub profile: ProfileConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModpackConfig {
    /// Project slug on the package host
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostsConfig {
    #[serde(default = "default_package_url")]
    pub package_url: String,

    #[serde(default = "default_loader_url")]
    pub loader_url: String,
}

fn default_package_url() -> String {
    "https://api.modrinth.com/v2".to_string()
}

fn default_loader_url() -> String {
    "https://meta.fabricmc.net/v2/versions".to_string()
}

impl Default for HostsConfig {
    fn default() -> Self {
        Self {
            package_url: default_package_url(),
            loader_url: default_loader_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Prefix of the generated version id (`{name}-{loader}-{game}`)
    #[serde(default = "default_loader_name")]
    pub name: String,

    /// Used when the loader host is unreachable or lists no stable version
    #[serde(default = "default_fallback_version")]
    pub fallback_version: String,
}

fn default_loader_name() -> String {
    "fabric-loader".to_string()
}

fn default_fallback_version() -> String {
    "0.14.22".to_string()
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            name: default_loader_name(),
            fallback_version: default_fallback_version(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Attempts per URL before giving up (minimum 1)
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    /// Delay before the first retry; doubled for every further retry
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,

    /// Per-request timeout in seconds (0 = no timeout)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Check each mod file against the manifest's sha512 hash.
    /// Off by default: mirrors are trusted as-is.
    #[serde(default)]
    pub verify_hashes: bool,
}

fn default_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    500
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            backoff_ms: default_backoff_ms(),
            timeout_secs: default_timeout_secs(),
            verify_hashes: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// JVM arguments written into the launcher profile
    #[serde(default = "default_java_args")]
    pub java_args: String,

    /// Launcher icon name used when the pack ships no `icon.png`
    #[serde(default = "default_fallback_icon")]
    pub fallback_icon: String,
}

fn default_java_args() -> String {
    "-Xmx4G -XX:+UnlockExperimentalVMOptions -XX:+UseG1GC -XX:G1NewSizePercent=20 \
     -XX:G1ReservePercent=20 -XX:MaxGCPauseMillis=50 -XX:G1HeapRegionSize=32M"
        .to_string()
}

fn default_fallback_icon() -> String {
    "Crafting_Table".to_string()
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            java_args: default_java_args(),
            fallback_icon: default_fallback_icon(),
        }
    }
}

impl Config {
    /// Get the default config file path
    ///
    /// Uses ONECLICK_CONFIG_DIR if set, otherwise ~/.oneclick/config.toml
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(config_dir) = std::env::var("ONECLICK_CONFIG_DIR") {
            return Ok(PathBuf::from(config_dir).join("config.toml"));
        }

        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not find home directory".to_string()))?;

        Ok(home.join(".oneclick").join("config.toml"))
    }

    /// Load config from file, or the defaults if it doesn't exist
    ///
    /// Environment variable overrides:
    /// - `ONECLICK_SLUG`: Overrides `modpack.slug`
    /// - `ONECLICK_CONFIG_DIR`: Overrides the config directory location
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;

        let mut config = if !path.exists() {
            Self::default()
        } else {
            let content = fs::read_to_string(&path)?;
            toml::from_str(&content)?
        };

        if let Ok(slug) = std::env::var("ONECLICK_SLUG") {
            if !slug.is_empty() {
                config.modpack.slug = Some(slug);
            }
        }

        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// The configured modpack slug, or an error telling the user how to set one
    pub fn slug(&self) -> Result<&str> {
        match self.modpack.slug.as_deref() {
            Some(slug) if !slug.trim().is_empty() => Ok(slug),
            _ => Err(Error::Config(
                "No modpack configured. Run `oneclick config set modpack.slug <slug>` \
                 or pass --slug"
                    .to_string(),
            )),
        }
    }

    /// Set a value by dotted key (e.g. `download.attempts`)
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "modpack.slug" => self.modpack.slug = Some(value.to_string()),
            "hosts.package_url" => self.hosts.package_url = value.to_string(),
            "hosts.loader_url" => self.hosts.loader_url = value.to_string(),
            "loader.name" => self.loader.name = value.to_string(),
            "loader.fallback_version" => self.loader.fallback_version = value.to_string(),
            "download.attempts" => self.download.attempts = parse_value(key, value)?,
            "download.backoff_ms" => self.download.backoff_ms = parse_value(key, value)?,
            "download.timeout_secs" => self.download.timeout_secs = parse_value(key, value)?,
            "download.verify_hashes" => self.download.verify_hashes = parse_value(key, value)?,
            "profile.java_args" => self.profile.java_args = value.to_string(),
            "profile.fallback_icon" => self.profile.fallback_icon = value.to_string(),
            _ => return Err(Error::Config(format!("Unknown config key: {}", key))),
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("Invalid value for {}: {}", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.hosts.package_url, "https://api.modrinth.com/v2");
        assert_eq!(config.hosts.loader_url, "https://meta.fabricmc.net/v2/versions");
        assert_eq!(config.loader.name, "fabric-loader");
        assert_eq!(config.loader.fallback_version, "0.14.22");
        assert_eq!(config.download.attempts, 3);
        assert!(!config.download.verify_hashes);
        assert_eq!(config.profile.fallback_icon, "Crafting_Table");
        assert!(config.modpack.slug.is_none());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
[modpack]
slug = "dragonhowl"

[download]
attempts = 5
"#,
        )
        .unwrap();

        assert_eq!(config.slug().unwrap(), "dragonhowl");
        assert_eq!(config.download.attempts, 5);
        assert_eq!(config.download.backoff_ms, 500);
        assert_eq!(config.hosts.package_url, "https://api.modrinth.com/v2");
    }

    #[test]
    fn test_slug_required() {
        let mut config = Config::default();
        assert!(config.slug().is_err());

        config.modpack.slug = Some("   ".to_string());
        assert!(config.slug().is_err());
    }

    #[test]
    fn test_set_known_keys() {
        let mut config = Config::default();
        config.set("modpack.slug", "pack").unwrap();
        config.set("download.attempts", "7").unwrap();
        config.set("download.verify_hashes", "true").unwrap();
        config.set("hosts.loader_url", "http://localhost:1234").unwrap();

        assert_eq!(config.modpack.slug.as_deref(), Some("pack"));
        assert_eq!(config.download.attempts, 7);
        assert!(config.download.verify_hashes);
        assert_eq!(config.hosts.loader_url, "http://localhost:1234");
    }

    #[test]
    fn test_set_rejects_unknown_key_and_bad_value() {
        let mut config = Config::default();
        assert!(config.set("build.platforms", "Win64").is_err());
        assert!(config.set("download.attempts", "many").is_err());
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let mut config = Config::default();
        config.modpack.slug = Some("pack".to_string());
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.modpack.slug.as_deref(), Some("pack"));
        assert_eq!(parsed.profile.java_args, config.profile.java_args);
    }
}

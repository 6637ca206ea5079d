//! Fabric loader resolution and version-profile installation
//!
//! The latest stable loader version is resolved at most once per
//! [`LoaderVersionCache`]; later calls never touch the network, even when the
//! first resolution fell back to the configured constant.

use crate::api::ApiClient;
use crate::{Error, Result};
use log::{debug, info, warn};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// One entry of the loader host's `/loader` listing
#[derive(Debug, Clone, Deserialize)]
pub struct LoaderVersion {
    pub version: String,
    #[serde(default)]
    pub stable: bool,
}

/// Read-through cache for the resolved loader version.
///
/// Cloning shares the slot; [`reset`](Self::reset) forces the next lookup to
/// query the host again.
#[derive(Debug, Clone, Default)]
pub struct LoaderVersionCache {
    slot: Arc<Mutex<Option<String>>>,
}

impl LoaderVersionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }

    /// Return the cached value, or run `resolve` and cache its result.
    /// The lock is held while resolving so concurrent callers resolve once.
    pub fn get_or_insert_with<F: FnOnce() -> String>(&self, resolve: F) -> String {
        let mut slot = match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(version) = slot.as_ref() {
            return version.clone();
        }
        let version = resolve();
        *slot = Some(version.clone());
        version
    }

    pub fn reset(&self) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = None;
        }
    }
}

/// Name of the version profile for a loader/game combination,
/// e.g. `fabric-loader-0.16.10-1.21.1`
pub fn profile_name(loader_name: &str, loader_version: &str, game_version: &str) -> String {
    format!("{}-{}-{}", loader_name, loader_version, game_version)
}

/// `{game_dir}/{name}/{name}.json`
pub fn profile_path(game_dir: &Path, name: &str) -> PathBuf {
    game_dir.join(name).join(format!("{}.json", name))
}

#[derive(Debug, Clone)]
pub struct LoaderResolver {
    api: ApiClient,
    loader_name: String,
    fallback_version: String,
    cache: LoaderVersionCache,
}

impl LoaderResolver {
    pub fn new(
        api: ApiClient,
        loader_name: impl Into<String>,
        fallback_version: impl Into<String>,
    ) -> Self {
        Self {
            api,
            loader_name: loader_name.into(),
            fallback_version: fallback_version.into(),
            cache: LoaderVersionCache::new(),
        }
    }

    /// Use an existing cache instead of a fresh one
    pub fn with_cache(mut self, cache: LoaderVersionCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &LoaderVersionCache {
        &self.cache
    }

    pub fn loader_name(&self) -> &str {
        &self.loader_name
    }

    /// The first stable loader version listed by the host.
    ///
    /// List order decides, not version ordering. Never fails: an unreachable
    /// host or a listing without stable entries yields the fallback version,
    /// which is cached like any other result.
    pub fn latest_loader_version(&self) -> String {
        self.cache.get_or_insert_with(|| match self.api.get::<Vec<LoaderVersion>>("loader") {
            Ok(versions) => match first_stable(&versions) {
                Some(version) => {
                    info!("Latest stable loader: {}", version);
                    version.to_string()
                }
                None => {
                    warn!(
                        "No stable loader listed, using fallback {}",
                        self.fallback_version
                    );
                    self.fallback_version.clone()
                }
            },
            Err(e) => {
                warn!(
                    "Loader host unavailable ({}), using fallback {}",
                    e, self.fallback_version
                );
                self.fallback_version.clone()
            }
        })
    }

    /// Install the version profile JSON for a loader/game combination.
    ///
    /// If the profile file already exists it is decoded and returned without
    /// any network traffic; its content is not compared against the requested
    /// versions. Otherwise the host's profile is written verbatim.
    pub fn download_loader_profile(
        &self,
        game_dir: &Path,
        game_version: &str,
        loader_version: &str,
    ) -> Result<serde_json::Value> {
        let name = profile_name(&self.loader_name, loader_version, game_version);
        let path = profile_path(game_dir, &name);

        if path.exists() {
            debug!("Loader profile already installed at {}", path.display());
            let content = fs::read_to_string(&path)?;
            return serde_json::from_str(&content).map_err(|e| {
                Error::LoaderUnavailable(format!(
                    "Existing profile {} is not valid JSON: {}",
                    path.display(),
                    e
                ))
            });
        }

        let endpoint = format!("loader/{}/{}/profile/json", game_version, loader_version);
        let body = self
            .api
            .get_raw(&endpoint)
            .map_err(|e| Error::LoaderUnavailable(e.to_string()))?;

        let profile: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            Error::LoaderUnavailable(format!(
                "Loader host returned an invalid profile for {}: {}",
                name, e
            ))
        })?;
        if !profile.is_object() {
            return Err(Error::LoaderUnavailable(format!(
                "Loader host returned no profile for {}",
                name
            )));
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, body.as_bytes())?;

        info!("Installed loader profile {}", name);
        Ok(profile)
    }
}

fn first_stable(versions: &[LoaderVersion]) -> Option<&str> {
    versions
        .iter()
        .find(|v| v.stable)
        .map(|v| v.version.as_str())
}

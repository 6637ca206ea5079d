//! The modpack install pipeline
//!
//! Stages run strictly in order on the calling thread:
//!
//! 1. Resolve the newest pack version on the package host
//! 2. Install the loader version profile
//! 3. Download and open the bundle
//! 4. Validate the bundle index
//! 5. Download every client-supported file, one URL at a time
//! 6. Extract `overrides/` and `client-overrides/`
//! 7. Pick the profile icon
//! 8. Register the launcher profile
//!
//! The first failing stage ends the run with an [`InstallFailure`]. Files
//! written by earlier stages are left in place.
//!
//! # Examples
//!
//! ```no_run
//! use oneclick::{installer, progress, Config};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load()?;
//! let installer = installer::Installer::from_config(&config)?;
//!
//! let (status, _receiver) = progress::channel();
//! let cancel = progress::CancellationToken::new();
//! let report = installer.install(Path::new("/games/.minecraft"), &status, &cancel)?;
//! println!("Installed {} ({} files)", report.pack_name, report.downloaded.len());
//! # Ok(())
//! # }
//! ```

use crate::api::{http_client, ApiClient, RetryPolicy};
use crate::config::{Config, ProfileConfig};
use crate::loader::{profile_name, LoaderResolver};
use crate::modrinth::PackageResolver;
use crate::mrpack::{Mrpack, OverrideEntry};
use crate::profile::{encode_icon, install_profile};
use crate::progress::{self, CancellationToken, StatusReceiver, StatusSender};
use crate::{Error, Result};
use log::{debug, error, info, warn};
use std::fmt;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Marker looked for in override entry names when picking the profile icon
pub const ICON_MARKER: &str = "icon.png";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ResolvePackage,
    InstallLoader,
    DownloadPackage,
    ValidateManifest,
    InstallFiles,
    ExtractOverrides,
    ResolveIcon,
    InstallProfile,
    /// The worker thread died without producing a result
    Worker,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Stage::ResolvePackage => "resolving the modpack version",
            Stage::InstallLoader => "installing the mod loader",
            Stage::DownloadPackage => "downloading the modpack",
            Stage::ValidateManifest => "validating the modpack manifest",
            Stage::InstallFiles => "downloading mod files",
            Stage::ExtractOverrides => "extracting overrides",
            Stage::ResolveIcon => "resolving the profile icon",
            Stage::InstallProfile => "registering the launcher profile",
            Stage::Worker => "running the installer",
        };
        f.write_str(text)
    }
}

/// Terminal result of a failed run
#[derive(Debug, thiserror::Error)]
#[error("Failed while {stage}: {error}")]
pub struct InstallFailure {
    pub stage: Stage,
    #[source]
    pub error: Error,
}

fn failed(stage: Stage) -> impl FnOnce(Error) -> InstallFailure {
    move |error| InstallFailure { stage, error }
}

/// What a successful run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub pack_name: String,
    pub pack_version: String,
    pub game_version: String,
    pub loader_version: String,
    /// `lastVersionId` of the registered launcher profile
    pub version_id: String,
    /// Files fetched, relative to the game directory, in manifest order
    pub downloaded: Vec<PathBuf>,
    /// Bytes written for the downloaded files
    pub downloaded_bytes: u64,
    /// Client-unsupported entries that were left alone
    pub skipped: Vec<PathBuf>,
    /// Override files written, relative to the game directory
    pub overrides: Vec<PathBuf>,
    pub icon: String,
}

impl InstallReport {
    /// Whether the icon came from the pack rather than the fallback name
    pub fn has_pack_icon(&self) -> bool {
        self.icon.starts_with("data:")
    }
}

#[derive(Debug, Clone)]
pub struct Installer {
    packages: PackageResolver,
    loader: LoaderResolver,
    retry: RetryPolicy,
    verify_hashes: bool,
    java_args: String,
    fallback_icon: String,
}

impl Installer {
    pub fn new(packages: PackageResolver, loader: LoaderResolver) -> Self {
        let profile = ProfileConfig::default();
        Self {
            packages,
            loader,
            retry: RetryPolicy::default(),
            verify_hashes: false,
            java_args: profile.java_args,
            fallback_icon: profile.fallback_icon,
        }
    }

    /// Build an installer for the configured slug and hosts
    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = match config.download.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        let client = http_client(timeout)?;

        let packages = PackageResolver::new(
            ApiClient::new(&config.hosts.package_url, client.clone()),
            config.slug()?,
        );
        let loader = LoaderResolver::new(
            ApiClient::new(&config.hosts.loader_url, client),
            &config.loader.name,
            &config.loader.fallback_version,
        );

        Ok(Self::new(packages, loader)
            .with_retry(RetryPolicy {
                attempts: config.download.attempts.max(1),
                backoff: Duration::from_millis(config.download.backoff_ms),
            })
            .with_hash_verification(config.download.verify_hashes)
            .with_java_args(&config.profile.java_args)
            .with_fallback_icon(&config.profile.fallback_icon))
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_hash_verification(mut self, enabled: bool) -> Self {
        self.verify_hashes = enabled;
        self
    }

    pub fn with_java_args(mut self, java_args: impl Into<String>) -> Self {
        self.java_args = java_args.into();
        self
    }

    pub fn with_fallback_icon(mut self, icon: impl Into<String>) -> Self {
        self.fallback_icon = icon.into();
        self
    }

    pub fn packages(&self) -> &PackageResolver {
        &self.packages
    }

    pub fn loader(&self) -> &LoaderResolver {
        &self.loader
    }

    /// Run the whole pipeline into `game_dir`.
    ///
    /// On failure the last published status is the failure message.
    pub fn install(
        &self,
        game_dir: &Path,
        status: &StatusSender,
        cancel: &CancellationToken,
    ) -> std::result::Result<InstallReport, InstallFailure> {
        match self.run(game_dir, status, cancel) {
            Ok(report) => {
                info!(
                    "Installed {} {} into {}",
                    report.pack_name,
                    report.pack_version,
                    game_dir.display()
                );
                status.message(format!("Installed {}", report.pack_name));
                Ok(report)
            }
            Err(failure) => {
                error!("{}", failure);
                status.message(failure.to_string());
                Err(failure)
            }
        }
    }

    fn run(
        &self,
        game_dir: &Path,
        status: &StatusSender,
        cancel: &CancellationToken,
    ) -> std::result::Result<InstallReport, InstallFailure> {
        status.progress(0, 1);

        // Package version
        progress::check_cancelled(cancel).map_err(failed(Stage::ResolvePackage))?;
        status.message("Getting Latest Modpack Version");
        let latest = self
            .packages
            .latest_version()
            .map_err(failed(Stage::ResolvePackage))?;
        let game_version = latest
            .game_version()
            .map_err(failed(Stage::ResolvePackage))?
            .to_string();

        // Loader profile
        progress::check_cancelled(cancel).map_err(failed(Stage::InstallLoader))?;
        status.message(format!("Installing Fabric: {}", game_version));
        let loader_version = self.loader.latest_loader_version();
        let version_json = self
            .loader
            .download_loader_profile(game_dir, &game_version, &loader_version)
            .map_err(failed(Stage::InstallLoader))?;
        status.message("Installed Fabric");
        debug!(
            "Loader profile {}",
            profile_name(self.loader.loader_name(), &loader_version, &game_version)
        );

        // Bundle
        progress::check_cancelled(cancel).map_err(failed(Stage::DownloadPackage))?;
        status.message("Downloading Modpack");
        let mut pack = self
            .packages
            .download_package(game_dir, &latest.file.filename, &latest.file.url, &self.retry)
            .map_err(failed(Stage::DownloadPackage))?;
        status.message("Downloaded Modpack");

        progress::check_cancelled(cancel).map_err(failed(Stage::ValidateManifest))?;
        let index = pack.index().map_err(failed(Stage::ValidateManifest))?;
        info!(
            "Installing {} {} ({} files)",
            index.name,
            index.version_id,
            index.files.len()
        );

        // Mod files
        let total = index.files.len() as u64;
        let mut downloaded = Vec::new();
        let mut downloaded_bytes = 0;
        let mut skipped = Vec::new();

        for (i, raw) in index.files.iter().enumerate() {
            progress::check_cancelled(cancel).map_err(failed(Stage::InstallFiles))?;
            let file = raw.validate().map_err(failed(Stage::InstallFiles))?;

            if file.is_client_supported() {
                let dest = game_dir.join(&file.path);
                let display_name = file
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let expected = self.verify_hashes.then_some(file.sha512.as_str());

                let mut written = 0;
                for url in &file.downloads {
                    status.message(format!("Downloading: {}", display_name));
                    written = self
                        .packages
                        .api()
                        .download_with_retry(url, &dest, &self.retry, expected)
                        .map_err(failed(Stage::InstallFiles))?;
                }
                if let Some(declared) = file.file_size.filter(|size| *size != written) {
                    warn!(
                        "{} is {} bytes, the manifest declares {}",
                        file.path.display(),
                        written,
                        declared
                    );
                }
                downloaded_bytes += written;
                downloaded.push(file.path);
            } else {
                debug!("Skipping client-unsupported {}", file.path.display());
                skipped.push(file.path);
            }

            status.progress(i as u64 + 1, total);
        }

        // Overrides
        progress::check_cancelled(cancel).map_err(failed(Stage::ExtractOverrides))?;
        let entries = pack
            .override_entries()
            .map_err(failed(Stage::ExtractOverrides))?;
        let mut overrides = Vec::with_capacity(entries.len());
        for entry in &entries {
            status.message(format!("Unpacking: {}", entry.relative.display()));
            pack.extract_entry(entry.index, &game_dir.join(&entry.relative))
                .map_err(failed(Stage::ExtractOverrides))?;
            overrides.push(entry.relative.clone());
        }

        progress::check_cancelled(cancel).map_err(failed(Stage::ResolveIcon))?;
        let icon = resolve_icon(&mut pack, &entries, &self.fallback_icon)
            .map_err(failed(Stage::ResolveIcon))?;

        // Launcher profile
        progress::check_cancelled(cancel).map_err(failed(Stage::InstallProfile))?;
        status.message(format!("Creating Profile: {}", index.name));
        let profile = install_profile(game_dir, &index.name, &icon, &version_json, &self.java_args)
            .map_err(failed(Stage::InstallProfile))?;

        Ok(InstallReport {
            pack_name: index.name,
            pack_version: index.version_id,
            game_version,
            loader_version,
            version_id: profile.last_version_id,
            downloaded,
            downloaded_bytes,
            skipped,
            overrides,
            icon,
        })
    }
}

/// The first override whose name contains [`ICON_MARKER`], inlined as a
/// data URI, or `fallback` when there is none
fn resolve_icon(pack: &mut Mrpack, entries: &[OverrideEntry], fallback: &str) -> Result<String> {
    match entries.iter().find(|entry| entry.name.contains(ICON_MARKER)) {
        Some(entry) => {
            debug!("Using {} as profile icon", entry.name);
            Ok(encode_icon(&pack.read_entry(entry.index)?))
        }
        None => Ok(fallback.to_string()),
    }
}

/// A pipeline running on its own thread
pub struct InstallHandle {
    status: StatusReceiver,
    cancel: CancellationToken,
    thread: JoinHandle<std::result::Result<InstallReport, InstallFailure>>,
}

impl InstallHandle {
    pub fn status(&self) -> &StatusReceiver {
        &self.status
    }

    /// Ask the pipeline to stop before its next stage or file
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the pipeline to end
    pub fn join(self) -> std::result::Result<InstallReport, InstallFailure> {
        match self.thread.join() {
            Ok(result) => result,
            Err(_) => Err(InstallFailure {
                stage: Stage::Worker,
                error: Error::Other("install thread panicked".to_string()),
            }),
        }
    }
}

/// Run `installer` into `game_dir` on a background thread
pub fn spawn(installer: Installer, game_dir: PathBuf) -> Result<InstallHandle> {
    let (sender, receiver) = progress::channel();
    let cancel = CancellationToken::new();
    let worker_cancel = cancel.clone();

    let thread = thread::Builder::new()
        .name("oneclick-install".to_string())
        .spawn(move || installer.install(&game_dir, &sender, &worker_cancel))?;

    Ok(InstallHandle {
        status: receiver,
        cancel,
        thread,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn open_pack(dir: &Path, entries: &[(&str, &[u8])]) -> Mrpack {
        let path = dir.join("icons.mrpack");
        let mut zip = zip::ZipWriter::new(File::create(&path).unwrap());
        for (name, content) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(content).unwrap();
        }
        zip.finish().unwrap();
        Mrpack::open(&path).unwrap()
    }

    #[test]
    fn test_failure_message_names_stage() {
        let failure = InstallFailure {
            stage: Stage::ValidateManifest,
            error: Error::InvalidManifest("missing required field 'name'".to_string()),
        };
        assert_eq!(
            failure.to_string(),
            "Failed while validating the modpack manifest: Invalid modpack manifest: \
             missing required field 'name'"
        );
        assert_eq!(failure.error.kind(), ErrorKind::InvalidManifest);
    }

    #[test]
    fn test_icon_falls_back_without_match() {
        let temp_dir = TempDir::new().unwrap();
        let mut pack = open_pack(temp_dir.path(), &[("overrides/config/a.txt", b"a")]);
        let entries = pack.override_entries().unwrap();

        let icon = resolve_icon(&mut pack, &entries, "Crafting_Table").unwrap();
        assert_eq!(icon, "Crafting_Table");
    }

    #[test]
    fn test_first_icon_match_wins() {
        let temp_dir = TempDir::new().unwrap();
        let mut pack = open_pack(
            temp_dir.path(),
            &[
                ("overrides/config/a.txt", b"a"),
                ("overrides/resources/icon.png", b"first"),
                ("overrides/icon.png", b"second"),
            ],
        );
        let entries = pack.override_entries().unwrap();

        let icon = resolve_icon(&mut pack, &entries, "Crafting_Table").unwrap();
        assert_eq!(icon, encode_icon(b"first"));
    }

    #[test]
    fn test_report_icon_source() {
        let mut report = InstallReport {
            pack_name: "Pack".to_string(),
            pack_version: "1.0.0".to_string(),
            game_version: "1.20.1".to_string(),
            loader_version: "0.16.10".to_string(),
            version_id: "fabric-loader-0.16.10-1.20.1".to_string(),
            downloaded: vec![],
            downloaded_bytes: 0,
            skipped: vec![],
            overrides: vec![],
            icon: "Crafting_Table".to_string(),
        };
        assert!(!report.has_pack_icon());

        report.icon = encode_icon(b"png");
        assert!(report.has_pack_icon());
    }
}

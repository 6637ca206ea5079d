//! Modrinth modpack bundles (`.mrpack`)
//!
//! A bundle is a zip holding `modrinth.index.json` plus raw files under the
//! `overrides/` and `client-overrides/` namespaces. The index is parsed
//! leniently into [`RawPackIndex`] and then validated into [`PackIndex`];
//! individual file entries are validated separately via
//! [`RawPackFile::validate`] so the installer can stop at the first bad entry.

use crate::{Error, Result};
use log::warn;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use zip::ZipArchive;

pub const INDEX_FILE: &str = "modrinth.index.json";
pub const OVERRIDES: &str = "overrides";
pub const CLIENT_OVERRIDES: &str = "client-overrides";

// Upper bound on the buffer reserved up front from an entry's declared size
const MAX_PREALLOCATION: u64 = 16 << 20;

/// Per-environment compatibility of a pack file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvSupport {
    Required,
    #[serde(alias = "supported")]
    Optional,
    Unsupported,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileEnv {
    pub client: Option<EnvSupport>,
}

/// A file entry exactly as it appears in the index
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPackFile {
    pub path: Option<String>,
    #[serde(default)]
    pub hashes: HashMap<String, String>,
    pub env: Option<FileEnv>,
    pub downloads: Option<Vec<String>>,
    pub file_size: Option<u64>,
}

/// A validated file entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackFile {
    /// Relative to the install target, guaranteed not to escape it
    pub path: PathBuf,
    pub downloads: Vec<String>,
    pub client: EnvSupport,
    pub sha512: String,
    pub file_size: Option<u64>,
}

impl PackFile {
    pub fn is_client_supported(&self) -> bool {
        self.client != EnvSupport::Unsupported
    }
}

impl RawPackFile {
    pub fn validate(&self) -> Result<PackFile> {
        let raw_path = self
            .path
            .as_deref()
            .ok_or_else(|| Error::InvalidManifest("file entry without a path".to_string()))?;
        let path = safe_relative_path(raw_path).ok_or_else(|| {
            Error::InvalidManifest(format!("unsafe file path: {:?}", raw_path))
        })?;

        let hash = |algorithm: &str| -> Result<String> {
            match self.hashes.get(algorithm) {
                Some(value) if !value.is_empty() => Ok(value.clone()),
                _ => Err(Error::InvalidManifest(format!(
                    "{} is missing its {} hash",
                    raw_path, algorithm
                ))),
            }
        };
        hash("sha1")?;
        let sha512 = hash("sha512")?;

        let downloads = match &self.downloads {
            Some(downloads) if !downloads.is_empty() => downloads.clone(),
            _ => {
                return Err(Error::InvalidManifest(format!(
                    "{} has no download URLs",
                    raw_path
                )))
            }
        };
        for download in &downloads {
            let parsed = url::Url::parse(download).map_err(|e| {
                Error::InvalidManifest(format!("{}: invalid download URL {}: {}", raw_path, download, e))
            })?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err(Error::InvalidManifest(format!(
                    "{}: unsupported download URL {}",
                    raw_path, download
                )));
            }
        }

        let client = self
            .env
            .as_ref()
            .and_then(|env| env.client)
            .unwrap_or(EnvSupport::Required);

        Ok(PackFile {
            path,
            downloads,
            client,
            sha512,
            file_size: self.file_size,
        })
    }
}

/// `modrinth.index.json` exactly as it appears in the bundle
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPackIndex {
    pub format_version: Option<u32>,
    pub game: Option<String>,
    pub version_id: Option<String>,
    pub name: Option<String>,
    pub summary: Option<String>,
    pub files: Option<Vec<RawPackFile>>,
    pub dependencies: Option<BTreeMap<String, String>>,
}

/// A structurally valid index. File entries are still raw; each one is
/// validated when the installer reaches it.
#[derive(Debug, Clone)]
pub struct PackIndex {
    pub format_version: u32,
    pub game: String,
    pub version_id: String,
    pub name: String,
    pub summary: Option<String>,
    pub files: Vec<RawPackFile>,
    pub dependencies: BTreeMap<String, String>,
}

impl RawPackIndex {
    pub fn validate(self) -> Result<PackIndex> {
        let format_version = self
            .format_version
            .ok_or_else(|| missing_field("formatVersion"))?;
        if format_version != 1 {
            return Err(Error::InvalidManifest(format!(
                "unsupported formatVersion {}",
                format_version
            )));
        }

        let game = self.game.ok_or_else(|| missing_field("game"))?;
        if game != "minecraft" {
            return Err(Error::InvalidManifest(format!("unsupported game '{}'", game)));
        }

        let version_id = non_empty(self.version_id, "versionId")?;
        let name = non_empty(self.name, "name")?;
        let files = self.files.ok_or_else(|| missing_field("files"))?;
        let dependencies = self
            .dependencies
            .ok_or_else(|| missing_field("dependencies"))?;

        Ok(PackIndex {
            format_version,
            game,
            version_id,
            name,
            summary: self.summary,
            files,
            dependencies,
        })
    }
}

fn missing_field(field: &str) -> Error {
    Error::InvalidManifest(format!("missing required field '{}'", field))
}

fn non_empty(value: Option<String>, field: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        Some(_) => Err(Error::InvalidManifest(format!("field '{}' is empty", field))),
        None => Err(missing_field(field)),
    }
}

/// Accept only plain relative paths: no root, no drive prefix, no `..`
pub fn safe_relative_path(path: &str) -> Option<PathBuf> {
    if path.is_empty() || path.starts_with('/') || path.starts_with('\\') {
        return None;
    }

    let mut out = PathBuf::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if out.as_os_str().is_empty() {
        None
    } else {
        Some(out)
    }
}

/// A file inside one of the override namespaces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideEntry {
    pub index: usize,
    /// Full name inside the archive, e.g. `overrides/config/a.txt`
    pub name: String,
    /// Path with the namespace stripped, e.g. `config/a.txt`
    pub relative: PathBuf,
}

pub struct Mrpack {
    path: PathBuf,
    archive: ZipArchive<File>,
}

impl std::fmt::Debug for Mrpack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mrpack")
            .field("path", &self.path)
            .field("entries", &self.archive.len())
            .finish()
    }
}

impl Mrpack {
    /// Open a downloaded bundle. Only the zip container is checked here.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let archive = ZipArchive::new(file).map_err(|e| Error::ArchiveOpen {
            path: path.clone(),
            message: e.to_string(),
        })?;
        Ok(Self { path, archive })
    }

    /// Parse `modrinth.index.json` without validating it
    pub fn raw_index(&mut self) -> Result<RawPackIndex> {
        let mut entry = self.archive.by_name(INDEX_FILE).map_err(|_| {
            Error::InvalidManifest(format!("{} not found in bundle", INDEX_FILE))
        })?;
        let mut content = String::new();
        entry.read_to_string(&mut content).map_err(|e| {
            Error::InvalidManifest(format!("{} is unreadable: {}", INDEX_FILE, e))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| Error::InvalidManifest(format!("{} is malformed: {}", INDEX_FILE, e)))
    }

    /// Parse and validate the index
    pub fn index(&mut self) -> Result<PackIndex> {
        self.raw_index()?.validate()
    }

    /// Non-directory entries under `overrides/`, then under
    /// `client-overrides/`, each group in archive order. Entries whose path
    /// would escape the install target are skipped.
    pub fn override_entries(&mut self) -> Result<Vec<OverrideEntry>> {
        let mut global = Vec::new();
        let mut client = Vec::new();

        for index in 0..self.archive.len() {
            let entry = self.archive.by_index(index).map_err(|e| corrupt(&self.path, e))?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();

            let (namespace, bucket) = if name.starts_with(&format!("{}/", OVERRIDES)) {
                (OVERRIDES, &mut global)
            } else if name.starts_with(&format!("{}/", CLIENT_OVERRIDES)) {
                (CLIENT_OVERRIDES, &mut client)
            } else {
                continue;
            };

            let Some(enclosed) = entry.enclosed_name().map(|p| p.to_owned()) else {
                warn!("Skipping unsafe override path: {}", name);
                continue;
            };
            let relative = match enclosed.strip_prefix(namespace) {
                Ok(rest) if !rest.as_os_str().is_empty() => rest.to_path_buf(),
                _ => continue,
            };

            bucket.push(OverrideEntry {
                index,
                name,
                relative,
            });
        }

        global.extend(client);
        Ok(global)
    }

    /// Read an entry fully into memory
    pub fn read_entry(&mut self, index: usize) -> Result<Vec<u8>> {
        let mut entry = self.archive.by_index(index).map_err(|e| corrupt(&self.path, e))?;
        let mut bytes = Vec::with_capacity(entry.size().min(MAX_PREALLOCATION) as usize);
        entry.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    /// Write an entry to `dest`, creating parent directories and replacing
    /// any existing file
    pub fn extract_entry(&mut self, index: usize, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut entry = self.archive.by_index(index).map_err(|e| corrupt(&self.path, e))?;
        let mut out = File::create(dest)?;
        std::io::copy(&mut entry, &mut out)?;
        Ok(())
    }
}

fn corrupt(path: &Path, e: zip::result::ZipError) -> Error {
    Error::ArchiveOpen {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

//! Modrinth package resolution
//!
//! "Latest" is whatever the host lists first: the first element of the
//! version list and the first file of that version. No version sorting or
//! timestamp comparison is done.

use crate::api::{ApiClient, RetryPolicy};
use crate::mrpack::Mrpack;
use crate::{Error, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    pub title: String,
    pub slug: String,
    pub icon_url: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Version {
    pub id: String,
    #[serde(default)]
    pub loaders: Vec<String>,
    #[serde(default)]
    pub game_versions: Vec<String>,
    #[serde(default)]
    pub files: Vec<VersionFile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VersionFile {
    pub url: String,
    pub filename: String,
}

/// The file selected for download
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDescriptor {
    /// Id of the version the file belongs to
    pub id: String,
    pub url: String,
    pub filename: String,
}

/// Project metadata merged with its newest version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionDescriptor {
    pub title: String,
    pub slug: String,
    pub icon_url: Option<String>,
    pub game_versions: Vec<String>,
    pub file: FileDescriptor,
}

impl VersionDescriptor {
    /// Merge a project with the first version of its listing
    pub fn from_project(project: Project, versions: Vec<Version>) -> Result<Self> {
        let version = versions.into_iter().next().ok_or_else(|| {
            Error::PackageNotFound(format!("'{}' has no published versions", project.slug))
        })?;
        let file = version.files.into_iter().next().ok_or_else(|| {
            Error::PackageNotFound(format!(
                "Version {} of '{}' has no files",
                version.id, project.slug
            ))
        })?;

        Ok(Self {
            title: project.title,
            slug: project.slug,
            icon_url: project.icon_url,
            game_versions: version.game_versions,
            file: FileDescriptor {
                id: version.id,
                url: file.url,
                filename: file.filename,
            },
        })
    }

    /// The game version the pack targets (first listed)
    pub fn game_version(&self) -> Result<&str> {
        self.game_versions.first().map(String::as_str).ok_or_else(|| {
            Error::PackageNotFound(format!(
                "Version {} of '{}' lists no game versions",
                self.file.id, self.slug
            ))
        })
    }
}

#[derive(Debug, Clone)]
pub struct PackageResolver {
    api: ApiClient,
    slug: String,
}

impl PackageResolver {
    pub fn new(api: ApiClient, slug: impl Into<String>) -> Self {
        Self {
            api,
            slug: slug.into(),
        }
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Fetch the project and its version list and merge them
    pub fn latest_version(&self) -> Result<VersionDescriptor> {
        let project: Project = self.api.get(&format!("project/{}", self.slug))?;
        let versions: Vec<Version> = self.api.get(&format!("project/{}/version", self.slug))?;

        let descriptor = VersionDescriptor::from_project(project, versions)?;
        info!(
            "Latest version of {}: {} ({})",
            descriptor.slug, descriptor.file.id, descriptor.file.filename
        );
        Ok(descriptor)
    }

    /// Stream the bundle to `{game_dir}/{filename}` and open it. Only the
    /// final component of `filename` is used.
    pub fn download_package(
        &self,
        game_dir: &Path,
        filename: &str,
        url: &str,
        policy: &RetryPolicy,
    ) -> Result<Mrpack> {
        let name = Path::new(filename).file_name().ok_or_else(|| {
            Error::PackageNotFound(format!("'{}' is not a usable file name", filename))
        })?;
        let dest = game_dir.join(name);
        self.api.download_with_retry(url, &dest, policy, None)?;
        Mrpack::open(&dest)
    }
}

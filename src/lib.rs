//! OneClick - one-command installer for a curated Modrinth modpack
//!
//! OneClick resolves the newest release of a modpack on Modrinth, installs
//! the matching Fabric loader profile, downloads the `.mrpack` bundle and
//! every client-side mod it lists, unpacks the bundled overrides, and
//! registers a profile in the vanilla launcher.
//!
//! - "Latest" means the first entry the host lists, no version sorting
//! - Downloads are sequential with bounded retry and optional sha512 checks
//! - Bundles are validated before anything is downloaded from them
//! - Progress is published through a single-slot status channel
//!
//! # Examples
//!
//! ```no_run
//! use oneclick::{installer, Config};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = Config::load()?;
//! config.set("modpack.slug", "dragonhowl")?;
//!
//! let handle = installer::spawn(
//!     installer::Installer::from_config(&config)?,
//!     "/games/.minecraft".into(),
//! )?;
//! let report = handle.join()?;
//! println!("Installed {} with {} mods", report.pack_name, report.downloaded.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`api`] - Blocking JSON-over-HTTP client with retrying downloads
//! - [`loader`] - Fabric loader version lookup and profile install
//! - [`modrinth`] - Modrinth project/version lookup and bundle download
//! - [`mrpack`] - `.mrpack` bundle access and index validation
//! - [`installer`] - The install pipeline and its background runner
//! - [`profile`] - `launcher_profiles.json` merging
//! - [`progress`] - Status channel and cancellation
//! - [`platform`] - Default game directory per OS
//! - [`config`] - User configuration management
//! - [`error`] - Error types and result handling

pub mod api;
pub mod config;
pub mod error;
pub mod installer;
pub mod loader;
pub mod modrinth;
pub mod mrpack;
pub mod platform;
pub mod profile;
pub mod progress;

pub use api::{ApiClient, RetryPolicy};
pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use installer::{InstallFailure, InstallHandle, InstallReport, Installer, Stage};
pub use loader::{LoaderResolver, LoaderVersionCache};
pub use modrinth::{PackageResolver, VersionDescriptor};
pub use mrpack::{EnvSupport, Mrpack, PackFile, PackIndex};
pub use platform::default_game_dir;
pub use profile::{encode_icon, install_profile, LauncherProfile};
pub use progress::{CancellationToken, Status, StatusReceiver, StatusSender};

//! Default game directory detection
//!
//! The launcher keeps its data in a per-OS location:
//!
//! - Windows: `%APPDATA%\.minecraft`
//! - macOS: `$HOME/Library/Application Support/minecraft`
//! - Linux and others: `$HOME/.minecraft`
//!
//! A default is only offered when that directory already exists.
//!
//! # Examples
//!
//! ```no_run
//! use oneclick::default_game_dir;
//!
//! match default_game_dir() {
//!     Some(dir) => println!("Installing into {}", dir.display()),
//!     None => println!("No launcher found, pass --dir"),
//! }
//! ```

use std::env;
use std::path::PathBuf;

/// The launcher directory for the running OS, if it exists
pub fn default_game_dir() -> Option<PathBuf> {
    game_dir_for(env::consts::OS, |key| env::var(key).ok()).filter(|dir| dir.is_dir())
}

/// Where the launcher directory lives on `os` (an `env::consts::OS` value),
/// whether or not it exists
pub fn game_dir_for<F>(os: &str, var: F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    match os {
        "windows" => var("APPDATA").map(|appdata| PathBuf::from(appdata).join(".minecraft")),
        "macos" => var("HOME").map(|home| {
            PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("minecraft")
        }),
        _ => var("HOME").map(|home| PathBuf::from(home).join(".minecraft")),
    }
}

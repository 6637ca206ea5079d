use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Unexpected response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Failed to download {url} after {attempts} attempt(s): {message}")]
    Download {
        url: String,
        attempts: u32,
        message: String,
    },

    #[error("Not a valid modpack archive ({path}): {message}")]
    ArchiveOpen { path: PathBuf, message: String },

    #[error("Invalid modpack manifest: {0}")]
    InvalidManifest(String),

    #[error("Mod loader unavailable: {0}")]
    LoaderUnavailable(String),

    #[error("Launcher configuration not found at {}\n\n\
             Hint: Start the Minecraft launcher once so it creates launcher_profiles.json,\n\
             or pass the correct game directory with --dir.",
             .0.display())]
    ConfigMissing(PathBuf),

    #[error("Invalid launcher configuration: {0}")]
    InvalidLauncherConfig(String),

    #[error("Package not found: {0}")]
    PackageNotFound(String),

    #[error("Hash mismatch for {path}: expected {expected}, got {actual}")]
    HashMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("Installation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

/// Coarse classification of an [`Error`], used by callers that apply
/// fallback policy or report a failure kind without the details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Decode,
    Download,
    ArchiveOpen,
    InvalidManifest,
    LoaderUnavailable,
    ConfigMissing,
    InvalidLauncherConfig,
    PackageNotFound,
    HashMismatch,
    Io,
    Cancelled,
    Config,
    Other,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::Io,
            Error::Json(_) => ErrorKind::Decode,
            Error::TomlDe(_) | Error::TomlSer(_) | Error::Config(_) => ErrorKind::Config,
            Error::Transport { .. } => ErrorKind::Transport,
            Error::Decode { .. } => ErrorKind::Decode,
            Error::Download { .. } => ErrorKind::Download,
            Error::ArchiveOpen { .. } => ErrorKind::ArchiveOpen,
            Error::InvalidManifest(_) => ErrorKind::InvalidManifest,
            Error::LoaderUnavailable(_) => ErrorKind::LoaderUnavailable,
            Error::ConfigMissing(_) => ErrorKind::ConfigMissing,
            Error::InvalidLauncherConfig(_) => ErrorKind::InvalidLauncherConfig,
            Error::PackageNotFound(_) => ErrorKind::PackageNotFound,
            Error::HashMismatch { .. } => ErrorKind::HashMismatch,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::Other(_) => ErrorKind::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_distinguishes_transport_from_decode() {
        let transport = Error::Transport {
            url: "http://localhost/loader".to_string(),
            message: "connection refused".to_string(),
        };
        let decode = Error::Decode {
            url: "http://localhost/loader".to_string(),
            message: "expected value".to_string(),
        };

        assert_eq!(transport.kind(), ErrorKind::Transport);
        assert_eq!(decode.kind(), ErrorKind::Decode);
        assert_ne!(transport.kind(), decode.kind());
    }

    #[test]
    fn test_config_missing_message_names_path() {
        let err = Error::ConfigMissing(PathBuf::from("/games/.minecraft/launcher_profiles.json"));
        let msg = err.to_string();
        assert!(msg.contains("launcher_profiles.json"));
        assert!(msg.contains("--dir"));
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io.into();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}

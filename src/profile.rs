//! Launcher profile registration
//!
//! Profiles are merged into the launcher's existing `launcher_profiles.json`.
//! The file is never created: a missing document means the launcher has not
//! been run in that directory, which is reported as [`Error::ConfigMissing`].

use crate::{Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, SecondsFormat, Utc};
use log::info;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

pub const LAUNCHER_PROFILES: &str = "launcher_profiles.json";

/// One entry of the launcher document's `profiles` object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LauncherProfile {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub created: String,
    pub last_used: String,
    pub icon: String,
    pub java_args: String,
    pub last_version_id: String,
}

/// Inline a PNG as a `data:` URI the launcher accepts as a profile icon
pub fn encode_icon(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png))
}

/// Register a profile stamped with the current time
pub fn install_profile(
    game_dir: &Path,
    name: &str,
    icon: &str,
    version_json: &Value,
    java_args: &str,
) -> Result<LauncherProfile> {
    install_profile_at(game_dir, name, icon, version_json, java_args, Utc::now())
}

/// Register a profile with an explicit timestamp.
///
/// The profile is inserted under `name`, replacing any profile with the same
/// key. Everything else in the document is written back untouched and in
/// its original order.
pub fn install_profile_at(
    game_dir: &Path,
    name: &str,
    icon: &str,
    version_json: &Value,
    java_args: &str,
    now: DateTime<Utc>,
) -> Result<LauncherProfile> {
    let last_version_id = version_json
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            Error::LoaderUnavailable("loader profile has no version id".to_string())
        })?;

    let timestamp = now.to_rfc3339_opts(SecondsFormat::Secs, true);
    let profile = LauncherProfile {
        name: name.to_string(),
        kind: "custom".to_string(),
        created: timestamp.clone(),
        last_used: timestamp,
        icon: icon.to_string(),
        java_args: java_args.to_string(),
        last_version_id: last_version_id.to_string(),
    };

    let path = game_dir.join(LAUNCHER_PROFILES);
    if !path.exists() {
        return Err(Error::ConfigMissing(path));
    }

    let content = fs::read_to_string(&path)?;
    let mut document: Value = serde_json::from_str(&content).map_err(|e| {
        Error::InvalidLauncherConfig(format!("{} is not valid JSON: {}", path.display(), e))
    })?;

    let root = document.as_object_mut().ok_or_else(|| {
        Error::InvalidLauncherConfig(format!("{} is not a JSON object", path.display()))
    })?;
    let profiles = root
        .entry("profiles")
        .or_insert_with(|| Value::Object(serde_json::Map::new()))
        .as_object_mut()
        .ok_or_else(|| {
            Error::InvalidLauncherConfig("'profiles' is not a JSON object".to_string())
        })?;

    profiles.insert(name.to_string(), serde_json::to_value(&profile)?);

    fs::write(&path, serde_json::to_string_pretty(&document)?)?;
    info!("Registered launcher profile '{}' -> {}", name, profile.last_version_id);
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use chrono::TimeZone;
    use serde_json::json;
    use tempfile::TempDir;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    fn loader_profile() -> Value {
        json!({"id": "fabric-loader-0.16.10-1.21.1", "inheritsFrom": "1.21.1"})
    }

    fn read_document(dir: &Path) -> Value {
        serde_json::from_str(&fs::read_to_string(dir.join(LAUNCHER_PROFILES)).unwrap()).unwrap()
    }

    #[test]
    fn test_encode_icon() {
        assert_eq!(encode_icon(b"png"), "data:image/png;base64,cG5n");
        assert_eq!(encode_icon(b""), "data:image/png;base64,");
    }

    #[test]
    fn test_merge_preserves_other_profiles_and_keys() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(LAUNCHER_PROFILES),
            r#"{
  "settings": {"enableSnapshots": false},
  "profiles": {
    "zzz-vanilla": {"name": "Vanilla", "type": "latest-release"},
    "aaa-other": {"name": "Other", "type": "custom"}
  },
  "version": 3
}"#,
        )
        .unwrap();

        let profile = install_profile_at(
            temp_dir.path(),
            "Dragonhowl",
            "Crafting_Table",
            &loader_profile(),
            "-Xmx4G",
            fixed_time(),
        )
        .unwrap();
        assert_eq!(profile.last_version_id, "fabric-loader-0.16.10-1.21.1");

        let document = read_document(temp_dir.path());
        let root_keys: Vec<_> = document.as_object().unwrap().keys().cloned().collect();
        assert_eq!(root_keys, vec!["settings", "profiles", "version"]);

        let profile_keys: Vec<_> = document["profiles"]
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(profile_keys, vec!["zzz-vanilla", "aaa-other", "Dragonhowl"]);

        assert_eq!(document["settings"]["enableSnapshots"], false);
        assert_eq!(document["version"], 3);

        let written = &document["profiles"]["Dragonhowl"];
        assert_eq!(written["name"], "Dragonhowl");
        assert_eq!(written["type"], "custom");
        assert_eq!(written["created"], "2024-03-09T14:05:07Z");
        assert_eq!(written["lastUsed"], "2024-03-09T14:05:07Z");
        assert_eq!(written["icon"], "Crafting_Table");
        assert_eq!(written["javaArgs"], "-Xmx4G");
        assert_eq!(written["lastVersionId"], "fabric-loader-0.16.10-1.21.1");
    }

    #[test]
    fn test_same_name_is_overwritten() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(LAUNCHER_PROFILES),
            r#"{"profiles": {"Pack": {"name": "Pack", "lastVersionId": "old"}}}"#,
        )
        .unwrap();

        install_profile_at(
            temp_dir.path(),
            "Pack",
            "icon",
            &loader_profile(),
            "",
            fixed_time(),
        )
        .unwrap();

        let document = read_document(temp_dir.path());
        assert_eq!(document["profiles"].as_object().unwrap().len(), 1);
        assert_eq!(
            document["profiles"]["Pack"]["lastVersionId"],
            "fabric-loader-0.16.10-1.21.1"
        );
    }

    #[test]
    fn test_missing_profiles_key_is_created() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(LAUNCHER_PROFILES), r#"{"version": 3}"#).unwrap();

        install_profile(temp_dir.path(), "Pack", "icon", &loader_profile(), "").unwrap();

        let document = read_document(temp_dir.path());
        assert_eq!(document["profiles"]["Pack"]["type"], "custom");
        assert_eq!(document["version"], 3);
    }

    #[test]
    fn test_missing_document_is_config_missing() {
        let temp_dir = TempDir::new().unwrap();
        let err = install_profile(temp_dir.path(), "Pack", "icon", &loader_profile(), "")
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ConfigMissing);
        assert!(!temp_dir.path().join(LAUNCHER_PROFILES).exists());
    }

    #[test]
    fn test_malformed_documents_are_rejected() {
        for content in ["[1, 2]", r#"{"profiles": []}"#, "not json"] {
            let temp_dir = TempDir::new().unwrap();
            fs::write(temp_dir.path().join(LAUNCHER_PROFILES), content).unwrap();

            let err = install_profile(temp_dir.path(), "Pack", "icon", &loader_profile(), "")
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidLauncherConfig, "case: {}", content);
            assert_eq!(
                fs::read_to_string(temp_dir.path().join(LAUNCHER_PROFILES)).unwrap(),
                content
            );
        }
    }

    #[test]
    fn test_version_json_without_id() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(LAUNCHER_PROFILES), r#"{"profiles": {}}"#).unwrap();

        let err = install_profile(temp_dir.path(), "Pack", "icon", &json!({}), "").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LoaderUnavailable);
    }
}

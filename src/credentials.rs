//! API-credential resolution and persistence.
//!
//! The lookup order is ordinary configuration precedence, expressed as an
//! explicit ordered function rather than global state so it can be called
//! once at startup and unit-tested against arbitrary roots:
//!
//! 1. `DOC2MD_API_KEY` environment variable
//! 2. local config file `./.doc2md.json`
//! 3. global config file `{config_dir}/doc2md/config.json`
//!
//! The `setup` CLI subcommand persists a key to either file via
//! [`store_api_key`]. Config files hold a single JSON object so future
//! fields can be added without a format break.

use crate::error::Doc2MdError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable consulted first.
pub const API_KEY_ENV: &str = "DOC2MD_API_KEY";

/// Name of the per-project config file, looked up in the current directory.
pub const LOCAL_CONFIG_FILE: &str = ".doc2md.json";

/// Where a credential should be persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// `./.doc2md.json` in the current directory.
    Local,
    /// `{config_dir}/doc2md/config.json`.
    Global,
}

/// On-disk config file contents.
#[derive(Debug, Serialize, Deserialize)]
struct ConfigFile {
    api_key: String,
}

/// Path of the global config file, if a platform config directory exists.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("doc2md").join("config.json"))
}

/// Resolve the API key using the documented precedence order.
///
/// Returns `None` when no source yields a non-empty key; callers map that
/// to [`Doc2MdError::MissingApiKey`] with a remediation hint.
pub fn resolve_api_key() -> Option<String> {
    if let Ok(key) = std::env::var(API_KEY_ENV) {
        if !key.trim().is_empty() {
            debug!("API key resolved from {}", API_KEY_ENV);
            return Some(key.trim().to_string());
        }
    }

    if let Some(key) = read_key_from_file(Path::new(LOCAL_CONFIG_FILE)) {
        debug!("API key resolved from {}", LOCAL_CONFIG_FILE);
        return Some(key);
    }

    if let Some(path) = global_config_path() {
        if let Some(key) = read_key_from_file(&path) {
            debug!("API key resolved from {}", path.display());
            return Some(key);
        }
    }

    None
}

/// Read and parse one config file; `None` on absence, unreadability, or
/// malformed JSON — a broken file must never abort credential lookup, the
/// next source in the chain is simply consulted.
fn read_key_from_file(path: &Path) -> Option<String> {
    let contents = std::fs::read_to_string(path).ok()?;
    let parsed: ConfigFile = serde_json::from_str(&contents).ok()?;
    if parsed.api_key.trim().is_empty() {
        None
    } else {
        Some(parsed.api_key.trim().to_string())
    }
}

/// Persist an API key to the local or global config file.
pub fn store_api_key(key: &str, scope: Scope) -> Result<PathBuf, Doc2MdError> {
    let path = match scope {
        Scope::Local => PathBuf::from(LOCAL_CONFIG_FILE),
        Scope::Global => global_config_path().ok_or_else(|| {
            Doc2MdError::Internal("No platform config directory available".into())
        })?,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| Doc2MdError::OutputWriteFailed {
                path: path.clone(),
                source: e,
            })?;
        }
    }

    let contents = serde_json::to_string_pretty(&ConfigFile {
        api_key: key.trim().to_string(),
    })
    .map_err(|e| Doc2MdError::Internal(format!("config serialisation: {e}")))?;

    std::fs::write(&path, contents).map_err(|e| Doc2MdError::OutputWriteFailed {
        path: path.clone(),
        source: e,
    })?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_key_from_file(&dir.path().join("nope.json")), None);
    }

    #[test]
    fn malformed_file_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(read_key_from_file(&path), None);
    }

    #[test]
    fn empty_key_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        std::fs::write(&path, r#"{"api_key": "  "}"#).unwrap();
        assert_eq!(read_key_from_file(&path), None);
    }

    #[test]
    fn round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        let contents = serde_json::to_string(&ConfigFile {
            api_key: "sk-test-123".into(),
        })
        .unwrap();
        std::fs::write(&path, contents).unwrap();
        assert_eq!(read_key_from_file(&path), Some("sk-test-123".to_string()));
    }

    #[test]
    fn key_is_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, r#"{"api_key": " sk-ws "}"#).unwrap();
        assert_eq!(read_key_from_file(&path), Some("sk-ws".to_string()));
    }
}

use crate::upload::UploadTarget;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// URL that parsed scans are POSTed to.
    /// Unset: scans are only printed.
    pub api_endpoint: Option<String>,
    /// Bearer token sent with uploads. Optional even when uploading.
    pub api_token: Option<String>,
}

impl Config {
    /// Load configuration from ~/.config/goosniffer/config.toml
    ///
    /// - File missing: returns default config (Ok)
    /// - File exists but invalid TOML: returns Err so caller can abort startup
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Layer `overrides` (flags / environment) on top of this config.
    /// Blank values count as unset and never override.
    pub fn merged_with(self, overrides: Config) -> Config {
        Config {
            api_endpoint: non_blank(overrides.api_endpoint).or(non_blank(self.api_endpoint)),
            api_token: non_blank(overrides.api_token).or(non_blank(self.api_token)),
        }
    }

    /// Upload destination, if an endpoint is configured.
    /// The token alone never enables uploading.
    pub fn upload_target(&self) -> Option<UploadTarget> {
        let endpoint = non_blank(self.api_endpoint.clone())?;
        Some(UploadTarget {
            endpoint,
            token: non_blank(self.api_token.clone()),
        })
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|d| d.join(".config").join("goosniffer").join("config.toml"))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config(endpoint: Option<&str>, token: Option<&str>) -> Config {
        Config {
            api_endpoint: endpoint.map(str::to_string),
            api_token: token.map(str::to_string),
        }
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_load_valid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, r#"api_endpoint = "https://example.com/moons""#).unwrap();
        writeln!(file, r#"api_token = "abc""#).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config(Some("https://example.com/moons"), Some("abc")));
    }

    #[test]
    fn test_load_partial_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_token = \"abc\"\n").unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_endpoint, None);
        assert_eq!(loaded.api_token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_endpoint = [[[invalid").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_overrides_win() {
        let file = config(Some("https://file"), Some("file-token"));
        let merged = file.merged_with(config(Some("https://flag"), None));
        assert_eq!(merged, config(Some("https://flag"), Some("file-token")));
    }

    #[test]
    fn test_blank_override_does_not_clear() {
        let file = config(Some("https://file"), Some("file-token"));
        let merged = file.merged_with(config(Some("   "), Some("")));
        assert_eq!(merged, config(Some("https://file"), Some("file-token")));
    }

    #[test]
    fn test_upload_target_requires_endpoint_only() {
        assert_eq!(config(None, Some("abc")).upload_target(), None);
        assert_eq!(config(Some(""), Some("abc")).upload_target(), None);

        let target = config(Some("https://example.com"), None)
            .upload_target()
            .unwrap();
        assert_eq!(target.endpoint, "https://example.com");
        assert_eq!(target.token, None);

        let target = config(Some("https://example.com"), Some(" abc "))
            .upload_target()
            .unwrap();
        assert_eq!(target.token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_config_path() {
        if let Some(path) = Config::config_path() {
            assert!(path.ends_with(".config/goosniffer/config.toml"));
        }
    }
}

//! Configuration file management for ketoplan.
//!
//! Provides a TOML-based config file at `~/.config/ketoplan/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.
//!
//! The API key is never stored here; it is read from `OPENAI_API_KEY` only.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use ketoplan_core::request::openai::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use ketoplan_core::request::retry::MAX_ATTEMPTS_CAP;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Environment variable holding the provider API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub model: ModelSection,
    #[serde(default)]
    pub request: RequestSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelSection {
    pub name: String,
    pub base_url: String,
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            name: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RequestSection {
    pub timeout_secs: u64,
    /// Attempts per request, including the first. Clamped to 1..=2.
    pub max_attempts: u32,
}

impl Default for RequestSection {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_attempts: 1,
        }
    }
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the ketoplan config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/ketoplan` or
/// `~/.config/ketoplan`, including on macOS.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("ketoplan");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("ketoplan")
}

/// Return the path to the ketoplan config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug, Clone, PartialEq)]
pub struct KetoplanConfig {
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    pub max_attempts: u32,
}

impl KetoplanConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - Model: `cli_model` > `KETOPLAN_MODEL` > `OPENAI_MODEL` > `model.name` > `gpt-4o-mini`
    /// - Base URL: `cli_base_url` > `OPENAI_BASE_URL` > `model.base_url` > OpenAI
    /// - Timeout: `cli_timeout` > `KETOPLAN_TIMEOUT_SECS` > `request.timeout_secs` > 60
    /// - Attempts: `request.max_attempts` > 1, clamped to `1..=2`
    pub fn resolve(
        cli_model: Option<&str>,
        cli_base_url: Option<&str>,
        cli_timeout: Option<u64>,
    ) -> Result<Self> {
        let file_config = load_config().ok();

        let model = if let Some(model) = cli_model {
            model.to_string()
        } else if let Some(model) = non_empty_env("KETOPLAN_MODEL") {
            model
        } else if let Some(model) = non_empty_env("OPENAI_MODEL") {
            model
        } else if let Some(ref cfg) = file_config {
            cfg.model.name.clone()
        } else {
            DEFAULT_MODEL.to_string()
        };

        let base_url = if let Some(url) = cli_base_url {
            url.to_string()
        } else if let Some(url) = non_empty_env("OPENAI_BASE_URL") {
            url
        } else if let Some(ref cfg) = file_config {
            cfg.model.base_url.clone()
        } else {
            DEFAULT_BASE_URL.to_string()
        };

        let timeout_secs = if let Some(secs) = cli_timeout {
            secs
        } else if let Some(raw) = non_empty_env("KETOPLAN_TIMEOUT_SECS") {
            raw.trim()
                .parse::<u64>()
                .with_context(|| format!("KETOPLAN_TIMEOUT_SECS is not a whole number: {raw:?}"))?
        } else if let Some(ref cfg) = file_config {
            cfg.request.timeout_secs
        } else {
            DEFAULT_TIMEOUT_SECS
        };
        if timeout_secs == 0 {
            bail!("request timeout must be at least 1 second");
        }

        let max_attempts = file_config
            .as_ref()
            .map_or(1, |cfg| cfg.request.max_attempts)
            .clamp(1, MAX_ATTEMPTS_CAP);

        Ok(Self {
            model,
            base_url,
            timeout: Duration::from_secs(timeout_secs),
            max_attempts,
        })
    }
}

/// Read the API key from the environment.
pub fn api_key() -> Result<String> {
    match non_empty_env(API_KEY_ENV) {
        Some(key) => Ok(key),
        None => bail!("{API_KEY_ENV} is not set; export your API key before running `ketoplan generate`"),
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        crate::test_util::lock_env()
    }

    const VARS: [&str; 6] = [
        "KETOPLAN_MODEL",
        "OPENAI_MODEL",
        "OPENAI_BASE_URL",
        "KETOPLAN_TIMEOUT_SECS",
        "OPENAI_API_KEY",
        "XDG_CONFIG_HOME",
    ];

    /// Clear every variable resolution reads and point the config dir at an
    /// empty temp dir. Returns the previous values for restoring.
    fn isolate(tmp: &tempfile::TempDir) -> Vec<(&'static str, Option<String>)> {
        let saved = VARS.iter().map(|v| (*v, std::env::var(v).ok())).collect();
        for v in VARS {
            unsafe { std::env::remove_var(v) };
        }
        unsafe { std::env::set_var("XDG_CONFIG_HOME", tmp.path()) };
        saved
    }

    fn restore(saved: Vec<(&'static str, Option<String>)>) {
        for (name, value) in saved {
            match value {
                Some(v) => unsafe { std::env::set_var(name, v) },
                None => unsafe { std::env::remove_var(name) },
            }
        }
    }

    fn write_config(tmp: &tempfile::TempDir, contents: &str) {
        let dir = tmp.path().join("ketoplan");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.toml"), contents).unwrap();
    }

    #[test]
    fn defaults_when_nothing_set() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let saved = isolate(&tmp);

        let config = KetoplanConfig::resolve(None, None, None);
        restore(saved);

        let config = config.unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.max_attempts, 1);
    }

    #[test]
    fn cli_flag_overrides_env_and_file() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let saved = isolate(&tmp);
        write_config(&tmp, "[model]\nname = \"file-model\"\nbase_url = \"http://file\"\n");
        unsafe { std::env::set_var("KETOPLAN_MODEL", "env-model") };
        unsafe { std::env::set_var("OPENAI_BASE_URL", "http://env") };
        unsafe { std::env::set_var("KETOPLAN_TIMEOUT_SECS", "30") };

        let config = KetoplanConfig::resolve(Some("cli-model"), Some("http://cli"), Some(5));
        restore(saved);

        let config = config.unwrap();
        assert_eq!(config.model, "cli-model");
        assert_eq!(config.base_url, "http://cli");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn env_overrides_file() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let saved = isolate(&tmp);
        write_config(
            &tmp,
            "[model]\nname = \"file-model\"\nbase_url = \"http://file\"\n\n[request]\ntimeout_secs = 90\nmax_attempts = 2\n",
        );
        unsafe { std::env::set_var("OPENAI_MODEL", "openai-env-model") };
        unsafe { std::env::set_var("KETOPLAN_TIMEOUT_SECS", "30") };

        let config = KetoplanConfig::resolve(None, None, None);
        restore(saved);

        let config = config.unwrap();
        assert_eq!(config.model, "openai-env-model");
        assert_eq!(config.base_url, "http://file");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_attempts, 2);
    }

    #[test]
    fn ketoplan_model_beats_openai_model() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let saved = isolate(&tmp);
        unsafe { std::env::set_var("KETOPLAN_MODEL", "ketoplan-env") };
        unsafe { std::env::set_var("OPENAI_MODEL", "openai-env") };

        let config = KetoplanConfig::resolve(None, None, None);
        restore(saved);

        assert_eq!(config.unwrap().model, "ketoplan-env");
    }

    #[test]
    fn max_attempts_is_clamped() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let saved = isolate(&tmp);
        write_config(&tmp, "[request]\ntimeout_secs = 60\nmax_attempts = 9\n");

        let config = KetoplanConfig::resolve(None, None, None);
        restore(saved);

        let config = config.unwrap();
        assert_eq!(config.max_attempts, MAX_ATTEMPTS_CAP);
        assert_eq!(config.model, DEFAULT_MODEL, "missing [model] falls back to defaults");
    }

    #[test]
    fn bad_timeout_env_is_an_error() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let saved = isolate(&tmp);
        unsafe { std::env::set_var("KETOPLAN_TIMEOUT_SECS", "soon") };

        let result = KetoplanConfig::resolve(None, None, None);
        restore(saved);

        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("KETOPLAN_TIMEOUT_SECS"), "unexpected error: {msg}");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let saved = isolate(&tmp);

        let result = KetoplanConfig::resolve(None, None, Some(0));
        restore(saved);

        assert!(result.is_err());
    }

    #[test]
    fn api_key_required() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let saved = isolate(&tmp);

        let missing = api_key();
        unsafe { std::env::set_var("OPENAI_API_KEY", "sk-abc") };
        let present = api_key();
        restore(saved);

        assert!(missing.unwrap_err().to_string().contains("OPENAI_API_KEY"));
        assert_eq!(present.unwrap(), "sk-abc");
    }

    #[cfg(unix)]
    #[test]
    fn save_config_roundtrip_with_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let saved = isolate(&tmp);

        let original = ConfigFile {
            model: ModelSection {
                name: "gpt-4o".to_string(),
                base_url: "http://localhost:8080/v1".to_string(),
            },
            request: RequestSection {
                timeout_secs: 120,
                max_attempts: 2,
            },
        };
        let save_result = save_config(&original);
        let path = config_path();
        let loaded = load_config();
        restore(saved);

        save_result.unwrap();
        let loaded = loaded.unwrap();
        assert_eq!(loaded.model.name, "gpt-4o");
        assert_eq!(loaded.model.base_url, "http://localhost:8080/v1");
        assert_eq!(loaded.request.timeout_secs, 120);
        assert_eq!(loaded.request.max_attempts, 2);

        let meta = std::fs::metadata(&path).unwrap();
        assert_eq!(meta.permissions().mode() & 0o777, 0o600);
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let path = config_path();
        assert!(
            path.ends_with("ketoplan/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}

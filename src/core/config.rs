//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.storefront-assistant/config.toml`. If missing on first
//! run, a commented-out default is generated so users can discover all options.

use log::{LevelFilter, debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::core::attachment::DEFAULT_MAX_ATTACHMENT_BYTES;
use crate::inference::MalformedEnvelope;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AssistantConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub endpoint: EndpointConfig,
    #[serde(default)]
    pub attachments: AttachmentConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// "error", "warn", "info", "debug" or "trace".
    pub log_level: Option<String>,
    pub log_file: Option<String>,
    pub malformed_envelope: Option<MalformedEnvelope>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct EndpointConfig {
    pub url: Option<String>,
    pub connect_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AttachmentConfig {
    pub max_bytes: Option<u64>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_ENDPOINT_URL: &str = "http://localhost:3000/api/chat";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_LOG_FILE: &str = "storefront-assistant.log";
pub const ENDPOINT_ENV_VAR: &str = "STOREFRONT_ENDPOINT_URL";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub endpoint_url: String,
    pub connect_timeout: Duration,
    pub max_attachment_bytes: u64,
    pub malformed_envelope: MalformedEnvelope,
    pub log_level: LevelFilter,
    pub log_file: PathBuf,
}

/// Values supplied on the command line. `None` means "not specified".
#[derive(Debug, Default, Clone)]
pub struct CliOverrides<'a> {
    pub endpoint: Option<&'a str>,
    pub log_file: Option<&'a str>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.storefront-assistant/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".storefront-assistant").join("config.toml"))
}

/// Load config from the default location.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `AssistantConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<AssistantConfig, ConfigError> {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => {
            warn!("Could not determine home directory, using default config");
            Ok(AssistantConfig::default())
        }
    }
}

pub fn load_config_from(path: &Path) -> Result<AssistantConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(AssistantConfig::default());
    }

    let contents = fs::read_to_string(path)?;
    let config: AssistantConfig = toml::from_str(&contents)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# Storefront Assistant Configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# log_level = "info"                  # "error", "warn", "info", "debug", "trace"
# log_file = "storefront-assistant.log"
# malformed_envelope = "fail"         # "fail" or "plain_text"

# [endpoint]
# url = "http://localhost:3000/api/chat"   # Or set STOREFRONT_ENDPOINT_URL
# connect_timeout_secs = 10

# [attachments]
# max_bytes = 4194304                 # 4 MiB
"#;

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &AssistantConfig, cli: &CliOverrides<'_>) -> ResolvedConfig {
    resolve_with_env(config, cli, std::env::var(ENDPOINT_ENV_VAR).ok())
}

fn resolve_with_env(
    config: &AssistantConfig,
    cli: &CliOverrides<'_>,
    env_endpoint: Option<String>,
) -> ResolvedConfig {
    // Endpoint: CLI → env → config → default
    let endpoint_url = cli
        .endpoint
        .map(|s| s.to_string())
        .or(env_endpoint)
        .or_else(|| config.endpoint.url.clone())
        .unwrap_or_else(|| DEFAULT_ENDPOINT_URL.to_string());

    let log_file = cli
        .log_file
        .map(|s| s.to_string())
        .or_else(|| config.general.log_file.clone())
        .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());

    let log_level = match config.general.log_level.as_deref() {
        None => LevelFilter::Debug,
        Some(level) => level.parse().unwrap_or_else(|_| {
            warn!("Unknown log_level '{}', using debug", level);
            LevelFilter::Debug
        }),
    };

    let max_attachment_bytes = match config.attachments.max_bytes {
        Some(0) => {
            warn!("attachments.max_bytes = 0 would reject every image, using default");
            DEFAULT_MAX_ATTACHMENT_BYTES
        }
        Some(n) => n,
        None => DEFAULT_MAX_ATTACHMENT_BYTES,
    };

    ResolvedConfig {
        endpoint_url,
        connect_timeout: Duration::from_secs(
            config
                .endpoint
                .connect_timeout_secs
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
        ),
        max_attachment_bytes,
        malformed_envelope: config.general.malformed_envelope.unwrap_or_default(),
        log_level,
        log_file: PathBuf::from(log_file),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_uses_defaults_when_empty() {
        let resolved = resolve_with_env(&AssistantConfig::default(), &CliOverrides::default(), None);
        assert_eq!(resolved.endpoint_url, DEFAULT_ENDPOINT_URL);
        assert_eq!(resolved.connect_timeout, Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS));
        assert_eq!(resolved.max_attachment_bytes, DEFAULT_MAX_ATTACHMENT_BYTES);
        assert_eq!(resolved.malformed_envelope, MalformedEnvelope::Fail);
        assert_eq!(resolved.log_level, LevelFilter::Debug);
        assert_eq!(resolved.log_file, PathBuf::from(DEFAULT_LOG_FILE));
    }

    #[test]
    fn test_resolve_config_values_override_defaults() {
        let config = AssistantConfig {
            general: GeneralConfig {
                log_level: Some("warn".to_string()),
                log_file: Some("/tmp/a.log".to_string()),
                malformed_envelope: Some(MalformedEnvelope::PlainText),
            },
            endpoint: EndpointConfig {
                url: Some("https://shop.example/api/chat".to_string()),
                connect_timeout_secs: Some(3),
            },
            attachments: AttachmentConfig {
                max_bytes: Some(1024),
            },
        };
        let resolved = resolve_with_env(&config, &CliOverrides::default(), None);
        assert_eq!(resolved.endpoint_url, "https://shop.example/api/chat");
        assert_eq!(resolved.connect_timeout, Duration::from_secs(3));
        assert_eq!(resolved.max_attachment_bytes, 1024);
        assert_eq!(resolved.malformed_envelope, MalformedEnvelope::PlainText);
        assert_eq!(resolved.log_level, LevelFilter::Warn);
        assert_eq!(resolved.log_file, PathBuf::from("/tmp/a.log"));
    }

    #[test]
    fn test_resolve_precedence_cli_env_file() {
        let config = AssistantConfig {
            endpoint: EndpointConfig {
                url: Some("http://file".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let env = Some("http://env".to_string());

        let resolved = resolve_with_env(&config, &CliOverrides::default(), env.clone());
        assert_eq!(resolved.endpoint_url, "http://env");

        let cli = CliOverrides {
            endpoint: Some("http://cli"),
            log_file: Some("cli.log"),
        };
        let resolved = resolve_with_env(&config, &cli, env);
        assert_eq!(resolved.endpoint_url, "http://cli");
        assert_eq!(resolved.log_file, PathBuf::from("cli.log"));
    }

    #[test]
    fn test_zero_max_bytes_falls_back() {
        let config = AssistantConfig {
            attachments: AttachmentConfig { max_bytes: Some(0) },
            ..Default::default()
        };
        let resolved = resolve_with_env(&config, &CliOverrides::default(), None);
        assert_eq!(resolved.max_attachment_bytes, DEFAULT_MAX_ATTACHMENT_BYTES);
    }

    #[test]
    fn test_bad_log_level_falls_back() {
        let config = AssistantConfig {
            general: GeneralConfig {
                log_level: Some("chatty".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let resolved = resolve_with_env(&config, &CliOverrides::default(), None);
        assert_eq!(resolved.log_level, LevelFilter::Debug);
    }

    #[test]
    fn test_toml_parses() {
        let toml_str = r#"
[general]
log_level = "info"
malformed_envelope = "plain_text"

[endpoint]
url = "http://127.0.0.1:8787/chat"
connect_timeout_secs = 5

[attachments]
max_bytes = 2097152
"#;
        let config: AssistantConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level.as_deref(), Some("info"));
        assert_eq!(config.general.malformed_envelope, Some(MalformedEnvelope::PlainText));
        assert_eq!(config.endpoint.connect_timeout_secs, Some(5));
        assert_eq!(config.attachments.max_bytes, Some(2 * 1024 * 1024));
    }

    #[test]
    fn test_sparse_toml_parses() {
        let config: AssistantConfig = toml::from_str("[endpoint]\nurl = \"http://x\"\n").unwrap();
        assert_eq!(config.endpoint.url.as_deref(), Some("http://x"));
        assert!(config.general.log_file.is_none());
        assert!(config.attachments.max_bytes.is_none());
    }

    #[test]
    fn test_load_generates_default_then_parses_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = load_config_from(&path).unwrap();
        assert!(config.endpoint.url.is_none());
        assert!(path.exists());

        // Everything in the generated file is commented out.
        let reparsed = load_config_from(&path).unwrap();
        assert!(reparsed.general.log_level.is_none());
    }

    #[test]
    fn test_load_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[endpoint\nurl = 1").unwrap();
        assert!(matches!(load_config_from(&path), Err(ConfigError::Parse(_))));
    }
}

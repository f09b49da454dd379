//! Server-side configuration.
//!
//! Loaded from a TOML file. A bare context name resolves to
//! `/etc/motorlog/<name>.toml`; anything containing `/` or `.` is
//! treated as a path.

use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the SQLite database.
    pub data_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    /// Access token lifetime in seconds.
    #[serde(default = "default_access_ttl")]
    pub access_ttl_secs: i64,
    /// Refresh token lifetime in seconds.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_secs: i64,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AiConfig {
    /// OpenRouter API key. Empty disables the remote advisor.
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SeedConfig {
    /// Load demo branches, users and reference rows on first start.
    #[serde(default)]
    pub enabled: bool,
    /// Password for the seeded admin account. Required when enabled.
    #[serde(default)]
    pub admin_password: String,
    /// Password for the seeded employee accounts.
    #[serde(default)]
    pub employee_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub storage: StorageConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

fn default_access_ttl() -> i64 {
    900
}

fn default_refresh_ttl() -> i64 {
    604_800
}

fn default_true() -> bool {
    true
}

fn default_max_requests() -> u32 {
    100
}

fn default_window_secs() -> u64 {
    60
}

impl ServerConfig {
    /// Resolve a context name or path to a config file path.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.contains('.') {
            PathBuf::from(name_or_path)
        } else {
            PathBuf::from(format!("/etc/motorlog/{}.toml", name_or_path))
        }
    }

    /// Load config from disk.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))?;
        let config: ServerConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Verify server configuration is ready for use.
pub fn verify_config(config: &ServerConfig) -> anyhow::Result<()> {
    if config.jwt.secret.is_empty() {
        anyhow::bail!("JWT secret is empty in configuration.");
    }
    if config.storage.data_dir.is_empty() {
        anyhow::bail!("Storage data_dir is empty in configuration.");
    }
    if config.seed.enabled && config.seed.admin_password.is_empty() {
        anyhow::bail!("Seeding is enabled but seed.admin_password is empty.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_path() {
        assert_eq!(
            ServerConfig::resolve_path("prod"),
            PathBuf::from("/etc/motorlog/prod.toml")
        );
        assert_eq!(
            ServerConfig::resolve_path("./local.toml"),
            PathBuf::from("./local.toml")
        );
    }

    #[test]
    fn test_minimal_config_parses() {
        let config: ServerConfig = toml::from_str(
            r#"
            [storage]
            data_dir = "/var/lib/motorlog"

            [jwt]
            secret = "s3cret"
            "#,
        )
        .unwrap();
        assert_eq!(config.jwt.access_ttl_secs, 900);
        assert_eq!(config.jwt.refresh_ttl_secs, 604_800);
        assert!(config.rate_limit.enabled);
        assert_eq!(config.rate_limit.max_requests, 100);
        assert!(config.ai.api_key.is_empty());
        assert!(!config.seed.enabled);
        assert!(verify_config(&config).is_ok());
    }

    #[test]
    fn test_verify_rejects_empty_secret() {
        let config: ServerConfig = toml::from_str(
            r#"
            [storage]
            data_dir = "/var/lib/motorlog"

            [jwt]
            secret = ""
            "#,
        )
        .unwrap();
        assert!(verify_config(&config).is_err());
    }

    #[test]
    fn test_verify_rejects_seed_without_password() {
        let config: ServerConfig = toml::from_str(
            r#"
            [storage]
            data_dir = "/var/lib/motorlog"

            [jwt]
            secret = "s3cret"

            [seed]
            enabled = true
            "#,
        )
        .unwrap();
        assert!(verify_config(&config).is_err());
    }
}

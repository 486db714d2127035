//! Service configuration and client factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use adaptquiz_core::engine::EngineConfig;
use adaptquiz_core::traits::{BehaviorAnalytics, MistakeAnalytics};

use crate::behavior::HttpBehaviorAnalytics;
use crate::http::DEFAULT_TIMEOUT_SECS;
use crate::mistakes::HttpMistakeAnalytics;
use crate::mock::{MockBehaviorAnalytics, MockMistakeAnalytics};

/// Environment variable that overrides the auth token of every service.
pub const TOKEN_ENV_VAR: &str = "ADAPTQUIZ_API_TOKEN";

/// Connection settings for one analytics service.
///
/// Note: Custom Debug impl masks the auth token to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub base_url: String,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("base_url", &self.base_url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "***"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// The analytics services; either may be absent, in which case an offline
/// mock stands in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServicesConfig {
    #[serde(default)]
    pub behavior: Option<ServiceConfig>,
    #[serde(default)]
    pub mistakes: Option<ServiceConfig>,
}

/// Top-level adaptquiz configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdaptquizConfig {
    #[serde(default)]
    pub services: ServicesConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        let var_name = &rest[start + 2..start + end];
        result.push_str(&rest[..start]);
        // Substituted values are not rescanned.
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_service_config(config: &mut ServiceConfig, token_override: Option<&str>) {
    config.base_url = resolve_env_vars(&config.base_url);
    config.auth_token = match token_override {
        Some(token) => Some(token.to_string()),
        None => config
            .auth_token
            .as_deref()
            .map(resolve_env_vars)
            .filter(|t| !t.is_empty()),
    };
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `adaptquiz.toml` in the current directory
/// 2. `~/.config/adaptquiz/config.toml`
///
/// Environment variable override: `ADAPTQUIZ_API_TOKEN`.
pub fn load_config() -> Result<AdaptquizConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<AdaptquizConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("adaptquiz.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|home| home.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            parse_config(&path)?
        }
        None => AdaptquizConfig::default(),
    };

    let token_override = std::env::var(TOKEN_ENV_VAR).ok().filter(|t| !t.is_empty());
    for service in [&mut config.services.behavior, &mut config.services.mistakes]
        .into_iter()
        .flatten()
    {
        resolve_service_config(service, token_override.as_deref());
    }

    config
        .engine
        .validate()
        .context("invalid [engine] configuration")?;

    Ok(config)
}

fn parse_config(path: &Path) -> Result<AdaptquizConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    toml::from_str::<AdaptquizConfig>(&content)
        .with_context(|| format!("failed to parse config: {}", path.display()))
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("adaptquiz"))
}

/// Build the behavior client, falling back to an empty mock when no
/// service is configured.
pub fn create_behavior_client(config: Option<&ServiceConfig>) -> Result<Arc<dyn BehaviorAnalytics>> {
    match config {
        Some(c) => Ok(Arc::new(HttpBehaviorAnalytics::new(
            &c.base_url,
            c.auth_token.clone(),
            c.timeout_secs,
        )?)),
        None => Ok(Arc::new(MockBehaviorAnalytics::empty())),
    }
}

/// Build the mistake client, falling back to an empty mock when no
/// service is configured.
pub fn create_mistake_client(config: Option<&ServiceConfig>) -> Result<Arc<dyn MistakeAnalytics>> {
    match config {
        Some(c) => Ok(Arc::new(HttpMistakeAnalytics::new(
            &c.base_url,
            c.auth_token.clone(),
            c.timeout_secs,
        )?)),
        None => Ok(Arc::new(MockMistakeAnalytics::empty())),
    }
}

/// Build both clients from a loaded configuration.
pub fn create_clients(
    config: &AdaptquizConfig,
) -> Result<(Arc<dyn BehaviorAnalytics>, Arc<dyn MistakeAnalytics>)> {
    Ok((
        create_behavior_client(config.services.behavior.as_ref())?,
        create_mistake_client(config.services.mistakes.as_ref())?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use adaptquiz_core::model::DifficultyLevel;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_ADAPTQUIZ_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_ADAPTQUIZ_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_ADAPTQUIZ_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("no vars"), "no vars");
        assert_eq!(resolve_env_vars("broken ${"), "broken ${");
        std::env::remove_var("_ADAPTQUIZ_TEST_VAR");
    }

    #[test]
    fn resolve_env_vars_does_not_rescan_values() {
        std::env::set_var("_ADAPTQUIZ_TEST_NESTED", "${_ADAPTQUIZ_TEST_NESTED}");
        assert_eq!(
            resolve_env_vars("a${_ADAPTQUIZ_TEST_NESTED}b${_ADAPTQUIZ_TEST_MISSING}c"),
            "a${_ADAPTQUIZ_TEST_NESTED}bc"
        );
        std::env::remove_var("_ADAPTQUIZ_TEST_NESTED");
    }

    #[test]
    fn default_config() {
        let config = AdaptquizConfig::default();
        assert!(config.services.behavior.is_none());
        assert_eq!(config.engine.window_size, 10);
        assert_eq!(config.engine.check_interval, 5);
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
[services.behavior]
base_url = "https://api.example.com"
auth_token = "tok"

[services.mistakes]
base_url = "https://api.example.com"
timeout_secs = 10

[engine]
initial_difficulty = "intermediate"
window_size = 8
"#;
        let config: AdaptquizConfig = toml::from_str(toml_str).unwrap();
        let behavior = config.services.behavior.unwrap();
        assert_eq!(behavior.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.services.mistakes.unwrap().timeout_secs, 10);
        assert_eq!(config.engine.initial_difficulty, DifficultyLevel::Intermediate);
        assert_eq!(config.engine.window_size, 8);
        assert_eq!(config.engine.promote_threshold, 0.8);
    }

    #[test]
    fn debug_masks_token() {
        let config = ServiceConfig {
            base_url: "https://api.example.com".into(),
            auth_token: Some("super-secret".into()),
            timeout_secs: 30,
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("adaptquiz.toml");
        std::fs::write(
            &path,
            "[services.behavior]\nbase_url = \"http://${_ADAPTQUIZ_TEST_HOST}\"\nauth_token = \"${_ADAPTQUIZ_TEST_UNSET}\"\n",
        )
        .unwrap();
        std::env::set_var("_ADAPTQUIZ_TEST_HOST", "localhost:9000");

        let config = load_config_from(Some(&path)).unwrap();
        let behavior = config.services.behavior.unwrap();
        assert_eq!(behavior.base_url, "http://localhost:9000");
        if std::env::var(TOKEN_ENV_VAR).is_err() {
            assert_eq!(behavior.auth_token, None);
        }
        std::env::remove_var("_ADAPTQUIZ_TEST_HOST");
    }

    #[test]
    fn missing_explicit_path_fails() {
        let err = load_config_from(Some(Path::new("/nonexistent/adaptquiz.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn invalid_engine_section_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("adaptquiz.toml");
        std::fs::write(&path, "[engine]\nwindow_size = 0\n").unwrap();
        let err = load_config_from(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("window_size"));
    }

    #[test]
    fn factory_falls_back_to_mocks() {
        let (behavior, mistakes) = create_clients(&AdaptquizConfig::default()).unwrap();
        assert_eq!(behavior.name(), "mock");
        assert_eq!(mistakes.name(), "mock");
    }

    #[test]
    fn factory_builds_http_clients() {
        let service = ServiceConfig {
            base_url: "http://localhost:9000".into(),
            auth_token: None,
            timeout_secs: 5,
        };
        let behavior = create_behavior_client(Some(&service)).unwrap();
        assert_eq!(behavior.name(), "http");
    }
}

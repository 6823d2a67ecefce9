//! Configuration Management
//!
//! Handles persistent configuration storage for ecl. Values resolve as
//! CLI flag > environment (`OS_*`) > config file.

use crate::cloud::auth::AuthMethod;
use crate::error::{Error, Result};
use crate::service_filter::Interface;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// User configuration
///
/// The password is never written to disk; it comes from `OS_PASSWORD`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Identity endpoint, e.g. `https://keystone.example.com/v3`
    #[serde(default)]
    pub auth_url: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub user_domain_id: Option<String>,
    /// Project to scope tokens to
    #[serde(default)]
    pub project_id: Option<String>,
    /// Last used region
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub interface: Option<Interface>,
}

/// Read a non-empty environment variable
fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ecl").join("config.yaml"))
    }

    /// Load configuration from the default location
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from a file, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    /// Save configuration to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::Config(format!("cannot encode config: {}", e)))?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get effective identity endpoint (env > config)
    pub fn effective_auth_url(&self) -> Option<String> {
        env_var("OS_AUTH_URL").or_else(|| self.auth_url.clone())
    }

    /// Get effective user name (env > config)
    pub fn effective_username(&self) -> Option<String> {
        env_var("OS_USERNAME").or_else(|| self.username.clone())
    }

    /// Get effective user domain (env > config)
    pub fn effective_user_domain_id(&self) -> Option<String> {
        env_var("OS_USER_DOMAIN_ID").or_else(|| self.user_domain_id.clone())
    }

    /// Get effective project (env > config)
    pub fn effective_project(&self) -> Option<String> {
        env_var("OS_PROJECT_ID").or_else(|| self.project_id.clone())
    }

    /// Get effective region (env > config)
    pub fn effective_region(&self) -> Option<String> {
        env_var("OS_REGION_NAME").or_else(|| self.region.clone())
    }

    /// Get effective interface (env > config)
    pub fn effective_interface(&self) -> Result<Option<Interface>> {
        match env_var("OS_INTERFACE") {
            Some(value) => Ok(Some(value.parse()?)),
            None => Ok(self.interface),
        }
    }

    /// Build the authentication method from the effective settings.
    ///
    /// `OS_TOKEN` selects token mode; otherwise a password is required.
    pub fn auth_method(&self) -> Result<AuthMethod> {
        let auth_url = self.effective_auth_url().ok_or_else(|| {
            Error::Config("No identity endpoint configured. Set OS_AUTH_URL".to_string())
        })?;

        if let Some(token) = env_var("OS_TOKEN") {
            return Ok(AuthMethod::Token { auth_url, token });
        }

        let username = self.effective_username().ok_or_else(|| {
            Error::Config("No user configured. Set OS_USERNAME".to_string())
        })?;
        let password = env_var("OS_PASSWORD").ok_or_else(|| {
            Error::Config("No password available. Set OS_PASSWORD or OS_TOKEN".to_string())
        })?;

        Ok(AuthMethod::Password {
            auth_url,
            username,
            password,
            user_domain_id: self.effective_user_domain_id(),
            project_id: self.effective_project(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_round_trip_on_disk() {
        let dir = std::env::temp_dir().join(format!("ecl-config-test-{}", std::process::id()));
        let path = dir.join("config.yaml");

        let config = Config {
            auth_url: Some("https://keystone.example.com/v3".to_string()),
            username: Some("alice".to_string()),
            project_id: Some("p1".to_string()),
            interface: Some(Interface::Internal),
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("interface: internal"));
        assert!(!content.contains("password"));
        assert_eq!(Config::load_from(&path), config);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("ecl-config-does-not-exist.yaml");
        assert_eq!(Config::load_from(&path), Config::default());
    }

    // Tests touching OS_* variables run one at a time
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    const AUTH_VARS: &[&str] = &[
        "OS_AUTH_URL",
        "OS_USERNAME",
        "OS_PASSWORD",
        "OS_USER_DOMAIN_ID",
        "OS_PROJECT_ID",
        "OS_TOKEN",
    ];

    fn clear_auth_env() {
        for var in AUTH_VARS {
            std::env::remove_var(var);
        }
    }

    fn configured() -> Config {
        Config {
            auth_url: Some("https://keystone.example.com/v3".to_string()),
            username: Some("alice".to_string()),
            project_id: Some("p1".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_auth_method_token_from_env() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_auth_env();
        std::env::set_var("OS_TOKEN", "pre-issued");

        let method = configured().auth_method();
        clear_auth_env();

        match method {
            Ok(AuthMethod::Token { auth_url, token }) => {
                assert_eq!(auth_url, "https://keystone.example.com/v3");
                assert_eq!(token, "pre-issued");
            }
            _ => panic!("expected token authentication"),
        }
    }

    #[test]
    fn test_auth_method_password() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_auth_env();
        std::env::set_var("OS_PASSWORD", "secret");
        std::env::set_var("OS_PROJECT_ID", "p2");

        let method = configured().auth_method();
        clear_auth_env();

        match method {
            Ok(AuthMethod::Password {
                username,
                password,
                user_domain_id,
                project_id,
                ..
            }) => {
                assert_eq!(username, "alice");
                assert_eq!(password, "secret");
                assert!(user_domain_id.is_none());
                assert_eq!(project_id.as_deref(), Some("p2"));
            }
            _ => panic!("expected password authentication"),
        }
    }

    #[test]
    fn test_auth_method_requires_password_or_token() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_auth_env();

        assert!(matches!(configured().auth_method(), Err(Error::Config(_))));
        assert!(matches!(
            Config::default().auth_method(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_partial_yaml() {
        let config: Config = serde_yaml::from_str("region: jp1\n").unwrap();
        assert_eq!(config.region.as_deref(), Some("jp1"));
        assert!(config.auth_url.is_none());
    }
}

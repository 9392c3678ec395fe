//! Configuration management for eldocs

use crate::auth::CloudAuthorization;
use crate::connector::DEFAULT_ELEMENTS_URL;
use crate::error::{Error, Result};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration directory name
const CONFIG_DIR: &str = "eldocs";

/// Configuration file name
const CONFIG_FILE: &str = "config.toml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    pub elements: ElementsConfig,
    pub logging: Option<LoggingConfig>,
}

/// Cloud Elements API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementsConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_secret: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_secret: Option<String>,

    // Token of the provisioned element instance (document hub)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_token: Option<String>,
}

impl ElementsConfig {
    /// Authorization value from the configured secrets, if complete
    pub fn authorization(&self) -> Option<CloudAuthorization> {
        let user = self.user_secret.clone()?;
        let org = self.organization_secret.clone()?;
        let auth = CloudAuthorization::new(user, org);
        Some(match &self.element_token {
            Some(token) => auth.with_element_token(token.clone()),
            None => auth,
        })
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default values
fn default_base_url() -> String {
    DEFAULT_ELEMENTS_URL.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let home = home_dir().ok_or_else(|| Error::Config("Cannot determine home directory".to_string()))?;
    let config_dir = home.join(".config").join(CONFIG_DIR);

    // Create directory if it doesn't exist
    if !config_dir.exists() {
        fs::create_dir_all(&config_dir).map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
    }

    Ok(config_dir)
}

/// Get the configuration file path
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(CONFIG_FILE))
}

/// Load configuration from file
pub fn load_config() -> Result<ConfigFile> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        return Err(Error::ConfigNotFound(config_path));
    }

    load_config_from(&config_path)
}

fn load_config_from(config_path: &Path) -> Result<ConfigFile> {
    let content = fs::read_to_string(config_path).map_err(|e| {
        Error::InvalidConfig(format!("Failed to read config file: {}", e))
    })?;

    let config: ConfigFile = toml::from_str(&content).map_err(|e| {
        Error::InvalidConfig(format!("Failed to parse config file: {}", e))
    })?;

    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let config_path = get_config_path()?;
    save_config_to(config, &config_path)
}

fn save_config_to(config: &ConfigFile, config_path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config).map_err(|e| {
        Error::InvalidConfig(format!("Failed to serialize config: {}", e))
    })?;

    fs::write(config_path, content).map_err(|e| {
        Error::Config(format!("Failed to write config file: {}", e))
    })?;

    // Set secure permissions on config file (read/write for owner only)
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(config_path)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(config_path, perms)?;
    }

    Ok(())
}

/// Validate configuration
pub fn validate_config(config: &ConfigFile) -> Result<()> {
    // Validate base URL
    if !config.elements.base_url.starts_with("http") {
        return Err(Error::InvalidInput(format!(
            "Invalid base URL: {}",
            config.elements.base_url
        )));
    }

    // Both account secrets are required to authenticate
    let has_secrets = config.elements.user_secret.is_some()
        && config.elements.organization_secret.is_some();

    if !has_secrets {
        return Err(Error::Config(
            "No authentication configured. Both user_secret and organization_secret must be set".to_string()
        ));
    }

    Ok(())
}

/// Check if configuration exists
pub fn config_exists() -> bool {
    get_config_path().map(|p| p.exists()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_valid_config() -> ConfigFile {
        ConfigFile {
            elements: ElementsConfig {
                base_url: DEFAULT_ELEMENTS_URL.to_string(),
                user_secret: Some("usr123".to_string()),
                organization_secret: Some("org456".to_string()),
                element_token: Some("el789".to_string()),
            },
            logging: None,
        }
    }

    #[test]
    fn test_validate_config_valid() {
        let config = make_valid_config();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_config_missing_secrets() {
        let mut config = make_valid_config();
        config.elements.organization_secret = None;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_config_bad_base_url() {
        let mut config = make_valid_config();
        config.elements.base_url = "ftp://nope".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_authorization_from_config() {
        let config = make_valid_config();
        let auth = config.elements.authorization().unwrap();
        assert_eq!(
            auth.header_value(),
            "User usr123, Organization org456, Element el789"
        );
    }

    #[test]
    fn test_authorization_requires_both_secrets() {
        let mut config = make_valid_config();
        config.elements.user_secret = None;
        assert!(config.elements.authorization().is_none());
    }

    #[test]
    fn test_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        let config = make_valid_config();
        save_config_to(&config, &path).unwrap();
        let loaded = load_config_from(&path).unwrap();

        assert_eq!(loaded.elements.base_url, config.elements.base_url);
        assert_eq!(loaded.elements.user_secret, config.elements.user_secret);
        assert_eq!(loaded.elements.element_token, config.elements.element_token);
    }

    #[test]
    fn test_base_url_defaults_when_absent() {
        let config: ConfigFile = toml::from_str(
            "[elements]\nuser_secret = \"u\"\norganization_secret = \"o\"\n",
        )
        .unwrap();
        assert_eq!(config.elements.base_url, DEFAULT_ELEMENTS_URL);
    }
}

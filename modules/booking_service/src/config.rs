//! Configuration for booking service module

use crate::domain::payload::BookingDefaults;
use crate::domain::validation::ValidationRules;
use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Booking service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Record store connection
    #[serde(default)]
    pub backend: BackendConfig,

    /// Timeout applied to every record store call
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Maximum students + supervisors per group
    #[serde(default = "default_max_group_size")]
    pub max_group_size: u32,

    /// Maximum number of groups per booking
    #[serde(default = "default_max_groups")]
    pub max_groups: usize,

    /// Category values that make a justification mandatory
    #[serde(default = "default_restricted_categories")]
    pub restricted_categories: Vec<String>,

    /// Hidden fields stamped on every booking
    #[serde(default)]
    pub booking_defaults: BookingDefaults,
}

/// Record store connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Base URL of the record store API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Versioned API namespace appended to the base URL
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// User credential
    #[serde(default)]
    pub api_key: String,

    /// Site credential
    #[serde(default)]
    pub site_key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            request_timeout: default_request_timeout(),
            max_group_size: default_max_group_size(),
            max_groups: default_max_groups(),
            restricted_categories: default_restricted_categories(),
            booking_defaults: BookingDefaults::default(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_version: default_api_version(),
            api_key: String::new(),
            site_key: String::new(),
        }
    }
}

impl Config {
    /// Load configuration from an optional YAML file, overridden by
    /// `BOOKING_`-prefixed environment variables (`__` separates nesting).
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let config = figment
            .merge(Env::prefixed("BOOKING_").split("__"))
            .extract()?;
        Ok(config)
    }

    /// Copy with credentials masked, for display
    pub fn redacted(&self) -> Self {
        let mask = |value: &str| {
            if value.is_empty() {
                String::new()
            } else {
                "***".to_string()
            }
        };
        let mut config = self.clone();
        config.backend.api_key = mask(&self.backend.api_key);
        config.backend.site_key = mask(&self.backend.site_key);
        config
    }

    /// Validation rules derived from this configuration
    pub fn validation_rules(&self) -> ValidationRules {
        ValidationRules {
            max_group_size: self.max_group_size,
            max_groups: self.max_groups,
            restricted_categories: self.restricted_categories.iter().cloned().collect(),
        }
    }
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_group_size() -> u32 {
    340
}

fn default_max_groups() -> usize {
    3
}

fn default_restricted_categories() -> Vec<String> {
    vec!["other".to_string()]
}

fn default_base_url() -> String {
    "http://localhost:8080/civicrm/ajax".to_string()
}

fn default_api_version() -> String {
    "api4".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.max_group_size, 340);
        assert_eq!(config.max_groups, 3);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.backend.api_version, "api4");
    }

    #[test]
    fn test_load_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "backend:\n  base_url: https://crm.example.org/api\n  api_key: user-key\n  site_key: site-key\nrequest_timeout: 5s\nrestricted_categories: [other, special_needs]"
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.backend.base_url, "https://crm.example.org/api");
        assert_eq!(config.backend.api_key, "user-key");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.restricted_categories.len(), 2);
        assert_eq!(config.max_group_size, 340);

        let rules = config.validation_rules();
        assert!(rules.restricted_categories.contains("special_needs"));
    }

    #[test]
    fn test_redacted_masks_credentials() {
        let mut config = Config::default();
        config.backend.api_key = "secret".to_string();

        let redacted = config.redacted();
        assert_eq!(redacted.backend.api_key, "***");
        assert_eq!(redacted.backend.site_key, "");
        assert_eq!(redacted.backend.base_url, config.backend.base_url);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_group_sise: 10").unwrap();
        assert!(Config::load(Some(file.path())).is_err());
    }
}

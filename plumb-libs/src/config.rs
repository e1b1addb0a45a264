//! Submission configuration.
//!
//! The editor ships with an ordered list of analysis endpoints (for example
//! a hosted service followed by a local development service). The list is
//! read once at startup from a YAML file and iterated verbatim on every
//! submission.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Endpoint used when no configuration is supplied
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000";

/// Request timeout used when the configuration does not set one
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Root configuration structure for submissions.
///
/// # Example YAML
///
/// ```yaml
/// endpoints:
///   - "https://pipelines.example.com"
///   - "http://localhost:8000"
/// timeout_secs: 5
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionConfig {
    /// Candidate base URLs, tried in order
    pub endpoints: Vec<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![DEFAULT_ENDPOINT.to_string()],
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl SubmissionConfig {
    /// Replace the endpoint list with a comma-separated override, as read
    /// from an environment variable. Blank entries are ignored.
    pub fn with_endpoint_override(mut self, list: &str) -> Self {
        let endpoints: Vec<String> = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if !endpoints.is_empty() {
            self.endpoints = endpoints;
        }
        self
    }

    /// Check the invariants every submission relies on
    pub fn validate(&self) -> Result<(), AppError> {
        if self.endpoints.is_empty() {
            return Err(AppError::ConfigError(
                "endpoints cannot be empty".to_string(),
            ));
        }

        for endpoint in &self.endpoints {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(AppError::ConfigError(format!(
                    "endpoint '{}' must start with http:// or https://",
                    endpoint
                )));
            }
        }

        if self.timeout_secs == 0 {
            return Err(AppError::ConfigError(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Load and validate a submission configuration from a YAML file.
///
/// # Arguments
///
/// * `config_path` - Path to the YAML file
///
/// # Returns
///
/// * `Ok(SubmissionConfig)` - Successfully parsed configuration
/// * `Err(AppError)` - Failed to read file, parse YAML or validate
///
/// # Example
///
/// ```rust,ignore
/// use plumb_libs::load_config;
///
/// let config = load_config("plumb.yaml")?;
/// println!("First endpoint: {}", config.endpoints[0]);
/// ```
pub fn load_config<P: AsRef<Path>>(config_path: P) -> Result<SubmissionConfig, AppError> {
    let path = config_path.as_ref();

    let contents = fs::read_to_string(path).map_err(|e| {
        AppError::ConfigError(format!("Failed to read config file at {:?}: {}", path, e))
    })?;

    let config: SubmissionConfig = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::ConfigError(format!("Failed to parse config YAML at {:?}: {}", path, e))
    })?;

    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_config() {
        let file = write_config(
            "endpoints:\n  - \"https://pipelines.example.com\"\n  - \"http://localhost:8000\"\ntimeout_secs: 3\n",
        );

        let config = load_config(file.path()).unwrap();
        assert_eq!(
            config.endpoints,
            vec!["https://pipelines.example.com", "http://localhost:8000"]
        );
        assert_eq!(config.timeout_secs, 3);
    }

    #[test]
    fn test_timeout_defaults() {
        let file = write_config("endpoints: [\"http://localhost:8000\"]\n");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_empty_endpoints_rejected() {
        let file = write_config("endpoints: []\n");
        assert!(matches!(load_config(file.path()), Err(AppError::ConfigError(_))));
    }

    #[test]
    fn test_bad_scheme_rejected() {
        let config = SubmissionConfig {
            endpoints: vec!["localhost:8000".to_string()],
            timeout_secs: 1,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_config("/definitely/not/here.yaml"),
            Err(AppError::ConfigError(_))
        ));
    }

    #[test]
    fn test_endpoint_override() {
        let config = SubmissionConfig::default()
            .with_endpoint_override(" http://a:1 , ,http://b:2");
        assert_eq!(config.endpoints, vec!["http://a:1", "http://b:2"]);

        let untouched = SubmissionConfig::default().with_endpoint_override(" , ");
        assert_eq!(untouched.endpoints, vec![DEFAULT_ENDPOINT]);
    }
}

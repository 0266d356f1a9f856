//! Runtime configuration for the buildpack.
//!
//! Settings come from environment variables, with defaults suitable for a
//! standard CNB builder image.
//!
//! # Environment Variables
//!
//! - `BP_LOG_LEVEL`: log level (trace|debug|info|warn|error) - default: "info"
//! - `POETRY_BUILDPACK_LOG_JSON`: JSON log output (true|false) - default: "false"
//! - `POETRY_BUILDPACK_PIP`: pip executable - default: "pip"
//! - `POETRY_BUILDPACK_PYTHON`: python executable - default: "python"
//! - `POETRY_BUILDPACK_DOWNLOAD_TIMEOUT`: download timeout in seconds - default: "300"
//! - `CNB_BUILDPACK_DIR`: buildpack root, set by the lifecycle
//! - `CNB_STACK_ID`: stack the build runs on, set by the lifecycle

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_LOG_JSON: bool = false;
const DEFAULT_PIP: &str = "pip";
const DEFAULT_PYTHON: &str = "python";
const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("CNB_STACK_ID is not set; the lifecycle must provide the build stack")]
    MissingStack,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildpackConfig {
    pub log_level: String,
    pub log_json: bool,
    pub pip: String,
    pub python: String,
    pub download_timeout_secs: u64,
    pub buildpack_dir: Option<PathBuf>,
    pub stack_id: Option<String>,
}

impl Default for BuildpackConfig {
    fn default() -> Self {
        let log_level = env::var("BP_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        let log_json = env::var("POETRY_BUILDPACK_LOG_JSON")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(DEFAULT_LOG_JSON);

        let pip = env::var("POETRY_BUILDPACK_PIP")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_PIP.to_string());

        let python = env::var("POETRY_BUILDPACK_PYTHON")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_PYTHON.to_string());

        let download_timeout_secs = env::var("POETRY_BUILDPACK_DOWNLOAD_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_DOWNLOAD_TIMEOUT_SECS);

        let buildpack_dir = env::var_os("CNB_BUILDPACK_DIR")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let stack_id = env::var("CNB_STACK_ID").ok().filter(|v| !v.is_empty());

        Self {
            log_level,
            log_json,
            pip,
            python,
            download_timeout_secs,
            buildpack_dir,
            stack_id,
        }
    }
}

impl BuildpackConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.download_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "Download timeout must be at least 1 second".to_string(),
            ));
        }
        if self.download_timeout_secs > 3600 {
            return Err(ConfigError::ValidationFailed(
                "Download timeout cannot exceed 1 hour".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    /// The stack id, required by the build phase.
    pub fn stack(&self) -> Result<&str, ConfigError> {
        self.stack_id.as_deref().ok_or(ConfigError::MissingStack)
    }

    pub fn to_display_map(&self) -> std::collections::HashMap<String, String> {
        let mut map = std::collections::HashMap::new();

        map.insert("log_level".to_string(), self.log_level.clone());
        map.insert("log_json".to_string(), self.log_json.to_string());
        map.insert("pip".to_string(), self.pip.clone());
        map.insert("python".to_string(), self.python.clone());
        map.insert(
            "download_timeout_secs".to_string(),
            self.download_timeout_secs.to_string(),
        );
        if let Some(ref dir) = self.buildpack_dir {
            map.insert("buildpack_dir".to_string(), dir.display().to_string());
        }
        if let Some(ref stack) = self.stack_id {
            map.insert("stack_id".to_string(), stack.clone());
        }

        map
    }
}

impl fmt::Display for BuildpackConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Poetry Buildpack Configuration:")?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        writeln!(f, "  JSON Logs: {}", self.log_json)?;
        writeln!(f, "  Pip: {}", self.pip)?;
        writeln!(f, "  Python: {}", self.python)?;
        writeln!(f, "  Download Timeout: {}s", self.download_timeout_secs)?;
        if let Some(ref dir) = self.buildpack_dir {
            writeln!(f, "  Buildpack Dir: {}", dir.display())?;
        }
        if let Some(ref stack) = self.stack_id {
            writeln!(f, "  Stack: {}", stack)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    struct EnvGuard {
        key: String,
        old_value: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let old_value = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                old_value,
            }
        }

        fn remove(key: &str) -> Self {
            let old_value = env::var(key).ok();
            env::remove_var(key);
            Self {
                key: key.to_string(),
                old_value,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.old_value {
                Some(v) => env::set_var(&self.key, v),
                None => env::remove_var(&self.key),
            }
        }
    }

    fn valid() -> BuildpackConfig {
        BuildpackConfig {
            log_level: "info".to_string(),
            log_json: false,
            pip: "pip".to_string(),
            python: "python".to_string(),
            download_timeout_secs: 300,
            buildpack_dir: None,
            stack_id: Some("io.buildpacks.stacks.bionic".to_string()),
        }
    }

    #[test]
    #[serial]
    fn test_default_configuration() {
        let _guards = [
            EnvGuard::remove("BP_LOG_LEVEL"),
            EnvGuard::remove("POETRY_BUILDPACK_LOG_JSON"),
            EnvGuard::remove("POETRY_BUILDPACK_PIP"),
            EnvGuard::remove("POETRY_BUILDPACK_PYTHON"),
            EnvGuard::remove("POETRY_BUILDPACK_DOWNLOAD_TIMEOUT"),
            EnvGuard::remove("CNB_BUILDPACK_DIR"),
            EnvGuard::remove("CNB_STACK_ID"),
        ];

        let config = BuildpackConfig::default();

        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.log_json, DEFAULT_LOG_JSON);
        assert_eq!(config.pip, DEFAULT_PIP);
        assert_eq!(config.python, DEFAULT_PYTHON);
        assert_eq!(config.download_timeout_secs, DEFAULT_DOWNLOAD_TIMEOUT_SECS);
        assert_eq!(config.buildpack_dir, None);
        assert_eq!(config.stack_id, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_environment_variable_parsing() {
        let _guards = [
            EnvGuard::set("BP_LOG_LEVEL", "DEBUG"),
            EnvGuard::set("POETRY_BUILDPACK_LOG_JSON", "true"),
            EnvGuard::set("POETRY_BUILDPACK_PIP", "pip3"),
            EnvGuard::set("POETRY_BUILDPACK_PYTHON", "python3"),
            EnvGuard::set("POETRY_BUILDPACK_DOWNLOAD_TIMEOUT", "60"),
            EnvGuard::set("CNB_BUILDPACK_DIR", "/cnb/buildpacks/poetry"),
            EnvGuard::set("CNB_STACK_ID", "io.paketo.stacks.tiny"),
        ];

        let config = BuildpackConfig::default();

        assert_eq!(config.log_level, "debug");
        assert!(config.log_json);
        assert_eq!(config.pip, "pip3");
        assert_eq!(config.python, "python3");
        assert_eq!(config.download_timeout(), Duration::from_secs(60));
        assert_eq!(
            config.buildpack_dir,
            Some(PathBuf::from("/cnb/buildpacks/poetry"))
        );
        assert_eq!(config.stack().unwrap(), "io.paketo.stacks.tiny");
    }

    #[test]
    #[serial]
    fn test_unparseable_values_fall_back_to_defaults() {
        let _guards = [
            EnvGuard::set("POETRY_BUILDPACK_LOG_JSON", "yes please"),
            EnvGuard::set("POETRY_BUILDPACK_DOWNLOAD_TIMEOUT", "soon"),
            EnvGuard::set("POETRY_BUILDPACK_PIP", ""),
        ];

        let config = BuildpackConfig::default();

        assert!(!config.log_json);
        assert_eq!(config.download_timeout_secs, DEFAULT_DOWNLOAD_TIMEOUT_SECS);
        assert_eq!(config.pip, DEFAULT_PIP);
    }

    #[test]
    fn test_validation_valid() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_validation_timeout_bounds() {
        let zero = BuildpackConfig {
            download_timeout_secs: 0,
            ..valid()
        };
        assert!(zero.validate().is_err());

        let too_long = BuildpackConfig {
            download_timeout_secs: 3601,
            ..valid()
        };
        let err = too_long.validate().unwrap_err();
        assert!(err.to_string().contains("1 hour"));
    }

    #[test]
    fn test_validation_invalid_log_level() {
        let config = BuildpackConfig {
            log_level: "verbose".to_string(),
            ..valid()
        };

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("verbose"));
    }

    #[test]
    fn test_missing_stack() {
        let config = BuildpackConfig {
            stack_id: None,
            ..valid()
        };

        assert!(matches!(config.stack(), Err(ConfigError::MissingStack)));
    }

    #[test]
    fn test_display_and_map() {
        let config = valid();

        let display = config.to_string();
        assert!(display.contains("Poetry Buildpack Configuration:"));
        assert!(display.contains("Stack: io.buildpacks.stacks.bionic"));

        let map = config.to_display_map();
        assert_eq!(map.get("pip").map(String::as_str), Some("pip"));
        assert_eq!(map.get("download_timeout_secs").map(String::as_str), Some("300"));
        assert!(!map.contains_key("buildpack_dir"));
    }
}

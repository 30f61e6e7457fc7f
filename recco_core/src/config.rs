//! Workflow configuration.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration. Files are YAML or TOML, chosen by extension.

use crate::error::ConfigError;
use crate::fanout::DEFAULT_BRANCH_TIMEOUT_MS;
use crate::intent::DEFAULT_INTENT_TIMEOUT_MS;
use crate::prompts::INTENT_PROMPT_NAME;
use crate::types::DEFAULT_MAX_K;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default overall workflow budget in milliseconds
pub const DEFAULT_GLOBAL_TIMEOUT_MS: u64 = 60000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Per-vertical search timeout in milliseconds (default: 5000)
    pub branch_timeout_ms: u64,

    /// Budget for the whole intent → search → compose sequence (default: 60000)
    pub global_timeout_ms: u64,

    /// Deadline for the single model call (default: 30000)
    pub intent_timeout_ms: u64,

    /// Largest accepted `k` (default: 10)
    pub max_k: usize,

    /// Name of the system prompt handed to the prompt loader
    pub intent_prompt: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            branch_timeout_ms: DEFAULT_BRANCH_TIMEOUT_MS,
            global_timeout_ms: DEFAULT_GLOBAL_TIMEOUT_MS,
            intent_timeout_ms: DEFAULT_INTENT_TIMEOUT_MS,
            max_k: DEFAULT_MAX_K,
            intent_prompt: INTENT_PROMPT_NAME.to_string(),
        }
    }
}

impl WorkflowConfig {
    /// Default location: `<config_dir>/recco/workflow.yaml`.
    pub fn default_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|p| p.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("recco").join("workflow.yaml")
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        // An empty YAML document deserializes to unit, not a map.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.yaml`/`.yml` or `.toml` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            Some("toml") => Self::from_toml_str(&content),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    /// Load the file at [`Self::default_path`], or defaults when it does not exist.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.branch_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "branch_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.global_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "global_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.intent_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "intent_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.branch_timeout_ms > self.global_timeout_ms {
            return Err(ConfigError::Invalid(
                "branch_timeout_ms must not exceed global_timeout_ms".into(),
            ));
        }
        if self.max_k == 0 {
            return Err(ConfigError::Invalid("max_k must be greater than 0".into()));
        }
        if self.intent_prompt.trim().is_empty() {
            return Err(ConfigError::Invalid("intent_prompt must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkflowConfig::default();
        assert_eq!(config.branch_timeout_ms, 5000);
        assert_eq!(config.global_timeout_ms, 60000);
        assert_eq!(config.intent_timeout_ms, 30000);
        assert_eq!(config.max_k, 10);
        assert_eq!(config.intent_prompt, "intent_extraction");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_partial_override() {
        let config = WorkflowConfig::from_yaml_str("branch_timeout_ms: 2500\nmax_k: 5\n").unwrap();
        assert_eq!(config.branch_timeout_ms, 2500);
        assert_eq!(config.max_k, 5);
        assert_eq!(config.global_timeout_ms, DEFAULT_GLOBAL_TIMEOUT_MS);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(
            WorkflowConfig::from_yaml_str("").unwrap(),
            WorkflowConfig::default()
        );
    }

    #[test]
    fn test_toml_override() {
        let config =
            WorkflowConfig::from_toml_str("global_timeout_ms = 20000\nintent_prompt = \"brief\"\n")
                .unwrap();
        assert_eq!(config.global_timeout_ms, 20000);
        assert_eq!(config.intent_prompt, "brief");
    }

    #[test]
    fn test_validation_errors() {
        let zero_branch = WorkflowConfig {
            branch_timeout_ms: 0,
            ..Default::default()
        };
        assert!(zero_branch
            .validate()
            .unwrap_err()
            .to_string()
            .contains("branch_timeout_ms"));

        let inverted = WorkflowConfig {
            branch_timeout_ms: 10_000,
            global_timeout_ms: 5000,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());

        let zero_k = WorkflowConfig {
            max_k: 0,
            ..Default::default()
        };
        assert!(zero_k.validate().is_err());

        let blank_prompt = WorkflowConfig {
            intent_prompt: " ".into(),
            ..Default::default()
        };
        assert!(blank_prompt.validate().is_err());
    }

    #[test]
    fn test_invalid_file_content_rejected() {
        assert!(WorkflowConfig::from_yaml_str("global_timeout_ms: 0").is_err());
        assert!(matches!(
            WorkflowConfig::from_toml_str("max_k = \"ten\""),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn test_load_by_extension() {
        let dir = std::env::temp_dir().join(format!("recco-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let yaml = dir.join("workflow.yml");
        std::fs::write(&yaml, "max_k: 3\n").unwrap();
        assert_eq!(WorkflowConfig::load(&yaml).unwrap().max_k, 3);

        let toml_path = dir.join("workflow.toml");
        std::fs::write(&toml_path, "max_k = 4\n").unwrap();
        assert_eq!(WorkflowConfig::load(&toml_path).unwrap().max_k, 4);

        let json = dir.join("workflow.json");
        std::fs::write(&json, "{}").unwrap();
        assert!(matches!(
            WorkflowConfig::load(&json),
            Err(ConfigError::UnsupportedFormat(ext)) if ext == "json"
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_default_path() {
        let path = WorkflowConfig::default_path();
        assert!(path.ends_with("recco/workflow.yaml"));
    }
}

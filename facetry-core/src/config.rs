//! Configuration parsing and management.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

/// Main configuration struct matching the facetry.yml schema
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetamodelConfig {
    #[serde(default)]
    pub introspection: IntrospectionConfig,

    #[serde(default)]
    pub programming_model: ProgrammingModelConfig,

    #[serde(default)]
    pub validation: ValidationConfig,
}

/// When specifications are introspected
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntrospectionMode {
    /// On the first lookup of each type
    #[default]
    Lazy,
    /// Every known type during bootstrap
    Eager,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntrospectionConfig {
    #[serde(default)]
    pub mode: IntrospectionMode,

    /// Abort loading on the first factory error instead of recording it
    #[serde(default)]
    pub fail_fast: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgrammingModelConfig {
    #[serde(default = "default_true")]
    pub ignore_deprecated: bool,

    #[serde(default)]
    pub include_incubating: bool,

    /// Factory ids to leave out of the model
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ProgrammingModelConfig {
    fn default() -> Self {
        Self {
            ignore_deprecated: true,
            include_incubating: false,
            exclude: Vec::new(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl MetamodelConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        // an empty document is a valid, all-default configuration
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn is_eager(&self) -> bool {
        self.introspection.mode == IntrospectionMode::Eager
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_values() {
        let config = MetamodelConfig::default();
        assert_eq!(config.introspection.mode, IntrospectionMode::Lazy);
        assert!(!config.introspection.fail_fast);
        assert!(config.programming_model.ignore_deprecated);
        assert!(!config.programming_model.include_incubating);
        assert!(config.validation.enabled);
    }

    #[test]
    fn test_partial_yaml() {
        let config = MetamodelConfig::from_yaml_str(
            r#"
introspection:
  mode: eager
programming_model:
  exclude: [action-semantics-naming]
"#,
        )
        .unwrap();

        assert!(config.is_eager());
        assert!(!config.introspection.fail_fast);
        assert!(config.programming_model.ignore_deprecated);
        assert_eq!(config.programming_model.exclude, vec!["action-semantics-naming"]);
        assert!(config.validation.enabled);
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(MetamodelConfig::from_yaml_str("  \n").unwrap(), MetamodelConfig::default());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "introspection:\n  fail_fast: true").unwrap();

        let config = MetamodelConfig::from_file(file.path()).unwrap();
        assert!(config.introspection.fail_fast);
    }

    #[test]
    fn test_invalid_yaml() {
        let err = MetamodelConfig::from_yaml_str("introspection: [").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}

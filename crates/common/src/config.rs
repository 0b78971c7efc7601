//! Session configuration with layered resolution.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default name of the project configuration file.
pub const CONFIG_FILE: &str = "pdflow.toml";

/// Errors from configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    FileNotFound { path: String },
    #[error("Failed to parse {path}: {message}")]
    ParseError { path: String, message: String },
    #[error("Invalid value for {field}: {message}")]
    ValidationFailed { field: String, message: String },
}

/// Settings for one analysis session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Directory that receives one `<report name>.json` per reporting unit.
    pub output_dir: PathBuf,
    /// Number of leading package segments compared when classifying a
    /// missing method as pending (same prefix) or out of scope.
    pub namespace_depth: usize,
    /// Units whose name ends with one of these suffixes are ignored.
    pub skip_unit_suffixes: Vec<String>,
    /// At session end, write best-effort reports for entries still pending.
    pub emit_partial_on_finish: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("pdtree"),
            namespace_depth: 4,
            skip_unit_suffixes: vec!["Test".to_string()],
            emit_partial_on_finish: false,
        }
    }
}

/// CLI override arguments applied on top of every other layer.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub output_dir: Option<PathBuf>,
    pub namespace_depth: Option<usize>,
    pub emit_partial_on_finish: Option<bool>,
}

/// On-disk shape: every key optional so a file only overrides what it names.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    output_dir: Option<PathBuf>,
    namespace_depth: Option<usize>,
    skip_unit_suffixes: Option<Vec<String>>,
    emit_partial_on_finish: Option<bool>,
}

impl AnalysisConfig {
    /// Load configuration with layered resolution.
    ///
    /// Resolution order (highest priority first):
    /// 1. CLI flags
    /// 2. Environment variables (`PDFLOW_OUTPUT_DIR`, `PDFLOW_NAMESPACE_DEPTH`)
    /// 3. Config file: `explicit` if given (must exist), else `pdflow.toml` in `root` if present
    /// 4. Compiled defaults
    pub fn load(
        root: &Path,
        explicit: Option<&Path>,
        cli: Option<&CliOverrides>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        match explicit {
            Some(path) => config.merge_toml_file(path)?,
            None => {
                let project = root.join(CONFIG_FILE);
                if project.exists() {
                    config.merge_toml_file(&project)?;
                }
            }
        }

        config.apply_env_overrides(|key| std::env::var(key).ok());

        if let Some(cli) = cli {
            config.apply_cli_overrides(cli);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string over compiled defaults.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.merge_toml_str(toml_str, "<string>")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.namespace_depth == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "namespace_depth".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed {
                field: "output_dir".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Returns `true` if the unit should not be analysed at all (test sources).
    pub fn skips_unit(&self, unit_name: &str) -> bool {
        self.skip_unit_suffixes
            .iter()
            .any(|suffix| !suffix.is_empty() && unit_name.ends_with(suffix.as_str()))
    }

    fn merge_toml_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        self.merge_toml_str(&content, &path.display().to_string())
    }

    fn merge_toml_str(&mut self, content: &str, origin: &str) -> Result<(), ConfigError> {
        let file: ConfigFile = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: origin.to_string(),
            message: e.to_string(),
        })?;

        if let Some(dir) = file.output_dir {
            self.output_dir = dir;
        }
        if let Some(depth) = file.namespace_depth {
            self.namespace_depth = depth;
        }
        if let Some(suffixes) = file.skip_unit_suffixes {
            self.skip_unit_suffixes = suffixes;
        }
        if let Some(emit) = file.emit_partial_on_finish {
            self.emit_partial_on_finish = emit;
        }
        Ok(())
    }

    /// Applies `PDFLOW_*` variables through `lookup`. Unparsable values are
    /// ignored with a warning.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("PDFLOW_OUTPUT_DIR").filter(|d| !d.is_empty()) {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup("PDFLOW_NAMESPACE_DEPTH") {
            match raw.trim().parse::<usize>() {
                Ok(depth) => self.namespace_depth = depth,
                Err(e) => {
                    tracing::warn!(value = %raw, error = %e, "ignoring PDFLOW_NAMESPACE_DEPTH")
                }
            }
        }
    }

    pub fn apply_cli_overrides(&mut self, cli: &CliOverrides) {
        if let Some(dir) = &cli.output_dir {
            self.output_dir = dir.clone();
        }
        if let Some(depth) = cli.namespace_depth {
            self.namespace_depth = depth;
        }
        if let Some(emit) = cli.emit_partial_on_finish {
            self.emit_partial_on_finish = emit;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.output_dir, PathBuf::from("pdtree"));
        assert_eq!(config.namespace_depth, 4);
        assert!(!config.emit_partial_on_finish);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = AnalysisConfig::from_toml("namespace_depth = 3\n").unwrap();
        assert_eq!(config.namespace_depth, 3);
        assert_eq!(config.output_dir, PathBuf::from("pdtree"));
    }

    #[test]
    fn test_invalid_toml() {
        let err = AnalysisConfig::from_toml("namespace_depth = \"four\"").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_zero_depth_rejected() {
        let err = AnalysisConfig::from_toml("namespace_depth = 0").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationFailed { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("PDFLOW_OUTPUT_DIR", "/tmp/reports"),
            ("PDFLOW_NAMESPACE_DEPTH", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = AnalysisConfig::default();
        config.apply_env_overrides(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/reports"));
        assert_eq!(config.namespace_depth, 4);
    }

    #[test]
    fn test_project_file_then_cli() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join(CONFIG_FILE),
            "output_dir = \"out\"\nemit_partial_on_finish = true\n",
        )
        .unwrap();

        let cli = CliOverrides {
            namespace_depth: Some(2),
            ..Default::default()
        };
        let config = AnalysisConfig::load(tmp.path(), None, Some(&cli)).unwrap();
        assert_eq!(config.namespace_depth, 2);
        assert!(config.emit_partial_on_finish);
    }

    #[test]
    fn test_explicit_file_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope.toml");
        let err = AnalysisConfig::load(tmp.path(), Some(&missing), None).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn test_skips_test_units() {
        let config = AnalysisConfig::default();
        assert!(config.skips_unit("com.acme.web.UserControllerTest"));
        assert!(!config.skips_unit("com.acme.web.UserController"));
    }
}

//! Configuration management for dxq
//!
//! This module provides configuration management for dxq, handling configuration
//! from multiple sources including command-line arguments, environment variables,
//! and configuration files. Later sources override earlier ones:
//!
//! 1. built-in defaults
//! 2. the first config file found in the standard locations
//! 3. `DXQ_*` environment variables
//! 4. an explicit `--config FILE`
//! 5. command-line flags

use crate::cli::CliConfig;
use dxq_filter::{ConvertOptions, FilterOptions, MissingAttribute};
use dxq_shared::constants::DEFAULT_MAX_DEPTH;
use dxq_shared::error::config_error;
use dxq_shared::Result;

use serde::{Deserialize, Serialize};

use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_NAMES: [&str; 4] = ["dxq.toml", ".dxq.toml", "dxq.yaml", ".dxq.yaml"];

/// Main configuration structure for dxq
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Placeholder resolution and folding
    pub conversion: ConversionConfig,
    /// Parser limits
    pub parser: ParserConfig,
    /// Output rendering
    pub output: OutputConfig,
    /// Debug and diagnostic configuration
    pub debug: DebugConfig,
}

/// Conversion configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Decide constant comparisons and fold them away
    pub short_circuit: bool,
    /// Expand `IN` lists into `=` conditions
    pub expand_in: bool,
    /// What a missing attribute resolves to
    pub missing_attribute: MissingAttribute,
}

/// Parser configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Maximum expression nesting depth
    pub max_depth: usize,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print JSON output
    pub pretty: bool,
}

/// Debug configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Verbosity level
    pub verbosity: u8,
}

/// One config file's settings; only the keys the file spells are `Some`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PartialConfig {
    conversion: PartialConversion,
    parser: PartialParser,
    output: PartialOutput,
    debug: PartialDebug,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PartialConversion {
    short_circuit: Option<bool>,
    expand_in: Option<bool>,
    missing_attribute: Option<MissingAttribute>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PartialParser {
    max_depth: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PartialOutput {
    pretty: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PartialDebug {
    verbosity: Option<u8>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            short_circuit: true,
            expand_in: true,
            missing_attribute: MissingAttribute::FirstProperty,
        }
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl Config {
    /// Create a new configuration with defaults
    #[allow(dead_code)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut config = Self::default();
        config.merge_file(path)?;
        Ok(config)
    }

    /// Load configuration from the standard locations and the environment
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(config_path) = Self::find_config_file(None) {
            log::debug!("using config file {}", config_path.display());
            config.merge_file(&config_path)?;
        }

        config.merge_env()?;

        Ok(config)
    }

    /// Find configuration file in standard locations
    pub(crate) fn find_config_file(current_dir: Option<&Path>) -> Option<PathBuf> {
        let current_dir = match current_dir {
            Some(dir) => dir.to_path_buf(),
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        };

        let mut search_dirs = vec![current_dir];
        if let Some(config_dir) = dirs::config_dir() {
            search_dirs.push(config_dir.join("dxq"));
        }
        if let Some(home) = dirs::home_dir() {
            search_dirs.push(home);
        }
        search_dirs.push(PathBuf::from("/etc/dxq"));

        search_dirs
            .iter()
            .flat_map(|dir| CONFIG_NAMES.iter().map(move |name| dir.join(name)))
            .find(|path| path.is_file())
            .map(|path| path.canonicalize().unwrap_or(path))
    }

    /// Merge configuration from file
    pub fn merge_file(&mut self, path: &Path) -> Result<()> {
        let content = fs::read_to_string(path).map_err(|e| {
            config_error(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        let file_config: PartialConfig = match extension {
            "toml" => toml::from_str(&content)
                .map_err(|e| config_error(format!("Invalid TOML config: {}", e)))?,
            "yaml" | "yml" => serde_yaml::from_str(&content)
                .map_err(|e| config_error(format!("Invalid YAML config: {}", e)))?,
            _ => return Err(config_error("Unsupported config file format")),
        };
        self.merge(file_config);

        Ok(())
    }

    /// Merge configuration from environment variables
    fn merge_env(&mut self) -> Result<()> {
        self.merge_env_with_reader(|key| std::env::var(key).ok())
    }

    /// Merge configuration from environment variables with custom reader
    fn merge_env_with_reader<F>(&mut self, env_reader: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        // DXQ_SHORT_CIRCUIT
        if let Some(val) = env_reader("DXQ_SHORT_CIRCUIT") {
            self.conversion.short_circuit = parse_flag(&val);
        }

        // DXQ_EXPAND_IN
        if let Some(val) = env_reader("DXQ_EXPAND_IN") {
            self.conversion.expand_in = parse_flag(&val);
        }

        // DXQ_MISSING_ATTRIBUTE
        if let Some(val) = env_reader("DXQ_MISSING_ATTRIBUTE") {
            self.conversion.missing_attribute = val
                .parse()
                .map_err(|e| config_error(format!("DXQ_MISSING_ATTRIBUTE: {}", e)))?;
        }

        // DXQ_MAX_DEPTH
        if let Some(val) = env_reader("DXQ_MAX_DEPTH") {
            if let Ok(depth) = val.parse() {
                self.parser.max_depth = depth;
            } else {
                self.parser.max_depth = ParserConfig::default().max_depth;
            }
        }

        // DXQ_VERBOSITY
        if let Some(val) = env_reader("DXQ_VERBOSITY") {
            if let Ok(level) = val.parse() {
                self.debug.verbosity = level;
            }
        }

        Ok(())
    }

    /// Overlay the settings a file spells out, including ones equal to the
    /// defaults
    fn merge(&mut self, other: PartialConfig) {
        let PartialConfig {
            conversion,
            parser,
            output,
            debug,
        } = other;

        if let Some(short_circuit) = conversion.short_circuit {
            self.conversion.short_circuit = short_circuit;
        }
        if let Some(expand_in) = conversion.expand_in {
            self.conversion.expand_in = expand_in;
        }
        if let Some(policy) = conversion.missing_attribute {
            self.conversion.missing_attribute = policy;
        }

        if let Some(max_depth) = parser.max_depth {
            self.parser.max_depth = max_depth;
        }

        if let Some(pretty) = output.pretty {
            self.output.pretty = pretty;
        }

        if let Some(verbosity) = debug.verbosity {
            self.debug.verbosity = verbosity;
        }
    }

    /// Apply CLI configuration overrides
    pub fn apply_cli(&mut self, cli_config: &CliConfig) -> Result<()> {
        // Conversion settings
        if let Some(short_circuit) = cli_config.short_circuit {
            self.conversion.short_circuit = short_circuit;
        }
        if let Some(expand_in) = cli_config.expand_in {
            self.conversion.expand_in = expand_in;
        }
        if let Some(policy) = cli_config.missing_attribute {
            self.conversion.missing_attribute = policy;
        }

        // Parser settings
        if let Some(max_depth) = cli_config.max_depth {
            if max_depth == 0 {
                return Err(config_error("--max-depth must be greater than 0"));
            }
            self.parser.max_depth = max_depth;
        }

        // Output settings
        if cli_config.compact {
            self.output.pretty = false;
        }

        // Debug settings
        if cli_config.verbose > 0 {
            self.debug.verbosity = cli_config.verbose;
        }

        Ok(())
    }

    /// Settings for the filter pipeline
    pub fn to_filter_options(&self) -> FilterOptions {
        FilterOptions {
            max_depth: Some(self.parser.max_depth),
            convert: ConvertOptions {
                short_circuit: self.conversion.short_circuit,
                expand_in: self.conversion.expand_in,
                missing_attribute: self.conversion.missing_attribute,
            },
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("toml");

        let content = match extension {
            "toml" => toml::to_string_pretty(self)
                .map_err(|e| config_error(format!("Failed to serialize config: {}", e)))?,
            "yaml" | "yml" => serde_yaml::to_string(self)
                .map_err(|e| config_error(format!("Failed to serialize config: {}", e)))?,
            _ => return Err(config_error("Unsupported config file format")),
        };

        fs::write(path, content)
            .map_err(|e| config_error(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}

fn parse_flag(val: &str) -> bool {
    val != "0" && !val.eq_ignore_ascii_case("false")
}

/// Create a default config file template
pub fn create_default_config_file(path: &Path) -> Result<()> {
    let config = Config::default();
    config.save(path)?;
    Ok(())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.parser.max_depth == 0 {
        return Err(config_error("Max depth must be greater than 0"));
    }

    if config.debug.verbosity > 3 {
        log::warn!(
            "verbosity {} is above the highest level (3)",
            config.debug.verbosity
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.conversion.short_circuit);
        assert!(config.conversion.expand_in);
        assert_eq!(
            config.conversion.missing_attribute,
            MissingAttribute::FirstProperty
        );
        assert_eq!(config.parser.max_depth, DEFAULT_MAX_DEPTH);
        assert!(config.output.pretty);
        assert_eq!(config.debug.verbosity, 0);
    }

    #[test]
    fn test_load_toml_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("dxq.toml");
        fs::write(
            &path,
            r#"
[conversion]
short_circuit = false
missing_attribute = "unresolved"

[parser]
max_depth = 64
"#,
        )
        .unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert!(!config.conversion.short_circuit);
        assert!(config.conversion.expand_in);
        assert_eq!(
            config.conversion.missing_attribute,
            MissingAttribute::Unresolved
        );
        assert_eq!(config.parser.max_depth, 64);
        assert!(config.output.pretty);
    }

    #[test]
    fn test_load_yaml_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("dxq.yaml");
        fs::write(&path, "conversion:\n  expand_in: false\noutput:\n  pretty: false\n").unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert!(!config.conversion.expand_in);
        assert!(!config.output.pretty);
        assert!(config.conversion.short_circuit);
    }

    #[test]
    fn test_invalid_files() {
        let temp_dir = TempDir::new().unwrap();

        let bad_toml = temp_dir.path().join("bad.toml");
        fs::write(&bad_toml, "[parser\nmax_depth = ").unwrap();
        let err = Config::load_from_file(&bad_toml).unwrap_err();
        assert!(err.to_string().contains("Invalid TOML config"));

        let unknown = temp_dir.path().join("dxq.ini");
        fs::write(&unknown, "").unwrap();
        assert!(Config::load_from_file(&unknown).is_err());

        let missing = temp_dir.path().join("missing.toml");
        assert!(Config::load_from_file(&missing).is_err());
    }

    #[test]
    fn test_find_config_file_in_current_dir() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(".dxq.toml");
        fs::write(&path, "").unwrap();

        let found = Config::find_config_file(Some(temp_dir.path())).unwrap();
        assert_eq!(found, path.canonicalize().unwrap());
    }

    #[test]
    fn test_find_config_file_prefers_toml_over_yaml() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("dxq.yaml"), "").unwrap();
        fs::write(temp_dir.path().join("dxq.toml"), "").unwrap();

        let found = Config::find_config_file(Some(temp_dir.path())).unwrap();
        assert_eq!(found.file_name().unwrap(), "dxq.toml");
    }

    #[test]
    fn test_merge_env() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("DXQ_SHORT_CIRCUIT", "false"),
            ("DXQ_EXPAND_IN", "0"),
            ("DXQ_MAX_DEPTH", "12"),
            ("DXQ_MISSING_ATTRIBUTE", "unresolved"),
            ("DXQ_VERBOSITY", "2"),
        ]);
        let env_reader = |key: &str| env.get(key).map(|v| (*v).to_string());

        let mut config = Config::default();
        config.merge_env_with_reader(env_reader).unwrap();
        assert!(!config.conversion.short_circuit);
        assert!(!config.conversion.expand_in);
        assert_eq!(config.parser.max_depth, 12);
        assert_eq!(
            config.conversion.missing_attribute,
            MissingAttribute::Unresolved
        );
        assert_eq!(config.debug.verbosity, 2);
    }

    #[test]
    fn test_later_file_restores_default_values() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("override.toml");
        fs::write(
            &path,
            r#"
[conversion]
short_circuit = true
expand_in = true
missing_attribute = "first-property"

[parser]
max_depth = 256

[output]
pretty = true
"#,
        )
        .unwrap();

        let env: HashMap<&str, &str> = HashMap::from([
            ("DXQ_SHORT_CIRCUIT", "0"),
            ("DXQ_EXPAND_IN", "false"),
            ("DXQ_MISSING_ATTRIBUTE", "unresolved"),
            ("DXQ_MAX_DEPTH", "8"),
        ]);
        let mut config = Config::default();
        config
            .merge_env_with_reader(|key: &str| env.get(key).map(|v| (*v).to_string()))
            .unwrap();
        config.output.pretty = false;
        config.merge_file(&path).unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_file_leaves_unspelled_keys_alone() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("partial.yaml");
        fs::write(&path, "parser:\n  max_depth: 32\n").unwrap();

        let mut config = Config::default();
        config.conversion.short_circuit = false;
        config.output.pretty = false;
        config.merge_file(&path).unwrap();

        assert!(!config.conversion.short_circuit);
        assert!(!config.output.pretty);
        assert_eq!(config.parser.max_depth, 32);
    }

    #[test]
    fn test_merge_env_invalid_values() {
        let env: HashMap<&str, &str> = HashMap::from([("DXQ_MAX_DEPTH", "deep")]);
        let mut config = Config::default();
        config
            .merge_env_with_reader(|key: &str| env.get(key).map(|v| (*v).to_string()))
            .unwrap();
        assert_eq!(config.parser.max_depth, DEFAULT_MAX_DEPTH);

        let env: HashMap<&str, &str> = HashMap::from([("DXQ_MISSING_ATTRIBUTE", "never")]);
        let mut config = Config::default();
        assert!(config
            .merge_env_with_reader(|key: &str| env.get(key).map(|v| (*v).to_string()))
            .is_err());
    }

    #[test]
    fn test_apply_cli() {
        let mut config = Config::default();
        let cli_config = CliConfig {
            short_circuit: Some(false),
            expand_in: None,
            missing_attribute: Some(MissingAttribute::Unresolved),
            max_depth: Some(8),
            compact: true,
            verbose: 3,
            config_file: None,
        };
        config.apply_cli(&cli_config).unwrap();

        assert!(!config.conversion.short_circuit);
        assert!(config.conversion.expand_in);
        assert_eq!(config.parser.max_depth, 8);
        assert!(!config.output.pretty);
        assert_eq!(config.debug.verbosity, 3);

        let options = config.to_filter_options();
        assert_eq!(options.max_depth, Some(8));
        assert!(!options.convert.short_circuit);
        assert_eq!(
            options.convert.missing_attribute,
            MissingAttribute::Unresolved
        );
    }

    #[test]
    fn test_apply_cli_rejects_zero_depth() {
        let mut config = Config::default();
        let cli_config = CliConfig {
            max_depth: Some(0),
            ..CliConfig::default()
        };
        assert!(config.apply_cli(&cli_config).is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["saved.toml", "saved.yaml"] {
            let path = temp_dir.path().join(name);
            let mut config = Config::default();
            config.conversion.expand_in = false;
            config.parser.max_depth = 99;
            config.save(&path).unwrap();

            let reloaded = Config::load_from_file(&path).unwrap();
            assert_eq!(reloaded, config);
        }
    }

    #[test]
    fn test_create_default_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("dxq.toml");
        create_default_config_file(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("[conversion]"));
        assert!(content.contains("missing_attribute = \"first-property\""));
        assert_eq!(Config::load_from_file(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_validate_config() {
        assert!(validate_config(&Config::default()).is_ok());

        let mut config = Config::default();
        config.parser.max_depth = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("Max depth must be greater than 0"));
    }
}

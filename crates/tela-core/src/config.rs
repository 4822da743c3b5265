//! Configuration management for tela.
//!
//! Loads configuration from ${TELA_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Which API shape requests are built for.
///
/// `openai` talks to any OpenAI-compatible `/chat/completions` endpoint.
/// `azure` routes through Azure OpenAI deployment URLs and `api-key` auth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApiType {
    /// OpenAI-compatible endpoint (default)
    #[default]
    OpenAi,
    /// Azure OpenAI deployment endpoint
    Azure,
}

impl ApiType {
    /// Stable string identifier, matching the config file spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            ApiType::OpenAi => "openai",
            ApiType::Azure => "azure",
        }
    }

    /// Environment variable consulted when no api_key is configured.
    pub fn api_key_env_var(self) -> &'static str {
        match self {
            ApiType::OpenAi => "OPENAI_API_KEY",
            ApiType::Azure => "AZURE_OPENAI_API_KEY",
        }
    }
}

/// Returns the default config template with comments.
///
/// This is embedded from default_config.toml at compile time.
/// To update, run `cargo run -p xtask -- update-default-config`.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

/// Recursively merges items from source table into target table.
fn merge_items(target: &mut toml_edit::Table, source: &toml_edit::Table) {
    use toml_edit::Item;

    for (key, value) in source.iter() {
        match value {
            Item::Value(v) => {
                // Scalar value: override in target
                target[key] = Item::Value(v.clone());
            }
            Item::Table(src_table) => {
                // Nested table: recursively merge
                if let Some(Item::Table(target_table)) = target.get_mut(key) {
                    merge_items(target_table, src_table);
                } else {
                    // Target doesn't have this table, copy it
                    target[key] = Item::Table(src_table.clone());
                }
            }
            Item::ArrayOfTables(src_arr) => {
                // Array of tables: replace entirely with user's version
                target[key] = Item::ArrayOfTables(src_arr.clone());
            }
            Item::None => {}
        }
    }
}

pub mod paths {
    //! Path resolution for tela configuration and data directories.
    //!
    //! TELA_HOME resolution order:
    //! 1. TELA_HOME environment variable (if set)
    //! 2. ~/.tela (default)

    use std::path::PathBuf;

    /// Returns the tela home directory.
    ///
    /// Checks TELA_HOME env var first, falls back to ~/.tela
    pub fn tela_home() -> PathBuf {
        if let Ok(home) = std::env::var("TELA_HOME") {
            return PathBuf::from(home);
        }

        std::env::var_os("HOME")
            .map(|h| PathBuf::from(h).join(".tela"))
            .expect("Could not determine home directory")
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        tela_home().join("config.toml")
    }

    /// Returns the directory log files are written to.
    pub fn logs_dir() -> PathBuf {
        tela_home().join("logs")
    }
}

/// Azure OpenAI specific settings, only read when `api_type = "azure"`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AzureConfig {
    /// API version query parameter (e.g. "2024-06-01")
    pub api_version: Option<String>,
    /// Deployment name; falls back to the model name when unset
    pub deployment: Option<String>,
}

impl AzureConfig {
    /// Returns the api-version query value, falling back to the default.
    pub fn effective_api_version(&self) -> &str {
        self.api_version
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(Config::DEFAULT_AZURE_API_VERSION)
    }

    /// Returns the deployment name, falling back to the model name.
    pub fn effective_deployment<'a>(&'a self, model: &'a str) -> &'a str {
        self.deployment
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(model)
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API shape: "openai" or "azure"
    pub api_type: ApiType,

    /// The model to request
    pub model: String,

    /// Optional API base URL (proxies, Azure resource endpoint)
    pub base_url: Option<String>,

    /// Optional API key (overrides environment variable)
    pub api_key: Option<String>,

    /// Sampling temperature
    pub temperature: f64,

    /// Maximum tokens for responses (optional)
    pub max_tokens: Option<u32>,

    /// Azure OpenAI settings
    #[serde(default)]
    pub azure: AzureConfig,
}

impl Config {
    pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
    pub const DEFAULT_TEMPERATURE: f64 = 0.7;
    pub const DEFAULT_AZURE_API_VERSION: &str = "2024-06-01";

    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Returns the configured API key if set and non-empty.
    pub fn effective_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Returns the configured base URL if set and non-empty.
    pub fn effective_base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Generates a fresh config TOML from Rust defaults.
    ///
    /// This is used by `xtask update-default-config` to keep
    /// `default_config.toml` in sync with Rust default values.
    ///
    /// Uses the embedded template for structure/comments and merges
    /// generated values from `Config::default()` into it.
    pub fn generate() -> Result<String> {
        use toml_edit::DocumentMut;

        let config = Config::default();
        let generated_toml =
            toml::to_string(&config).context("Failed to serialize default config to TOML")?;

        // Parse template as base (preserves comments)
        let mut doc: DocumentMut = default_config_template()
            .parse()
            .context("Failed to parse default config template")?;

        // Parse generated values
        let generated_doc: DocumentMut = generated_toml
            .parse()
            .context("Failed to parse generated config")?;

        // Merge generated values into template (overwrites values, keeps comments)
        merge_items(doc.as_table_mut(), generated_doc.as_table());

        Ok(doc.to_string())
    }

    /// Writes config content to a file, creating parent directories as needed.
    /// Uses atomic write (temp file + rename) to prevent corruption.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_type: ApiType::default(),
            model: Self::DEFAULT_MODEL.to_string(),
            base_url: None,
            api_key: None,
            temperature: Self::DEFAULT_TEMPERATURE,
            max_tokens: None,
            azure: AzureConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    /// Config loading: missing file returns defaults.
    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nonexistent.toml");

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.api_type, ApiType::OpenAi);
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.max_tokens, None);
    }

    /// Config loading: partial config merges with defaults.
    #[test]
    fn test_load_partial_config_merges_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(&config_path, "model = \"gpt-4.1\"\n").unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.model, "gpt-4.1");
        assert_eq!(config.api_type, ApiType::OpenAi);
        assert!((config.temperature - 0.7).abs() < f64::EPSILON);
    }

    /// Config loading: unknown keys do not fail the parse.
    #[test]
    fn test_load_ignores_unknown_keys() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(&config_path, "model = \"gpt-4o\"\nfuture_knob = true\n").unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.model, "gpt-4o");
    }

    /// Config loading: azure section parses and applies fallbacks.
    #[test]
    fn test_load_azure_section() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(
            &config_path,
            r#"api_type = "azure"
model = "gpt-4o"

[azure]
deployment = "prod-gpt4o"
"#,
        )
        .unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.api_type, ApiType::Azure);
        assert_eq!(config.azure.effective_deployment(&config.model), "prod-gpt4o");
        assert_eq!(config.azure.effective_api_version(), "2024-06-01");
    }

    /// Azure deployment: falls back to the model name when unset.
    #[test]
    fn test_azure_deployment_falls_back_to_model() {
        let config = Config::default();
        assert_eq!(config.azure.effective_deployment("gpt-4o"), "gpt-4o");

        let azure = AzureConfig {
            deployment: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(azure.effective_deployment("gpt-4o"), "gpt-4o");
    }

    /// API key: empty/whitespace config values are treated as unset.
    #[test]
    fn test_effective_api_key_empty_is_none() {
        let config = Config {
            api_key: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.effective_api_key(), None);

        let config = Config {
            api_key: Some(" sk-test ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.effective_api_key(), Some("sk-test"));
    }

    /// Base URL: empty/whitespace treated as unset.
    #[test]
    fn test_effective_base_url_empty_is_none() {
        let config = Config {
            base_url: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.effective_base_url(), None);
    }

    /// Config init: creates file with defaults, creates parent dirs.
    #[test]
    fn test_init_creates_config_with_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("subdir").join("config.toml");

        Config::init(&config_path).unwrap();

        assert!(config_path.exists());
        let contents = fs::read_to_string(&config_path).unwrap();
        assert!(contents.contains("gpt-4o-mini"));
        assert!(contents.contains("# max_tokens ="));
    }

    /// Config init: fails if file exists (no silent overwrite).
    #[test]
    fn test_init_fails_if_exists() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(&config_path, "").unwrap();

        let result = Config::init(&config_path);
        assert!(result.is_err());
    }

    /// Config generate: output round-trips to the default values.
    #[test]
    fn test_generate_round_trips_defaults() {
        let generated = Config::generate().unwrap();

        // Template comments survive the merge
        assert!(generated.contains("# tela configuration"));

        let parsed: Config = toml::from_str(&generated).unwrap();
        assert_eq!(parsed.api_type, ApiType::OpenAi);
        assert_eq!(parsed.model, Config::DEFAULT_MODEL);
        assert!((parsed.temperature - Config::DEFAULT_TEMPERATURE).abs() < f64::EPSILON);
        assert_eq!(parsed.max_tokens, None);
    }

    /// ApiType: config file spellings map to the right variants.
    #[test]
    fn test_api_type_spelling() {
        assert_eq!(ApiType::OpenAi.as_str(), "openai");
        assert_eq!(ApiType::Azure.as_str(), "azure");
        assert_eq!(ApiType::OpenAi.api_key_env_var(), "OPENAI_API_KEY");
        assert_eq!(ApiType::Azure.api_key_env_var(), "AZURE_OPENAI_API_KEY");
    }
}

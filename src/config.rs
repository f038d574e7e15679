//! Configuration handling.
//!
//! Settings layer in three steps: `.worklens.toml` defaults, then CLI
//! arguments, then the Azure DevOps connection from required environment
//! variables. The connection is validated before any network or
//! aggregation work, and the credential never lands in a config file.

use crate::error::Error;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable naming the Azure DevOps organization.
pub const ENV_ORG: &str = "AZURE_DEVOPS_ORG";
/// Environment variable naming the project.
pub const ENV_PROJECT: &str = "AZURE_DEVOPS_PROJECT";
/// Environment variable carrying the personal access token.
pub const ENV_PAT: &str = "AZURE_DEVOPS_PAT";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Query settings.
    #[serde(default)]
    pub query: QueryConfig,

    /// Status-scanner settings.
    #[serde(default)]
    pub status: StatusConfig,

    /// Azure DevOps connection, filled from the environment, never from
    /// the config file.
    #[serde(skip)]
    pub connection: ConnectionConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output format ("table", "json", or "csv").
    #[serde(default = "default_format")]
    pub format: String,

    /// Default cap on the number of items shown.
    #[serde(default)]
    pub limit: Option<usize>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            limit: None,
        }
    }
}

fn default_format() -> String {
    "table".to_string()
}

/// Work-item query settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// States considered "active work".
    #[serde(default = "default_active_states")]
    pub active_states: Vec<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Azure DevOps REST API version.
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            active_states: default_active_states(),
            timeout_seconds: default_timeout(),
            api_version: default_api_version(),
        }
    }
}

fn default_active_states() -> Vec<String> {
    vec!["Active", "In Progress", "Committed", "Doing"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_timeout() -> u64 {
    30
}

fn default_api_version() -> String {
    "7.1".to_string()
}

/// Status-scanner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusConfig {
    /// Root directory of the planning tree.
    #[serde(default = "default_status_root")]
    pub root: String,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            root: default_status_root(),
        }
    }
}

fn default_status_root() -> String {
    ".".to_string()
}

/// Azure DevOps connection parameters, from the environment.
#[derive(Debug, Clone, Default)]
pub struct ConnectionConfig {
    /// Organization name (the segment after `dev.azure.com/`).
    pub organization: String,
    /// Project name within the organization.
    pub project: String,
    /// Personal access token, sent as the basic-auth password.
    pub pat: String,
}

impl ConnectionConfig {
    /// Read the connection from the process environment.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` first. Fails with a
    /// [`Error::Configuration`] naming every missing variable, so a user
    /// with none of them set sees all three at once.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut required = |name: &'static str| match lookup(name) {
            Some(value) if !value.trim().is_empty() => value,
            _ => {
                missing.push(name);
                String::new()
            }
        };

        let organization = required(ENV_ORG);
        let project = required(ENV_PROJECT);
        let pat = required(ENV_PAT);

        if !missing.is_empty() {
            return Err(Error::Configuration(missing.join(", ")));
        }

        Ok(Self {
            organization,
            project,
            pat,
        })
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists
    /// but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(".worklens.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence, but only where the user provided an
    /// explicit value.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(query) = args.query_args() {
            if let Some(format) = query.format_name() {
                self.general.format = format.to_string();
            }
            if let Some(limit) = query.limit {
                self.general.limit = Some(limit);
            }
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_connection_from_complete_environment() {
        let lookup = lookup_from(&[
            (ENV_ORG, "contoso"),
            (ENV_PROJECT, "Widgets"),
            (ENV_PAT, "secret-token"),
        ]);

        let conn = ConnectionConfig::from_lookup(lookup).unwrap();
        assert_eq!(conn.organization, "contoso");
        assert_eq!(conn.project, "Widgets");
        assert_eq!(conn.pat, "secret-token");
    }

    #[test]
    fn test_connection_names_all_missing_variables() {
        let lookup = lookup_from(&[(ENV_PROJECT, "Widgets")]);

        let err = ConnectionConfig::from_lookup(lookup).unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("Missing required environment variables"));
        assert!(msg.contains(ENV_ORG));
        assert!(msg.contains(ENV_PAT));
        assert!(!msg.contains(ENV_PROJECT));
    }

    #[test]
    fn test_blank_variable_counts_as_missing() {
        let lookup = lookup_from(&[
            (ENV_ORG, "  "),
            (ENV_PROJECT, "Widgets"),
            (ENV_PAT, "secret"),
        ]);

        let err = ConnectionConfig::from_lookup(lookup).unwrap_err();
        assert!(err.to_string().contains(ENV_ORG));
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.format, "table");
        assert_eq!(config.query.timeout_seconds, 30);
        assert!(config
            .query
            .active_states
            .contains(&"In Progress".to_string()));
        assert_eq!(config.status.root, ".");
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
format = "csv"
limit = 25

[query]
active_states = ["Active", "Doing"]
timeout_seconds = 10

[status]
root = "./planning"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.format, "csv");
        assert_eq!(config.general.limit, Some(25));
        assert_eq!(config.query.active_states, vec!["Active", "Doing"]);
        assert_eq!(config.query.timeout_seconds, 10);
        assert_eq!(config.status.root, "./planning");
    }

    #[test]
    fn test_default_toml_omits_connection() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[query]"));
        assert!(toml_str.contains("[status]"));
        // The PAT comes from the environment only.
        assert!(!toml_str.contains("pat"));
        assert!(!toml_str.contains("connection"));
        // Verbosity is a CLI concern, not a config key.
        assert!(!toml_str.contains("verbose"));
    }
}

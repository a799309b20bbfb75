//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Workflow tuning knobs.
    #[serde(default)]
    pub workflow: WorkflowConfig,
    /// Log output configuration.
    #[serde(default)]
    pub log: LogConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT settings as read from configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for verifying tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    900 // 15 minutes
}

/// Workflow tuning knobs.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WorkflowConfig {
    /// How many times a numbered insert is retried after a unique violation.
    #[serde(default = "default_numbering_retry_budget")]
    pub numbering_retry_budget: u32,
    /// Validity window applied to quotes created without an explicit date.
    #[serde(default = "default_quote_validity_days")]
    pub quote_validity_days: u32,
    /// Window for the "upcoming due" BRC compliance bucket.
    #[serde(default = "default_brc_upcoming_window_days")]
    pub brc_upcoming_window_days: u32,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            numbering_retry_budget: default_numbering_retry_budget(),
            quote_validity_days: default_quote_validity_days(),
            brc_upcoming_window_days: default_brc_upcoming_window_days(),
        }
    }
}

fn default_numbering_retry_budget() -> u32 {
    5
}

fn default_quote_validity_days() -> u32 {
    30
}

fn default_brc_upcoming_window_days() -> u32 {
    30
}

/// Log output configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogConfig {
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones overriding earlier ones: `config/default`,
    /// `config/{RUN_MODE}`, then `EXIMFLOW__SECTION__KEY` variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("EXIMFLOW")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("EXIMFLOW__DATABASE__URL", Some("postgres://localhost/eximflow")),
                ("EXIMFLOW__JWT__SECRET", Some("secret")),
                ("EXIMFLOW__SERVER__PORT", Some("9090")),
                ("EXIMFLOW__WORKFLOW__NUMBERING_RETRY_BUDGET", Some("7")),
                ("RUN_MODE", None),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/eximflow");
                assert_eq!(config.jwt.secret, "secret");
                assert_eq!(config.server.port, 9090);
                assert_eq!(config.server.host, "0.0.0.0");
                assert_eq!(config.workflow.numbering_retry_budget, 7);
                assert_eq!(config.workflow.quote_validity_days, 30);
                assert!(!config.log.json);
            },
        );
    }

    #[test]
    fn test_missing_database_url_fails() {
        temp_env::with_vars(
            [
                ("EXIMFLOW__DATABASE__URL", None::<&str>),
                ("EXIMFLOW__JWT__SECRET", Some("secret")),
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }

    #[test]
    fn test_workflow_defaults() {
        let workflow = WorkflowConfig::default();
        assert_eq!(workflow.numbering_retry_budget, 5);
        assert_eq!(workflow.quote_validity_days, 30);
        assert_eq!(workflow.brc_upcoming_window_days, 30);
    }
}

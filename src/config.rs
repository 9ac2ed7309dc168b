use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    #[serde(default)]
    pub limits: LimitSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
    /// Serve from the process-local store instead of PostgreSQL.
    #[serde(default)]
    pub in_memory: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: String,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: i64,
}

fn default_issuer() -> String { "swipe-match".to_string() }
fn default_token_ttl_secs() -> i64 { 3600 }

#[derive(Debug, Clone, Deserialize)]
pub struct LimitSettings {
    #[serde(default = "default_daily_view_limit")]
    pub daily_view_limit: u32,
    #[serde(default = "default_subscription_months")]
    pub subscription_months: u32,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            daily_view_limit: default_daily_view_limit(),
            subscription_months: default_subscription_months(),
        }
    }
}

fn default_daily_view_limit() -> u32 { 10 }
fn default_subscription_months() -> u32 { 1 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with DATING__)
    /// 5. `DATABASE_URL` / `JWT_SECRET`
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., DATING__SERVER__PORT -> server.port
            .add_source(environment())
            .build()?;

        apply_well_known_env(settings)?.try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("DATING")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Apply the conventional unprefixed variables on top of the layered config
fn apply_well_known_env(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(url) = env::var("DATABASE_URL") {
        builder = builder.set_override("database.url", url)?;
    }
    if let Ok(secret) = env::var("JWT_SECRET") {
        builder = builder.set_override("auth.jwt_secret", secret)?;
    }

    builder.build()
}

use secrecy::Secret;
use serde::Deserialize;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::ConnectOptions;
use std::str::FromStr;
use std::time::Duration;

#[derive(Deserialize, Clone, Debug)]
pub struct AppConfig {
    pub application: ApplicationConfig,
    pub database: DatabaseConfig,
    pub jwt_auth_config: JwtAuthConfig,
    pub attachments: AttachmentConfig,
    pub notifications: NotificationConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self, config::ConfigError> {
        let base_path = std::env::current_dir()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        let config_dir = base_path.join("src/core/configurations");

        let app_environment: Environment = std::env::var("AITS_APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .try_into()
            .map_err(config::ConfigError::Message)?;

        // AITS__DATABASE__DATABASE_NAME=... overrides `database.database_name`
        let configurations = config::Config::builder()
            .add_source(
                config::File::from(config_dir.join(app_environment.as_str())).required(true),
            )
            .add_source(
                config::Environment::with_prefix("AITS")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        configurations.try_deserialize()
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct ApplicationConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseConfig {
    /// SQLite file path, or `:memory:`.
    pub database_name: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn connect(&self) -> Result<SqliteConnectOptions, sqlx::Error> {
        let options = if self.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")?
        } else {
            SqliteConnectOptions::new()
                .filename(&self.database_name)
                .create_if_missing(true)
        };

        Ok(options
            .foreign_keys(true)
            .log_statements(tracing::log::LevelFilter::Trace))
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_name == ":memory:"
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct JwtAuthConfig {
    pub secret: Secret<String>,
    /// Hours a freshly issued token stays valid.
    pub token_expiration_time: i64,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AttachmentConfig {
    pub upload_dir: String,
    pub max_file_size: usize,
}

/// Read by the client-side notification poller.
#[derive(Deserialize, Clone, Debug)]
pub struct NotificationConfig {
    pub poll_interval_secs: u64,
}

impl NotificationConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
        }
    }
}

fn default_max_connections() -> u32 {
    10
}

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not supported environment. Use either `local` or `production` ",
                other
            )),
        }
    }
}

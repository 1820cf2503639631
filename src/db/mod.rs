use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::time::Duration;

use crate::core::config::DatabaseConfig;

pub mod departments;
pub mod issues;
pub mod notifications;
pub mod users;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Lazily connected pool. An in-memory SQLite database lives as long as its single
/// connection, so that connection is never recycled.
pub fn connect(config: &DatabaseConfig) -> Result<SqlitePool, sqlx::Error> {
    let options = SqlitePoolOptions::new().acquire_timeout(Duration::from_secs(5));
    let options = if config.is_in_memory() {
        options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
    } else {
        options.max_connections(config.max_connections)
    };

    Ok(options.connect_lazy_with(config.connect()?))
}

pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}

/// Escape character for LIKE patterns. SQLite has no default escape.
pub const LIKE_ESCAPE: char = '!';

/// `%term%` for `LIKE ? ESCAPE '!'` filters.
pub fn like_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .replace(LIKE_ESCAPE, "!!")
        .replace('%', "!%")
        .replace('_', "!_");
    format!("%{}%", escaped)
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let config = DatabaseConfig {
        database_name: ":memory:".to_string(),
        max_connections: 1,
    };
    let pool = connect(&config).unwrap();
    migrate(&pool).await.unwrap();
    pool
}

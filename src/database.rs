/// SQLite connection pool and schema migrations

use sqlx::migrate::MigrateError;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::configuration::DatabaseSettings;

/// Open a pool for the configured database, creating the file if needed
pub async fn get_connection_pool(settings: &DatabaseSettings) -> Result<SqlitePool, sqlx::Error> {
    if let Some(dir) = settings.parent_dir() {
        std::fs::create_dir_all(dir)?;
    }

    let options = if settings.is_in_memory() {
        // Each in-memory connection is its own database, so keep exactly one alive.
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(settings.max_connections)
    };

    options.connect_with(settings.connect_options()?).await
}

/// Apply the embedded migrations in `./migrations`
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

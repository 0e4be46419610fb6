use std::net::TcpListener;

use auth_service::configuration::get_configuration;
use auth_service::database::{get_connection_pool, run_migrations};
use auth_service::startup::run;
use auth_service::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "Configuration error")
    })?;

    init_telemetry(&configuration.log);
    tracing::info!("Configuration loaded successfully");

    if let Err(e) = configuration.validate() {
        tracing::error!(error = %e, "Invalid configuration");
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "Configuration error",
        ));
    }

    if configuration.uses_default_secret() {
        tracing::warn!("Using the built-in JWT secret; set JWT_SECRET before deploying");
    }

    tracing::info!(path = %configuration.database.path, "Opening database");
    let pool = get_connection_pool(&configuration.database)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to create connection pool");
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Database connection error",
            )
        })?;

    run_migrations(&pool).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to run database migrations");
        std::io::Error::new(std::io::ErrorKind::Other, "Database migration error")
    })?;
    tracing::info!("Database ready");

    let address = configuration.application.address();
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    run(listener, pool, &configuration)?.await
}

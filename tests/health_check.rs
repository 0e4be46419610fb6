//! Smoke tests for the server wiring

use std::net::TcpListener;

use auth_service::configuration::{
    ApplicationSettings, DatabaseSettings, JwtSettings, LogSettings, PasswordSettings, Settings,
};
use auth_service::database::{get_connection_pool, run_migrations};
use auth_service::startup::run;

fn test_settings(port: u16) -> Settings {
    Settings {
        application: ApplicationSettings {
            host: "127.0.0.1".to_string(),
            port,
        },
        database: DatabaseSettings::in_memory(),
        jwt: JwtSettings {
            secret: "health-check-secret".to_string(),
            access_token_expiry_minutes: 60,
        },
        password: PasswordSettings { hash_cost: 4 },
        log: LogSettings {
            level: "warn".to_string(),
            json: false,
        },
    }
}

async fn spawn_app() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let settings = test_settings(port);

    let pool = get_connection_pool(&settings.database)
        .await
        .expect("Failed to open in-memory database");
    run_migrations(&pool).await.expect("Failed to migrate");

    let server = run(listener, pool, &settings).expect("Failed to create server");
    let _ = tokio::spawn(server);

    format!("http://127.0.0.1:{}", port)
}

#[tokio::test]
async fn health_check_works() {
    let addr = spawn_app().await;

    let response = reqwest::Client::new()
        .get(&format!("{}/health", addr))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let addr = spawn_app().await;

    let response = reqwest::Client::new()
        .get(&format!("{}/does-not-exist", addr))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn wrong_method_on_public_route_is_not_success() {
    let addr = spawn_app().await;

    let response = reqwest::Client::new()
        .get(&format!("{}/auth/login", addr))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(!response.status().is_success());
}

#[tokio::test]
async fn out_of_range_token_lifetime_fails_startup_without_panic() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let mut settings = test_settings(port);
    settings.jwt.access_token_expiry_minutes = i64::MAX / 2;

    assert!(settings.validate().is_err());

    let pool = get_connection_pool(&settings.database)
        .await
        .expect("Failed to open in-memory database");
    let result = run(listener, pool, &settings);

    assert_eq!(
        result.err().map(|e| e.kind()),
        Some(std::io::ErrorKind::InvalidInput)
    );
}

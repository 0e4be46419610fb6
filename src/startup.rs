use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use sqlx::SqlitePool;
use std::net::TcpListener;

use crate::auth::{PasswordHasher, TokenIssuer, TokenVerifier};
use crate::configuration::Settings;
use crate::error::{AppError, ValidationError};
use crate::logger::LoggerMiddleware;
use crate::middleware::JwtMiddleware;
use crate::routes::{get_current_user, health_check, login, logout, refresh, register};
use crate::user_store::UserStore;

pub fn run(
    listener: TcpListener,
    pool: SqlitePool,
    settings: &Settings,
) -> Result<Server, std::io::Error> {
    let store = web::Data::new(UserStore::new(pool));
    let hasher = web::Data::new(PasswordHasher::new(settings.password.hash_cost));
    let issuer = TokenIssuer::new(&settings.jwt)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    let issuer = web::Data::new(issuer);
    let verifier = TokenVerifier::new(&settings.jwt);
    let verifier_data = web::Data::new(verifier.clone());

    let server = HttpServer::new(move || {
        // Missing fields and bad JSON become ordinary validation errors.
        let json_config = web::JsonConfig::default().error_handler(|err, _req| {
            AppError::Validation(ValidationError::MalformedBody(err.to_string())).into()
        });

        App::new()
            .wrap(LoggerMiddleware)
            .app_data(json_config)
            .app_data(store.clone())
            .app_data(hasher.clone())
            .app_data(issuer.clone())
            .app_data(verifier_data.clone())
            .route("/health", web::get().to(health_check))
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(register))
                    .route("/login", web::post().to(login))
                    .route("/refresh", web::post().to(refresh))
                    // Protected resources (require JWT authentication)
                    .service(
                        web::resource("/me")
                            .wrap(JwtMiddleware::new(verifier.clone()))
                            .route(web::get().to(get_current_user)),
                    )
                    .service(
                        web::resource("/logout")
                            .wrap(JwtMiddleware::new(verifier.clone()))
                            .route(web::post().to(logout)),
                    ),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}

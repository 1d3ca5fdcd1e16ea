use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::TokenIssuer;
use crate::configuration::{AuthSettings, Environment};
use crate::middleware::{RequestLogger, TokenGate};
use crate::routes::{current_user, health_check, login, register};
use crate::store::CredentialStore;

/// Wires the HTTP application and starts serving on the given listener.
///
/// The credential store and auth settings are injected so tests can run the
/// full stack against an in-memory store with deterministic keys.
pub fn run(
    listener: TcpListener,
    store: Arc<dyn CredentialStore>,
    auth_settings: AuthSettings,
    environment: Environment,
) -> Result<Server, std::io::Error> {
    let issuer = TokenIssuer::new(&auth_settings);

    let store_data: web::Data<dyn CredentialStore> = web::Data::from(store);
    let issuer_data = web::Data::new(issuer.clone());
    let auth_data = web::Data::new(auth_settings);
    let environment_data = web::Data::new(environment);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(RequestLogger)
            // Shared state
            .app_data(store_data.clone())
            .app_data(issuer_data.clone())
            .app_data(auth_data.clone())
            .app_data(environment_data.clone())
            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login))
            // Routes gated by a verified session token
            .service(
                web::scope("/users")
                    .wrap(TokenGate::new(issuer.clone()))
                    .route("/me", web::get().to(current_user)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}

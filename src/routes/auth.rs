/// Registration and Login Flows
///
/// `POST /register` validates the candidate identity, hashes the password,
/// and persists one new record; no session is issued. `POST /login` looks the
/// identity up by email, verifies the password, and answers with a signed
/// session token both in the body and as the `accessToken` cookie.

use actix_web::cookie::{Cookie, SameSite};
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::{hash_password, verify_password, TokenIssuer};
use crate::configuration::{AuthSettings, Environment};
use crate::error::{ApiError, AppError, AuthError};
use crate::middleware::ACCESS_TOKEN_COOKIE;
use crate::store::{CredentialStore, NewIdentity, Role, UserIdentity};
use crate::validators::{validate_login, validate_registration};

/// Candidate identity. No `Debug` impl: the plaintext password must never
/// reach logs through diagnostic formatting.
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub photo: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
}

/// The identity as echoed to clients: the password hash is dropped here and
/// the role travels as its own response field, never inside `data`.
#[derive(Serialize)]
pub struct IdentityPayload {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    pub created_at: String,
}

impl From<UserIdentity> for IdentityPayload {
    fn from(identity: UserIdentity) -> Self {
        Self {
            id: identity.id.to_string(),
            username: identity.username,
            email: identity.email,
            photo: identity.photo,
            created_at: identity.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub data: IdentityPayload,
    pub role: Role,
}

/// POST /register
///
/// # Outcomes
/// - 200: identity created (the caller still has to log in)
/// - 400: validation failure, with the full violation list
/// - 409: email already registered
/// - 500: store failure, diagnostic echoed only in development
pub async fn register(
    form: web::Json<RegisterRequest>,
    store: web::Data<dyn CredentialStore>,
    auth: web::Data<AuthSettings>,
    environment: web::Data<Environment>,
) -> Result<HttpResponse, ApiError> {
    let environment = **environment;

    register_flow(form.into_inner(), &store, &auth)
        .await
        .map_err(|e| {
            ApiError::new(e, environment).with_server_message("Failed to create. Try again")
        })
}

async fn register_flow(
    form: RegisterRequest,
    store: &web::Data<dyn CredentialStore>,
    auth: &AuthSettings,
) -> Result<HttpResponse, AppError> {
    validate_registration(&form)?;

    let RegisterRequest {
        username,
        email,
        password,
        photo,
    } = form;

    // bcrypt at the configured cost is deliberately slow; keep it off the
    // async executor.
    let cost = auth.hash_cost;
    let password_hash = web::block(move || hash_password(&password, cost)).await??;

    let identity = store
        .insert_identity(NewIdentity {
            username: username.trim().to_string(),
            email: email.trim().to_string(),
            password_hash,
            role: Role::default(),
            photo,
        })
        .await?;

    tracing::info!(user_id = %identity.id, "identity registered");

    Ok(HttpResponse::Ok().json(RegisterResponse {
        success: true,
        message: "Successfully created".to_string(),
    }))
}

/// POST /login
///
/// # Outcomes
/// - 200: body `{token, data, role}` plus the `accessToken` cookie
/// - 400: malformed credentials shape
/// - 404: no identity for that email
/// - 401: password mismatch
/// - 500: store failure or signing failure
pub async fn login(
    form: web::Json<LoginRequest>,
    store: web::Data<dyn CredentialStore>,
    issuer: web::Data<TokenIssuer>,
    environment: web::Data<Environment>,
) -> Result<HttpResponse, ApiError> {
    let environment = **environment;

    login_flow(form.into_inner(), &store, &issuer, environment)
        .await
        .map_err(|e| {
            ApiError::new(e, environment).with_server_message("Failed to login. Try again")
        })
}

async fn login_flow(
    form: LoginRequest,
    store: &web::Data<dyn CredentialStore>,
    issuer: &TokenIssuer,
    environment: Environment,
) -> Result<HttpResponse, AppError> {
    validate_login(&form)?;

    let LoginRequest { email, password } = form;

    let identity = store
        .find_by_email(email.trim())
        .await?
        .ok_or(AuthError::UserNotFound)?;

    let stored_hash = identity.password_hash.clone();
    let matched = web::block(move || verify_password(&password, &stored_hash)).await??;
    if !matched {
        tracing::warn!(user_id = %identity.id, "login rejected: password mismatch");
        return Err(AuthError::InvalidCredentials.into());
    }

    let issued = issuer.issue(identity.id, identity.role)?;
    let cookie = session_cookie(&issued.token, issued.expires_at, environment)?;

    let role = identity.role;
    tracing::info!(user_id = %identity.id, "login succeeded");

    Ok(HttpResponse::Ok().cookie(cookie).json(LoginResponse {
        token: issued.token,
        data: IdentityPayload::from(identity),
        role,
    }))
}

fn session_cookie(
    token: &str,
    expires_at: DateTime<Utc>,
    environment: Environment,
) -> Result<Cookie<'static>, AppError> {
    let expires =
        actix_web::cookie::time::OffsetDateTime::from_unix_timestamp(expires_at.timestamp())
            .map_err(|e| AppError::Internal(format!("cookie expiry out of range: {}", e)))?;

    Ok(Cookie::build(ACCESS_TOKEN_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .secure(environment.is_production())
        .same_site(SameSite::Lax)
        .expires(expires)
        .finish())
}

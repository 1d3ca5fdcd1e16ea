/// Current-user lookup behind the token gate.
///
/// The gate verifies the session token and injects its claims; this handler
/// resolves them back to the stored identity.

use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::auth::Claims;
use crate::configuration::Environment;
use crate::error::{ApiError, AppError, AuthError};
use crate::routes::IdentityPayload;
use crate::store::CredentialStore;

#[derive(Serialize)]
pub struct CurrentUserResponse {
    pub success: bool,
    pub message: String,
    pub data: IdentityPayload,
}

/// GET /users/me
pub async fn current_user(
    claims: web::ReqData<Claims>,
    store: web::Data<dyn CredentialStore>,
    environment: web::Data<Environment>,
) -> Result<HttpResponse, ApiError> {
    let environment = **environment;

    current_user_flow(claims.into_inner(), &store)
        .await
        .map_err(|e| {
            ApiError::new(e, environment).with_server_message("Failed to fetch user. Try again")
        })
}

async fn current_user_flow(
    claims: Claims,
    store: &web::Data<dyn CredentialStore>,
) -> Result<HttpResponse, AppError> {
    let user_id = claims.user_id()?;

    let identity = store
        .find_by_id(user_id)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    Ok(HttpResponse::Ok().json(CurrentUserResponse {
        success: true,
        message: "Successfully fetched".to_string(),
        data: identity.into(),
    }))
}

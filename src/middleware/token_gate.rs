/// Session Token Gate
///
/// Protects routes behind a verified session token. The token is accepted
/// from either the `Authorization: Bearer` header or the `accessToken`
/// cookie, mirroring the login flow's dual delivery. Verified claims are
/// injected into request extensions for route handlers.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::{TokenError, TokenIssuer};
use crate::error::{unauthorized_response, AuthError};

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

pub struct TokenGate {
    issuer: TokenIssuer,
}

impl TokenGate {
    pub fn new(issuer: TokenIssuer) -> Self {
        Self { issuer }
    }
}

impl<S, B> Transform<S, ServiceRequest> for TokenGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TokenGateService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(TokenGateService {
            service: Rc::new(service),
            issuer: self.issuer.clone(),
        }))
    }
}

pub struct TokenGateService<S> {
    service: Rc<S>,
    issuer: TokenIssuer,
}

fn extract_token(req: &ServiceRequest) -> Option<String> {
    let bearer = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string);

    bearer.or_else(|| {
        req.cookie(ACCESS_TOKEN_COOKIE)
            .map(|cookie| cookie.value().to_string())
    })
}

impl<S, B> Service<ServiceRequest> for TokenGateService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = match extract_token(&req) {
            Some(token) => token,
            None => {
                tracing::warn!("request to protected route without a session token");
                let response = unauthorized_response(AuthError::MissingToken);
                return Box::pin(async move {
                    Err(actix_web::error::InternalError::from_response(
                        "missing token",
                        response,
                    )
                    .into())
                });
            }
        };

        match self.issuer.verify(&token) {
            Ok(claims) => {
                tracing::debug!(user_id = %claims.sub, role = %claims.role, "session token accepted");
                req.extensions_mut().insert(claims);

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(err) => {
                tracing::warn!(reason = %err, "session token rejected");
                let kind = match err {
                    TokenError::Expired => AuthError::TokenExpired,
                    _ => AuthError::TokenInvalid,
                };
                let response = unauthorized_response(kind);
                Box::pin(async move {
                    Err(actix_web::error::InternalError::from_response(
                        "invalid token",
                        response,
                    )
                    .into())
                })
            }
        }
    }
}

/// Session Token Issuance and Verification
///
/// Stateless, HS256-signed bearer tokens encoding the authenticated identity
/// and its role. Validity is a fixed window from issuance; there is no
/// server-side session record and no revocation list, so rotating the signing
/// secret invalidates every outstanding token.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use std::fmt;

use crate::configuration::AuthSettings;
use crate::store::Role;

/// Token payload: subject (user id), role, issuance and expiry timestamps.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.sub).map_err(|_| TokenError::Invalid)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The token was once valid but its validity window has passed.
    Expired,
    /// Bad signature, wrong key, or malformed payload.
    Invalid,
    Signing(String),
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::Expired => write!(f, "token has expired"),
            TokenError::Invalid => write!(f, "token is invalid"),
            TokenError::Signing(msg) => write!(f, "token signing failed: {}", msg),
        }
    }
}

impl std::error::Error for TokenError {}

/// A freshly signed token together with its expiry instant.
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies session tokens. Built once at startup from injected
/// settings; tests construct issuers with deterministic keys and windows.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validity: Duration,
}

impl TokenIssuer {
    pub fn new(settings: &AuthSettings) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(settings.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
            validity: Duration::days(settings.token_expiry_days),
        }
    }

    /// Issue a signed token for the given identity.
    pub fn issue(&self, user_id: Uuid, role: Role) -> Result<IssuedToken, TokenError> {
        let issued_at = Utc::now();
        let expires_at = issued_at + self.validity;

        let claims = Claims {
            sub: user_id.to_string(),
            role,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Verify a token's signature and expiry and return its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer_with(expiry_days: i64) -> TokenIssuer {
        TokenIssuer::new(&AuthSettings {
            jwt_secret: "test-secret-key-at-least-32-characters-long".to_string(),
            token_expiry_days: expiry_days,
            hash_cost: 4,
        })
    }

    #[test]
    fn issued_token_verifies_and_round_trips_identity() {
        let issuer = issuer_with(15);
        let user_id = Uuid::new_v4();

        let issued = issuer.issue(user_id, Role::Admin).expect("issuing failed");
        let claims = issuer.verify(&issued.token).expect("verification failed");

        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp, issued.expires_at.timestamp());
        assert!(claims.iat <= claims.exp);
    }

    #[test]
    fn expiry_window_is_fifteen_days_by_default_settings() {
        let issuer = issuer_with(15);
        let issued = issuer
            .issue(Uuid::new_v4(), Role::User)
            .expect("issuing failed");

        let window = issued.expires_at - Utc::now();
        assert!(window > Duration::days(14));
        assert!(window <= Duration::days(15));
    }

    #[test]
    fn expired_token_is_rejected_as_expired() {
        // A negative validity window backdates the expiry past now.
        let issuer = issuer_with(-1);
        let issued = issuer
            .issue(Uuid::new_v4(), Role::User)
            .expect("issuing failed");

        assert_eq!(issuer.verify(&issued.token), Err(TokenError::Expired));
    }

    #[test]
    fn tampered_token_is_rejected_as_invalid() {
        let issuer = issuer_with(15);
        let issued = issuer
            .issue(Uuid::new_v4(), Role::User)
            .expect("issuing failed");

        let tampered = format!("{}x", issued.token);
        assert_eq!(issuer.verify(&tampered), Err(TokenError::Invalid));
    }

    #[test]
    fn token_signed_with_another_key_is_rejected() {
        let issuer = issuer_with(15);
        let other = TokenIssuer::new(&AuthSettings {
            jwt_secret: "a-completely-different-signing-secret!!".to_string(),
            token_expiry_days: 15,
            hash_cost: 4,
        });

        let issued = other
            .issue(Uuid::new_v4(), Role::User)
            .expect("issuing failed");

        assert_eq!(issuer.verify(&issued.token), Err(TokenError::Invalid));
    }

    #[test]
    fn garbage_token_is_rejected_as_invalid() {
        let issuer = issuer_with(15);
        assert_eq!(
            issuer.verify("definitely.not.a-token"),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn claims_with_non_uuid_subject_fail_user_id_extraction() {
        let claims = Claims {
            sub: "not-a-uuid".to_string(),
            role: Role::User,
            iat: 0,
            exp: 0,
        };
        assert_eq!(claims.user_id(), Err(TokenError::Invalid));
    }
}

//! Token verification at the connection boundary.

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use super::{
    errors::{AuthError, AuthResult},
    models::{ACCESS_TOKEN_TYPE, AccessTokenClaims, Credentials, Identity},
};

/// Turns client credentials into a verified identity. Connections are only
/// admitted to a room once this succeeds.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> AuthResult<Identity>;
}

/// Verifies HS256 access tokens signed with a shared secret.
pub struct JwtAuthenticator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtAuthenticator {
    pub fn new(jwt_secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Verify JWT access token
    pub fn verify_access_token(&self, token: &str) -> AuthResult<AccessTokenClaims> {
        let token_data = decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }
}

#[async_trait]
impl Authenticator for JwtAuthenticator {
    async fn authenticate(&self, credentials: &Credentials) -> AuthResult<Identity> {
        let token = credentials
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;
        let claims = self.verify_access_token(token)?;

        if claims.token_type != ACCESS_TOKEN_TYPE {
            return Err(AuthError::WrongTokenType(claims.token_type));
        }
        if claims.sub.trim().is_empty() {
            return Err(AuthError::InvalidSubject);
        }

        let username = claims.username.unwrap_or_else(|| claims.sub.clone());
        Ok(Identity::new(claims.sub, username))
    }
}

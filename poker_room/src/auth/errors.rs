//! Authentication error types.

use thiserror::Error;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// No token in cookie or query string
    #[error("Missing access token")]
    MissingToken,

    /// JWT token error
    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    /// Token is valid but not an access token
    #[error("Wrong token type: {0}")]
    WrongTokenType(String),

    /// Subject claim missing or empty
    #[error("Invalid token subject")]
    InvalidSubject,
}

impl AuthError {
    /// Get a client-safe error message that doesn't leak sensitive information
    pub fn client_message(&self) -> String {
        match self {
            // Don't expose token structure
            AuthError::JwtError(_) | AuthError::WrongTokenType(_) | AuthError::InvalidSubject => {
                "Authentication failed".to_string()
            }
            AuthError::MissingToken => self.to_string(),
        }
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

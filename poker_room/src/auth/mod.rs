//! Authentication at the room boundary.
//!
//! Accounts, credential issuance, and sessions live elsewhere. This module
//! only turns a presented access token into an [`Identity`]:
//! - HS256 JWT verification with a shared secret
//! - `type` claim must be `"access"`
//! - `sub` becomes the user ID, `username` is optional
//!
//! ## Example
//!
//! ```no_run
//! use poker_room::auth::{Authenticator, Credentials, JwtAuthenticator};
//!
//! #[tokio::main]
//! async fn main() {
//!     let auth = JwtAuthenticator::new("jwt_secret");
//!     let credentials = Credentials::bearer("eyJ...");
//!     match auth.authenticate(&credentials).await {
//!         Ok(identity) => println!("hello {}", identity.username),
//!         Err(e) => println!("rejected: {}", e.client_message()),
//!     }
//! }
//! ```

pub mod authenticator;
pub mod errors;
pub mod models;

pub use authenticator::{Authenticator, JwtAuthenticator};
pub use errors::{AuthError, AuthResult};
pub use models::{AccessTokenClaims, Credentials, Identity, UserId};

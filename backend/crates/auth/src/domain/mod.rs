//! Domain Layer
//!
//! Contains entities, value objects, the token service, and repository traits.

pub mod entity;
pub mod repository;
pub mod token;
pub mod value_object;

// Re-exports
pub use entity::{auth_user::AuthUser, session::Session, user::User};
pub use repository::{CredentialRepository, SessionRepository, TotpRepository, UserRepository};
pub use token::{TokenClaims, TokenError, TokenSigner};

//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, and the security middleware pipeline.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use handlers::{AuthAppState, AuthRepositories};
pub use middleware::{authorize, require_auth, security_headers};
pub use router::{auth_router, auth_router_with_state};

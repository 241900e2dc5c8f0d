//! Application Layer
//!
//! Use cases and application services.

pub mod authenticate;
pub mod config;
pub mod refresh;
pub mod sessions;
pub mod sign_in;
pub mod sign_out;
pub mod sign_up;
pub mod tokens;
pub mod totp_setup;

// Re-exports
pub use authenticate::AuthenticateUseCase;
pub use config::AuthConfig;
pub use refresh::{RefreshOutput, RefreshUseCase};
pub use sessions::ListSessionsUseCase;
pub use sign_in::{SignInInput, SignInOutput, SignInUseCase};
pub use sign_out::SignOutUseCase;
pub use sign_up::{SignUpInput, SignUpOutput, SignUpUseCase};
pub use tokens::TokenPair;
pub use totp_setup::{TotpSetupOutput, TotpSetupUseCase};

//! Entity Module

pub mod auth_user;
pub mod credential;
pub mod session;
pub mod totp_enrollment;
pub mod user;

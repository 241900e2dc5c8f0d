//! Value Object Module

pub mod backup_codes;
pub mod display_name;
pub mod email;
pub mod public_id;
pub mod token_kind;
pub mod totp_secret;
pub mod user_status;

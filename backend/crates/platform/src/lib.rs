//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (SHA-256, HMAC, secure random tokens)
//! - Password hashing (Argon2id, NIST SP 800-63B compliant)
//! - Cookie management
//! - Client identification (fingerprint, IP extraction)
//! - Rate limiting and brute-force lockout
//! - Malicious input detection and sanitization

pub mod client;
pub mod cookie;
pub mod crypto;
pub mod lockout;
pub mod password;
pub mod rate_limit;
pub mod sanitize;

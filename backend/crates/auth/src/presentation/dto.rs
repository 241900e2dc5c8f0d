//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};

use access::Role;

use crate::domain::entity::auth_user::AuthUser;
use crate::domain::entity::session::SessionInfo;
use crate::domain::entity::user::User;

// ============================================================================
// Register
// ============================================================================

/// Register request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub display_name: String,
    pub password: String,
    pub home_region: i32,
}

/// Register response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub public_id: String,
}

// ============================================================================
// Login / Refresh
// ============================================================================

/// Login request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// TOTP or backup code if 2FA is enabled
    pub totp_code: Option<String>,
}

/// Login response; the refresh token is also set as an HttpOnly cookie
/// for browser clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserResponse,
}

/// Refresh request; non-browser clients send the token in the body
/// instead of the cookie
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// Refresh response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

// ============================================================================
// User Info
// ============================================================================

/// Public user representation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub public_id: String,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub home_region: i32,
    pub last_login_at_ms: Option<i64>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            public_id: user.public_id.to_string(),
            email: user.email.as_str().to_string(),
            display_name: user.display_name.as_str().to_string(),
            role: user.role,
            home_region: user.home_region.0,
            last_login_at_ms: user.last_login_at.map(|t| t.timestamp_millis()),
        }
    }
}

/// Current identity response (derived from the access token)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub public_id: String,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub home_region: i32,
    pub second_factor_verified: bool,
}

impl From<&AuthUser> for MeResponse {
    fn from(user: &AuthUser) -> Self {
        Self {
            public_id: user.public_id.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            role: user.role,
            home_region: user.home_region.0,
            second_factor_verified: user.second_factor_verified,
        }
    }
}

// ============================================================================
// Sessions
// ============================================================================

/// One live session on the device management screen
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: String,
    pub device_info: String,
    pub ip: Option<String>,
    pub created_at_ms: i64,
    pub last_activity_at_ms: i64,
    pub is_current: bool,
}

impl From<&SessionInfo> for SessionResponse {
    fn from(info: &SessionInfo) -> Self {
        Self {
            session_id: info.session_id.to_string(),
            device_info: info.device_info.clone(),
            ip: info.ip.clone(),
            created_at_ms: info.created_at.timestamp_millis(),
            last_activity_at_ms: info.last_activity_at.timestamp_millis(),
            is_current: info.is_current,
        }
    }
}

/// Session list response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionListResponse {
    pub sessions: Vec<SessionResponse>,
}

/// Revoke-all response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeAllResponse {
    pub revoked: u64,
}

// ============================================================================
// TOTP
// ============================================================================

/// TOTP setup response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotpSetupResponse {
    /// QR code as base64-encoded PNG
    pub qr_code: String,
    /// Secret for manual entry
    pub secret: String,
    /// otpauth:// URL
    pub otpauth_url: String,
}

/// TOTP confirm request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotpConfirmRequest {
    pub code: String,
}

/// TOTP confirm response; backup codes are shown exactly once
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotpConfirmResponse {
    pub backup_codes: Vec<String>,
}

/// TOTP verify request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotpVerifyRequest {
    pub code: String,
}

/// TOTP disable request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotpDisableRequest {
    /// Current TOTP or backup code to confirm disable
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response_carries_both_tokens() {
        let response = LoginResponse {
            access_token: "acc".to_string(),
            refresh_token: "ref".to_string(),
            user: UserResponse {
                public_id: "p".to_string(),
                email: "hanako@example.com".to_string(),
                display_name: "Hanako".to_string(),
                role: Role::Student,
                home_region: 1,
                last_login_at_ms: None,
            },
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["accessToken"], "acc");
        assert_eq!(json["refreshToken"], "ref");
    }

    #[test]
    fn test_refresh_request_token_is_optional() {
        let req: RefreshRequest = serde_json::from_str(r#"{"refreshToken":"ref"}"#).unwrap();
        assert_eq!(req.refresh_token.as_deref(), Some("ref"));

        let req: RefreshRequest = serde_json::from_str("{}").unwrap();
        assert!(req.refresh_token.is_none());
    }
}

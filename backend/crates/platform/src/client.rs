//! Client Identification
//!
//! Resolves who is on the other end of a request: the effective IP
//! (reverse-proxy aware) and a User-Agent fingerprint. These feed the
//! rate limiter and lockout guard keys and session device metadata.

use axum::http::{HeaderMap, header};
use std::net::IpAddr;

use crate::crypto::sha256;
use crate::sanitize::{SanitizeOptions, sanitize};

/// Identity of the requesting client, derived from connection and headers
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    /// Effective IP address, X-Forwarded-For aware
    pub ip: Option<IpAddr>,
    /// SHA-256 of the User-Agent header, all zeroes when absent
    pub fingerprint: [u8; 32],
    /// Raw User-Agent for session device metadata
    pub user_agent: Option<String>,
}

impl ClientIdentity {
    /// Resolve the client from headers plus the direct connection IP
    pub fn from_request(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Self {
        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let fingerprint = user_agent
            .as_deref()
            .map(|ua| sha256(ua.as_bytes()))
            .unwrap_or([0u8; 32]);

        Self {
            ip: extract_client_ip(headers, direct_ip),
            fingerprint,
            user_agent,
        }
    }

    /// IP as string, "unknown" when undeterminable
    pub fn ip_string(&self) -> String {
        self.ip
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Composite key for the rate limiter: category + IP.
    ///
    /// Keyed on IP rather than identity so unauthenticated floods are
    /// throttled too.
    pub fn rate_limit_key(&self, category: &str) -> String {
        format!("{}:{}", category, self.ip_string())
    }

    /// Composite key for the lockout guard: the attempted account plus
    /// the source IP, so an attacker cannot lock out a victim from a
    /// different address.
    pub fn lockout_key(&self, identifier: &str) -> String {
        format!("login:{}:{}", identifier.to_lowercase(), self.ip_string())
    }

    /// Short device label for session metadata.
    ///
    /// The User-Agent is attacker-controlled and is later echoed in the
    /// session list, so it is escaped and bounded before storage.
    pub fn device_info(&self) -> String {
        let options = SanitizeOptions {
            escape_html: true,
            strip_control: true,
            max_length: Some(255),
        };
        match self.user_agent.as_deref() {
            Some(ua) => sanitize(ua, &options),
            None => "unknown".to_string(),
        }
    }
}

/// Extract the client IP, preferring the first X-Forwarded-For entry
/// over the direct connection address
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first_ip) = xff.split(',').next() {
            if let Ok(ip) = first_ip.trim().parse::<IpAddr>() {
                return Some(ip);
            }
        }
    }
    direct_ip
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_identity_from_request() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_static("Mozilla/5.0 Test Browser"),
        );

        let client = ClientIdentity::from_request(&headers, Some("10.0.0.5".parse().unwrap()));
        assert_eq!(client.ip, Some("10.0.0.5".parse().unwrap()));
        assert_ne!(client.fingerprint, [0u8; 32]);
        assert_eq!(client.device_info(), "Mozilla/5.0 Test Browser");
    }

    #[test]
    fn test_missing_user_agent_is_tolerated() {
        let headers = HeaderMap::new();
        let client = ClientIdentity::from_request(&headers, None);
        assert_eq!(client.fingerprint, [0u8; 32]);
        assert_eq!(client.device_info(), "unknown");
        assert_eq!(client.ip_string(), "unknown");
    }

    #[test]
    fn test_device_info_is_cleaned() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_static("Mozilla/5.0 <script>alert(1)</script>"),
        );

        let client = ClientIdentity::from_request(&headers, None);
        assert_eq!(
            client.device_info(),
            "Mozilla/5.0 &lt;script&gt;alert(1)&lt;/script&gt;"
        );
    }

    #[test]
    fn test_xff_takes_precedence() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("192.168.1.1, 10.0.0.1"),
        );

        let ip = extract_client_ip(&headers, Some("127.0.0.1".parse().unwrap()));
        assert_eq!(ip, Some("192.168.1.1".parse().unwrap()));
    }

    #[test]
    fn test_composite_keys() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9"),
        );
        let client = ClientIdentity::from_request(&headers, None);

        assert_eq!(client.rate_limit_key("login"), "login:203.0.113.9");
        assert_eq!(
            client.lockout_key("Alice@Example.com"),
            "login:alice@example.com:203.0.113.9"
        );
    }
}

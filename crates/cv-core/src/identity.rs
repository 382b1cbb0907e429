//! # Voter identity
//!
//! Best-effort identity built from three weak signals: client IP, a
//! long-lived cookie token and an optional device fingerprint. Nothing here
//! touches HTTP; the API layer feeds in raw header values.

use std::net::IpAddr;

use uuid::Uuid;

/// Name of the long-lived voter cookie.
pub const VOTER_COOKIE: &str = "voter_id";

/// Stored when no address can be determined.
pub const UNKNOWN_IP: &str = "unknown";

/// Picks the client address in priority order: first `X-Forwarded-For`
/// entry, then the transport peer, then `"unknown"`.
///
/// The forwarded header is client-suppliable. Deployments not behind a
/// proxy that rewrites it should pass `trust_forwarded_for = false`.
pub fn resolve_client_ip(
    forwarded_for: Option<&str>,
    peer: Option<IpAddr>,
    trust_forwarded_for: bool,
) -> String {
    if trust_forwarded_for {
        let first = forwarded_for
            .and_then(|h| h.split(',').next())
            .map(str::trim)
            .filter(|s| !s.is_empty());
        if let Some(ip) = first {
            return ip.to_string();
        }
    }

    peer.map(|ip| ip.to_string())
        .unwrap_or_else(|| UNKNOWN_IP.to_string())
}

/// Mints a fresh cookie token with UUID-class entropy.
pub fn mint_cookie_token() -> String {
    Uuid::new_v4().to_string()
}

/// Empty or whitespace-only fingerprints count as absent.
pub fn normalize_fingerprint(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// The resolved `(ipAddress, cookieToken, fingerprint?)` tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoterIdentity {
    pub ip_address: String,
    pub cookie_token: String,
    pub fingerprint: Option<String>,
}

/// One store-level uniqueness key a ballot can be found by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityKey {
    Fingerprint(String),
    IpCookie {
        ip_address: String,
        cookie_token: String,
    },
}

impl IdentityKey {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            IdentityKey::Fingerprint(_) => "fingerprint",
            IdentityKey::IpCookie { .. } => "ip_cookie",
        }
    }
}

type KeyExtractor = fn(&VoterIdentity) -> Option<IdentityKey>;

fn fingerprint_key(id: &VoterIdentity) -> Option<IdentityKey> {
    id.fingerprint.clone().map(IdentityKey::Fingerprint)
}

fn ip_cookie_key(id: &VoterIdentity) -> Option<IdentityKey> {
    Some(IdentityKey::IpCookie {
        ip_address: id.ip_address.clone(),
        cookie_token: id.cookie_token.clone(),
    })
}

/// Duplicate checks in priority order. Any hit blocks.
const KEY_TABLE: &[KeyExtractor] = &[fingerprint_key, ip_cookie_key];

impl VoterIdentity {
    /// Keys to check, strongest first. The fingerprint survives cookie
    /// clearing, so it leads when present.
    pub fn lookup_keys(&self) -> Vec<IdentityKey> {
        KEY_TABLE.iter().filter_map(|extract| extract(self)).collect()
    }
}

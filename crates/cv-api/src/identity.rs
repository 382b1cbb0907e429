//! Resolving who is voting, from the raw request.
//!
//! Handlers call [`ensure_identity`] explicitly and attach the minted
//! cookie (if any) to whatever response they produce.

use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::{HttpRequest, HttpResponse};
use cv_core::{mint_cookie_token, normalize_fingerprint, resolve_client_ip, VoterIdentity, VOTER_COOKIE};

pub const FINGERPRINT_HEADER: &str = "x-fingerprint";
const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Deployment knobs for identity resolution.
#[derive(Debug, Clone, Copy)]
pub struct IdentityPolicy {
    /// Set the cookie's `Secure` flag (production only).
    pub secure_cookie: bool,
    pub trust_forwarded_for: bool,
}

/// Builds the voter identity. A request without a `voter_id` cookie gets a
/// fresh token, returned as a cookie for the caller to set.
pub fn ensure_identity(
    req: &HttpRequest,
    policy: &IdentityPolicy,
    fingerprint: Option<&str>,
) -> (VoterIdentity, Option<Cookie<'static>>) {
    let forwarded_for = req
        .headers()
        .get(FORWARDED_FOR_HEADER)
        .and_then(|v| v.to_str().ok());
    let ip_address = resolve_client_ip(
        forwarded_for,
        req.peer_addr().map(|a| a.ip()),
        policy.trust_forwarded_for,
    );

    let existing = req
        .cookie(VOTER_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty());
    let (cookie_token, minted) = match existing {
        Some(token) => (token, None),
        None => {
            let token = mint_cookie_token();
            let cookie = voter_cookie(token.clone(), policy.secure_cookie);
            (token, Some(cookie))
        }
    };

    let identity = VoterIdentity {
        ip_address,
        cookie_token,
        fingerprint: normalize_fingerprint(fingerprint),
    };
    (identity, minted)
}

fn voter_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build(VOTER_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::days(365))
        .finish()
}

/// Sets the minted cookie, if any, on a finished response.
pub fn with_cookie(mut resp: HttpResponse, cookie: Option<Cookie<'static>>) -> HttpResponse {
    if let Some(cookie) = cookie {
        if let Err(e) = resp.add_cookie(&cookie) {
            tracing::warn!(error = %e, "could not set voter cookie");
        }
    }
    resp
}

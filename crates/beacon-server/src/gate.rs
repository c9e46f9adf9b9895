//! The access gate: credential middleware fronting the control plane.
//!
//! Evaluated before every handler. Two exemptions, matching the system's
//! trust boundary:
//!
//! - anything under the signaling relay prefix (the transport's traffic is
//!   not control-plane data), and
//! - any GET outside the `/api` namespace (static assets, health).
//!
//! Everything else must present an `x-api-key` header whose credential
//! exists and is active. Denial is total: there are no partial scopes. The
//! gate never mutates state.

use axum::extract::{Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use beacon_core::BeaconError;

use crate::error::ApiError;
use crate::server::AppState;

/// Header carrying the credential.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Prefix of the control-plane data namespace.
pub const API_PREFIX: &str = "/api";

/// Middleware entry point. Wire with `axum::middleware::from_fn_with_state`.
pub async fn access_gate(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if is_exempt(req.method(), req.uri().path(), &state.config.signaling_path) {
        return next.run(req).await;
    }

    let presented = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    let Some(key) = presented else {
        warn!(path = req.uri().path(), "request without api key denied");
        return ApiError::from(BeaconError::AccessDenied).into_response();
    };

    match state.registry.credential_active(key) {
        Ok(true) => next.run(req).await,
        Ok(false) => {
            warn!(path = req.uri().path(), "invalid or inactive api key denied");
            ApiError::from(BeaconError::AccessDenied).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Whether a request bypasses the credential check.
fn is_exempt(method: &Method, path: &str, signaling_path: &str) -> bool {
    if path.starts_with(signaling_path) {
        return true;
    }
    method == Method::GET && !path.starts_with(API_PREFIX)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signaling_traffic_exempt_any_method() {
        assert!(is_exempt(&Method::GET, "/signal/peer", "/signal"));
        assert!(is_exempt(&Method::POST, "/signal/peer", "/signal"));
    }

    #[test]
    fn static_get_exempt() {
        assert!(is_exempt(&Method::GET, "/", "/signal"));
        assert!(is_exempt(&Method::GET, "/index.html", "/signal"));
        assert!(is_exempt(&Method::GET, "/health", "/signal"));
    }

    #[test]
    fn api_get_not_exempt() {
        assert!(!is_exempt(&Method::GET, "/api/friends/AB12CD", "/signal"));
    }

    #[test]
    fn api_post_not_exempt() {
        assert!(!is_exempt(&Method::POST, "/api/auth", "/signal"));
        assert!(!is_exempt(&Method::POST, "/api/add-friend", "/signal"));
    }

    #[test]
    fn non_api_post_not_exempt() {
        assert!(!is_exempt(&Method::POST, "/upload", "/signal"));
    }

    #[test]
    fn custom_signaling_prefix_respected() {
        assert!(is_exempt(&Method::POST, "/relay/x", "/relay"));
        assert!(!is_exempt(&Method::POST, "/signal/x", "/relay"));
    }
}

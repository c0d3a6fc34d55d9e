//! Authentication gate for the admin API
//!
//! Every `/api/{action}` request passes through [`auth_middleware`]:
//! - OPTIONS preflights pass untouched
//! - public actions (`search`, `cal`, `auth`) pass without a token
//! - everything else needs a `bgmi-token` header equal to the admin token

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State, rejection::PathRejection},
    http::{HeaderMap, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use super::router::envelope_response;
use crate::action::Action;
use crate::config::AdminConfig;
use crate::envelope::Envelope;

/// Header carrying the admin token
pub const TOKEN_HEADER: &str = "bgmi-token";

/// Resolved admin token
pub struct AdminAuth {
    token: String,
}

impl AdminAuth {
    /// Wrap an already-resolved token
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Resolve the token from configuration (expands `env:`, generates `auto`)
    #[must_use]
    pub fn from_config(config: &AdminConfig) -> Self {
        let token = config.resolve_token();

        if config.is_auto_token() {
            tracing::info!("Auto-generated admin token: {}", token);
        }

        Self { token }
    }

    /// The token callers must present
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Constant-time comparison against the admin token
    #[must_use]
    pub fn verify(&self, provided: &str) -> bool {
        self.verify_bytes(provided.as_bytes())
    }

    /// Constant-time comparison of raw header bytes against the admin token
    #[must_use]
    pub fn verify_bytes(&self, provided: &[u8]) -> bool {
        provided.ct_eq(self.token.as_bytes()).into()
    }

    /// Decide whether `action` may run for a request carrying `headers`.
    ///
    /// The `Err` variant is the terminal 401 response.
    #[allow(clippy::result_large_err)]
    pub fn guard(&self, action: &str, headers: &HeaderMap) -> Result<(), Response> {
        if action.parse::<Action>().is_ok_and(Action::is_public) {
            debug!(action = %action, "Public action, skipping auth");
            return Ok(());
        }

        let provided = headers.get(TOKEN_HEADER).map(HeaderValue::as_bytes);

        if provided.is_some_and(|p| self.verify_bytes(p)) {
            debug!(action = %action, "Authenticated request");
            Ok(())
        } else {
            warn!(
                action = %action,
                token_present = provided.is_some(),
                "Rejected admin request"
            );
            Err(unauthorized_response())
        }
    }
}

/// Authentication middleware for `/api/{action}`
pub async fn auth_middleware(
    State(auth): State<Arc<AdminAuth>>,
    action: Result<Path<String>, PathRejection>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS {
        return next.run(request).await;
    }

    let Ok(Path(action)) = action else {
        warn!(path = %request.uri().path(), "Could not extract action for auth");
        return StatusCode::BAD_REQUEST.into_response();
    };

    match auth.guard(&action, request.headers()) {
        Ok(()) => next.run(request).await,
        Err(response) => response,
    }
}

/// 401 with the `need auth` envelope
fn unauthorized_response() -> Response {
    let envelope = Envelope::error("need auth");
    match envelope_response(StatusCode::UNAUTHORIZED, &envelope, None) {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

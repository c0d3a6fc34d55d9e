//! HTTP router and handlers

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    middleware,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde_json::{Map, Value};
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{debug, warn};

use super::admin_page::{admin_index_handler, admin_page_handler};
use super::auth::{AdminAuth, auth_middleware};
use super::registry::ActionRegistry;
use crate::config::AdminConfig;
use crate::controller::Controllers;
use crate::envelope::Envelope;
use crate::{Error, Result};

/// Content type of every API envelope
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

const ALLOW_METHODS: &str = "GET,POST,PUT,DELETE,OPTIONS";
const ALLOW_HEADERS: &str =
    "Content-Type,bgmi-token, Access-Control-Allow-Headers, Authorization, X-Requested-With";

/// Shared application state, immutable after start-up
pub struct AppState {
    /// Operations behind the actions
    pub controllers: Arc<dyn Controllers>,
    /// Admin token
    pub auth: Arc<AdminAuth>,
    /// GET/POST action tables
    pub registry: ActionRegistry,
    /// Development mode
    pub dev_mode: bool,
    /// Admin UI bundle directory
    pub admin_path: PathBuf,
    /// `Access-Control-Allow-Origin` value
    pub cors_origin: HeaderValue,
}

impl AppState {
    /// Build state from configuration, resolving the admin token
    ///
    /// # Errors
    ///
    /// Returns an error if the CORS origin is not a valid header value.
    pub fn new(config: &AdminConfig, controllers: Arc<dyn Controllers>) -> Result<Self> {
        Self::with_auth(config, controllers, AdminAuth::from_config(config))
    }

    /// Build state with an explicit token
    ///
    /// # Errors
    ///
    /// Returns an error if the CORS origin is not a valid header value.
    pub fn with_auth(
        config: &AdminConfig,
        controllers: Arc<dyn Controllers>,
        auth: AdminAuth,
    ) -> Result<Self> {
        let cors_origin = HeaderValue::from_str(&config.cors_origin)
            .map_err(|e| Error::Config(format!("Invalid cors_origin: {e}")))?;

        Ok(Self {
            controllers,
            auth: Arc::new(auth),
            registry: ActionRegistry::new(),
            dev_mode: config.dev,
            admin_path: config.path.clone(),
            cors_origin,
        })
    }

    /// CORS origin to attach to API responses, if any
    fn api_cors(&self) -> Option<&HeaderValue> {
        self.dev_mode.then_some(&self.cors_origin)
    }
}

/// Create the router
pub fn create_router(state: Arc<AppState>) -> Router {
    let auth = Arc::clone(&state.auth);

    let api = Router::new()
        .route(
            "/api/{action}",
            get(api_get_handler)
                .post(api_post_handler)
                .options(preflight_handler),
        )
        .route_layer(middleware::from_fn_with_state(auth, auth_middleware));

    Router::new()
        .merge(api)
        .route("/admin/", get(admin_index_handler))
        .route("/admin/{*path}", get(admin_page_handler))
        .fallback(not_found_handler)
        .method_not_allowed_fallback(method_not_allowed_handler)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::new()),
        )
        .with_state(state)
}

/// GET /api/{action}
///
/// Unknown actions are inert: empty body, default status.
async fn api_get_handler(
    State(state): State<Arc<AppState>>,
    Path(action): Path<String>,
) -> Result<Response> {
    let Some(handler) = state.registry.get_handler(&action) else {
        debug!(action = %action, "Ignoring unknown GET action");
        return Ok(().into_response());
    };

    debug!(action = %action, "GET action");
    let envelope = handler(Arc::clone(&state)).await;
    envelope_response(StatusCode::OK, &envelope, state.api_cors())
}

/// POST /api/{action}
///
/// 502 for a malformed body or an `error` envelope, 404 for unknown actions.
async fn api_post_handler(
    State(state): State<Arc<AppState>>,
    Path(action): Path<String>,
    body: Bytes,
) -> Result<Response> {
    let args: Map<String, Value> = match serde_json::from_slice(&body) {
        Ok(args) => args,
        Err(e) => {
            warn!(action = %action, error = %e, "Malformed request body");
            return Ok(error_page(StatusCode::BAD_GATEWAY));
        }
    };

    let Some(handler) = state.registry.post_handler(&action) else {
        debug!(action = %action, "Unknown POST action");
        return Ok(error_page(StatusCode::NOT_FOUND));
    };

    let envelope = match handler(Arc::clone(&state), args).await {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(action = %action, error = %e, "Invalid action arguments");
            return Ok(error_page(StatusCode::BAD_GATEWAY));
        }
    };

    let status = if envelope.is_error() {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::OK
    };
    debug!(action = %action, status = %status, "POST action");
    envelope_response(status, &envelope, state.api_cors())
}

/// OPTIONS on any path: CORS headers, empty body, no auth
async fn preflight_handler(State(state): State<Arc<AppState>>) -> Response {
    let mut response = ().into_response();
    apply_cors(response.headers_mut(), &state.cors_origin);
    response
}

async fn not_found_handler(State(state): State<Arc<AppState>>, method: Method) -> Response {
    if method == Method::OPTIONS {
        preflight_handler(State(state)).await
    } else {
        error_page(StatusCode::NOT_FOUND)
    }
}

async fn method_not_allowed_handler(
    State(state): State<Arc<AppState>>,
    method: Method,
) -> Response {
    if method == Method::OPTIONS {
        preflight_handler(State(state)).await
    } else {
        error_page(StatusCode::METHOD_NOT_ALLOWED)
    }
}

/// Serialize an envelope with the API content type and optional CORS headers
pub(crate) fn envelope_response(
    status: StatusCode,
    envelope: &Envelope,
    cors_origin: Option<&HeaderValue>,
) -> Result<Response> {
    let mut response = (
        status,
        [(header::CONTENT_TYPE, JSON_CONTENT_TYPE)],
        envelope.to_json()?,
    )
        .into_response();

    if let Some(origin) = cors_origin {
        apply_cors(response.headers_mut(), origin);
    }
    Ok(response)
}

/// Attach the CORS header set
pub fn apply_cors(headers: &mut HeaderMap, origin: &HeaderValue) {
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
}

/// Generic, non-envelope error page
pub fn error_page(status: StatusCode) -> Response {
    let code = status.as_u16();
    let reason = status.canonical_reason().unwrap_or("Unknown");
    let mut response = Html(format!(
        "<html><title>{code}: {reason}</title><body>{code}: {reason}</body></html>"
    ))
    .into_response();
    *response.status_mut() = status;
    response
}

//! Admin UI pages
//!
//! In development mode the UI bundle is read straight from disk. In
//! production a reverse proxy is expected to serve it, so every path gets a
//! page explaining how to configure one.

use std::path::{Component, Path as FsPath};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use super::router::{AppState, error_page};
use crate::Result;

const CSS_CONTENT_TYPE: &str = "text/css; charset=UTF-8";

/// GET /admin/{*path}
pub async fn admin_page_handler(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Result<Response> {
    serve_admin(&state, &path).await
}

/// GET /admin/
pub async fn admin_index_handler(State(state): State<Arc<AppState>>) -> Result<Response> {
    serve_admin(&state, "").await
}

async fn serve_admin(state: &AppState, path: &str) -> Result<Response> {
    if !state.dev_mode {
        return Ok(placeholder_page(&state.admin_path));
    }

    let relative = FsPath::new(path);
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        warn!(path = %path, "Refusing admin path outside the bundle");
        return Ok(error_page(StatusCode::NOT_FOUND));
    }

    // Missing files surface as an IO error (500), not a 404
    let bytes = tokio::fs::read(state.admin_path.join(relative)).await?;
    debug!(path = %path, size = bytes.len(), "Served admin asset");

    let mut response = Response::new(Body::from(bytes));
    if path.ends_with(".css") {
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(CSS_CONTENT_TYPE),
        );
    }
    Ok(response)
}

/// Production page pointing the operator at the reverse-proxy setup
pub fn placeholder_page(admin_path: &FsPath) -> Response {
    let dir = admin_path.display();
    let body = format!(
        "<h1>BGmi HTTP Service</h1>\
         <pre>Please modify your web server configure file\n\
         to server this path to '{dir}'.\n\
         e.g.\n\n\
         ...\n\
         location /admin {{\n    alias {dir};\n}}\n\
         ...\n</pre>"
    );
    ([(header::CONTENT_TYPE, "text/html")], body).into_response()
}

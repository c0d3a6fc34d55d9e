//! Action registry
//!
//! Two read-only tables built once per [`AppState`]: which actions answer
//! GET and which answer POST. A miss is an ordinary outcome; the router
//! decides what it means for each method.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::router::AppState;
use crate::action::Action;
use crate::controller::{
    AddRequest, ConfigRequest, DeleteRequest, DownloadRequest, SearchRequest,
};
use crate::envelope::{Envelope, Status};

/// Handler for a GET action
pub type GetHandler = fn(Arc<AppState>) -> BoxFuture<'static, Envelope>;

/// Handler for a POST action; fails if the arguments do not decode
pub type PostHandler =
    fn(Arc<AppState>, Map<String, Value>) -> BoxFuture<'static, serde_json::Result<Envelope>>;

/// GET and POST action tables
pub struct ActionRegistry {
    get: HashMap<Action, GetHandler>,
    post: HashMap<Action, PostHandler>,
}

impl ActionRegistry {
    /// Build the fixed action tables
    #[must_use]
    pub fn new() -> Self {
        let get: HashMap<Action, GetHandler> = HashMap::from([
            (Action::Cal, get_cal as GetHandler),
            (Action::Config, get_config as GetHandler),
        ]);

        let post: HashMap<Action, PostHandler> = HashMap::from([
            (Action::Add, post_add as PostHandler),
            (Action::Delete, post_delete as PostHandler),
            (Action::Search, post_search as PostHandler),
            (Action::Config, post_config as PostHandler),
            (Action::Download, post_download as PostHandler),
            (Action::Auth, post_auth as PostHandler),
        ]);

        Self { get, post }
    }

    /// Look up a GET action by its exact wire name
    #[must_use]
    pub fn get_handler(&self, name: &str) -> Option<GetHandler> {
        let action = name.parse::<Action>().ok()?;
        self.get.get(&action).copied()
    }

    /// Look up a POST action by its exact wire name
    #[must_use]
    pub fn post_handler(&self, name: &str) -> Option<PostHandler> {
        let action = name.parse::<Action>().ok()?;
        self.post.get(&action).copied()
    }

    /// Actions answering GET, in declaration order
    #[must_use]
    pub fn get_actions(&self) -> Vec<Action> {
        Action::ALL
            .into_iter()
            .filter(|a| self.get.contains_key(a))
            .collect()
    }

    /// Actions answering POST, in declaration order
    #[must_use]
    pub fn post_actions(&self) -> Vec<Action> {
        Action::ALL
            .into_iter()
            .filter(|a| self.post.contains_key(a))
            .collect()
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn decode<T: DeserializeOwned>(args: Map<String, Value>) -> serde_json::Result<T> {
    serde_json::from_value(Value::Object(args))
}

fn get_cal(state: Arc<AppState>) -> BoxFuture<'static, Envelope> {
    Box::pin(async move { state.controllers.cal().await })
}

fn get_config(state: Arc<AppState>) -> BoxFuture<'static, Envelope> {
    Box::pin(async move { state.controllers.config(ConfigRequest::default()).await })
}

fn post_add(
    state: Arc<AppState>,
    args: Map<String, Value>,
) -> BoxFuture<'static, serde_json::Result<Envelope>> {
    Box::pin(async move {
        let request: AddRequest = decode(args)?;
        Ok(state.controllers.add(request).await)
    })
}

fn post_delete(
    state: Arc<AppState>,
    args: Map<String, Value>,
) -> BoxFuture<'static, serde_json::Result<Envelope>> {
    Box::pin(async move {
        let request: DeleteRequest = decode(args)?;
        Ok(state.controllers.delete(request).await)
    })
}

fn post_search(
    state: Arc<AppState>,
    args: Map<String, Value>,
) -> BoxFuture<'static, serde_json::Result<Envelope>> {
    Box::pin(async move {
        let request: SearchRequest = decode(args)?;
        Ok(state.controllers.search(request).await)
    })
}

fn post_config(
    state: Arc<AppState>,
    args: Map<String, Value>,
) -> BoxFuture<'static, serde_json::Result<Envelope>> {
    Box::pin(async move {
        let request: ConfigRequest = decode(args)?;
        Ok(state.controllers.config(request).await)
    })
}

fn post_download(
    state: Arc<AppState>,
    args: Map<String, Value>,
) -> BoxFuture<'static, serde_json::Result<Envelope>> {
    Box::pin(async move {
        let request: DownloadRequest = decode(args)?;
        Ok(state.controllers.download_prepare(request).await)
    })
}

/// Arguments of the gateway-local `auth` action
#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct AuthRequest {
    #[serde(default)]
    token: String,
}

/// Token check used by the UI login form; answers `error` on mismatch.
fn post_auth(
    state: Arc<AppState>,
    args: Map<String, Value>,
) -> BoxFuture<'static, serde_json::Result<Envelope>> {
    Box::pin(async move {
        let request: AuthRequest = decode(args)?;
        let status = if state.auth.verify(&request.token) {
            Status::Success
        } else {
            Status::Error
        };
        Ok(Envelope::from_status(status))
    })
}

//! Admin gateway: action dispatch, auth gate, admin UI pages

mod admin_page;
pub mod auth;
pub mod registry;
mod router;
mod server;

pub use admin_page::placeholder_page;
pub use auth::{AdminAuth, TOKEN_HEADER, auth_middleware};
pub use registry::ActionRegistry;
pub use router::{AppState, JSON_CONTENT_TYPE, apply_cors, create_router, error_page};
pub use server::Gateway;

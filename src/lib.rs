//! BGmi Admin Gateway
//!
//! HTTP control surface for a BGmi installation.
//!
//! # Features
//!
//! - **Action dispatch**: `/api/{action}` routes `add`, `delete`, `search`,
//!   `cal`, `config`, `download` and `auth` to controllers
//! - **Token gate**: every action except `search`, `cal` and `auth` needs a
//!   `bgmi-token` header matching the admin token
//! - **Envelopes**: every answer is `{"status": "success" | "error", ...}`;
//!   an `error` envelope on POST is reported as 502
//! - **Admin UI**: served from disk in development mode, a reverse-proxy
//!   hint page otherwise

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod action;
pub mod cli;
pub mod config;
pub mod controller;
pub mod envelope;
pub mod error;
pub mod gateway;

pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => {
            subscriber
                .with(fmt::layer().json())
                .try_init()
                .map_err(|e| Error::Internal(e.to_string()))?;
        }
        _ => {
            subscriber
                .with(fmt::layer())
                .try_init()
                .map_err(|e| Error::Internal(e.to_string()))?;
        }
    }

    Ok(())
}

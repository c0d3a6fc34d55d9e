//! Controller seam
//!
//! The gateway never looks inside an operation: it decodes the request body
//! into the action's argument struct, calls the matching [`Controllers`]
//! method and forwards whatever [`Envelope`] comes back.
//!
//! Argument structs reject unknown fields so a typo in a client payload
//! fails before it reaches a controller.

mod memory;

pub use memory::{DEFAULT_MAX_QUEUE, MemoryControllers};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::envelope::Envelope;

/// Operations reachable through the admin API
#[async_trait]
pub trait Controllers: Send + Sync {
    /// Follow a bangumi
    async fn add(&self, request: AddRequest) -> Envelope;

    /// Unfollow one bangumi, or everything
    async fn delete(&self, request: DeleteRequest) -> Envelope;

    /// Search the catalogue
    async fn search(&self, request: SearchRequest) -> Envelope;

    /// Weekly calendar
    async fn cal(&self) -> Envelope;

    /// Read or write configuration
    async fn config(&self, request: ConfigRequest) -> Envelope;

    /// Queue episodes for download
    async fn download_prepare(&self, request: DownloadRequest) -> Envelope;
}

/// Arguments of `add`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddRequest {
    /// Bangumi name
    pub name: String,
    /// Episode to start from
    #[serde(default)]
    pub episode: Option<u32>,
}

/// Arguments of `delete`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteRequest {
    /// Bangumi name
    #[serde(default)]
    pub name: Option<String>,
    /// Unfollow everything
    #[serde(default)]
    pub clear_all: bool,
}

/// Arguments of `search`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchRequest {
    /// Case-insensitive keyword
    pub keyword: String,
    /// Maximum number of results
    #[serde(default = "default_search_count")]
    pub count: usize,
    /// Regular expression the name must match
    #[serde(default)]
    pub regex: Option<String>,
    /// Comma-separated substrings, any of which must appear in the name
    #[serde(default)]
    pub filter: Option<String>,
}

fn default_search_count() -> usize {
    3
}

/// Arguments of `config`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigRequest {
    /// Section to read or write
    #[serde(default)]
    pub section: Option<String>,
    /// Key within the section
    #[serde(default)]
    pub key: Option<String>,
    /// New value; reads when absent
    #[serde(default)]
    pub value: Option<String>,
}

/// Arguments of `download`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DownloadRequest {
    /// Episodes to queue
    #[serde(default)]
    pub data: Vec<DownloadItem>,
}

/// One episode to download
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DownloadItem {
    /// Bangumi name
    pub name: String,
    /// Release title
    pub title: String,
    /// Episode number
    pub episode: u32,
    /// Magnet or torrent link
    pub download: String,
}

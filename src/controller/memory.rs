//! Process-local controllers backed by the configured catalogue

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use parking_lot::RwLock;
use regex::Regex;
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use super::{
    AddRequest, ConfigRequest, Controllers, DeleteRequest, DownloadItem, DownloadRequest,
    SearchRequest,
};
use crate::config::{CatalogueEntry, Weekday};
use crate::envelope::Envelope;

type ConfigStore = BTreeMap<String, BTreeMap<String, String>>;

/// Default bound on queued download items
pub const DEFAULT_MAX_QUEUE: usize = 1000;

/// In-memory implementation of [`Controllers`]
///
/// Followed bangumi, configuration values and the download queue live for
/// the lifetime of the process.
#[derive(Debug)]
pub struct MemoryControllers {
    catalogue: Vec<CatalogueEntry>,
    max_queue: usize,
    /// Followed name -> starting episode
    followed: RwLock<BTreeMap<String, u32>>,
    config: RwLock<ConfigStore>,
    queue: RwLock<Vec<DownloadItem>>,
}

impl MemoryControllers {
    /// Create controllers over a catalogue
    #[must_use]
    pub fn new(catalogue: Vec<CatalogueEntry>) -> Self {
        Self {
            catalogue,
            ..Default::default()
        }
    }

    /// Bound the download queue; requests that would overflow it are refused
    #[must_use]
    pub fn with_max_queue(mut self, max_queue: usize) -> Self {
        self.max_queue = max_queue;
        self
    }

    /// Names currently followed
    #[must_use]
    pub fn followed(&self) -> Vec<String> {
        self.followed.read().keys().cloned().collect()
    }

    /// Items waiting in the download queue
    #[must_use]
    pub fn queued(&self) -> Vec<DownloadItem> {
        self.queue.read().clone()
    }

    fn in_catalogue(&self, name: &str) -> bool {
        self.catalogue.iter().any(|entry| entry.name == name)
    }
}

impl Default for MemoryControllers {
    fn default() -> Self {
        Self {
            catalogue: Vec::new(),
            max_queue: DEFAULT_MAX_QUEUE,
            followed: RwLock::default(),
            config: RwLock::default(),
            queue: RwLock::default(),
        }
    }
}

#[async_trait]
impl Controllers for MemoryControllers {
    async fn add(&self, request: AddRequest) -> Envelope {
        if !self.in_catalogue(&request.name) {
            return Envelope::error(format!("Bangumi {} does not exist", request.name));
        }

        let mut followed = self.followed.write();
        if followed.contains_key(&request.name) {
            return Envelope::error(format!("Bangumi {} has already been followed", request.name));
        }

        let episode = request.episode.unwrap_or(0);
        followed.insert(request.name.clone(), episode);
        info!(name = %request.name, episode, "Followed bangumi");
        Envelope::success().with("message", format!("{} has been followed", request.name))
    }

    async fn delete(&self, request: DeleteRequest) -> Envelope {
        let mut followed = self.followed.write();

        if request.clear_all {
            let count = followed.len();
            followed.clear();
            info!(count, "Unfollowed all bangumi");
            return Envelope::success()
                .with("message", format!("{count} bangumi have been unfollowed"));
        }

        let Some(name) = request.name else {
            return Envelope::error("name is required unless clear_all is set");
        };

        if followed.remove(&name).is_some() {
            info!(name = %name, "Unfollowed bangumi");
            Envelope::success().with("message", format!("{name} has been unfollowed"))
        } else {
            Envelope::error(format!("Bangumi {name} is not followed"))
        }
    }

    async fn search(&self, request: SearchRequest) -> Envelope {
        let pattern = match request.regex.as_deref().map(Regex::new).transpose() {
            Ok(p) => p,
            Err(e) => return Envelope::error(format!("Invalid regex: {e}")),
        };

        let keyword = request.keyword.to_lowercase();
        let filters: Vec<String> = request
            .filter
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|f| f.trim().to_lowercase())
            .filter(|f| !f.is_empty())
            .collect();

        let followed = self.followed.read();
        let results: Vec<Value> = self
            .catalogue
            .iter()
            .filter(|entry| {
                let name = entry.name.to_lowercase();
                name.contains(&keyword)
                    && pattern.as_ref().is_none_or(|re| re.is_match(&entry.name))
                    && (filters.is_empty() || filters.iter().any(|f| name.contains(f)))
            })
            .take(request.count)
            .map(|entry| {
                json!({
                    "name": entry.name,
                    "update_day": entry.update_day.as_str(),
                    "followed": followed.contains_key(&entry.name),
                })
            })
            .collect();

        debug!(keyword = %request.keyword, results = results.len(), "Catalogue search");
        Envelope::success().with("data", results)
    }

    async fn cal(&self) -> Envelope {
        let followed = self.followed.read();
        let mut week = Map::new();
        for day in Weekday::ALL {
            let entries: Vec<Value> = self
                .catalogue
                .iter()
                .filter(|entry| entry.update_day == day)
                .map(|entry| {
                    json!({
                        "name": entry.name,
                        "followed": followed.contains_key(&entry.name),
                    })
                })
                .collect();
            week.insert(day.as_str().to_string(), Value::Array(entries));
        }
        Envelope::success().with("data", week)
    }

    async fn config(&self, request: ConfigRequest) -> Envelope {
        let ConfigRequest {
            section,
            key,
            value,
        } = request;

        match (section, key, value) {
            (None, None, None) => {
                let store = self.config.read();
                Envelope::success().with("data", json!(*store))
            }
            (Some(section), None, None) => {
                let store = self.config.read();
                let values = store.get(&section).cloned().unwrap_or_default();
                Envelope::success().with("data", json!(values))
            }
            (Some(section), Some(key), None) => {
                let store = self.config.read();
                match store.get(&section).and_then(|s| s.get(&key)) {
                    Some(v) => Envelope::success().with("data", v.clone()),
                    None => Envelope::error(format!("{section}.{key} is not set")),
                }
            }
            (Some(section), Some(key), Some(value)) => {
                info!(section = %section, key = %key, "Updated configuration");
                self.config
                    .write()
                    .entry(section.clone())
                    .or_default()
                    .insert(key.clone(), value);
                Envelope::success().with("message", format!("{section}.{key} has been set"))
            }
            _ => Envelope::error("config requires a section before a key and a key before a value"),
        }
    }

    async fn download_prepare(&self, request: DownloadRequest) -> Envelope {
        if request.data.is_empty() {
            return Envelope::error("nothing to download");
        }

        let names: BTreeSet<&str> = request.data.iter().map(|i| i.name.as_str()).collect();
        debug!(bangumi = ?names, "Queueing downloads");

        let count = request.data.len();
        let mut queue = self.queue.write();
        if queue.len() + count > self.max_queue {
            warn!(
                queued = queue.len(),
                requested = count,
                max = self.max_queue,
                "Download queue is full"
            );
            return Envelope::error("download queue is full");
        }
        queue.extend(request.data);
        drop(queue);
        info!(count, "Queued downloads");
        Envelope::success().with("message", format!("{count} item(s) queued"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::Status;
    use pretty_assertions::assert_eq;

    fn catalogue() -> Vec<CatalogueEntry> {
        vec![
            CatalogueEntry {
                name: "Frieren".to_string(),
                update_day: Weekday::Fri,
            },
            CatalogueEntry {
                name: "Bocchi the Rock!".to_string(),
                update_day: Weekday::Sat,
            },
            CatalogueEntry {
                name: "Dungeon Meshi".to_string(),
                update_day: Weekday::Thu,
            },
            CatalogueEntry {
                name: "Dungeon People".to_string(),
                update_day: Weekday::Sun,
            },
        ]
    }

    fn add(name: &str) -> AddRequest {
        AddRequest {
            name: name.to_string(),
            episode: None,
        }
    }

    fn search(keyword: &str) -> SearchRequest {
        SearchRequest {
            keyword: keyword.to_string(),
            count: 3,
            regex: None,
            filter: None,
        }
    }

    fn names(envelope: &Envelope) -> Vec<String> {
        envelope.data["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["name"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_add_follows_catalogue_entry() {
        let controllers = MemoryControllers::new(catalogue());
        let envelope = controllers.add(add("Frieren")).await;
        assert_eq!(envelope.status, Status::Success);
        assert_eq!(controllers.followed(), vec!["Frieren".to_string()]);
    }

    #[tokio::test]
    async fn test_add_unknown_or_duplicate_fails() {
        let controllers = MemoryControllers::new(catalogue());
        assert!(controllers.add(add("Nope")).await.is_error());

        assert!(!controllers.add(add("Frieren")).await.is_error());
        let again = controllers.add(add("Frieren")).await;
        assert!(again.is_error());
        assert!(again.data["message"].as_str().unwrap().contains("already"));
    }

    #[tokio::test]
    async fn test_delete_single_and_clear_all() {
        let controllers = MemoryControllers::new(catalogue());
        controllers.add(add("Frieren")).await;
        controllers.add(add("Dungeon Meshi")).await;

        let removed = controllers
            .delete(DeleteRequest {
                name: Some("Frieren".to_string()),
                clear_all: false,
            })
            .await;
        assert!(!removed.is_error());
        assert_eq!(controllers.followed(), vec!["Dungeon Meshi".to_string()]);

        let missing = controllers
            .delete(DeleteRequest {
                name: Some("Frieren".to_string()),
                clear_all: false,
            })
            .await;
        assert!(missing.is_error());

        let cleared = controllers
            .delete(DeleteRequest {
                name: None,
                clear_all: true,
            })
            .await;
        assert!(!cleared.is_error());
        assert!(controllers.followed().is_empty());
    }

    #[tokio::test]
    async fn test_delete_without_name_fails() {
        let controllers = MemoryControllers::new(catalogue());
        assert!(controllers.delete(DeleteRequest::default()).await.is_error());
    }

    #[tokio::test]
    async fn test_search_keyword_is_case_insensitive() {
        let controllers = MemoryControllers::new(catalogue());
        let envelope = controllers.search(search("dungeon")).await;
        assert_eq!(names(&envelope), vec!["Dungeon Meshi", "Dungeon People"]);
    }

    #[tokio::test]
    async fn test_search_regex_filter_and_count() {
        let controllers = MemoryControllers::new(catalogue());

        let by_regex = controllers
            .search(SearchRequest {
                regex: Some("Meshi$".to_string()),
                ..search("dungeon")
            })
            .await;
        assert_eq!(names(&by_regex), vec!["Dungeon Meshi"]);

        let by_filter = controllers
            .search(SearchRequest {
                filter: Some("people, nothing".to_string()),
                ..search("")
            })
            .await;
        assert_eq!(names(&by_filter), vec!["Dungeon People"]);

        let capped = controllers
            .search(SearchRequest {
                count: 1,
                ..search("")
            })
            .await;
        assert_eq!(names(&capped).len(), 1);
    }

    #[tokio::test]
    async fn test_search_invalid_regex_is_error_envelope() {
        let controllers = MemoryControllers::new(catalogue());
        let envelope = controllers
            .search(SearchRequest {
                regex: Some("(".to_string()),
                ..search("")
            })
            .await;
        assert!(envelope.is_error());
    }

    #[tokio::test]
    async fn test_cal_groups_by_day_and_marks_followed() {
        let controllers = MemoryControllers::new(catalogue());
        controllers.add(add("Frieren")).await;

        let envelope = controllers.cal().await;
        let week = envelope.data["data"].as_object().unwrap();
        assert_eq!(week.len(), 7);
        assert_eq!(week["fri"], json!([{"name": "Frieren", "followed": true}]));
        assert_eq!(week["sat"], json!([{"name": "Bocchi the Rock!", "followed": false}]));
        assert_eq!(week["mon"], json!([]));
    }

    #[tokio::test]
    async fn test_config_set_and_read_back() {
        let controllers = MemoryControllers::new(vec![]);
        let set = controllers
            .config(ConfigRequest {
                section: Some("bgmi".to_string()),
                key: Some("MAX_PAGE".to_string()),
                value: Some("5".to_string()),
            })
            .await;
        assert!(!set.is_error());

        let single = controllers
            .config(ConfigRequest {
                section: Some("bgmi".to_string()),
                key: Some("MAX_PAGE".to_string()),
                value: None,
            })
            .await;
        assert_eq!(single.data["data"], json!("5"));

        let all = controllers.config(ConfigRequest::default()).await;
        assert_eq!(all.data["data"], json!({"bgmi": {"MAX_PAGE": "5"}}));
    }

    #[tokio::test]
    async fn test_config_missing_key_and_bad_shape() {
        let controllers = MemoryControllers::new(vec![]);
        let missing = controllers
            .config(ConfigRequest {
                section: Some("bgmi".to_string()),
                key: Some("NOPE".to_string()),
                value: None,
            })
            .await;
        assert!(missing.is_error());

        let keyless = controllers
            .config(ConfigRequest {
                section: None,
                key: Some("NOPE".to_string()),
                value: None,
            })
            .await;
        assert!(keyless.is_error());
    }

    #[tokio::test]
    async fn test_download_prepare_queues_items() {
        let controllers = MemoryControllers::new(catalogue());
        assert!(controllers.download_prepare(DownloadRequest::default()).await.is_error());

        let item = DownloadItem {
            name: "Frieren".to_string(),
            title: "[Sub] Frieren - 01 [1080p]".to_string(),
            episode: 1,
            download: "magnet:?xt=urn:btih:abc".to_string(),
        };
        let envelope = controllers
            .download_prepare(DownloadRequest {
                data: vec![item.clone()],
            })
            .await;
        assert_eq!(envelope.data["message"], json!("1 item(s) queued"));
        assert_eq!(controllers.queued(), vec![item]);
    }

    #[tokio::test]
    async fn test_download_queue_is_bounded() {
        let controllers = MemoryControllers::new(catalogue()).with_max_queue(2);
        let item = |episode| DownloadItem {
            name: "Frieren".to_string(),
            title: format!("[Sub] Frieren - {episode:02}"),
            episode,
            download: format!("magnet:?xt=urn:btih:{episode}"),
        };

        let first = controllers
            .download_prepare(DownloadRequest {
                data: vec![item(1)],
            })
            .await;
        assert!(!first.is_error());

        let overflow = controllers
            .download_prepare(DownloadRequest {
                data: vec![item(2), item(3)],
            })
            .await;
        assert!(overflow.is_error());
        assert_eq!(overflow.data["message"], json!("download queue is full"));
        assert_eq!(controllers.queued(), vec![item(1)]);

        let fits = controllers
            .download_prepare(DownloadRequest {
                data: vec![item(2)],
            })
            .await;
        assert!(!fits.is_error());
        assert_eq!(controllers.queued().len(), 2);
    }
}

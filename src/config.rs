//! Configuration management

use std::{env, path::Path, path::PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::controller::DEFAULT_MAX_QUEUE;
use crate::{Error, Result};

/// Token value that asks for a generated token
const AUTO_TOKEN: &str = "auto";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Admin surface configuration
    pub admin: AdminConfig,
    /// Bangumi known to the in-memory controllers
    pub catalogue: Vec<CatalogueEntry>,
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// # Errors
    ///
    /// Returns an error if the config file does not exist or cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        // BGMI_ADMIN_SERVER__PORT=9000 -> server.port
        figment = figment.merge(Env::prefixed("BGMI_ADMIN_").split("__"));

        let mut config: Self = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;

        // Legacy switch: any non-empty DEV turns on development mode
        if env::var_os("DEV").is_some_and(|v| !v.is_empty()) {
            config.admin.dev = true;
        }

        Ok(config)
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Maximum request body size (bytes)
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8888,
            max_body_size: 1024 * 1024,
        }
    }
}

/// Admin API and UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Shared admin token
    /// Supports: literal value, `env:VAR_NAME`, or `auto` (generates random token)
    pub token: String,
    /// Directory holding the admin UI bundle
    pub path: PathBuf,
    /// Development mode: permissive CORS and local asset serving
    pub dev: bool,
    /// Origin advertised in `Access-Control-Allow-Origin`
    pub cors_origin: String,
    /// Maximum number of items held in the download queue
    pub max_queue: usize,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            token: AUTO_TOKEN.to_string(),
            path: PathBuf::from("front_static"),
            dev: false,
            cors_origin: "http://localhost:8080".to_string(),
            max_queue: DEFAULT_MAX_QUEUE,
        }
    }
}

impl AdminConfig {
    /// Whether the token is generated at start-up
    #[must_use]
    pub fn is_auto_token(&self) -> bool {
        self.token == AUTO_TOKEN
    }

    /// Resolve the admin token (expand env vars, generate if `auto`)
    #[must_use]
    pub fn resolve_token(&self) -> String {
        if self.is_auto_token() {
            generate_token()
        } else if let Some(var_name) = self.token.strip_prefix("env:") {
            env::var(var_name).unwrap_or_else(|_| self.token.clone())
        } else {
            self.token.clone()
        }
    }
}

/// Generate a random admin token
#[must_use]
pub fn generate_token() -> String {
    use rand::Rng;
    let random_bytes: [u8; 32] = rand::rng().random();
    format!(
        "bgmi_{}",
        base64::Engine::encode(
            &base64::engine::general_purpose::URL_SAFE_NO_PAD,
            random_bytes
        )
    )
}

/// Day of the week a bangumi airs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    /// Monday
    Mon,
    /// Tuesday
    Tue,
    /// Wednesday
    Wed,
    /// Thursday
    Thu,
    /// Friday
    Fri,
    /// Saturday
    Sat,
    /// Sunday
    Sun,
}

impl Weekday {
    /// Every day, Monday first
    pub const ALL: [Self; 7] = [
        Self::Mon,
        Self::Tue,
        Self::Wed,
        Self::Thu,
        Self::Fri,
        Self::Sat,
        Self::Sun,
    ];

    /// Lowercase short name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mon => "mon",
            Self::Tue => "tue",
            Self::Wed => "wed",
            Self::Thu => "thu",
            Self::Fri => "fri",
            Self::Sat => "sat",
            Self::Sun => "sun",
        }
    }
}

/// Catalogue entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogueEntry {
    /// Bangumi name
    pub name: String,
    /// Airing day
    pub update_day: Weekday,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8888);
        assert!(config.admin.is_auto_token());
        assert!(!config.admin.dev);
        assert_eq!(config.admin.cors_origin, "http://localhost:8080");
        assert_eq!(config.admin.max_queue, 1000);
        assert!(config.catalogue.is_empty());
    }

    #[test]
    fn test_literal_token_is_kept() {
        let admin = AdminConfig {
            token: "s3cret".to_string(),
            ..Default::default()
        };
        assert_eq!(admin.resolve_token(), "s3cret");
    }

    #[test]
    fn test_env_token_falls_back_to_literal_when_unset() {
        let admin = AdminConfig {
            token: "env:BGMI_ADMIN_TEST_SURELY_UNSET_VAR".to_string(),
            ..Default::default()
        };
        assert_eq!(admin.resolve_token(), "env:BGMI_ADMIN_TEST_SURELY_UNSET_VAR");
    }

    #[test]
    fn test_auto_token_is_random() {
        let admin = AdminConfig::default();
        let first = admin.resolve_token();
        let second = admin.resolve_token();
        assert!(first.starts_with("bgmi_"));
        assert!(first.len() > 40);
        assert_ne!(first, second);
    }

    #[test]
    fn test_load_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("admin.yaml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            r"
server:
  port: 9001
admin:
  token: hunter2
  path: /srv/bgmi/front
  max_queue: 5
catalogue:
  - name: Frieren
    update_day: fri
"
        )
        .unwrap();
        drop(f);

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.server.port, 9001);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.admin.token, "hunter2");
        assert_eq!(config.admin.path, PathBuf::from("/srv/bgmi/front"));
        assert_eq!(config.admin.max_queue, 5);
        assert_eq!(config.catalogue.len(), 1);
        assert_eq!(config.catalogue[0].update_day, Weekday::Fri);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let err = Config::load(Some(Path::new("/nonexistent/bgmi-admin.yaml"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_catalogue_deserialized_from_yaml() {
        let yaml = r"
catalogue:
  - name: Bocchi the Rock!
    update_day: sat
  - name: 葬送のフリーレン
    update_day: fri
";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.catalogue.len(), 2);
        assert_eq!(config.catalogue[1].name, "葬送のフリーレン");
        assert_eq!(config.catalogue[0].update_day, Weekday::Sat);
    }
}

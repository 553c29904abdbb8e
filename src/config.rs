//! Process configuration from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `HOST` / `PORT` | `0.0.0.0` / `8080` |
//! | `STORAGE_BACKEND` | `gcs` (`gcs`, `local`, `memory`) |
//! | `PRESENTATIONS_BUCKET` | `presentations` |
//! | `STAGING_BUCKET` | unset |
//! | `LOCAL_STORE_ROOT` | `./store` |
//! | `PUBLIC_BASE_URL` | `https://storage.googleapis.com` |
//! | `GCS_API_BASE` | `https://storage.googleapis.com` |
//! | `GCS_ACCESS_TOKEN` | unset |
//! | `GCS_METADATA_TOKEN` | `false` |
//! | `FOOTER_TEXT` | `Project Update - Confidential` |
//! | `HEADER_IMAGE_PATH` / `BADGE_IMAGE_PATH` | unset |
//! | `SHARED_SECRET` | unset |
//! | `SINGLE_TIMEOUT_SECS` / `MULTI_TIMEOUT_SECS` | `60` / `120` |

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::render::{DeckService, LayoutSpec, SlideAssets};
use crate::server::AppState;
use crate::storage::gcs::DEFAULT_API_BASE;
use crate::storage::{
    ArtifactPublisher, GcsStore, ImageFetcher, LocalStore, MemoryStore, ObjectStore, StoreError,
    TokenSource,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} has an invalid value {value:?}: expected {expected}")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("failed to initialize storage: {0}")]
    Storage(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Gcs,
    Local,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gcs" => Ok(Self::Gcs),
            "local" => Ok(Self::Local),
            "memory" => Ok(Self::Memory),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: IpAddr,
    pub port: u16,
    pub storage_backend: StorageBackend,
    pub presentations_bucket: String,
    pub staging_bucket: Option<String>,
    pub local_store_root: PathBuf,
    pub public_base_url: String,
    pub gcs_api_base: String,
    pub gcs_access_token: Option<String>,
    pub gcs_metadata_token: bool,
    pub footer_text: String,
    pub header_image: Option<PathBuf>,
    pub badge_image: Option<PathBuf>,
    pub shared_secret: Option<String>,
    pub single_timeout: Duration,
    pub multi_timeout: Duration,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build settings from any variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let text = |var: &str, default: &str| get(var).unwrap_or_else(|| default.to_string());

        Ok(Self {
            host: parse(&get, "HOST", "an IP address")?.unwrap_or(IpAddr::from([0, 0, 0, 0])),
            port: parse(&get, "PORT", "a port number")?.unwrap_or(8080),
            storage_backend: parse(&get, "STORAGE_BACKEND", "gcs, local or memory")?
                .unwrap_or(StorageBackend::Gcs),
            presentations_bucket: text("PRESENTATIONS_BUCKET", "presentations"),
            staging_bucket: get("STAGING_BUCKET"),
            local_store_root: PathBuf::from(text("LOCAL_STORE_ROOT", "./store")),
            public_base_url: text("PUBLIC_BASE_URL", DEFAULT_API_BASE),
            gcs_api_base: text("GCS_API_BASE", DEFAULT_API_BASE),
            gcs_access_token: get("GCS_ACCESS_TOKEN"),
            gcs_metadata_token: parse_bool(&get, "GCS_METADATA_TOKEN")?.unwrap_or(false),
            footer_text: text("FOOTER_TEXT", SlideAssets::DEFAULT_FOOTER),
            header_image: get("HEADER_IMAGE_PATH").map(PathBuf::from),
            badge_image: get("BADGE_IMAGE_PATH").map(PathBuf::from),
            shared_secret: get("SHARED_SECRET"),
            single_timeout: Duration::from_secs(
                parse(&get, "SINGLE_TIMEOUT_SECS", "a number of seconds")?.unwrap_or(60),
            ),
            multi_timeout: Duration::from_secs(
                parse(&get, "MULTI_TIMEOUT_SECS", "a number of seconds")?.unwrap_or(120),
            ),
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn build_store(&self) -> Result<Arc<dyn ObjectStore>, ConfigError> {
        let store: Arc<dyn ObjectStore> = match self.storage_backend {
            StorageBackend::Gcs => {
                let tokens = match (&self.gcs_access_token, self.gcs_metadata_token) {
                    (Some(token), _) => TokenSource::Static(token.clone()),
                    (None, true) => TokenSource::metadata(),
                    (None, false) => TokenSource::None,
                };
                Arc::new(GcsStore::with_api_base(&self.gcs_api_base, tokens)?)
            },
            StorageBackend::Local => Arc::new(LocalStore::new(&self.local_store_root)),
            StorageBackend::Memory => Arc::new(MemoryStore::new()),
        };
        Ok(store)
    }

    pub fn slide_assets(&self) -> SlideAssets {
        SlideAssets {
            layout: LayoutSpec::STANDARD,
            footer_text: self.footer_text.clone(),
            header_image: self.header_image.clone(),
            badge_image: self.badge_image.clone(),
        }
    }

    pub fn deck_service(&self, store: Arc<dyn ObjectStore>) -> DeckService {
        DeckService::new(
            ImageFetcher::new(Arc::clone(&store), self.staging_bucket.clone()),
            ArtifactPublisher::new(store, &self.presentations_bucket, &self.public_base_url),
            self.slide_assets(),
        )
        .with_timeouts(self.single_timeout, self.multi_timeout)
    }

    /// Everything the router needs, backed by the configured store.
    pub fn app_state(&self) -> Result<AppState, ConfigError> {
        let service = self.deck_service(self.build_store()?);
        Ok(AppState::new(service, self.shared_secret.clone()))
    }
}

fn parse<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    expected: &'static str,
) -> Result<Option<T>, ConfigError> {
    get(var)
        .map(|value| {
            value.parse().map_err(|_| ConfigError::Invalid {
                var,
                value: value.clone(),
                expected,
            })
        })
        .transpose()
}

fn parse_bool(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<bool>, ConfigError> {
    get(var)
        .map(|value| match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid {
                var,
                value,
                expected: "a boolean",
            }),
        })
        .transpose()
}

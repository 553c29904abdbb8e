//! Validated rendering inputs and outputs.

use std::fmt;
use std::path::PathBuf;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Reference to an object in the image catalog, always in canonical form.
///
/// Built by [`super::url::canonicalize`], which folds every accepted alias of
/// the same object into one `gs://bucket/key` value, so equality on
/// `ImageRef` is equality on the underlying object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRef {
    bucket: String,
    key: String,
}

impl ImageRef {
    pub(crate) fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Lower-cased file extension of the key, if it looks like one.
    pub fn extension(&self) -> Option<String> {
        let file = self.key.rsplit('/').next()?;
        let (_, ext) = file.rsplit_once('.')?;
        if ext.is_empty() || ext.len() > 5 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gs://{}/{}", self.bucket, self.key)
    }
}

/// An image plus the label shown above it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionedImage {
    pub image: ImageRef,
    pub caption: String,
}

/// Where the logo comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoSource {
    /// Fetched from the object store.
    Remote(ImageRef),
    /// Local file used verbatim, without a fetch.
    Local(PathBuf),
}

/// Normalized input for exactly one slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRender {
    pub title: String,
    pub customer_name: Option<String>,
    pub logo: Option<LogoSource>,
    /// Bullet lines, already prefixed with the bullet glyph.
    pub bullets: Vec<String>,
    pub images: Vec<CaptionedImage>,
    pub include_quality_badge: bool,
}

impl ProjectRender {
    /// Case-insensitive ordering key used by multi-slide decks.
    pub fn sort_key(&self) -> String {
        self.customer_name
            .as_deref()
            .unwrap_or_default()
            .to_lowercase()
    }

    /// Name given to the rendered slide: the customer, or the title when
    /// there is no customer.
    pub fn slide_name(&self) -> &str {
        self.customer_name.as_deref().unwrap_or(&self.title)
    }
}

/// Output shape of a rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeckMode {
    Single,
    Multi,
}

impl DeckMode {
    /// Prefix of generated artifact filenames.
    pub fn filename_prefix(&self) -> &'static str {
        match self {
            Self::Single => "presentation",
            Self::Multi => "multi_slide_presentation",
        }
    }
}

/// Single- or multi-slide request envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeckRequest {
    Single(ProjectRender),
    /// Already in customer order.
    Multi(Vec<ProjectRender>),
}

impl DeckRequest {
    pub fn mode(&self) -> DeckMode {
        match self {
            Self::Single(_) => DeckMode::Single,
            Self::Multi(_) => DeckMode::Multi,
        }
    }

    pub fn projects(&self) -> &[ProjectRender] {
        match self {
            Self::Single(project) => std::slice::from_ref(project),
            Self::Multi(projects) => projects,
        }
    }
}

/// A normalized request plus the caller-chosen artifact name, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderJob {
    pub deck: DeckRequest,
    pub filename: Option<String>,
}

/// The rendered `.pptx` and the name it is published under.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub filename: String,
    pub bytes: Bytes,
}

impl Artifact {
    pub fn new(filename: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// `<mode>_<YYYYMMDD_HHMMSS>.pptx`
    pub fn timestamped_name(mode: DeckMode, at: DateTime<Utc>) -> String {
        format!(
            "{}_{}.pptx",
            mode.filename_prefix(),
            at.format("%Y%m%d_%H%M%S")
        )
    }

    /// Object key under which the artifact is published.
    pub fn key(&self) -> String {
        format!("presentations/{}", self.filename)
    }
}

/// Where a published artifact lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactLocation {
    pub bucket: String,
    pub key: String,
    pub url: String,
}

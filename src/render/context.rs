//! Per-process assets and per-request scratch state.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use super::layout::LayoutSpec;
use crate::storage::fetch::ImageFetcher;

/// Static inputs shared by every slide.
#[derive(Debug, Clone)]
pub struct SlideAssets {
    pub layout: LayoutSpec,
    pub footer_text: String,
    /// Banner image for the header band.
    pub header_image: Option<PathBuf>,
    /// Quality badge image placed beside the logo.
    pub badge_image: Option<PathBuf>,
}

impl SlideAssets {
    pub const DEFAULT_FOOTER: &'static str = "Project Update - Confidential";
}

impl Default for SlideAssets {
    fn default() -> Self {
        Self {
            layout: LayoutSpec::STANDARD,
            footer_text: Self::DEFAULT_FOOTER.to_string(),
            header_image: None,
            badge_image: None,
        }
    }
}

/// State owned by one rendering request.
///
/// Fetched images and the written deck live in `scratch`, which is removed
/// when the context drops, whether the request succeeded or not.
#[derive(Debug)]
pub struct RenderContext {
    fetcher: ImageFetcher,
    assets: Arc<SlideAssets>,
    scratch: TempDir,
}

impl RenderContext {
    pub fn new(fetcher: ImageFetcher, assets: Arc<SlideAssets>) -> io::Result<Self> {
        let scratch = tempfile::Builder::new().prefix("slidegen-").tempdir()?;
        Ok(Self {
            fetcher,
            assets,
            scratch,
        })
    }

    pub fn fetcher(&self) -> &ImageFetcher {
        &self.fetcher
    }

    pub fn assets(&self) -> &Arc<SlideAssets> {
        &self.assets
    }

    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }
}

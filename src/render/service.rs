//! End-to-end rendering: materialize, compose, publish.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{Instant, timeout_at};
use tracing::info;

use super::context::{RenderContext, SlideAssets};
use super::deck::DeckAssembler;
use super::model::{Artifact, ArtifactLocation, DeckMode, RenderJob};
use super::normalize::materialize;
use crate::error::{DeckError, Phase, Result};
use crate::ooxml::OoxmlError;
use crate::storage::{ArtifactPublisher, ImageFetcher};

pub const DEFAULT_SINGLE_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_MULTI_TIMEOUT: Duration = Duration::from_secs(120);

/// A published deck.
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    pub location: ArtifactLocation,
    pub filename: String,
    pub slide_count: usize,
}

/// Renders validated jobs into published decks.
///
/// Each call gets its own scratch directory; concurrent renders share
/// nothing but the read-only assets and the store clients.
#[derive(Debug, Clone)]
pub struct DeckService {
    fetcher: ImageFetcher,
    publisher: ArtifactPublisher,
    assets: Arc<SlideAssets>,
    single_timeout: Duration,
    multi_timeout: Duration,
}

impl DeckService {
    pub fn new(fetcher: ImageFetcher, publisher: ArtifactPublisher, assets: SlideAssets) -> Self {
        Self {
            fetcher,
            publisher,
            assets: Arc::new(assets),
            single_timeout: DEFAULT_SINGLE_TIMEOUT,
            multi_timeout: DEFAULT_MULTI_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, single: Duration, multi: Duration) -> Self {
        self.single_timeout = single;
        self.multi_timeout = multi;
        self
    }

    pub fn assets(&self) -> &SlideAssets {
        &self.assets
    }

    pub fn timeout_for(&self, mode: DeckMode) -> Duration {
        match mode {
            DeckMode::Single => self.single_timeout,
            DeckMode::Multi => self.multi_timeout,
        }
    }

    /// Render and publish one job under a single deadline covering all
    /// phases.
    pub async fn render(&self, job: RenderJob) -> Result<RenderOutcome> {
        let started = Instant::now();
        let mode = job.deck.mode();
        let deadline = started + self.timeout_for(mode);
        let ctx = RenderContext::new(self.fetcher.clone(), Arc::clone(&self.assets))?;

        let resolved = timeout_at(deadline, materialize(&job.deck, &ctx))
            .await
            .map_err(|_| DeckError::Timeout {
                phase: Phase::FetchingImages,
            })?;

        let assets = Arc::clone(&self.assets);
        let scratch = ctx.scratch_dir().to_path_buf();
        let created = Utc::now();
        let compose = tokio::task::spawn_blocking(move || {
            let assembler = DeckAssembler::new(&assets);
            let pres = assembler.assemble(mode, &resolved, created);
            let bytes = assembler.write(&pres, &scratch)?;
            Ok::<_, OoxmlError>((bytes, pres.slide_count()))
        });
        let (bytes, slide_count) = timeout_at(deadline, compose)
            .await
            .map_err(|_| DeckError::Timeout {
                phase: Phase::Composing,
            })???;

        let filename = job
            .filename
            .unwrap_or_else(|| Artifact::timestamped_name(mode, Utc::now()));
        let artifact = Artifact::new(filename, bytes);
        let location = timeout_at(deadline, self.publisher.publish(&artifact))
            .await
            .map_err(|_| DeckError::Timeout {
                phase: Phase::Publishing,
            })??;

        info!(
            mode = ?mode,
            slides = slide_count,
            filename = %artifact.filename,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "rendered presentation"
        );
        Ok(RenderOutcome {
            location,
            filename: artifact.filename,
            slide_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::pptx::inspect;
    use crate::render::normalize::{normalize_multi, normalize_single};
    use crate::render::request::{ImageData, MultiSlideRequest, SlideRequest};
    use crate::storage::{MemoryStore, ObjectStore, PublishError, StoreError};
    use bytes::Bytes;
    use assert_matches::assert_matches;
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        image::RgbImage::from_pixel(width, height, image::Rgb([10, 120, 200]))
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    fn service(store: &Arc<MemoryStore>) -> DeckService {
        DeckService::new(
            ImageFetcher::new(store.clone(), None),
            ArtifactPublisher::new(store.clone(), "presentations", "https://storage.googleapis.com"),
            SlideAssets::default(),
        )
    }

    fn slide(title: &str) -> SlideRequest {
        SlideRequest {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_single_render_publishes_timestamped_deck() {
        let store = Arc::new(MemoryStore::new());
        let outcome = service(&store)
            .render(normalize_single(&slide("Q3 Review")).unwrap())
            .await
            .unwrap();

        assert!(outcome.filename.starts_with("presentation_"));
        assert_eq!(outcome.slide_count, 1);
        assert_eq!(outcome.location.key, format!("presentations/{}", outcome.filename));

        let bytes = store.object("presentations", &outcome.location.key).unwrap();
        let summary = inspect(&bytes).unwrap();
        assert_eq!(summary.slides[0].shape("Project Title").unwrap().text, "Q3 Review");
    }

    #[tokio::test]
    async fn test_same_image_is_stored_once() {
        let store = Arc::new(MemoryStore::new());
        store.insert("anderson_images", "project_images/site.png", png(40, 30));
        let image = |url: &str| ImageData {
            gcs_url: url.into(),
            title: None,
        };
        let request = SlideRequest {
            image_data: Some(vec![
                image("gs://anderson_images/project_images/site.png"),
                image("https://storage.cloud.google.com/anderson_images/project_images/site.png?authuser=0"),
            ]),
            filename: Some("dedupe".into()),
            ..slide("T")
        };

        let outcome = service(&store)
            .render(normalize_single(&request).unwrap())
            .await
            .unwrap();
        assert_eq!(outcome.filename, "dedupe.pptx");

        let summary = inspect(&store.object("presentations", "presentations/dedupe.pptx").unwrap()).unwrap();
        let slide = &summary.slides[0];
        assert_eq!(
            slide.shape("Image 1").unwrap().image,
            slide.shape("Image 2").unwrap().image
        );
        assert_eq!(summary.media_count, 1);
    }

    #[tokio::test]
    async fn test_multi_render_orders_by_customer() {
        let store = Arc::new(MemoryStore::new());
        let project = |title: &str, customer: &str| SlideRequest {
            customer_name: Some(customer.into()),
            ..slide(title)
        };
        let job = normalize_multi(&MultiSlideRequest {
            projects: vec![
                project("w", "Walmart"),
                project("t", "Target"),
                project("s", "Sam's Club"),
            ],
            filename: None,
        })
        .unwrap();

        let outcome = service(&store).render(job).await.unwrap();
        assert!(outcome.filename.starts_with("multi_slide_presentation_"));
        assert_eq!(outcome.slide_count, 3);

        let summary = inspect(&store.object("presentations", &outcome.location.key).unwrap()).unwrap();
        let titles: Vec<_> = summary
            .slides
            .iter()
            .map(|s| s.shape("Project Title").unwrap().text.as_str())
            .collect();
        assert_eq!(titles, vec!["s", "t", "w"]);
    }

    #[tokio::test]
    async fn test_publish_failure_surfaces() {
        let store = Arc::new(MemoryStore::new());
        store.reject_writes("presentations");
        let err = service(&store)
            .render(normalize_single(&slide("T")).unwrap())
            .await
            .unwrap_err();
        assert_matches!(
            err,
            DeckError::Publish(PublishError {
                source: StoreError::Rejected { status: 403, .. },
                ..
            })
        );
    }

    #[derive(Debug)]
    struct StalledStore;

    #[async_trait::async_trait]
    impl ObjectStore for StalledStore {
        async fn get(&self, _bucket: &str, _key: &str) -> Result<Bytes, StoreError> {
            std::future::pending().await
        }

        async fn put(&self, _: &str, _: &str, _: Bytes, _: &str) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_stalled_fetch_times_out() {
        let store: Arc<dyn ObjectStore> = Arc::new(StalledStore);
        let service = DeckService::new(
            ImageFetcher::new(store.clone(), None),
            ArtifactPublisher::new(store, "presentations", "https://x"),
            SlideAssets::default(),
        )
        .with_timeouts(Duration::from_millis(50), Duration::from_millis(50));
        let request = SlideRequest {
            logo_gcs_url: Some("gs://b/logo.png".into()),
            ..slide("T")
        };

        let err = service
            .render(normalize_single(&request).unwrap())
            .await
            .unwrap_err();
        assert_matches!(
            err,
            DeckError::Timeout {
                phase: Phase::FetchingImages
            }
        );
        assert_eq!(err.to_string(), "timed out while fetching images");
    }
}

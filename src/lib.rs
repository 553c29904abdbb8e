//! Slidegen - project-update decks as a service
//!
//! This library renders structured project data (title, customer logo,
//! bullet text, captioned images, an optional quality badge) into
//! PowerPoint `.pptx` decks and publishes them to an object store.
//!
//! # Features
//!
//! - **Deterministic layout**: every slide follows one fixed 16:9 layout
//! - **Aspect-preserving images**: logos, badges and photos are never distorted
//! - **Partial failure tolerance**: unreachable images become labelled placeholders
//! - **Multi-slide decks**: one slide per project, ordered by customer
//! - **Pluggable storage**: Cloud Storage, a local directory, or memory
//! - **Deck inspection**: read produced decks back into a typed summary
//!
//! # Example - Rendering a deck in-process
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use slidegen::render::normalize::normalize_single;
//! use slidegen::render::{DeckService, SlideAssets, SlideRequest};
//! use slidegen::storage::{ArtifactPublisher, ImageFetcher, LocalStore, ObjectStore};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store: Arc<dyn ObjectStore> = Arc::new(LocalStore::new("./store"));
//! let service = DeckService::new(
//!     ImageFetcher::new(Arc::clone(&store), None),
//!     ArtifactPublisher::new(store, "presentations", "http://localhost:8080"),
//!     SlideAssets::default(),
//! );
//!
//! let request = SlideRequest {
//!     title: Some("Q3 Review".into()),
//!     ..Default::default()
//! };
//! let outcome = service.render(normalize_single(&request)?).await?;
//! println!("{}", outcome.location.url);
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Inspecting a deck
//!
//! ```no_run
//! use slidegen::ooxml::pptx::DeckSummary;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bytes = std::fs::read("presentation.pptx")?;
//! let summary = DeckSummary::from_bytes(&bytes)?;
//! for slide in &summary.slides {
//!     println!("{:?}: {:?}", slide.name, slide.shape_names());
//! }
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod client;
pub mod common;
pub mod config;
pub mod error;
pub mod ooxml;
pub mod render;
pub mod server;
pub mod storage;

pub use error::{DeckError, Phase};
pub use render::{DeckService, GenerateResponse, MultiSlideRequest, SlideRequest};

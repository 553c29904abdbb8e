//! Presentation rendering engine.
//!
//! Requests flow through this module in a fixed order: wire shapes are
//! validated and normalized into [`model::ProjectRender`]s, their images are
//! materialized into a per-request scratch directory, every project becomes
//! one slide, and the deck is handed to the artifact publisher.

pub mod compose;
pub mod context;
pub mod deck;
pub mod layout;
pub mod model;
pub mod normalize;
pub mod request;
pub mod service;
pub mod url;

pub use context::{RenderContext, SlideAssets};
pub use layout::{LayoutSpec, fit_within};
pub use model::{
    Artifact, ArtifactLocation, CaptionedImage, DeckMode, DeckRequest, ImageRef, LogoSource,
    ProjectRender, RenderJob,
};
pub use request::{GenerateResponse, ImageData, MultiSlideRequest, SlideRequest, TextContent};
pub use service::{DeckService, RenderOutcome};

/// A request that fails a shape or invariant check.
///
/// The message is shown to the client verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

//! Mutable presentation writer components for PPTX.

pub mod pres;
pub(crate) mod relmap;
pub mod shape;
pub mod slide;

// Re-export main types
pub use pres::{MutablePresentation, WIDESCREEN_HEIGHT, WIDESCREEN_WIDTH};
pub use shape::{Frame, Geometry, MutableShape};
pub use slide::MutableSlide;

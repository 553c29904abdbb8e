//! PowerPoint (.pptx) presentation support.
//!
//! The writer builds decks shape by shape and serializes them through the
//! OPC layer. [`inspect`] reads a produced deck back into a summary.
//!
//! # Example
//!
//! ```rust
//! use slidegen::ooxml::pptx::{MutablePresentation, TextAlign, inspect};
//!
//! let mut pres = MutablePresentation::widescreen();
//! let slide = pres.add_slide();
//! slide.set_name("Weekly");
//! slide
//!     .add_text_box("Status", 914400, 914400, 4572000, 457200)
//!     .set_name("Headline")
//!     .align(TextAlign::Center);
//!
//! let summary = inspect(&pres.to_bytes()?)?;
//! assert_eq!(summary.slides[0].shape("Headline").unwrap().text, "Status");
//! # Ok::<(), slidegen::ooxml::OoxmlError>(())
//! ```

pub mod format;
pub mod inspect;
pub mod template;
pub mod writer;

pub use format::{ImageFormat, TextAlign, TextAnchor, TextFormat};
pub use inspect::{DeckSummary, ShapeKind, ShapeSummary, SlideSummary, inspect};
pub use writer::{Frame, MutablePresentation, MutableShape, MutableSlide};

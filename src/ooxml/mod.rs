//! Office Open XML (OOXML) support.
//!
//! Only what a presentation generator needs: the Open Packaging Conventions
//! layer and a PresentationML writer, plus a small reader that inspects
//! produced decks.
//!
//! 1. **OPC Layer** (`opc`): package handling (ZIP, parts, relationships)
//! 2. **PresentationML** (`pptx`): slides, shapes, pictures and text
//!
//! # Example
//!
//! ```rust,no_run
//! use slidegen::ooxml::pptx::MutablePresentation;
//!
//! let mut pres = MutablePresentation::widescreen();
//! let slide = pres.add_slide();
//! slide.add_text_box("Hello", 914400, 914400, 4572000, 457200);
//! pres.save("hello.pptx")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod error;
pub mod opc;
pub mod pptx;

// Re-export commonly used types from OPC layer
pub use opc::{OpcPackage, PackURI};

// Re-export error types
pub use error::{OoxmlError, Result};

/// Open Packaging Conventions (OPC) implementation.
///
/// The write half of the OPC specification, which defines the structure and
/// packaging format of Office Open XML documents:
///
/// - Package structure (parts, relationships)
/// - Content type management (`[Content_Types].xml`)
/// - ZIP-based physical packaging
///
/// Parts and relationships keep insertion order so that the same input always
/// produces the same archive layout.
pub mod constants;
pub mod error;
pub mod package;
pub mod packuri;
pub mod part;
pub mod phys_pkg;
pub mod pkgwriter;
pub mod rel;

// Re-export commonly used types
pub use package::OpcPackage;
pub use packuri::PackURI;
pub use part::{BlobPart, Part};
pub use pkgwriter::PackageWriter;
pub use rel::{Relationship, Relationships};

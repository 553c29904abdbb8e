use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::rel::Relationships;
/// Open Packaging Convention (OPC) objects related to package parts.
///
/// Parts are the fundamental units of content in an OPC package, each with a
/// unique partname, content type, and optional relationships.
use std::sync::Arc;

/// Trait representing a part in an OPC package.
pub trait Part: Send + Sync {
    /// Get the partname of this part.
    fn partname(&self) -> &PackURI;

    /// Get the content type of this part.
    fn content_type(&self) -> &str;

    /// Get the binary content of this part.
    fn blob(&self) -> &[u8];

    /// Get the relationships for this part.
    fn rels(&self) -> &Relationships;

    /// Get mutable access to the relationships for this part.
    fn rels_mut(&mut self) -> &mut Relationships;

    /// Add or get a relationship to another part.
    ///
    /// The target is given as an absolute partname and stored relative to this
    /// part's directory. Returns the rId.
    fn relate_to(&mut self, target: &PackURI, reltype: &str) -> String {
        let target_ref = target.relative_ref(self.partname().base_uri());
        self.rels_mut().get_or_add(reltype, &target_ref).r_id().to_string()
    }
}

/// A part that stores its content as an opaque byte blob.
///
/// Every part the presentation writer emits (XML or media) is a `BlobPart`.
/// XML parts that reference their own relationships are created empty,
/// related, and then filled with [`BlobPart::set_blob`].
#[derive(Debug)]
pub struct BlobPart {
    /// The partname (URI) of this part
    partname: PackURI,

    /// The content type of this part
    content_type: String,

    /// The binary content of this part (shared via Arc so media can be reused)
    blob: Arc<Vec<u8>>,

    /// Relationships from this part to other parts
    rels: Relationships,
}

impl BlobPart {
    /// Create a new BlobPart.
    pub fn new(partname: PackURI, content_type: impl Into<String>, blob: Vec<u8>) -> Self {
        Self::shared(partname, content_type, Arc::new(blob))
    }

    /// Create a BlobPart over an already shared buffer.
    pub fn shared(partname: PackURI, content_type: impl Into<String>, blob: Arc<Vec<u8>>) -> Self {
        Self {
            partname,
            content_type: content_type.into(),
            blob,
            rels: Relationships::new(),
        }
    }

    /// Replace the content of this part.
    pub fn set_blob(&mut self, blob: Vec<u8>) {
        self.blob = Arc::new(blob);
    }
}

impl Part for BlobPart {
    fn partname(&self) -> &PackURI {
        &self.partname
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn blob(&self) -> &[u8] {
        &self.blob
    }

    fn rels(&self) -> &Relationships {
        &self.rels
    }

    fn rels_mut(&mut self) -> &mut Relationships {
        &mut self.rels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relate_to_uses_relative_target() {
        let mut slide = BlobPart::new(
            PackURI::new("/ppt/slides/slide1.xml").unwrap(),
            "application/xml",
            b"<p:sld/>".to_vec(),
        );
        let layout = PackURI::new("/ppt/slideLayouts/slideLayout1.xml").unwrap();

        let r_id = slide.relate_to(&layout, "layout");
        assert_eq!(r_id, "rId1");
        assert_eq!(
            slide.rels().get("rId1").unwrap().target_ref(),
            "../slideLayouts/slideLayout1.xml"
        );
        // Relating twice reuses the relationship
        assert_eq!(slide.relate_to(&layout, "layout"), "rId1");
    }
}

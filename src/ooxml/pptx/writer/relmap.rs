/// Media bookkeeping for deck serialization.
///
/// Picture bytes are interned by SHA-256 digest so identical images share
/// one `/ppt/media` part. Each picture's slide-level relationship ID is
/// recorded here before the slide XML is generated.
use std::collections::HashMap;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::error::OpcError;
use crate::ooxml::opc::{BlobPart, PackURI};
use crate::ooxml::pptx::ImageFormat;

#[derive(Debug, Default)]
pub(crate) struct MediaRegistry {
    parts: Vec<BlobPart>,
    by_digest: HashMap<[u8; 32], PackURI>,
    /// (slide index, picture index within the slide) to relationship ID
    picture_rels: HashMap<(usize, usize), String>,
}

impl MediaRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Media part name for `data`, adding a part the first time these bytes
    /// are seen.
    pub(crate) fn intern(&mut self, data: &Arc<Vec<u8>>, format: ImageFormat) -> Result<PackURI> {
        let digest: [u8; 32] = Sha256::digest(data.as_slice()).into();
        if let Some(uri) = self.by_digest.get(&digest) {
            return Ok(uri.clone());
        }

        let name = format!("/ppt/media/image{}.{}", self.parts.len() + 1, format.extension());
        let uri = PackURI::new(&name).map_err(|e| OoxmlError::Opc(OpcError::InvalidPackUri(e)))?;
        self.parts
            .push(BlobPart::shared(uri.clone(), format.mime_type(), Arc::clone(data)));
        self.by_digest.insert(digest, uri.clone());
        Ok(uri)
    }

    pub(crate) fn bind(&mut self, slide: usize, picture: usize, rel_id: String) {
        self.picture_rels.insert((slide, picture), rel_id);
    }

    pub(crate) fn picture_rel(&self, slide: usize, picture: usize) -> Option<&str> {
        self.picture_rels.get(&(slide, picture)).map(String::as_str)
    }

    pub(crate) fn media_count(&self) -> usize {
        self.parts.len()
    }

    pub(crate) fn into_parts(self) -> Vec<BlobPart> {
        self.parts
    }
}

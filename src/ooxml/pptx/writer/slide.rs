/// Slide types and implementation for PPTX presentations.
use std::fmt::Write as FmtWrite;
use std::sync::Arc;

use crate::common::xml::escape_xml;
use crate::ooxml::error::{OoxmlError, Result};

// Import shared format types
use super::super::format::ImageFormat;
use super::relmap::MediaRegistry;
use super::shape::{Frame, Geometry, MutableShape};

/// A mutable slide in a presentation.
#[derive(Debug, Clone)]
pub struct MutableSlide {
    /// Slide ID (unique identifier)
    pub(crate) slide_id: u32,
    /// Slide name written to `p:cSld/@name`
    pub(crate) name: Option<String>,
    /// Shapes on the slide, in z-order
    pub(crate) shapes: Vec<MutableShape>,
}

impl MutableSlide {
    /// Create a new empty slide.
    pub(crate) fn new(slide_id: u32) -> Self {
        Self {
            slide_id,
            name: None,
            shapes: Vec::new(),
        }
    }

    /// Get the slide ID.
    pub fn slide_id(&self) -> u32 {
        self.slide_id
    }

    /// Set the slide name.
    pub fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    // IDs: 1=group, 2+=shapes
    fn next_shape_id(&self) -> u32 {
        (self.shapes.len() + 2) as u32
    }

    fn push(&mut self, shape: MutableShape) -> &mut MutableShape {
        let index = self.shapes.len();
        self.shapes.push(shape);
        &mut self.shapes[index]
    }

    /// Add a text box to the slide.
    pub fn add_text_box(
        &mut self,
        text: &str,
        x: i64,
        y: i64,
        width: i64,
        height: i64,
    ) -> &mut MutableShape {
        let shape = MutableShape::new_text_box(
            self.next_shape_id(),
            text,
            Frame::new(x, y, width, height),
        );
        self.push(shape)
    }

    /// Add a rectangle to the slide.
    pub fn add_rectangle(
        &mut self,
        x: i64,
        y: i64,
        width: i64,
        height: i64,
        fill_color: Option<String>,
    ) -> &mut MutableShape {
        self.add_auto_shape(Geometry::Rect, Frame::new(x, y, width, height), fill_color)
    }

    /// Add a rounded rectangle to the slide.
    pub fn add_rounded_rectangle(
        &mut self,
        x: i64,
        y: i64,
        width: i64,
        height: i64,
        fill_color: Option<String>,
    ) -> &mut MutableShape {
        self.add_auto_shape(
            Geometry::RoundRect,
            Frame::new(x, y, width, height),
            fill_color,
        )
    }

    fn add_auto_shape(
        &mut self,
        geometry: Geometry,
        frame: Frame,
        fill_color: Option<String>,
    ) -> &mut MutableShape {
        let shape =
            MutableShape::new_auto_shape(self.next_shape_id(), geometry, frame, fill_color);
        self.push(shape)
    }

    /// Add a picture to the slide from bytes.
    ///
    /// The buffer is shared, so the same image placed twice is stored once.
    pub fn add_picture_from_bytes(
        &mut self,
        data: Arc<Vec<u8>>,
        x: i64,
        y: i64,
        width: i64,
        height: i64,
        description: Option<String>,
    ) -> Result<&mut MutableShape> {
        let format = ImageFormat::detect_from_bytes(&data)
            .ok_or_else(|| OoxmlError::InvalidFormat("Unknown image format".to_string()))?;

        let desc = description.unwrap_or_else(|| "Picture".to_string());
        let shape = MutableShape::new_picture(
            self.next_shape_id(),
            data,
            format,
            Frame::new(x, y, width, height),
            desc,
        );
        Ok(self.push(shape))
    }

    /// Get the number of shapes.
    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    pub fn shapes(&self) -> &[MutableShape] {
        &self.shapes
    }

    /// Find a shape by its name.
    pub fn shape_by_name(&self, name: &str) -> Option<&MutableShape> {
        self.shapes.iter().find(|s| s.name() == name)
    }

    /// Collect all images from this slide, in shape order.
    pub(crate) fn collect_images(&self) -> Vec<(&Arc<Vec<u8>>, ImageFormat)> {
        self.shapes
            .iter()
            .filter_map(|shape| shape.get_image_data())
            .collect()
    }

    /// Generate slide XML content.
    #[cfg(test)]
    pub(crate) fn to_xml(&self) -> Result<String> {
        self.to_xml_with_rels(None, None)
    }

    /// Generate slide XML, taking picture relationship IDs from `media`.
    pub(crate) fn to_xml_with_rels(
        &self,
        slide_index: Option<usize>,
        media: Option<&MediaRegistry>,
    ) -> Result<String> {
        let mut xml = String::with_capacity(4096);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);

        xml.push_str(
            r#"<p:sld xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" "#,
        );
        xml.push_str(r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#);
        xml.push_str(
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
        );

        match &self.name {
            Some(name) => write!(xml, r#"<p:cSld name="{}">"#, escape_xml(name))?,
            None => xml.push_str("<p:cSld>"),
        }

        xml.push_str("<p:spTree>");

        // Write group shape properties (required)
        xml.push_str("<p:nvGrpSpPr>");
        xml.push_str(r#"<p:cNvPr id="1" name=""/>"#);
        xml.push_str("<p:cNvGrpSpPr/>");
        xml.push_str("<p:nvPr/>");
        xml.push_str("</p:nvGrpSpPr>");
        xml.push_str("<p:grpSpPr>");
        xml.push_str("<a:xfrm>");
        xml.push_str(r#"<a:off x="0" y="0"/>"#);
        xml.push_str(r#"<a:ext cx="0" cy="0"/>"#);
        xml.push_str(r#"<a:chOff x="0" y="0"/>"#);
        xml.push_str(r#"<a:chExt cx="0" cy="0"/>"#);
        xml.push_str("</a:xfrm>");
        xml.push_str("</p:grpSpPr>");

        // Write shapes with relationship IDs
        let mut image_counter = 0;
        for shape in &self.shapes {
            let rid = if shape.is_picture() {
                let rid = slide_index
                    .and_then(|si| media.and_then(|m| m.picture_rel(si, image_counter)));
                image_counter += 1;
                rid
            } else {
                None
            };

            shape.to_xml(&mut xml, rid)?;
        }

        xml.push_str("</p:spTree>");
        xml.push_str("</p:cSld>");

        xml.push_str(r#"<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>"#);
        xml.push_str("</p:sld>");

        Ok(xml)
    }
}

/// Shape types and implementation for PPTX presentations.
use std::fmt::Write as FmtWrite;
use std::sync::Arc;

use serde::Serialize;

use crate::common::xml::escape_xml;
use crate::ooxml::error::Result;

// Import shared format types
pub use super::super::format::{ImageFormat, TextAlign, TextAnchor, TextFormat};

/// Position and size of a shape, in EMUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Frame {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl Frame {
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Preset geometry of an auto shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Geometry {
    Rect,
    RoundRect,
}

impl Geometry {
    fn preset(&self) -> &'static str {
        match self {
            Self::Rect => "rect",
            Self::RoundRect => "roundRect",
        }
    }
}

/// Solid line around a shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outline {
    /// Hex RGB color
    pub color: String,
    /// Line width in EMUs
    pub width: i64,
}

/// One paragraph holding a single run.
#[derive(Debug, Clone, PartialEq)]
pub struct TextParagraph {
    pub text: String,
    pub format: TextFormat,
}

/// Text content of a shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextBody {
    pub paragraphs: Vec<TextParagraph>,
    pub align: TextAlign,
    pub anchor: TextAnchor,
}

impl TextBody {
    fn single(text: &str) -> Self {
        Self {
            paragraphs: vec![TextParagraph {
                text: text.to_string(),
                format: TextFormat::default(),
            }],
            ..Default::default()
        }
    }

    /// Paragraph texts joined with newlines.
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn write_xml(&self, xml: &mut String, wrap: bool) -> Result<()> {
        xml.push_str("<p:txBody>");
        write!(
            xml,
            r#"<a:bodyPr wrap="{}" rtlCol="0" anchor="{}"/>"#,
            if wrap { "square" } else { "none" },
            self.anchor.as_attr()
        )?;
        xml.push_str("<a:lstStyle/>");

        if self.paragraphs.is_empty() {
            xml.push_str(r#"<a:p><a:endParaRPr lang="en-US" dirty="0"/></a:p>"#);
        }

        for paragraph in &self.paragraphs {
            xml.push_str("<a:p>");
            write!(xml, r#"<a:pPr algn="{}"/>"#, self.align.as_attr())?;
            if paragraph.text.is_empty() {
                xml.push_str(r#"<a:endParaRPr lang="en-US" dirty="0"/>"#);
                xml.push_str("</a:p>");
                continue;
            }

            xml.push_str("<a:r>");
            write_run_properties(xml, &paragraph.format)?;
            write!(xml, "<a:t>{}</a:t>", escape_xml(&paragraph.text))?;
            xml.push_str("</a:r>");
            xml.push_str("</a:p>");
        }

        xml.push_str("</p:txBody>");
        Ok(())
    }
}

fn write_run_properties(xml: &mut String, format: &TextFormat) -> Result<()> {
    xml.push_str("<a:rPr lang=\"en-US\" dirty=\"0\"");

    if let Some(size) = format.size {
        write!(xml, " sz=\"{}\"", crate::common::unit::pt_to_centipoints(size))?;
    }

    if let Some(true) = format.bold {
        xml.push_str(" b=\"1\"");
    }

    if let Some(true) = format.italic {
        xml.push_str(" i=\"1\"");
    }

    if let Some(true) = format.underline {
        xml.push_str(" u=\"sng\"");
    }

    xml.push('>');

    // CT_TextCharacterProperties: fill comes before the typeface elements.
    if let Some(ref color) = format.color {
        write!(
            xml,
            "<a:solidFill><a:srgbClr val=\"{}\"/></a:solidFill>",
            escape_xml(color)
        )?;
    }

    if let Some(ref font) = format.font {
        write!(xml, "<a:latin typeface=\"{}\"/>", escape_xml(font))?;
    }

    xml.push_str("</a:rPr>");
    Ok(())
}

fn write_xfrm(xml: &mut String, frame: &Frame) -> Result<()> {
    xml.push_str("<a:xfrm>");
    write!(xml, r#"<a:off x="{}" y="{}"/>"#, frame.x, frame.y)?;
    write!(
        xml,
        r#"<a:ext cx="{}" cy="{}"/>"#,
        frame.width, frame.height
    )?;
    xml.push_str("</a:xfrm>");
    Ok(())
}

/// A shape on a slide (text box, auto shape or picture).
#[derive(Debug, Clone)]
pub struct MutableShape {
    /// Shape ID
    pub(crate) shape_id: u32,
    /// Explicit name written to `p:cNvPr/@name`
    pub(crate) name: Option<String>,
    /// Shape type
    pub(crate) shape_type: ShapeType,
}

#[derive(Debug, Clone)]
pub(crate) enum ShapeType {
    TextBox {
        frame: Frame,
        body: TextBody,
    },
    AutoShape {
        frame: Frame,
        geometry: Geometry,
        fill_color: Option<String>,
        outline: Option<Outline>,
        body: Option<TextBody>,
    },
    Picture {
        data: Arc<Vec<u8>>,
        format: ImageFormat,
        frame: Frame,
        description: String,
    },
}

impl MutableShape {
    /// Create a new text box shape.
    pub(crate) fn new_text_box(shape_id: u32, text: &str, frame: Frame) -> Self {
        Self {
            shape_id,
            name: None,
            shape_type: ShapeType::TextBox {
                frame,
                body: TextBody::single(text),
            },
        }
    }

    /// Create a new auto shape with the given preset geometry.
    pub(crate) fn new_auto_shape(
        shape_id: u32,
        geometry: Geometry,
        frame: Frame,
        fill_color: Option<String>,
    ) -> Self {
        Self {
            shape_id,
            name: None,
            shape_type: ShapeType::AutoShape {
                frame,
                geometry,
                fill_color,
                outline: None,
                body: None,
            },
        }
    }

    /// Create a new picture shape.
    pub(crate) fn new_picture(
        shape_id: u32,
        data: Arc<Vec<u8>>,
        format: ImageFormat,
        frame: Frame,
        description: String,
    ) -> Self {
        Self {
            shape_id,
            name: None,
            shape_type: ShapeType::Picture {
                data,
                format,
                frame,
                description,
            },
        }
    }

    pub fn shape_id(&self) -> u32 {
        self.shape_id
    }

    /// Name written to the slide. Falls back to `"<Kind> <id>"`.
    pub fn name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => {
                let kind = match self.shape_type {
                    ShapeType::TextBox { .. } => "TextBox",
                    ShapeType::AutoShape { .. } => "Shape",
                    ShapeType::Picture { .. } => "Picture",
                };
                format!("{} {}", kind, self.shape_id)
            },
        }
    }

    pub fn frame(&self) -> Frame {
        match &self.shape_type {
            ShapeType::TextBox { frame, .. }
            | ShapeType::AutoShape { frame, .. }
            | ShapeType::Picture { frame, .. } => *frame,
        }
    }

    /// Text of the shape, if it carries any.
    pub fn text(&self) -> Option<String> {
        self.body().map(TextBody::text)
    }

    pub fn is_picture(&self) -> bool {
        matches!(self.shape_type, ShapeType::Picture { .. })
    }

    fn body(&self) -> Option<&TextBody> {
        match &self.shape_type {
            ShapeType::TextBox { body, .. } => Some(body),
            ShapeType::AutoShape { body, .. } => body.as_ref(),
            ShapeType::Picture { .. } => None,
        }
    }

    fn body_mut(&mut self) -> Option<&mut TextBody> {
        match &mut self.shape_type {
            ShapeType::TextBox { body, .. } => Some(body),
            ShapeType::AutoShape { body, .. } => Some(body.get_or_insert_with(TextBody::default)),
            ShapeType::Picture { .. } => None,
        }
    }

    /// Builder method: set the shape name.
    pub fn set_name(&mut self, name: &str) -> &mut Self {
        self.name = Some(name.to_string());
        self
    }

    /// Builder method: replace the text with a single paragraph.
    pub fn text_content(&mut self, text: &str) -> &mut Self {
        if let Some(body) = self.body_mut() {
            body.paragraphs = TextBody::single(text).paragraphs;
        }
        self
    }

    /// Builder method: append a paragraph with its own formatting.
    pub fn add_paragraph(&mut self, text: &str, format: TextFormat) -> &mut Self {
        if let Some(body) = self.body_mut() {
            body.paragraphs.push(TextParagraph {
                text: text.to_string(),
                format,
            });
        }
        self
    }

    /// Set text formatting for every paragraph of this shape.
    pub fn set_text_format(&mut self, format: TextFormat) -> &mut Self {
        if let Some(body) = self.body_mut() {
            body.paragraphs
                .iter_mut()
                .for_each(|p| p.format = format.clone());
        }
        self
    }

    /// Builder method: set horizontal alignment.
    pub fn align(&mut self, align: TextAlign) -> &mut Self {
        if let Some(body) = self.body_mut() {
            body.align = align;
        }
        self
    }

    /// Builder method: set vertical anchoring.
    pub fn anchor(&mut self, anchor: TextAnchor) -> &mut Self {
        if let Some(body) = self.body_mut() {
            body.anchor = anchor;
        }
        self
    }

    /// Builder method: set a solid outline (auto shapes only).
    pub fn outline(&mut self, color: &str, width: i64) -> &mut Self {
        if let ShapeType::AutoShape {
            outline: ref mut o, ..
        } = self.shape_type
        {
            *o = Some(Outline {
                color: color.to_string(),
                width,
            });
        }
        self
    }

    /// Get image data if this shape is a picture.
    pub(crate) fn get_image_data(&self) -> Option<(&Arc<Vec<u8>>, ImageFormat)> {
        match &self.shape_type {
            ShapeType::Picture { data, format, .. } => Some((data, *format)),
            _ => None,
        }
    }

    /// Generate XML for this shape.
    ///
    /// Pictures need the relationship ID of their media part.
    pub(crate) fn to_xml(&self, xml: &mut String, rel_id: Option<&str>) -> Result<()> {
        let name = escape_xml(&self.name());
        match &self.shape_type {
            ShapeType::TextBox { frame, body } => {
                xml.push_str("<p:sp>");
                xml.push_str("<p:nvSpPr>");
                write!(xml, r#"<p:cNvPr id="{}" name="{}"/>"#, self.shape_id, name)?;
                xml.push_str("<p:cNvSpPr txBox=\"1\"/>");
                xml.push_str("<p:nvPr/>");
                xml.push_str("</p:nvSpPr>");

                xml.push_str("<p:spPr>");
                write_xfrm(xml, frame)?;
                xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom>"#);
                xml.push_str("<a:noFill/>");
                xml.push_str("</p:spPr>");

                body.write_xml(xml, true)?;
                xml.push_str("</p:sp>");
            },
            ShapeType::AutoShape {
                frame,
                geometry,
                fill_color,
                outline,
                body,
            } => {
                xml.push_str("<p:sp>");
                xml.push_str("<p:nvSpPr>");
                write!(xml, r#"<p:cNvPr id="{}" name="{}"/>"#, self.shape_id, name)?;
                xml.push_str("<p:cNvSpPr/>");
                xml.push_str("<p:nvPr/>");
                xml.push_str("</p:nvSpPr>");

                xml.push_str("<p:spPr>");
                write_xfrm(xml, frame)?;
                write!(
                    xml,
                    r#"<a:prstGeom prst="{}"><a:avLst/></a:prstGeom>"#,
                    geometry.preset()
                )?;

                match fill_color {
                    Some(color) => write!(
                        xml,
                        r#"<a:solidFill><a:srgbClr val="{}"/></a:solidFill>"#,
                        escape_xml(color)
                    )?,
                    None => xml.push_str("<a:noFill/>"),
                }

                if let Some(outline) = outline {
                    write!(
                        xml,
                        r#"<a:ln w="{}"><a:solidFill><a:srgbClr val="{}"/></a:solidFill></a:ln>"#,
                        outline.width,
                        escape_xml(&outline.color)
                    )?;
                }

                xml.push_str("</p:spPr>");

                if let Some(body) = body {
                    body.write_xml(xml, true)?;
                }
                xml.push_str("</p:sp>");
            },
            ShapeType::Picture {
                frame, description, ..
            } => {
                xml.push_str("<p:pic>");
                xml.push_str("<p:nvPicPr>");
                write!(
                    xml,
                    r#"<p:cNvPr id="{}" name="{}" descr="{}"/>"#,
                    self.shape_id,
                    name,
                    escape_xml(description)
                )?;
                xml.push_str(r#"<p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr>"#);
                xml.push_str("<p:nvPr/>");
                xml.push_str("</p:nvPicPr>");

                xml.push_str("<p:blipFill>");
                let rid = rel_id.unwrap_or("rIdImagePlaceholder");
                write!(xml, r#"<a:blip r:embed="{}"/>"#, rid)?;
                xml.push_str("<a:stretch><a:fillRect/></a:stretch>");
                xml.push_str("</p:blipFill>");

                xml.push_str("<p:spPr>");
                write_xfrm(xml, frame)?;
                xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom>"#);
                xml.push_str("</p:spPr>");
                xml.push_str("</p:pic>");
            },
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_box_xml() {
        let mut shape = MutableShape::new_text_box(2, "Q3 <update>", Frame::new(1, 2, 3, 4));
        shape
            .set_name("Footer")
            .set_text_format(TextFormat {
                font: Some("Calibri".into()),
                size: Some(8.0),
                color: Some("808080".into()),
                ..Default::default()
            })
            .align(TextAlign::Center);

        let mut xml = String::new();
        shape.to_xml(&mut xml, None).unwrap();
        assert!(xml.contains(r#"<p:cNvPr id="2" name="Footer"/>"#));
        assert!(xml.contains(r#"<a:off x="1" y="2"/>"#));
        assert!(xml.contains(r#"sz="800""#));
        assert!(xml.contains(r#"<a:pPr algn="ctr"/>"#));
        assert!(xml.contains("Q3 &lt;update&gt;"));
        // fill precedes the typeface
        let fill = xml.find("<a:solidFill>").unwrap();
        let latin = xml.find("<a:latin").unwrap();
        assert!(fill < latin);
    }

    #[test]
    fn test_auto_shape_outline_and_text() {
        let mut shape = MutableShape::new_auto_shape(
            5,
            Geometry::RoundRect,
            Frame::new(0, 0, 10, 10),
            Some("ADD8E6".to_string()),
        );
        shape
            .outline("00008B", 12_700)
            .text_content("Title")
            .set_text_format(TextFormat {
                bold: Some(true),
                ..Default::default()
            });

        let mut xml = String::new();
        shape.to_xml(&mut xml, None).unwrap();
        assert!(xml.contains(r#"prst="roundRect""#));
        assert!(xml.contains(r#"<a:ln w="12700">"#));
        assert!(xml.contains(r#"b="1""#));
        assert_eq!(shape.text().as_deref(), Some("Title"));
    }

    #[test]
    fn test_auto_shape_without_text_has_no_body() {
        let shape =
            MutableShape::new_auto_shape(3, Geometry::Rect, Frame::new(0, 0, 1, 1), None);
        let mut xml = String::new();
        shape.to_xml(&mut xml, None).unwrap();
        assert!(!xml.contains("<p:txBody>"));
        assert!(xml.contains("<a:noFill/>"));
        assert_eq!(shape.name(), "Shape 3");
    }

    #[test]
    fn test_picture_uses_rel_id() {
        let shape = MutableShape::new_picture(
            4,
            Arc::new(vec![0x89, b'P', b'N', b'G']),
            ImageFormat::Png,
            Frame::new(0, 0, 100, 50),
            "logo".to_string(),
        );
        let mut xml = String::new();
        shape.to_xml(&mut xml, Some("rId7")).unwrap();
        assert!(xml.contains(r#"r:embed="rId7""#));
        assert!(shape.is_picture());
        assert!(shape.text().is_none());
    }

    #[test]
    fn test_multi_paragraph_body() {
        let mut shape = MutableShape::new_text_box(2, "Heading", Frame::default());
        shape.add_paragraph("• one", TextFormat::default());
        shape.add_paragraph("", TextFormat::default());
        assert_eq!(shape.text().as_deref(), Some("Heading\n• one\n"));

        let mut xml = String::new();
        shape.to_xml(&mut xml, None).unwrap();
        assert_eq!(xml.matches("<a:p>").count(), 3);
        assert!(xml.contains("<a:endParaRPr"));
    }
}

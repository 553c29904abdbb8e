//! Read-back of generated decks.
//!
//! Walks a `.pptx` archive and summarizes every slide: its name and the
//! shapes it carries, with their geometry, fill, text and embedded media.
//! Only the subset of PresentationML produced by the writer is understood.

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::Serialize;
use zip::ZipArchive;

use crate::common::xml::unescape_entity;
use crate::ooxml::error::{OoxmlError, Result};

use super::writer::shape::Frame;

/// Kind of a shape on a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    AutoShape,
    TextBox,
    Picture,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeSummary {
    pub id: u32,
    pub name: String,
    pub kind: ShapeKind,
    pub frame: Frame,
    /// Preset geometry (`rect`, `roundRect`)
    pub geometry: Option<String>,
    /// Solid fill of the shape body, hex RGB
    pub fill: Option<String>,
    /// Paragraph texts joined with `\n`
    pub text: String,
    /// Partname of the embedded image, without the leading slash
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlideSummary {
    pub name: Option<String>,
    pub shapes: Vec<ShapeSummary>,
}

impl SlideSummary {
    /// First shape with the given name.
    pub fn shape(&self, name: &str) -> Option<&ShapeSummary> {
        self.shapes.iter().find(|s| s.name == name)
    }

    pub fn shape_names(&self) -> Vec<&str> {
        self.shapes.iter().map(|s| s.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeckSummary {
    pub title: Option<String>,
    pub slide_width: i64,
    pub slide_height: i64,
    pub slides: Vec<SlideSummary>,
    /// Number of distinct media parts in the package
    pub media_count: usize,
}

impl DeckSummary {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        inspect(bytes)
    }
}

/// Summarize a deck held in memory.
pub fn inspect(bytes: &[u8]) -> Result<DeckSummary> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let presentation = read_entry(&mut archive, "ppt/presentation.xml")?;
    let pres_rels = parse_rels(&read_entry(
        &mut archive,
        "ppt/_rels/presentation.xml.rels",
    )?)?;
    let (slide_width, slide_height, slide_rids) = parse_presentation(&presentation)?;

    let mut slides = Vec::with_capacity(slide_rids.len());
    for rid in slide_rids {
        let target = pres_rels
            .get(&rid)
            .ok_or_else(|| OoxmlError::PartNotFound(format!("presentation relationship {rid}")))?;
        let slide_path = resolve_target("ppt", target);
        let rels_path = rels_path_for(&slide_path);
        let slide_rels = match read_entry(&mut archive, &rels_path) {
            Ok(xml) => parse_rels(&xml)?,
            Err(OoxmlError::PartNotFound(_)) => HashMap::new(),
            Err(e) => return Err(e),
        };
        let base = slide_path
            .rsplit_once('/')
            .map(|(dir, _)| dir)
            .unwrap_or("");
        let xml = read_entry(&mut archive, &slide_path)?;
        slides.push(parse_slide(&xml, |rid| {
            slide_rels.get(rid).map(|t| resolve_target(base, t))
        })?);
    }

    let title = match read_entry(&mut archive, "docProps/core.xml") {
        Ok(xml) => parse_title(&xml)?,
        Err(OoxmlError::PartNotFound(_)) => None,
        Err(e) => return Err(e),
    };

    let media_count = archive
        .file_names()
        .filter(|name| name.starts_with("ppt/media/"))
        .count();

    Ok(DeckSummary {
        title,
        slide_width,
        slide_height,
        slides,
        media_count,
    })
}

fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Vec<u8>> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(OoxmlError::PartNotFound(name.to_string()));
        },
        Err(e) => return Err(e.into()),
    };
    let mut data = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut data)?;
    Ok(data)
}

fn attr(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| OoxmlError::Xml(e.to_string()))?;
        if attr.key.as_ref() == key {
            let value = attr
                .unescape_value()
                .map_err(|e| OoxmlError::Xml(e.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn attr_i64(e: &BytesStart<'_>, key: &[u8]) -> Result<i64> {
    Ok(attr(e, key)?
        .and_then(|v| v.parse().ok())
        .unwrap_or_default())
}

/// Resolve an entity reference (`amp`, `#38`, `#x26`) to its character.
fn resolve_reference(name: &[u8]) -> Option<char> {
    if let Some(c) = unescape_entity(name) {
        return Some(c);
    }
    let digits = std::str::from_utf8(name.strip_prefix(b"#")?).ok()?;
    let code = match digits.strip_prefix('x') {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse().ok()?,
    };
    char::from_u32(code)
}

/// `ppt/slides/slide1.xml` -> `ppt/slides/_rels/slide1.xml.rels`
fn rels_path_for(path: &str) -> String {
    match path.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{path}.rels"),
    }
}

/// Resolve a relationship target against the directory of its source part.
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            ".." => {
                segments.pop();
            },
            "." | "" => {},
            other => segments.push(other),
        }
    }
    segments.join("/")
}

fn parse_rels(xml: &[u8]) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_reader(xml);
    let mut rels = HashMap::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                if let (Some(id), Some(target)) = (attr(&e, b"Id")?, attr(&e, b"Target")?) {
                    rels.insert(id, target);
                }
            },
            Event::Eof => break,
            _ => {},
        }
        buf.clear();
    }

    Ok(rels)
}

fn parse_presentation(xml: &[u8]) -> Result<(i64, i64, Vec<String>)> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let (mut cx, mut cy) = (0, 0);
    let mut slide_rids = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                b"p:sldSz" => {
                    cx = attr_i64(&e, b"cx")?;
                    cy = attr_i64(&e, b"cy")?;
                },
                b"p:sldId" => {
                    if let Some(rid) = attr(&e, b"r:id")? {
                        slide_rids.push(rid);
                    }
                },
                _ => {},
            },
            Event::Eof => break,
            _ => {},
        }
        buf.clear();
    }

    Ok((cx, cy, slide_rids))
}

fn parse_title(xml: &[u8]) -> Result<Option<String>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut in_title = false;
    let mut title: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"dc:title" => {
                in_title = true;
                title = Some(String::new());
            },
            Event::End(e) if e.name().as_ref() == b"dc:title" => in_title = false,
            Event::Text(e) if in_title => {
                let t = std::str::from_utf8(e.as_ref())
                    .map_err(|e| OoxmlError::Xml(e.to_string()))?;
                title.get_or_insert_with(String::new).push_str(t);
            },
            Event::GeneralRef(r) if in_title => {
                if let Some(c) = resolve_reference(r.as_ref()) {
                    title.get_or_insert_with(String::new).push(c);
                }
            },
            Event::Eof => break,
            _ => {},
        }
        buf.clear();
    }

    Ok(title)
}

/// Shape under construction while its element is open.
struct PendingShape {
    summary: ShapeSummary,
    paragraphs: usize,
    in_sp_pr: bool,
    in_line: bool,
    in_fill: bool,
    in_text: bool,
}

impl PendingShape {
    fn new(kind: ShapeKind) -> Self {
        Self {
            summary: ShapeSummary {
                id: 0,
                name: String::new(),
                kind,
                frame: Frame::default(),
                geometry: None,
                fill: None,
                text: String::new(),
                image: None,
            },
            paragraphs: 0,
            in_sp_pr: false,
            in_line: false,
            in_fill: false,
            in_text: false,
        }
    }

    fn open(
        &mut self,
        e: &BytesStart<'_>,
        empty: bool,
        resolve: &impl Fn(&str) -> Option<String>,
    ) -> Result<()> {
        match e.name().as_ref() {
            b"p:cNvPr" => {
                self.summary.id = attr_i64(e, b"id")? as u32;
                self.summary.name = attr(e, b"name")?.unwrap_or_default();
            },
            b"p:cNvSpPr" => {
                if attr(e, b"txBox")?.as_deref() == Some("1") {
                    self.summary.kind = ShapeKind::TextBox;
                }
            },
            b"p:spPr" if !empty => self.in_sp_pr = true,
            b"a:ln" if !empty => self.in_line = true,
            b"a:solidFill" if !empty => self.in_fill = true,
            b"a:srgbClr" => {
                if self.in_sp_pr && self.in_fill && !self.in_line {
                    self.summary.fill = attr(e, b"val")?;
                }
            },
            b"a:off" if self.in_sp_pr => {
                self.summary.frame.x = attr_i64(e, b"x")?;
                self.summary.frame.y = attr_i64(e, b"y")?;
            },
            b"a:ext" if self.in_sp_pr => {
                self.summary.frame.width = attr_i64(e, b"cx")?;
                self.summary.frame.height = attr_i64(e, b"cy")?;
            },
            b"a:prstGeom" => self.summary.geometry = attr(e, b"prst")?,
            b"a:blip" => {
                if let Some(rid) = attr(e, b"r:embed")? {
                    self.summary.image = resolve(&rid);
                }
            },
            b"a:p" => {
                if self.paragraphs > 0 {
                    self.summary.text.push('\n');
                }
                self.paragraphs += 1;
            },
            b"a:t" if !empty => self.in_text = true,
            _ => {},
        }
        Ok(())
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"p:spPr" => self.in_sp_pr = false,
            b"a:ln" => self.in_line = false,
            b"a:solidFill" => self.in_fill = false,
            b"a:t" => self.in_text = false,
            _ => {},
        }
    }
}

fn parse_slide(xml: &[u8], resolve: impl Fn(&str) -> Option<String>) -> Result<SlideSummary> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut name = None;
    let mut shapes = Vec::new();
    let mut current: Option<PendingShape> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"p:cSld" => name = attr(&e, b"name")?,
                b"p:sp" => current = Some(PendingShape::new(ShapeKind::AutoShape)),
                b"p:pic" => current = Some(PendingShape::new(ShapeKind::Picture)),
                _ => {
                    if let Some(shape) = current.as_mut() {
                        shape.open(&e, false, &resolve)?;
                    }
                },
            },
            Event::Empty(e) => {
                if let Some(shape) = current.as_mut() {
                    shape.open(&e, true, &resolve)?;
                }
            },
            Event::End(e) => match e.name().as_ref() {
                b"p:sp" | b"p:pic" => {
                    if let Some(shape) = current.take() {
                        shapes.push(shape.summary);
                    }
                },
                other => {
                    if let Some(shape) = current.as_mut() {
                        shape.close(other);
                    }
                },
            },
            Event::Text(e) => {
                if let Some(shape) = current.as_mut().filter(|s| s.in_text) {
                    let t = std::str::from_utf8(e.as_ref())
                        .map_err(|e| OoxmlError::Xml(e.to_string()))?;
                    shape.summary.text.push_str(t);
                }
            },
            Event::GeneralRef(r) => {
                if let Some(shape) = current.as_mut().filter(|s| s.in_text)
                    && let Some(c) = resolve_reference(r.as_ref())
                {
                    shape.summary.text.push(c);
                }
            },
            Event::Eof => break,
            _ => {},
        }
        buf.clear();
    }

    Ok(SlideSummary { name, shapes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::pptx::writer::MutablePresentation;
    use crate::ooxml::pptx::{TextFormat, TextAlign};
    use std::sync::Arc;

    const PNG: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_resolve_target() {
        assert_eq!(
            resolve_target("ppt/slides", "../media/image1.png"),
            "ppt/media/image1.png"
        );
        assert_eq!(resolve_target("ppt", "slides/slide1.xml"), "ppt/slides/slide1.xml");
        assert_eq!(resolve_target("ppt", "/docProps/app.xml"), "docProps/app.xml");
        assert_eq!(
            rels_path_for("ppt/slides/slide3.xml"),
            "ppt/slides/_rels/slide3.xml.rels"
        );
    }

    #[test]
    fn test_resolve_reference() {
        assert_eq!(resolve_reference(b"amp"), Some('&'));
        assert_eq!(resolve_reference(b"#38"), Some('&'));
        assert_eq!(resolve_reference(b"#x26"), Some('&'));
        assert_eq!(resolve_reference(b"nbsp"), None);
    }

    #[test]
    fn test_round_trip_summary() {
        let mut pres = MutablePresentation::widescreen();
        pres.set_title("R&D");
        let slide = pres.add_slide();
        slide.set_name("Acme & Sons");
        slide
            .add_rounded_rectangle(10, 20, 30, 40, Some("ADD8E6".to_string()))
            .set_name("Project Title")
            .outline("00008B", 12_700)
            .text_content("Alpha <One>")
            .set_text_format(TextFormat {
                color: Some("00008B".into()),
                ..Default::default()
            });
        slide
            .add_text_box("Heading", 0, 0, 5, 5)
            .set_name("Overview")
            .add_paragraph("• a & b", TextFormat::default())
            .align(TextAlign::Left);
        slide
            .add_picture_from_bytes(Arc::new(PNG.to_vec()), 1, 2, 3, 4, None)
            .unwrap()
            .set_name("Logo");

        let summary = inspect(&pres.to_bytes().unwrap()).unwrap();
        assert_eq!(summary.title.as_deref(), Some("R&D"));
        assert_eq!(summary.slide_width, 12_192_000);
        assert_eq!(summary.media_count, 1);
        assert_eq!(summary.slides.len(), 1);

        let slide = &summary.slides[0];
        assert_eq!(slide.name.as_deref(), Some("Acme & Sons"));
        assert_eq!(slide.shape_names(), vec!["Project Title", "Overview", "Logo"]);

        let title = slide.shape("Project Title").unwrap();
        assert_eq!(title.kind, ShapeKind::AutoShape);
        assert_eq!(title.geometry.as_deref(), Some("roundRect"));
        assert_eq!(title.fill.as_deref(), Some("ADD8E6"));
        assert_eq!(title.text, "Alpha <One>");
        assert_eq!(title.frame, Frame::new(10, 20, 30, 40));

        let overview = slide.shape("Overview").unwrap();
        assert_eq!(overview.kind, ShapeKind::TextBox);
        assert_eq!(overview.text, "Heading\n• a & b");
        assert_eq!(overview.fill, None);

        let logo = slide.shape("Logo").unwrap();
        assert_eq!(logo.kind, ShapeKind::Picture);
        assert_eq!(logo.image.as_deref(), Some("ppt/media/image1.png"));
    }

    #[test]
    fn test_rejects_non_zip() {
        assert!(inspect(b"not a deck").is_err());
    }
}

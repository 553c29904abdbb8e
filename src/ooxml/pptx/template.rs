//! Presentation template module.
//!
//! Provides the fixed parts every generated deck carries: one slide master,
//! one blank layout, a theme and the presentation-level property parts.
//! Document properties are rendered per deck.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::common::xml::escape_xml;

/// `AppVersion`, in the `NN.NNNN` form.
const APP_VERSION: &str = "16.0000";

macro_rules! resource {
    ($path:literal) => {
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/resources/", $path))
    };
}

/// The single slide master. Its layout list points at `rId1`.
pub fn default_slide_master_xml() -> &'static str {
    resource!("slideMasters/slideMaster1.xml")
}

/// Blank slide layout used by every slide.
pub fn blank_slide_layout_xml() -> &'static str {
    resource!("slideLayouts/slideLayout1.xml")
}

/// Generate a minimal valid theme.xml content.
pub fn default_theme_xml() -> &'static str {
    resource!("theme/theme1.xml")
}

pub fn default_table_styles_xml() -> &'static str {
    resource!("tableStyles.xml")
}

pub fn default_view_props_xml() -> &'static str {
    resource!("viewProps.xml")
}

pub fn default_pres_props_xml() -> &'static str {
    resource!("presProps.xml")
}

/// Render docProps/core.xml with the deck title and a creation timestamp.
pub fn core_props_xml(title: Option<&str>, created: DateTime<Utc>) -> String {
    let stamp = created.to_rfc3339_opts(SecondsFormat::Secs, true);
    let mut xml = String::with_capacity(768);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#);
    if let Some(title) = title {
        xml.push_str("<dc:title>");
        xml.push_str(&escape_xml(title));
        xml.push_str("</dc:title>");
    }
    xml.push_str("<dc:creator>slidegen</dc:creator>");
    xml.push_str(r#"<dcterms:created xsi:type="dcterms:W3CDTF">"#);
    xml.push_str(&stamp);
    xml.push_str("</dcterms:created>");
    xml.push_str(r#"<dcterms:modified xsi:type="dcterms:W3CDTF">"#);
    xml.push_str(&stamp);
    xml.push_str("</dcterms:modified>");
    xml.push_str("</cp:coreProperties>");
    xml
}

/// Render docProps/app.xml for a deck with `slides` slides.
pub fn app_props_xml(slides: usize) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">"#,
            "<Application>slidegen</Application>",
            "<PresentationFormat>Widescreen</PresentationFormat>",
            "<Slides>{}</Slides>",
            "<AppVersion>{}</AppVersion>",
            "</Properties>"
        ),
        slides,
        APP_VERSION,
    )
}

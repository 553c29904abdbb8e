/// Presentation writer for PPTX.
use std::fmt::Write as FmtWrite;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};
use crate::ooxml::opc::error::OpcError;
use crate::ooxml::opc::{BlobPart, OpcPackage, PackURI, PackageWriter, Part};
use crate::ooxml::pptx::template;

use super::relmap::MediaRegistry;
use super::slide::MutableSlide;

/// 13.333" x 7.5" (16:9).
pub const WIDESCREEN_WIDTH: i64 = 12_192_000;
pub const WIDESCREEN_HEIGHT: i64 = 6_858_000;

fn pack_uri(uri: &str) -> Result<PackURI> {
    PackURI::new(uri).map_err(|e| OoxmlError::Opc(OpcError::InvalidPackUri(e)))
}

/// A mutable PowerPoint presentation for writing.
///
/// Provides methods to add slides, set dimensions and serialize the deck as
/// an OPC package.
#[derive(Debug)]
pub struct MutablePresentation {
    /// Slides in the presentation
    pub(crate) slides: Vec<MutableSlide>,
    /// Slide width in EMUs (English Metric Units, 914400 EMU = 1 inch)
    slide_width: i64,
    /// Slide height in EMUs
    slide_height: i64,
    /// Title written to the core document properties
    title: Option<String>,
    /// Creation time written to the core document properties
    created: Option<DateTime<Utc>>,
}

impl MutablePresentation {
    /// Create a new empty 16:9 presentation.
    pub fn widescreen() -> Self {
        Self {
            slides: Vec::new(),
            slide_width: WIDESCREEN_WIDTH,
            slide_height: WIDESCREEN_HEIGHT,
            title: None,
            created: None,
        }
    }

    /// Add a new slide to the presentation.
    pub fn add_slide(&mut self) -> &mut MutableSlide {
        let slide_id = (self.slides.len() + 256) as u32;
        self.slides.push(MutableSlide::new(slide_id));
        let index = self.slides.len() - 1;
        &mut self.slides[index]
    }

    /// Get the number of slides.
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    pub fn slides(&self) -> &[MutableSlide] {
        &self.slides
    }

    /// Get the slide width in EMUs.
    pub fn slide_width(&self) -> i64 {
        self.slide_width
    }

    /// Get the slide height in EMUs.
    pub fn slide_height(&self) -> i64 {
        self.slide_height
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = Some(title.to_string());
    }

    pub fn set_created(&mut self, created: DateTime<Utc>) {
        self.created = Some(created);
    }

    /// Generate presentation.xml content with actual relationship IDs.
    pub(crate) fn generate_presentation_xml_with_rels(
        &self,
        master_rel_id: &str,
        slide_rel_ids: &[String],
    ) -> Result<String> {
        if slide_rel_ids.len() != self.slides.len() {
            return Err(OoxmlError::Xml(
                "Slide relationship IDs must be provided for every slide".to_string(),
            ));
        }

        let mut xml = String::with_capacity(2048);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(r#"<p:presentation xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" saveSubsetFonts="1">"#);

        // Write slide master ID list
        xml.push_str("<p:sldMasterIdLst>");
        write!(
            xml,
            r#"<p:sldMasterId id="2147483648" r:id="{}"/>"#,
            master_rel_id
        )?;
        xml.push_str("</p:sldMasterIdLst>");

        // Write slide ID list
        if !self.slides.is_empty() {
            xml.push_str("<p:sldIdLst>");
            for (slide, rel_id) in self.slides.iter().zip(slide_rel_ids) {
                write!(
                    xml,
                    r#"<p:sldId id="{}" r:id="{}"/>"#,
                    slide.slide_id(),
                    rel_id
                )?;
            }
            xml.push_str("</p:sldIdLst>");
        }

        // Write slide size
        write!(
            xml,
            r#"<p:sldSz cx="{}" cy="{}"/>"#,
            self.slide_width, self.slide_height
        )?;

        xml.push_str("<p:notesSz cx=\"6858000\" cy=\"9144000\"/>");
        xml.push_str("</p:presentation>");

        Ok(xml)
    }

    /// Build the OPC package for this presentation.
    ///
    /// Identical image bytes are stored once under `/ppt/media` and shared
    /// by every slide that places them.
    pub fn to_package(&self) -> Result<OpcPackage> {
        let pres_uri = pack_uri("/ppt/presentation.xml")?;
        let master_uri = pack_uri("/ppt/slideMasters/slideMaster1.xml")?;
        let layout_uri = pack_uri("/ppt/slideLayouts/slideLayout1.xml")?;
        let theme_uri = pack_uri("/ppt/theme/theme1.xml")?;
        let pres_props_uri = pack_uri("/ppt/presProps.xml")?;
        let view_props_uri = pack_uri("/ppt/viewProps.xml")?;
        let table_styles_uri = pack_uri("/ppt/tableStyles.xml")?;
        let core_uri = pack_uri("/docProps/core.xml")?;
        let app_uri = pack_uri("/docProps/app.xml")?;

        let mut package = OpcPackage::new();
        package.relate_to(&pres_uri, rt::OFFICE_DOCUMENT);
        package.relate_to(&core_uri, rt::CORE_PROPERTIES);
        package.relate_to(&app_uri, rt::EXTENDED_PROPERTIES);

        let mut pres_part = BlobPart::new(pres_uri, ct::PML_PRESENTATION_MAIN, Vec::new());
        let master_rel_id = pres_part.relate_to(&master_uri, rt::SLIDE_MASTER);

        // The master's layout list refers to rId1.
        let mut master_part = BlobPart::new(
            master_uri.clone(),
            ct::PML_SLIDE_MASTER,
            template::default_slide_master_xml().as_bytes().to_vec(),
        );
        master_part.relate_to(&layout_uri, rt::SLIDE_LAYOUT);
        master_part.relate_to(&theme_uri, rt::THEME);

        let mut layout_part = BlobPart::new(
            layout_uri.clone(),
            ct::PML_SLIDE_LAYOUT,
            template::blank_slide_layout_xml().as_bytes().to_vec(),
        );
        layout_part.relate_to(&master_uri, rt::SLIDE_MASTER);

        let mut slide_parts = Vec::with_capacity(self.slides.len());
        let mut slide_rel_ids = Vec::with_capacity(self.slides.len());
        let mut media = MediaRegistry::new();

        for (slide_index, slide) in self.slides.iter().enumerate() {
            let slide_uri = pack_uri(&format!("/ppt/slides/slide{}.xml", slide_index + 1))?;
            slide_rel_ids.push(pres_part.relate_to(&slide_uri, rt::SLIDE));

            let mut slide_part = BlobPart::new(slide_uri, ct::PML_SLIDE, Vec::new());
            slide_part.relate_to(&layout_uri, rt::SLIDE_LAYOUT);

            for (picture_index, (data, format)) in slide.collect_images().into_iter().enumerate() {
                let media_uri = media.intern(data, format)?;
                let rel_id = slide_part.relate_to(&media_uri, rt::IMAGE);
                media.bind(slide_index, picture_index, rel_id);
            }

            let xml = slide.to_xml_with_rels(Some(slide_index), Some(&media))?;
            slide_part.set_blob(xml.into_bytes());
            slide_parts.push(slide_part);
        }

        pres_part.relate_to(&pres_props_uri, rt::PRES_PROPS);
        pres_part.relate_to(&view_props_uri, rt::VIEW_PROPS);
        pres_part.relate_to(&theme_uri, rt::THEME);
        pres_part.relate_to(&table_styles_uri, rt::TABLE_STYLES);
        let pres_xml = self.generate_presentation_xml_with_rels(&master_rel_id, &slide_rel_ids)?;
        pres_part.set_blob(pres_xml.into_bytes());

        package.add_part(Box::new(pres_part))?;
        package.add_part(Box::new(master_part))?;
        package.add_part(Box::new(layout_part))?;
        package.add_part(Box::new(BlobPart::new(
            theme_uri,
            ct::OFC_THEME,
            template::default_theme_xml().as_bytes().to_vec(),
        )))?;
        for part in slide_parts {
            package.add_part(Box::new(part))?;
        }
        for part in media.into_parts() {
            package.add_part(Box::new(part))?;
        }
        package.add_part(Box::new(BlobPart::new(
            pres_props_uri,
            ct::PML_PRES_PROPS,
            template::default_pres_props_xml().as_bytes().to_vec(),
        )))?;
        package.add_part(Box::new(BlobPart::new(
            view_props_uri,
            ct::PML_VIEW_PROPS,
            template::default_view_props_xml().as_bytes().to_vec(),
        )))?;
        package.add_part(Box::new(BlobPart::new(
            table_styles_uri,
            ct::PML_TABLE_STYLES,
            template::default_table_styles_xml().as_bytes().to_vec(),
        )))?;

        let created = self.created.unwrap_or_else(Utc::now);
        package.add_part(Box::new(BlobPart::new(
            core_uri,
            ct::OPC_CORE_PROPERTIES,
            template::core_props_xml(self.title.as_deref(), created).into_bytes(),
        )))?;
        package.add_part(Box::new(BlobPart::new(
            app_uri,
            ct::OFC_EXTENDED_PROPERTIES,
            template::app_props_xml(self.slides.len()).into_bytes(),
        )))?;

        Ok(package)
    }

    /// Serialize the presentation to `.pptx` bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let package = self.to_package()?;
        Ok(PackageWriter::to_bytes(&package)?)
    }

    /// Write the presentation to a `.pptx` file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let package = self.to_package()?;
        PackageWriter::write(path, &package)?;
        Ok(())
    }
}

impl Default for MutablePresentation {
    fn default() -> Self {
        Self::widescreen()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};
    use std::sync::Arc;

    const PNG: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_create_presentation() {
        let pres = MutablePresentation::default();
        assert_eq!(pres.slide_count(), 0);
        assert_eq!(pres.slide_width(), 12_192_000);
        assert_eq!(pres.slide_height(), 6_858_000);
    }

    #[test]
    fn test_add_slide() {
        let mut pres = MutablePresentation::widescreen();
        let slide = pres.add_slide();
        assert_eq!(slide.slide_id(), 256);
        pres.add_slide().add_text_box("Hello", 100, 100, 500, 200);
        assert_eq!(pres.slide_count(), 2);
        assert_eq!(pres.slides()[1].shape_count(), 1);
        assert_eq!(pres.slides()[1].slide_id(), 257);
    }

    #[test]
    fn test_presentation_xml() {
        let mut pres = MutablePresentation::widescreen();
        pres.add_slide();
        let xml = pres
            .generate_presentation_xml_with_rels("rId1", &["rId2".to_string()])
            .unwrap();
        assert!(xml.contains(r#"<p:sldId id="256" r:id="rId2"/>"#));
        assert!(xml.contains(r#"<p:sldSz cx="12192000" cy="6858000"/>"#));

        assert!(pres.generate_presentation_xml_with_rels("rId1", &[]).is_err());
    }

    #[test]
    fn test_package_parts() {
        let mut pres = MutablePresentation::widescreen();
        pres.set_title("Deck");
        pres.add_slide().add_text_box("One", 0, 0, 10, 10);
        pres.add_slide();

        let package = pres.to_package().unwrap();
        for name in [
            "/ppt/presentation.xml",
            "/ppt/slides/slide1.xml",
            "/ppt/slides/slide2.xml",
            "/ppt/slideMasters/slideMaster1.xml",
            "/ppt/slideLayouts/slideLayout1.xml",
            "/ppt/theme/theme1.xml",
            "/docProps/core.xml",
            "/docProps/app.xml",
        ] {
            assert!(
                package.contains_part(&PackURI::new(name).unwrap()),
                "missing {name}"
            );
        }
        assert_eq!(package.rels().len(), 3);
    }

    #[test]
    fn test_identical_images_share_one_media_part() {
        let mut pres = MutablePresentation::widescreen();
        let image = Arc::new(PNG.to_vec());
        pres.add_slide()
            .add_picture_from_bytes(Arc::clone(&image), 0, 0, 1, 1, None)
            .unwrap();
        pres.add_slide()
            .add_picture_from_bytes(Arc::new(PNG.to_vec()), 0, 0, 1, 1, None)
            .unwrap();

        let package = pres.to_package().unwrap();
        let media: Vec<_> = package
            .iter_parts()
            .filter(|p| p.partname().as_str().starts_with("/ppt/media/"))
            .collect();
        assert_eq!(media.len(), 1);
        assert_eq!(media[0].partname().as_str(), "/ppt/media/image1.png");
    }

    #[test]
    fn test_to_bytes_is_a_zip() {
        let mut pres = MutablePresentation::widescreen();
        pres.add_slide().add_text_box("Hi", 0, 0, 10, 10);
        let bytes = pres.to_bytes().unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut slide = String::new();
        archive
            .by_name("ppt/slides/slide1.xml")
            .unwrap()
            .read_to_string(&mut slide)
            .unwrap();
        assert!(slide.contains("<a:t>Hi</a:t>"));

        let mut rels = String::new();
        archive
            .by_name("ppt/slides/_rels/slide1.xml.rels")
            .unwrap()
            .read_to_string(&mut rels)
            .unwrap();
        assert!(rels.contains("../slideLayouts/slideLayout1.xml"));
    }
}

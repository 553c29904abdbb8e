//! Slide composition.
//!
//! One [`ResolvedProject`] becomes one slide. Shapes are placed in a fixed
//! order (header band, logo, badge, title, overview box, image box, image
//! columns, footer) at positions taken from [`LayoutSpec`]. A shape that
//! cannot be placed is logged and replaced by its fallback, so composition
//! itself never fails.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageReader;
use thiserror::Error;
use tracing::{debug, warn};

use super::context::SlideAssets;
use super::layout::{LayoutSpec, Rect, TextStyle};
use super::normalize::{ResolvedImage, ResolvedProject};
use crate::common::unit::pt_to_emu;
use crate::ooxml::OoxmlError;
use crate::ooxml::pptx::{MutableShape, MutableSlide, TextAlign, TextAnchor};

/// Failure to place one shape.
#[derive(Debug, Error)]
pub enum CompositionError {
    #[error("failed to read image {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("image {0} has no usable size")]
    Degenerate(PathBuf),
    #[error("failed to place shape: {0}")]
    Place(#[from] OoxmlError),
}

/// Image bytes plus pixel dimensions.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub data: Arc<Vec<u8>>,
    pub width: u32,
    pub height: u32,
}

impl LoadedImage {
    /// Read an image file and its dimensions without decoding pixels.
    pub fn load(path: &Path) -> Result<Self, CompositionError> {
        let data = std::fs::read(path).map_err(|source| CompositionError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let (width, height) = ImageReader::new(Cursor::new(&data))
            .with_guessed_format()
            .map_err(|source| CompositionError::Read {
                path: path.to_path_buf(),
                source,
            })?
            .into_dimensions()
            .map_err(|source| CompositionError::Decode {
                path: path.to_path_buf(),
                source,
            })?;
        if width == 0 || height == 0 {
            return Err(CompositionError::Degenerate(path.to_path_buf()));
        }
        Ok(Self {
            data: Arc::new(data),
            width,
            height,
        })
    }
}

fn load_asset(kind: &str, path: Option<&Path>) -> Option<LoadedImage> {
    let path = path?;
    match LoadedImage::load(path) {
        Ok(image) => Some(image),
        Err(e) => {
            warn!(asset = kind, error = %e, "slide asset unavailable");
            None
        },
    }
}

/// Places the shapes of one slide. Built once per deck; the header and
/// badge images are read a single time.
pub struct SlideComposer<'a> {
    assets: &'a SlideAssets,
    header: Option<LoadedImage>,
    badge: Option<LoadedImage>,
}

impl<'a> SlideComposer<'a> {
    pub fn new(assets: &'a SlideAssets) -> Self {
        Self {
            assets,
            header: load_asset("header", assets.header_image.as_deref()),
            badge: load_asset("badge", assets.badge_image.as_deref()),
        }
    }

    fn layout(&self) -> &LayoutSpec {
        &self.assets.layout
    }

    /// Fill `slide` from `resolved`.
    pub fn compose(&self, slide: &mut MutableSlide, resolved: &ResolvedProject) {
        let project = &resolved.project;
        slide.set_name(project.slide_name());

        self.place_header(slide);
        let logo = self.place_logo(slide, resolved.logo.as_deref());
        let badge = if project.include_quality_badge && logo.is_some() {
            self.place_badge(slide)
        } else {
            None
        };
        self.place_title(slide, &project.title, logo.is_some(), badge);
        self.place_overview(slide, &project.bullets);
        self.place_images(slide, &resolved.images);
        self.place_footer(slide);

        debug!(
            slide = project.slide_name(),
            shapes = slide.shape_count(),
            logo = logo.is_some(),
            badge = badge.is_some(),
            "composed slide"
        );
    }

    fn place_header(&self, slide: &mut MutableSlide) {
        let layout = self.layout();
        if let Some(header) = &self.header {
            match add_picture(slide, header, layout.header, "Header banner") {
                Ok(shape) => {
                    shape.set_name("Header Band");
                    return;
                },
                Err(e) => warn!(error = %e, "header banner failed, using plain band"),
            }
        }
        let shape = add_box(slide, layout.header, layout.header_fill);
        shape.set_name("Header Band");
        write_text(shape, layout.header_label, &layout.header_text);
        shape.align(TextAlign::Center).anchor(TextAnchor::Middle);
    }

    fn place_logo(&self, slide: &mut MutableSlide, path: Option<&Path>) -> Option<Rect> {
        let path = path?;
        let layout = self.layout();
        let placed = LoadedImage::load(path).and_then(|logo| {
            let rect = layout
                .place(layout.logo_slot, logo.width, logo.height)
                .ok_or_else(|| CompositionError::Degenerate(path.to_path_buf()))?;
            add_picture(slide, &logo, rect, "Customer logo")?.set_name("Logo");
            Ok(rect)
        });
        match placed {
            Ok(rect) => Some(rect),
            Err(e) => {
                warn!(error = %e, "logo could not be placed, rendering without logo");
                None
            },
        }
    }

    fn place_badge(&self, slide: &mut MutableSlide) -> Option<Rect> {
        let badge = self.badge.as_ref()?;
        let layout = self.layout();
        let rect = layout.place(layout.badge_slot, badge.width, badge.height)?;
        match add_picture(slide, badge, rect, "Execution Quality Index") {
            Ok(shape) => {
                shape.set_name("EQI Badge");
                Some(rect)
            },
            Err(e) => {
                warn!(error = %e, "quality badge could not be placed");
                None
            },
        }
    }

    fn place_title(&self, slide: &mut MutableSlide, title: &str, has_logo: bool, badge: Option<Rect>) {
        let layout = self.layout();
        let rect = layout.title_rect(has_logo, badge);
        let frame = rect.frame();
        let shape = slide.add_rounded_rectangle(
            frame.x,
            frame.y,
            frame.width,
            frame.height,
            Some(layout.title_fill.to_string()),
        );
        shape
            .set_name("Project Title")
            .outline(layout.title_border, pt_to_emu(layout.title_border_pt));
        write_text(shape, title, &layout.title_text);
        shape.align(TextAlign::Center).anchor(TextAnchor::Middle);
    }

    fn place_overview(&self, slide: &mut MutableSlide, bullets: &[String]) {
        let layout = self.layout();
        let shape = self.add_bordered_box(slide, layout.overview_box);
        shape.set_name("Project Overview");
        write_text(shape, layout.overview_heading, &layout.heading_text);

        let bullet_format = layout.bullet_text.format();
        if bullets.is_empty() {
            for line in layout.default_bullets {
                shape.add_paragraph(line, bullet_format.clone());
            }
        } else {
            for line in bullets {
                shape.add_paragraph(line, bullet_format.clone());
            }
        }
        shape.align(TextAlign::Left).anchor(TextAnchor::Top);
    }

    fn place_images(&self, slide: &mut MutableSlide, images: &[ResolvedImage]) {
        let layout = self.layout();
        let shape = self.add_bordered_box(slide, layout.image_box);
        shape.set_name("Image Box");
        if images.is_empty() {
            write_text(shape, layout.empty_images_label, &layout.empty_images_text);
            shape.align(TextAlign::Center).anchor(TextAnchor::Middle);
            return;
        }

        for (index, image) in images.iter().enumerate() {
            let number = index + 1;
            let column = layout.image_column(index, images.len());

            let frame = column.caption.frame();
            let caption =
                slide.add_text_box(&image.caption, frame.x, frame.y, frame.width, frame.height);
            caption
                .set_name(&format!("Caption {number}"))
                .set_text_format(layout.caption_text.format())
                .align(TextAlign::Center);

            let Some(path) = image.path.as_deref() else {
                self.place_placeholder(slide, column.slot, number);
                continue;
            };
            let placed = LoadedImage::load(path).and_then(|loaded| {
                let rect = layout
                    .place(column.slot, loaded.width, loaded.height)
                    .ok_or_else(|| CompositionError::Degenerate(path.to_path_buf()))?;
                add_picture(slide, &loaded, rect, &image.caption)?
                    .set_name(&format!("Image {number}"));
                Ok(())
            });
            if let Err(e) = placed {
                warn!(image = number, url = %image.source, error = %e, "image could not be placed");
                self.place_placeholder(slide, column.slot, number);
            }
        }
    }

    fn place_placeholder(&self, slide: &mut MutableSlide, slot: Rect, number: usize) {
        let layout = self.layout();
        let shape = add_box(slide, slot, layout.placeholder_fill);
        shape.set_name(&format!("Image {number} Placeholder"));
        write_text(shape, &format!("Image {number}"), &layout.placeholder_text);
        shape.align(TextAlign::Center).anchor(TextAnchor::Middle);
    }

    fn place_footer(&self, slide: &mut MutableSlide) {
        let layout = self.layout();
        let frame = layout.footer.frame();
        slide
            .add_text_box(
                &self.assets.footer_text,
                frame.x,
                frame.y,
                frame.width,
                frame.height,
            )
            .set_name("Footer")
            .set_text_format(layout.footer_text.format())
            .align(TextAlign::Center);
    }

    fn add_bordered_box<'s>(&self, slide: &'s mut MutableSlide, rect: Rect) -> &'s mut MutableShape {
        let layout = self.layout();
        let shape = add_box(slide, rect, layout.box_fill);
        shape.outline(layout.box_border, pt_to_emu(layout.box_border_pt));
        shape
    }
}

fn add_box<'s>(slide: &'s mut MutableSlide, rect: Rect, fill: &str) -> &'s mut MutableShape {
    let frame = rect.frame();
    slide.add_rectangle(
        frame.x,
        frame.y,
        frame.width,
        frame.height,
        Some(fill.to_string()),
    )
}

fn add_picture<'s>(
    slide: &'s mut MutableSlide,
    image: &LoadedImage,
    rect: Rect,
    description: &str,
) -> Result<&'s mut MutableShape, CompositionError> {
    let frame = rect.frame();
    Ok(slide.add_picture_from_bytes(
        Arc::clone(&image.data),
        frame.x,
        frame.y,
        frame.width,
        frame.height,
        Some(description.to_string()),
    )?)
}

fn write_text(shape: &mut MutableShape, text: &str, style: &TextStyle) {
    shape.text_content(text).set_text_format(style.format());
}

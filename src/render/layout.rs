//! Slide geometry and styling constants.
//!
//! All positions are in inches from the top-left corner of a 13.333" x 7.5"
//! slide; [`Rect::frame`] converts to EMUs at the writer boundary.

use crate::common::unit::inches_to_emu;
use crate::ooxml::pptx::{Frame, TextFormat};

/// Axis-aligned box in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Same anchor, new size.
    pub fn resized(&self, width: f64, height: f64) -> Self {
        Self::new(self.left, self.top, width, height)
    }

    pub fn frame(&self) -> Frame {
        Frame::new(
            inches_to_emu(self.left),
            inches_to_emu(self.top),
            inches_to_emu(self.width),
            inches_to_emu(self.height),
        )
    }
}

/// Run styling for one kind of text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font: &'static str,
    pub size: f64,
    pub bold: bool,
    pub color: &'static str,
}

impl TextStyle {
    pub fn format(&self) -> TextFormat {
        TextFormat {
            font: Some(self.font.to_string()),
            size: Some(self.size),
            bold: Some(self.bold),
            color: Some(self.color.to_string()),
            ..Default::default()
        }
    }
}

/// Caption and image slot of one column in the image box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageColumn {
    pub caption: Rect,
    /// Bound the image is fitted into; the image keeps its top-left anchor.
    pub slot: Rect,
}

/// Every position, color, font and size the composer uses.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutSpec {
    pub slide_width: f64,
    pub slide_height: f64,

    pub header: Rect,
    pub header_fill: &'static str,
    pub header_label: &'static str,
    pub header_text: TextStyle,

    pub logo_slot: Rect,
    pub badge_slot: Rect,

    pub title_top: f64,
    pub title_height: f64,
    /// Left edge and width when there is no logo.
    pub title_without_logo: (f64, f64),
    /// Left edge and width when there is a logo but no badge.
    pub title_after_logo: (f64, f64),
    pub title_gap: f64,
    pub title_right_margin: f64,
    pub title_fill: &'static str,
    pub title_border: &'static str,
    pub title_border_pt: f64,
    pub title_text: TextStyle,

    pub box_fill: &'static str,
    pub box_border: &'static str,
    pub box_border_pt: f64,

    pub overview_box: Rect,
    pub overview_heading: &'static str,
    pub heading_text: TextStyle,
    pub bullet_text: TextStyle,
    pub default_bullets: &'static [&'static str],

    pub image_box: Rect,
    /// Horizontal space of the image box not handed out to columns.
    pub image_box_padding: f64,
    /// Distance from the box's left edge to the first column.
    pub image_box_inset: f64,
    pub column_gap: f64,
    pub caption_offset: f64,
    pub caption_height: f64,
    pub image_offset: f64,
    /// Vertical space of the image box not available to images.
    pub image_height_trim: f64,
    pub caption_text: TextStyle,
    pub empty_images_label: &'static str,
    pub empty_images_text: TextStyle,
    pub placeholder_fill: &'static str,
    pub placeholder_text: TextStyle,

    pub footer: Rect,
    pub footer_text: TextStyle,
}

const CALIBRI: &str = "Calibri";
const LIGHT_BLUE: &str = "ADD8E6";
const DARK_BLUE: &str = "00008B";
const GRAY: &str = "808080";
const BLACK: &str = "000000";

impl LayoutSpec {
    pub const STANDARD: LayoutSpec = LayoutSpec {
        slide_width: 13.333,
        slide_height: 7.5,

        header: Rect::new(0.0, 0.0, 13.333, 1.5),
        header_fill: LIGHT_BLUE,
        header_label: "Project Header",
        header_text: TextStyle {
            font: CALIBRI,
            size: 24.0,
            bold: true,
            color: DARK_BLUE,
        },

        logo_slot: Rect::new(0.2, 2.1, 0.8, 0.8),
        badge_slot: Rect::new(1.1, 2.1, 2.0, 0.8),

        title_top: 2.0,
        title_height: 1.0,
        title_without_logo: (1.0, 11.33),
        title_after_logo: (1.1, 11.23),
        title_gap: 0.1,
        title_right_margin: 0.2,
        title_fill: LIGHT_BLUE,
        title_border: DARK_BLUE,
        title_border_pt: 2.0,
        title_text: TextStyle {
            font: CALIBRI,
            size: 19.2,
            bold: true,
            color: DARK_BLUE,
        },

        box_fill: "FFFFFF",
        box_border: BLACK,
        box_border_pt: 3.0,

        overview_box: Rect::new(1.0, 3.5, 3.0, 3.0),
        overview_heading: "Project Overview/Callouts",
        heading_text: TextStyle {
            font: CALIBRI,
            size: 12.0,
            bold: true,
            color: BLACK,
        },
        bullet_text: TextStyle {
            font: CALIBRI,
            size: 11.0,
            bold: false,
            color: BLACK,
        },
        default_bullets: &["• Add project overview here", "• Add key callouts here"],

        image_box: Rect::new(4.5, 3.5, 7.83, 3.0),
        image_box_padding: 0.4,
        image_box_inset: 0.2,
        column_gap: 0.1,
        caption_offset: 0.02,
        caption_height: 0.25,
        image_offset: 0.27,
        image_height_trim: 0.3,
        caption_text: TextStyle {
            font: CALIBRI,
            size: 9.6,
            bold: true,
            color: BLACK,
        },
        empty_images_label: "Images",
        empty_images_text: TextStyle {
            font: CALIBRI,
            size: 14.0,
            bold: false,
            color: GRAY,
        },
        placeholder_fill: "D3D3D3",
        placeholder_text: TextStyle {
            font: CALIBRI,
            size: 9.6,
            bold: false,
            color: GRAY,
        },

        footer: Rect::new(0.0, 6.8, 13.333, 0.5),
        footer_text: TextStyle {
            font: CALIBRI,
            size: 8.0,
            bold: false,
            color: GRAY,
        },
    };

    /// Title box bounds given the placed logo and badge.
    pub fn title_rect(&self, has_logo: bool, badge: Option<Rect>) -> Rect {
        let (left, width) = match (has_logo, badge) {
            (false, _) => self.title_without_logo,
            (true, None) => self.title_after_logo,
            (true, Some(badge)) => {
                let left = badge.right() + self.title_gap;
                (left, self.slide_width - left - self.title_right_margin)
            },
        };
        Rect::new(left, self.title_top, width, self.title_height)
    }

    /// Width handed to each of `count` image columns.
    pub fn column_width(&self, count: usize) -> f64 {
        (self.image_box.width - self.image_box_padding) / count.max(1) as f64
    }

    /// Caption and image slot of column `index` out of `count`.
    pub fn image_column(&self, index: usize, count: usize) -> ImageColumn {
        let width = self.column_width(count);
        let left = self.image_box.left + self.image_box_inset + index as f64 * width;
        let inner = width - self.column_gap;
        ImageColumn {
            caption: Rect::new(
                left,
                self.image_box.top + self.caption_offset,
                inner,
                self.caption_height,
            ),
            slot: Rect::new(
                left,
                self.image_box.top + self.image_offset,
                inner,
                self.image_box.height - self.image_height_trim,
            ),
        }
    }

    /// Fit a `width` x `height` pixel image into `slot`, keeping the slot's
    /// top-left anchor.
    pub fn place(&self, slot: Rect, width: u32, height: u32) -> Option<Rect> {
        let (w, h) = fit_within((width, height), slot.width, slot.height)?;
        Some(slot.resized(w, h))
    }
}

impl Default for LayoutSpec {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Scale a `w x h` source into `max_w x max_h` without distortion.
///
/// When the bound is relatively wider than the source the image is
/// height-bound, otherwise width-bound. `None` for degenerate inputs.
pub fn fit_within(source: (u32, u32), max_w: f64, max_h: f64) -> Option<(f64, f64)> {
    let (w, h) = source;
    if w == 0 || h == 0 || max_w <= 0.0 || max_h <= 0.0 {
        return None;
    }
    let ratio = f64::from(w) / f64::from(h);
    if max_w / max_h > ratio {
        Some((max_h * ratio, max_h))
    } else {
        Some((max_w, max_w / ratio))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_title_cases() {
        let spec = LayoutSpec::STANDARD;

        let no_logo = spec.title_rect(false, None);
        assert_eq!((no_logo.left, no_logo.width), (1.0, 11.33));
        assert_eq!((no_logo.top, no_logo.height), (2.0, 1.0));

        let logo_only = spec.title_rect(true, None);
        assert_eq!((logo_only.left, logo_only.width), (1.1, 11.23));

        let badge = spec.badge_slot.resized(1.6, 0.8);
        let both = spec.title_rect(true, Some(badge));
        assert!((both.left - 2.8).abs() < EPS);
        assert!((both.right() - (spec.slide_width - 0.2)).abs() < EPS);
    }

    #[test]
    fn test_badge_alone_is_ignored_without_logo() {
        let spec = LayoutSpec::STANDARD;
        let badge = spec.badge_slot;
        assert_eq!(spec.title_rect(false, Some(badge)), spec.title_rect(false, None));
    }

    #[test]
    fn test_columns_partition_the_image_box() {
        let spec = LayoutSpec::STANDARD;
        for count in 1..=5 {
            let first = spec.image_column(0, count);
            let last = spec.image_column(count - 1, count);
            assert!((first.slot.left - 4.7).abs() < EPS);
            assert!(last.slot.right() <= spec.image_box.right() + EPS);
            assert!((first.slot.height - 2.7).abs() < EPS);
            assert!((first.caption.height - 0.25).abs() < EPS);
            assert!(first.caption.bottom() <= first.slot.top + EPS);
        }
        let two = spec.image_column(1, 2);
        assert!((two.slot.left - (4.7 + 3.715)).abs() < EPS);
    }

    #[test]
    fn test_fit_within_binding_dimension() {
        // Wide source in a square: width-bound.
        assert_eq!(fit_within((200, 100), 0.8, 0.8), Some((0.8, 0.4)));
        // Tall source in a square: height-bound.
        assert_eq!(fit_within((100, 200), 0.8, 0.8), Some((0.4, 0.8)));
        // Square source in a wide slot: height-bound.
        assert_eq!(fit_within((50, 50), 2.0, 0.8), Some((0.8, 0.8)));
        assert_eq!(fit_within((0, 50), 2.0, 0.8), None);
        assert_eq!(fit_within((50, 50), 0.0, 0.8), None);
    }

    #[test]
    fn test_frame_conversion() {
        let frame = Rect::new(1.0, 0.5, 2.0, 0.25).frame();
        assert_eq!(frame, Frame::new(914_400, 457_200, 1_828_800, 228_600));
    }

    proptest! {
        #[test]
        fn prop_fit_within_never_distorts_or_overflows(
            w in 1u32..5000,
            h in 1u32..5000,
            max_w in 0.1f64..12.0,
            max_h in 0.1f64..6.0,
        ) {
            let (fw, fh) = fit_within((w, h), max_w, max_h).unwrap();
            prop_assert!(fw <= max_w + EPS && fh <= max_h + EPS);
            let ratio = f64::from(w) / f64::from(h);
            prop_assert!((fw / fh - ratio).abs() <= ratio * 1e-9);
            prop_assert!((fw - max_w).abs() < EPS || (fh - max_h).abs() < EPS);
        }
    }
}

//! Word placement: from normalized OCR boxes to page-unit draw commands.

use crate::error::{Error, Result};
use crate::model::{BoundingBox, PageGeometry, TextAnnotation, Word};

/// One positioned text draw, in top-left page units of the displayed page.
///
/// `y` is the baseline: the bottom edge of the word's box, measured down
/// from the top of the page. On rotated pages "top" and "left" are those of
/// the page as shown, which is how OCR sees a rasterized page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextDraw {
    /// Word text, unnormalized
    pub text: String,

    /// Left edge in points
    pub x: f64,

    /// Baseline in points from the top edge
    pub y: f64,

    /// Font size in points (the box height)
    pub font_size: f64,

    /// Box width in points
    pub width: f64,
}

impl TextDraw {
    /// Place a word's box on a page of the given size.
    pub fn place(word: &Word, bbox: &BoundingBox, geometry: &PageGeometry) -> Self {
        let (w, h) = geometry.displayed_dimensions();
        let font_size = bbox.height() * h;
        Self {
            text: word.text(),
            x: w * bbox.min_x,
            y: h * bbox.min_y + font_size,
            font_size,
            width: bbox.width() * w,
        }
    }

    /// Baseline origin in PDF user space (bottom-left origin, MediaBox offset applied).
    ///
    /// The displayed position is turned back through the page's `/Rotate`.
    pub fn pdf_origin(&self, geometry: &PageGeometry) -> (f64, f64) {
        let (_, displayed_height) = geometry.displayed_dimensions();
        let (dx, dy) = (self.x, displayed_height - self.y);
        let (w, h) = geometry.dimensions();
        let (u, v) = match geometry.rotation {
            90 => (w - dy, dx),
            180 => (w - dx, h - dy),
            270 => (dy, h - dx),
            _ => (dx, dy),
        };
        (geometry.origin_x + u, geometry.origin_y + v)
    }
}

/// Iterate an annotation's words depth-first (block → paragraph → word)
/// together with their bounding boxes.
///
/// The iterator is lazy and can be restarted by calling this again. A word
/// with no symbols or with an empty polygon yields an error in its place.
pub fn placed_words(
    annotation: &TextAnnotation,
) -> impl Iterator<Item = Result<(&Word, BoundingBox)>> + '_ {
    annotation
        .blocks()
        .flat_map(|block| block.paragraphs.iter())
        .flat_map(|paragraph| paragraph.words.iter())
        .map(|word| {
            if word.is_empty() {
                return Err(Error::EmptyWord { page: 0 });
            }
            let bbox = word.bounding_box.bounding_box()?;
            Ok((word, bbox))
        })
}

//! Page and word geometry.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A point in normalized page coordinates.
///
/// `x` and `y` are fractions of the page width and height, origin at the
/// top-left corner. The OCR service omits zero coordinates, so both default
/// to `0.0` when absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedVertex {
    /// Horizontal position (0 = left edge, 1 = right edge)
    #[serde(default)]
    pub x: f32,

    /// Vertical position (0 = top edge, 1 = bottom edge)
    #[serde(default)]
    pub y: f32,
}

impl NormalizedVertex {
    /// Create a vertex.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A bounding polygon, usually four corners in reading order.
///
/// Corners need not be axis-aligned; skewed scans produce rotated quads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingPoly {
    /// Corners in normalized coordinates
    #[serde(default)]
    pub normalized_vertices: Vec<NormalizedVertex>,
}

impl BoundingPoly {
    /// Create a polygon from its corners.
    pub fn new(vertices: Vec<NormalizedVertex>) -> Self {
        Self {
            normalized_vertices: vertices,
        }
    }

    /// Axis-aligned rectangle from `(x0, y0)` to `(x1, y1)`, clockwise from top-left.
    pub fn rect(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self::new(vec![
            NormalizedVertex::new(x0, y0),
            NormalizedVertex::new(x1, y0),
            NormalizedVertex::new(x1, y1),
            NormalizedVertex::new(x0, y1),
        ])
    }

    /// Compute the axis-aligned bounding box of this polygon.
    pub fn bounding_box(&self) -> Result<BoundingBox> {
        BoundingBox::from_vertices(&self.normalized_vertices)
    }
}

/// Axis-aligned box in normalized page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Coordinate-wise min/max over a polygon's vertices.
    ///
    /// Both the min and the max bounds start from the first vertex, so a
    /// polygon that lies entirely away from the origin keeps its true extent.
    /// An empty vertex list is an input-integrity error rather than a zero box.
    pub fn from_vertices(vertices: &[NormalizedVertex]) -> Result<Self> {
        let (first, rest) = vertices
            .split_first()
            .ok_or(Error::EmptyPolygon { page: 0 })?;

        let x = f64::from(first.x);
        let y = f64::from(first.y);
        let mut bbox = Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        };

        for v in rest {
            let (x, y) = (f64::from(v.x), f64::from(v.y));
            bbox.min_x = bbox.min_x.min(x);
            bbox.min_y = bbox.min_y.min(y);
            bbox.max_x = bbox.max_x.max(x);
            bbox.max_y = bbox.max_y.max(y);
        }

        Ok(bbox)
    }

    /// Normalized width.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Normalized height.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Size and placement of a source page, read from its MediaBox.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    /// Page width in points (1 point = 1/72 inch)
    pub width: f64,

    /// Page height in points
    pub height: f64,

    /// Lower-left x of the source MediaBox
    pub origin_x: f64,

    /// Lower-left y of the source MediaBox
    pub origin_y: f64,

    /// Page rotation in degrees (0, 90, 180, 270)
    pub rotation: i64,
}

impl PageGeometry {
    /// Geometry for a page whose MediaBox starts at the origin.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            origin_x: 0.0,
            origin_y: 0.0,
            rotation: 0,
        }
    }

    /// Build geometry from a `[llx lly urx ury]` MediaBox.
    ///
    /// Boxes given with swapped corners are normalized; zero-area or
    /// non-finite boxes are rejected.
    pub fn from_media_box(page: u32, media_box: [f64; 4]) -> Result<Self> {
        if media_box.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidPageGeometry {
                page,
                reason: format!("non-finite MediaBox {:?}", media_box),
            });
        }

        let [x0, y0, x1, y1] = media_box;
        let (llx, urx) = (x0.min(x1), x0.max(x1));
        let (lly, ury) = (y0.min(y1), y0.max(y1));
        let (width, height) = (urx - llx, ury - lly);

        if width <= 0.0 || height <= 0.0 {
            return Err(Error::InvalidPageGeometry {
                page,
                reason: format!("empty MediaBox {:?}", media_box),
            });
        }

        Ok(Self {
            width,
            height,
            origin_x: llx,
            origin_y: lly,
            rotation: 0,
        })
    }

    /// Set the page rotation, normalized to 0..360.
    pub fn with_rotation(mut self, degrees: i64) -> Self {
        self.rotation = degrees.rem_euclid(360);
        self
    }

    /// The MediaBox as `[llx, lly, urx, ury]`.
    pub fn media_box(&self) -> [f64; 4] {
        [
            self.origin_x,
            self.origin_y,
            self.origin_x + self.width,
            self.origin_y + self.height,
        ]
    }

    /// Get page dimensions as (width, height) tuple.
    pub fn dimensions(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// Dimensions as the page is displayed, after applying `/Rotate`.
    ///
    /// Rasterized pages (and so OCR coordinates) use this orientation.
    pub fn displayed_dimensions(&self) -> (f64, f64) {
        match self.rotation {
            90 | 270 => (self.height, self.width),
            _ => (self.width, self.height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f32, y: f32) -> NormalizedVertex {
        NormalizedVertex::new(x, y)
    }

    #[test]
    fn test_axis_aligned_box() {
        let bbox =
            BoundingBox::from_vertices(&[v(0.1, 0.2), v(0.3, 0.2), v(0.3, 0.4), v(0.1, 0.4)])
                .unwrap();
        assert_eq!(bbox.min_x, f64::from(0.1f32));
        assert_eq!(bbox.min_y, f64::from(0.2f32));
        assert_eq!(bbox.max_x, f64::from(0.3f32));
        assert_eq!(bbox.max_y, f64::from(0.4f32));
    }

    #[test]
    fn test_rotated_polygon() {
        // A skewed quad: corners are not axis-aligned
        let bbox =
            BoundingBox::from_vertices(&[v(0.2, 0.1), v(0.5, 0.15), v(0.48, 0.3), v(0.18, 0.25)])
                .unwrap();
        assert_eq!(bbox.min_x, f64::from(0.18f32));
        assert_eq!(bbox.max_x, f64::from(0.5f32));
        assert_eq!(bbox.min_y, f64::from(0.1f32));
        assert_eq!(bbox.max_y, f64::from(0.3f32));
    }

    #[test]
    fn test_displayed_dimensions() {
        let page = PageGeometry::new(200.0, 100.0);
        assert_eq!(page.displayed_dimensions(), (200.0, 100.0));
        assert_eq!(page.with_rotation(90).displayed_dimensions(), (100.0, 200.0));
        assert_eq!(page.with_rotation(-90).displayed_dimensions(), (100.0, 200.0));
        assert_eq!(page.with_rotation(180).displayed_dimensions(), (200.0, 100.0));
    }

    #[test]
    fn test_empty_polygon_fails() {
        let result = BoundingBox::from_vertices(&[]);
        assert!(matches!(result, Err(Error::EmptyPolygon { .. })));
    }

    #[test]
    fn test_single_vertex_is_degenerate_but_valid() {
        let bbox = BoundingBox::from_vertices(&[v(0.7, 0.9)]).unwrap();
        assert_eq!(bbox.width(), 0.0);
        assert_eq!(bbox.height(), 0.0);
        assert_eq!(bbox.min_x, f64::from(0.7f32));
    }

    #[test]
    fn test_max_bounds_start_from_first_vertex() {
        // A zero-initialized max would report max_x = 0 here and clip the box.
        let bbox = BoundingBox::from_vertices(&[v(-0.4, -0.3), v(-0.2, -0.1)]).unwrap();
        assert_eq!(bbox.max_x, f64::from(-0.2f32));
        assert_eq!(bbox.max_y, f64::from(-0.1f32));
        assert!(bbox.width() > 0.0);
    }

    #[test]
    fn test_bounds_stay_within_input_range() {
        let polygons: Vec<Vec<NormalizedVertex>> = vec![
            vec![v(0.0, 0.0)],
            vec![v(1.0, 1.0), v(0.0, 0.0)],
            vec![v(0.9, 0.1), v(0.2, 0.8), v(0.5, 0.5)],
            vec![v(0.33, 0.66), v(0.33, 0.66), v(0.34, 0.67), v(0.32, 0.65)],
        ];

        for poly in polygons {
            let bbox = BoundingBox::from_vertices(&poly).unwrap();
            let xs: Vec<f64> = poly.iter().map(|p| f64::from(p.x)).collect();
            let ys: Vec<f64> = poly.iter().map(|p| f64::from(p.y)).collect();
            let lo_x = xs.iter().cloned().fold(f64::INFINITY, f64::min);
            let hi_x = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let lo_y = ys.iter().cloned().fold(f64::INFINITY, f64::min);
            let hi_y = ys.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

            assert!(bbox.min_x <= bbox.max_x);
            assert!(bbox.min_y <= bbox.max_y);
            assert!(bbox.min_x >= lo_x && bbox.max_x <= hi_x);
            assert!(bbox.min_y >= lo_y && bbox.max_y <= hi_y);
        }
    }

    #[test]
    fn test_vertex_defaults_for_omitted_zero() {
        let vertex: NormalizedVertex = serde_json::from_str(r#"{"y": 0.25}"#).unwrap();
        assert_eq!(vertex, v(0.0, 0.25));

        let poly: BoundingPoly =
            serde_json::from_str(r#"{"normalizedVertices": [{}, {"x": 1}]}"#).unwrap();
        assert_eq!(poly.normalized_vertices, vec![v(0.0, 0.0), v(1.0, 0.0)]);
    }

    #[test]
    fn test_page_geometry_from_media_box() {
        let geometry = PageGeometry::from_media_box(1, [0.0, 0.0, 612.0, 792.0]).unwrap();
        assert_eq!(geometry.dimensions(), (612.0, 792.0));

        let shifted = PageGeometry::from_media_box(2, [10.0, 20.0, 210.0, 120.0]).unwrap();
        assert_eq!(shifted.dimensions(), (200.0, 100.0));
        assert_eq!(shifted.media_box(), [10.0, 20.0, 210.0, 120.0]);
    }

    #[test]
    fn test_page_geometry_swapped_corners() {
        let geometry = PageGeometry::from_media_box(1, [200.0, 100.0, 0.0, 0.0]).unwrap();
        assert_eq!(geometry.dimensions(), (200.0, 100.0));
        assert_eq!(geometry.origin_x, 0.0);
    }

    #[test]
    fn test_page_geometry_rejects_empty_box() {
        let result = PageGeometry::from_media_box(4, [0.0, 0.0, 0.0, 792.0]);
        assert!(matches!(
            result,
            Err(Error::InvalidPageGeometry { page: 4, .. })
        ));

        let result = PageGeometry::from_media_box(1, [0.0, 0.0, f64::NAN, 10.0]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rotation_normalized() {
        assert_eq!(PageGeometry::new(1.0, 1.0).with_rotation(-90).rotation, 270);
        assert_eq!(PageGeometry::new(1.0, 1.0).with_rotation(450).rotation, 90);
    }
}

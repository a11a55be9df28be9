//! Content-stream operators for the text layer.

use lopdf::content::Operation;
use lopdf::Object;

use crate::model::PageGeometry;
use crate::options::TextMode;

use super::font::EncodedText;
use super::placement::TextDraw;

/// Resource name of the overlay font on every output page.
pub const FONT_RESOURCE: &str = "OCR";

/// Fill colour of visible debug text.
const DEBUG_COLOR: [f32; 3] = [1.0, 0.0, 0.0];

/// Horizontal scale limits for `Tz`, in percent.
const MIN_SCALE: f64 = 1.0;
const MAX_SCALE: f64 = 1000.0;

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

/// The `a b c d` part of the text matrix that keeps text upright on a page
/// shown with the given `/Rotate`.
fn upright_matrix(rotation: i64) -> [i64; 4] {
    match rotation {
        90 => [0, 1, -1, 0],
        180 => [-1, 0, 0, -1],
        270 => [0, -1, 1, 0],
        _ => [1, 0, 0, 1],
    }
}

/// Horizontal scale (percent) that makes `encoded` span `width` points.
///
/// Returns `None` when the text has no advance or the box no width, so the
/// text is drawn unscaled.
pub fn fit_scale(encoded: &EncodedText, font_size: f64, width: f64) -> Option<f64> {
    let natural = encoded.width(font_size);
    if natural <= 0.0 || width <= 0.0 || !natural.is_finite() || !width.is_finite() {
        return None;
    }
    Some((width / natural * 100.0).clamp(MIN_SCALE, MAX_SCALE))
}

/// Build the operators drawing one word as a self-contained text object.
pub fn text_operations(
    draw: &TextDraw,
    encoded: &EncodedText,
    geometry: &PageGeometry,
    mode: TextMode,
    fit_width: bool,
    embedded: bool,
) -> Vec<Operation> {
    let (x, y) = draw.pdf_origin(geometry);
    let mut ops = Vec::with_capacity(8);

    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tr", vec![Object::Integer(mode.render_mode())]));
    if mode == TextMode::Visible {
        ops.push(Operation::new(
            "rg",
            DEBUG_COLOR.iter().map(|c| Object::Real(*c)).collect(),
        ));
    }
    ops.push(Operation::new(
        "Tf",
        vec![Object::Name(FONT_RESOURCE.as_bytes().to_vec()), real(draw.font_size)],
    ));
    let scale = if fit_width {
        fit_scale(encoded, draw.font_size, draw.width)
    } else {
        None
    };
    ops.push(Operation::new("Tz", vec![real(scale.unwrap_or(100.0))]));
    let mut matrix: Vec<Object> = upright_matrix(geometry.rotation)
        .iter()
        .map(|c| Object::Integer(*c))
        .collect();
    matrix.extend([real(x), real(y)]);
    ops.push(Operation::new("Tm", matrix));
    ops.push(Operation::new("Tj", vec![encoded.operand(embedded)]));
    ops.push(Operation::new("ET", vec![]));
    ops
}

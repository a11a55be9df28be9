//! Text-layer rendering: word placement, fonts and content operators.

mod font;
mod placement;
mod text_layer;

pub use font::{
    encode_win_ansi, win_ansi_code, EmbeddedFont, EncodedText, FontSource, OverlayFont,
    GLYPHLESS_ADVANCE,
};
pub use placement::{placed_words, TextDraw};
pub use text_layer::{fit_scale, text_operations, FONT_RESOURCE};

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::Result;

/// Zlib-compress stream data for a `/FlateDecode` filter.
pub(crate) fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

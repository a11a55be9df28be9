//! Data model shared by the OCR loader, the indexer and the reconstructor.
//!
//! The annotation types follow the OCR service's JSON output; the geometry
//! types hold normalized word boxes and absolute page sizes.

mod annotation;
mod geometry;

pub use annotation::{
    assemble_text, AnnotateFileResponse, AnnotateImageResponse, AnnotatedPage, Block,
    ImageContext, Paragraph, Status, Symbol, TextAnnotation, Word,
};
pub use geometry::{BoundingBox, BoundingPoly, NormalizedVertex, PageGeometry};

//! OCR annotation tree: blocks, paragraphs, words and symbols.
//!
//! The types mirror the document text detection output of the OCR service
//! (`AnnotateFileResponse` JSON, camelCase field names). Unknown fields are
//! ignored, so richer responses decode without changes here.

use serde::{Deserialize, Serialize};

use super::geometry::BoundingPoly;

/// A single recognized character or glyph cluster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    /// Recognized text, usually one character
    #[serde(default)]
    pub text: String,

    /// Recognition confidence in `[0, 1]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl Symbol {
    /// Create a symbol with the given text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            confidence: None,
        }
    }
}

/// A recognized word: symbols in reading order plus the word's polygon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    /// Symbols in reading order
    #[serde(default)]
    pub symbols: Vec<Symbol>,

    /// Word outline in normalized page coordinates
    #[serde(default)]
    pub bounding_box: BoundingPoly,

    /// Recognition confidence in `[0, 1]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl Word {
    /// Build a word from its text, one symbol per character.
    pub fn from_text(text: &str, bounding_box: BoundingPoly) -> Self {
        Self {
            symbols: text.chars().map(|c| Symbol::new(c.to_string())).collect(),
            bounding_box,
            confidence: None,
        }
    }

    /// The word's text: its symbols concatenated in order.
    pub fn text(&self) -> String {
        assemble_text(self.symbols.iter().map(|s| s.text.as_str()))
    }

    /// Whether the word carries no symbols at all.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Concatenate symbol fragments in order.
///
/// No separators are inserted and nothing is normalized: word spacing in the
/// output comes from each word's own position, not from embedded spaces.
pub fn assemble_text<'a, I>(fragments: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    fragments.into_iter().collect()
}

/// An ordered run of words.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    #[serde(default)]
    pub words: Vec<Word>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

/// An ordered run of paragraphs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,

    /// Block kind reported by the OCR service (e.g. `TEXT`, `TABLE`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

/// One page of a text annotation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedPage {
    /// Blocks in reading order
    #[serde(default)]
    pub blocks: Vec<Block>,

    /// Page width as reported by the OCR service
    #[serde(default)]
    pub width: u32,

    /// Page height as reported by the OCR service
    #[serde(default)]
    pub height: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

/// All text recognized on one physical page.
///
/// For PDF input the OCR service emits one response per page, each with a
/// single entry in `pages`; several entries are still traversed in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextAnnotation {
    #[serde(default)]
    pub pages: Vec<AnnotatedPage>,

    /// Full recognized text with line breaks
    #[serde(default)]
    pub text: String,
}

impl TextAnnotation {
    /// Wrap a list of blocks as a single-page annotation.
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        Self {
            pages: vec![AnnotatedPage {
                blocks,
                ..Default::default()
            }],
            text: String::new(),
        }
    }

    /// Blocks of every contained page, in order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> + '_ {
        self.pages.iter().flat_map(|p| p.blocks.iter())
    }

    /// Words in block → paragraph → word order.
    pub fn words(&self) -> impl Iterator<Item = &Word> + '_ {
        self.blocks()
            .flat_map(|b| b.paragraphs.iter())
            .flat_map(|p| p.words.iter())
    }

    /// Number of words on the page.
    pub fn word_count(&self) -> usize {
        self.words().count()
    }
}

/// Where a response came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageContext {
    /// Source file URI
    #[serde(default)]
    pub uri: String,

    /// 1-based page number within the source file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
}

/// Error status attached to a failed page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub code: i32,

    #[serde(default)]
    pub message: String,
}

/// OCR result for one page of the source file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateImageResponse {
    /// Recognized text; absent when nothing was found
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_text_annotation: Option<TextAnnotation>,

    /// Page this response belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ImageContext>,

    /// Set when OCR failed for this page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Status>,
}

impl AnnotateImageResponse {
    /// A response for `page_number` carrying `annotation`.
    pub fn for_page(page_number: u32, annotation: Option<TextAnnotation>) -> Self {
        Self {
            full_text_annotation: annotation,
            context: Some(ImageContext {
                uri: String::new(),
                page_number: Some(page_number),
            }),
            error: None,
        }
    }

    /// The page number from the response context, if any.
    pub fn page_number(&self) -> Option<u32> {
        self.context.as_ref().and_then(|c| c.page_number)
    }
}

/// Contents of one OCR output file; may bundle several pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotateFileResponse {
    #[serde(default)]
    pub responses: Vec<AnnotateImageResponse>,
}

impl AnnotateFileResponse {
    /// Bundle page responses into one file response.
    pub fn new(responses: Vec<AnnotateImageResponse>) -> Self {
        Self { responses }
    }
}

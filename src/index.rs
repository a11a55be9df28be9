//! Page-number index over OCR responses.
//!
//! The index is built once per document and read-only afterwards. It keeps
//! three cases apart:
//!
//! - page annotated: the OCR service returned text for it
//! - page known but empty: a response exists with no text (or an OCR error)
//! - page missing: no response mentioned the page at all
//!
//! Only the last case is a data-completeness gap worth warning about.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::model::{AnnotateFileResponse, AnnotateImageResponse, TextAnnotation};

/// Result of looking a page up in the index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PageLookup<'a> {
    /// Recognized text for the page.
    Annotated(&'a TextAnnotation),
    /// The page was processed but no text was recognized.
    Empty,
    /// No response covered the page.
    Missing,
}

/// Mapping from 1-based page number to that page's annotation.
#[derive(Debug, Clone, Default)]
pub struct AnnotationIndex {
    pages: BTreeMap<u32, Option<TextAnnotation>>,
    failures: BTreeMap<u32, String>,
}

impl AnnotationIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every page response of every file, in iteration order.
    ///
    /// When a page number repeats, the later response replaces the earlier
    /// one; nothing is merged.
    pub fn from_responses<I>(files: I) -> Result<Self>
    where
        I: IntoIterator<Item = AnnotateFileResponse>,
    {
        let mut index = Self::new();
        for file in files {
            for response in file.responses {
                index.insert_response(response)?;
            }
        }
        Ok(index)
    }

    /// Index a single page response.
    pub fn insert_response(&mut self, response: AnnotateImageResponse) -> Result<()> {
        let page = match response.page_number() {
            Some(0) => {
                return Err(Error::InvalidPageNumber(
                    "page numbers are 1-based, got 0".to_string(),
                ))
            }
            Some(n) => n,
            None => {
                return Err(Error::InvalidPageNumber(
                    "response has no page number in its context".to_string(),
                ))
            }
        };

        match response.error {
            Some(status) => {
                self.failures.insert(page, status.message);
                self.pages.insert(page, None);
            }
            None => {
                self.failures.remove(&page);
                self.pages.insert(page, response.full_text_annotation);
            }
        }
        Ok(())
    }

    /// Set the annotation for a page directly.
    pub fn insert(&mut self, page: u32, annotation: Option<TextAnnotation>) {
        self.failures.remove(&page);
        self.pages.insert(page, annotation);
    }

    /// Look a page up.
    pub fn lookup(&self, page: u32) -> PageLookup<'_> {
        match self.pages.get(&page) {
            Some(Some(annotation)) => PageLookup::Annotated(annotation),
            Some(None) => PageLookup::Empty,
            None => PageLookup::Missing,
        }
    }

    /// The annotation for a page, if one was recognized.
    pub fn get(&self, page: u32) -> Option<&TextAnnotation> {
        self.pages.get(&page).and_then(Option::as_ref)
    }

    /// Whether any response covered the page.
    pub fn contains(&self, page: u32) -> bool {
        self.pages.contains_key(&page)
    }

    /// Number of indexed pages (annotated or empty).
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Check if the index has no pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Indexed page numbers in ascending order.
    pub fn page_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.keys().copied()
    }

    /// Highest indexed page number.
    pub fn max_page(&self) -> Option<u32> {
        self.pages.keys().next_back().copied()
    }

    /// OCR error messages by page, for pages whose latest response failed.
    pub fn failures(&self) -> &BTreeMap<u32, String> {
        &self.failures
    }

    /// Total number of words across all annotated pages.
    pub fn word_count(&self) -> usize {
        self.pages
            .values()
            .flatten()
            .map(TextAnnotation::word_count)
            .sum()
    }
}

//! Reconstruction options and configuration.

use std::path::Path;

use crate::render::FontSource;

/// Options for building a searchable PDF.
#[derive(Debug, Clone)]
pub struct ReconstructOptions {
    /// Font used for the text layer
    pub font: FontSource,

    /// How the text layer is rendered
    pub text_mode: TextMode,

    /// Stretch each word horizontally so its advance matches the OCR box
    pub fit_width: bool,

    /// Fail when the OCR results mention pages beyond the source page count
    pub strict_page_count: bool,

    /// Flate-compress content, template and font streams
    pub compress: bool,

    /// Decode OCR result files in parallel
    pub parallel: bool,

    /// Title written to the output Info dictionary
    pub title: Option<String>,
}

impl ReconstructOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the overlay font.
    pub fn with_font(mut self, font: FontSource) -> Self {
        self.font = font;
        self
    }

    /// Use a TrueType/OpenType file as the overlay font.
    pub fn with_font_file<P: AsRef<Path>>(self, path: P) -> Self {
        self.with_font(FontSource::file(path))
    }

    /// Set text mode.
    pub fn with_text_mode(mut self, mode: TextMode) -> Self {
        self.text_mode = mode;
        self
    }

    /// Draw the text layer visibly, for checking alignment against the scan.
    pub fn visible_text(self) -> Self {
        self.with_text_mode(TextMode::Visible)
    }

    /// Enable or disable horizontal fitting.
    pub fn with_fit_width(mut self, fit: bool) -> Self {
        self.fit_width = fit;
        self
    }

    /// Enable or disable the page-count check.
    pub fn with_strict_page_count(mut self, strict: bool) -> Self {
        self.strict_page_count = strict;
        self
    }

    /// Ignore OCR results for pages the source does not have.
    pub fn lenient_pages(mut self) -> Self {
        self.strict_page_count = false;
        self
    }

    /// Enable or disable stream compression.
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Disable parallel decoding of result files.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Set the document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

impl Default for ReconstructOptions {
    fn default() -> Self {
        Self {
            font: FontSource::Builtin,
            text_mode: TextMode::Invisible,
            fit_width: true,
            strict_page_count: true,
            compress: true,
            parallel: true,
            title: None,
        }
    }
}

/// How overlay text is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextMode {
    /// Render mode 3: searchable and selectable, never painted
    #[default]
    Invisible,
    /// Painted in a debug colour over the scan
    Visible,
}

impl TextMode {
    /// The `Tr` operand for this mode.
    pub fn render_mode(self) -> i64 {
        match self {
            TextMode::Invisible => 3,
            TextMode::Visible => 0,
        }
    }
}

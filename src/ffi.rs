//! C-ABI FFI bindings for cross-language integration.
//!
//! This module provides a C-compatible API for building searchable PDFs from
//! other languages such as C#, Python, and Node.js.

use std::ffi::{c_char, CStr, CString};
use std::path::Path;
use std::ptr;

use crate::source::{PageSource, PdfSource};
use crate::{load, make_searchable, Error, FontSource, ReconstructOptions};

/// Result structure returned by FFI functions.
#[repr(C)]
pub struct SearchablePdfResult {
    /// Whether the operation succeeded.
    pub success: bool,
    /// JSON result data (null if failed). Must be freed with `searchable_pdf_free_result`.
    pub data: *mut c_char,
    /// Error message (null if succeeded). Must be freed with `searchable_pdf_free_result`.
    pub error: *mut c_char,
}

impl SearchablePdfResult {
    fn success(data: String) -> Self {
        Self {
            success: true,
            data: CString::new(data).unwrap_or_default().into_raw(),
            error: ptr::null_mut(),
        }
    }

    fn error(message: String) -> Self {
        Self {
            success: false,
            data: ptr::null_mut(),
            error: CString::new(message).unwrap_or_default().into_raw(),
        }
    }
}

/// Borrow a required C string argument.
unsafe fn str_arg<'a>(value: *const c_char, name: &str) -> Result<&'a str, String> {
    if value.is_null() {
        return Err(format!("{} cannot be null", name));
    }
    CStr::from_ptr(value)
        .to_str()
        .map_err(|_| format!("Invalid UTF-8 {}", name))
}

/// Build a searchable PDF.
///
/// `ocr` is an OCR result file or a directory of result shards. `font` may be
/// null to use the built-in font. On success `data` holds the run report as
/// JSON.
///
/// # Safety
///
/// `source`, `ocr` and `output` must be valid null-terminated UTF-8 strings;
/// `font` must be null or one. The returned result must be freed with
/// `searchable_pdf_free_result`.
#[no_mangle]
pub unsafe extern "C" fn searchable_pdf_convert(
    source: *const c_char,
    ocr: *const c_char,
    output: *const c_char,
    font: *const c_char,
) -> SearchablePdfResult {
    let args = (|| {
        let source = str_arg(source, "source")?;
        let ocr = str_arg(ocr, "ocr")?;
        let output = str_arg(output, "output")?;
        let font = if font.is_null() {
            None
        } else {
            Some(str_arg(font, "font")?)
        };
        Ok::<_, String>((source, ocr, output, font))
    })();

    let (source, ocr, output, font) = match args {
        Ok(args) => args,
        Err(message) => return SearchablePdfResult::error(message),
    };

    match convert_internal(source, ocr, output, font) {
        Ok(json) => SearchablePdfResult::success(json),
        Err(e) => SearchablePdfResult::error(e.to_string()),
    }
}

fn convert_internal(
    source: &str,
    ocr: &str,
    output: &str,
    font: Option<&str>,
) -> crate::Result<String> {
    let mut options = ReconstructOptions::new();
    if let Some(font) = font {
        options = options.with_font(FontSource::file(font));
    }
    let report = make_searchable(source, &[ocr], output, &options)?;
    serde_json::to_string(&report)
        .map_err(|e| Error::Other(format!("failed to serialize report: {}", e)))
}

/// Summarize OCR results as JSON: indexed pages, failures and word count.
///
/// # Safety
///
/// The `ocr` must be a valid null-terminated UTF-8 string.
/// The returned result must be freed with `searchable_pdf_free_result`.
#[no_mangle]
pub unsafe extern "C" fn searchable_pdf_inspect(ocr: *const c_char) -> SearchablePdfResult {
    let ocr = match str_arg(ocr, "ocr") {
        Ok(s) => s,
        Err(message) => return SearchablePdfResult::error(message),
    };

    match load::load_index(&[Path::new(ocr)]) {
        Ok(index) => {
            let summary = serde_json::json!({
                "pages": index.page_numbers().collect::<Vec<_>>(),
                "failures": index.failures(),
                "words": index.word_count(),
            });
            SearchablePdfResult::success(summary.to_string())
        }
        Err(e) => SearchablePdfResult::error(e.to_string()),
    }
}

/// Get the page count of a PDF file.
///
/// # Safety
///
/// The `path` must be a valid null-terminated UTF-8 string.
/// Returns -1 on error.
#[no_mangle]
pub unsafe extern "C" fn searchable_pdf_page_count(path: *const c_char) -> i32 {
    let Ok(path) = str_arg(path, "path") else {
        return -1;
    };

    match PdfSource::open(path) {
        Ok(source) => source.page_count() as i32,
        Err(_) => -1,
    }
}

/// Check if a file is a valid PDF.
///
/// # Safety
///
/// The `path` must be a valid null-terminated UTF-8 string.
#[no_mangle]
pub unsafe extern "C" fn searchable_pdf_is_pdf(path: *const c_char) -> bool {
    match str_arg(path, "path") {
        Ok(path) => crate::detect::detect_format_from_path(Path::new(path)).is_ok(),
        Err(_) => false,
    }
}

/// Free a result returned by any searchable_pdf function.
///
/// # Safety
///
/// The `result` must have been returned by a searchable_pdf function.
/// This function should only be called once per result.
#[no_mangle]
pub unsafe extern "C" fn searchable_pdf_free_result(result: SearchablePdfResult) {
    if !result.data.is_null() {
        drop(CString::from_raw(result.data));
    }
    if !result.error.is_null() {
        drop(CString::from_raw(result.error));
    }
}

/// Get the version of the library.
///
/// # Safety
///
/// The returned string is statically allocated and should not be freed.
#[no_mangle]
pub extern "C" fn searchable_pdf_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

//! Source PDF access using lopdf.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use flate2::read::ZlibDecoder;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::detect::detect_format_from_path;
use crate::error::{Error, Result};
use crate::model::PageGeometry;

use super::template::{collect_closure, PageTemplate};
use super::PageSource;

/// How far up the page tree inherited attributes are looked for.
const MAX_TREE_DEPTH: usize = 32;

/// A loaded source PDF.
pub struct PdfSource {
    doc: Document,
    pages: BTreeMap<u32, ObjectId>,
}

impl PdfSource {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Verify it's a PDF
        let format = detect_format_from_path(path)?;
        log::debug!("opening {} ({})", path.display(), format);

        let doc = Document::load(path)?;
        Self::from_document(doc)
    }

    /// Load a PDF from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let doc = Document::load_mem(data)?;
        Self::from_document(doc)
    }

    /// Load a PDF from a reader.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(&data)
    }

    /// Wrap an already loaded document.
    ///
    /// Documents that still carry an `/Encrypt` dictionary are rejected.
    pub fn from_document(doc: Document) -> Result<Self> {
        if doc.is_encrypted() {
            return Err(Error::Encrypted);
        }
        let pages = doc.get_pages();
        Ok(Self { doc, pages })
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        self.pages
            .get(&page)
            .copied()
            .ok_or(Error::PageOutOfRange(page, self.page_count()))
    }

    fn resolve<'a>(&'a self, object: &'a Object) -> Option<&'a Object> {
        match object {
            Object::Reference(id) => self.doc.get_object(*id).ok(),
            other => Some(other),
        }
    }

    /// Look up a page attribute, walking up `/Parent` links for inheritable keys.
    fn inherited(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut node = self.doc.get_dictionary(page_id).ok()?;
        for _ in 0..MAX_TREE_DEPTH {
            if let Ok(value) = node.get(key) {
                return self.resolve(value);
            }
            let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
            node = self.doc.get_dictionary(parent).ok()?;
        }
        None
    }

    fn media_box(&self, page: u32, page_id: ObjectId) -> Result<[f64; 4]> {
        let invalid = |reason: &str| Error::InvalidPageGeometry {
            page,
            reason: reason.to_string(),
        };

        let array = self
            .inherited(page_id, b"MediaBox")
            .ok_or_else(|| invalid("missing MediaBox"))?
            .as_array()
            .map_err(|_| invalid("MediaBox is not an array"))?;

        if array.len() != 4 {
            return Err(invalid("MediaBox does not have four entries"));
        }

        let mut media_box = [0.0; 4];
        for (slot, value) in media_box.iter_mut().zip(array) {
            *slot = self
                .resolve(value)
                .and_then(|v| v.as_float().ok())
                .map(f64::from)
                .ok_or_else(|| invalid("MediaBox entry is not a number"))?;
        }
        Ok(media_box)
    }

    fn rotation(&self, page_id: ObjectId) -> i64 {
        self.inherited(page_id, b"Rotate")
            .and_then(|v| v.as_i64().ok())
            .unwrap_or(0)
    }

    /// The content stream references of a page, in drawing order.
    ///
    /// `/Contents` may be a single reference or an array of them, either
    /// inline or itself behind a reference.
    fn content_refs(&self, page_id: ObjectId) -> Vec<ObjectId> {
        let Ok(contents) = self
            .doc
            .get_dictionary(page_id)
            .and_then(|page| page.get(b"Contents"))
        else {
            return Vec::new();
        };

        let items = match contents {
            Object::Reference(id) => match self.doc.get_object(*id) {
                Ok(Object::Array(items)) => items,
                _ => return vec![*id],
            },
            Object::Array(items) => items,
            _ => return Vec::new(),
        };
        items.iter().filter_map(|item| item.as_reference().ok()).collect()
    }

    /// Concatenate a page's content streams, decoded.
    ///
    /// A referenced stream that is missing or cannot be decoded makes the
    /// page unreadable.
    fn page_content(&self, page: u32, page_id: ObjectId) -> Result<Vec<u8>> {
        let unreadable = |id: ObjectId, reason: String| Error::UnreadablePage {
            page,
            reason: format!("content stream {} {} R: {}", id.0, id.1, reason),
        };

        let mut content = Vec::new();
        for stream_id in self.content_refs(page_id) {
            let stream = self
                .doc
                .get_object(stream_id)
                .and_then(Object::as_stream)
                .map_err(|e| unreadable(stream_id, e.to_string()))?;
            let data = decode_stream(stream).map_err(|reason| unreadable(stream_id, reason))?;
            if !content.is_empty() {
                content.push(b'\n');
            }
            content.extend_from_slice(&data);
        }
        Ok(content)
    }

    fn resources(&self, page_id: ObjectId) -> Dictionary {
        self.inherited(page_id, b"Resources")
            .and_then(|v| v.as_dict().ok())
            .cloned()
            .unwrap_or_default()
    }
}

/// Decode a content stream's data.
///
/// Unfiltered streams are returned as is. Plain `/FlateDecode` is inflated
/// strictly; other filter chains go through lopdf, and an empty result from
/// non-empty data counts as a failure.
fn decode_stream(stream: &Stream) -> std::result::Result<Vec<u8>, String> {
    let filters = match stream.dict.get(b"Filter") {
        Err(_) => return Ok(stream.content.clone()),
        Ok(Object::Name(name)) => vec![name.as_slice()],
        Ok(Object::Array(items)) => items
            .iter()
            .map(|item| item.as_name().map_err(|e| e.to_string()))
            .collect::<std::result::Result<Vec<_>, _>>()?,
        Ok(other) => return Err(format!("unexpected /Filter {:?}", other)),
    };

    if filters.is_empty() {
        return Ok(stream.content.clone());
    }

    if filters == [b"FlateDecode".as_slice()] && !stream.dict.has(b"DecodeParms") {
        let mut data = Vec::new();
        ZlibDecoder::new(stream.content.as_slice())
            .read_to_end(&mut data)
            .map_err(|e| format!("invalid FlateDecode data: {}", e))?;
        return Ok(data);
    }

    let data = stream.decompressed_content().map_err(|e| e.to_string())?;
    if data.is_empty() && !stream.content.is_empty() {
        return Err("filtered data decoded to nothing".to_string());
    }
    Ok(data)
}

impl PageSource for PdfSource {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_geometry(&self, page: u32) -> Result<PageGeometry> {
        let page_id = self.page_id(page)?;
        let media_box = self.media_box(page, page_id)?;
        Ok(PageGeometry::from_media_box(page, media_box)?.with_rotation(self.rotation(page_id)))
    }

    fn capture_template(&self, page: u32) -> Result<PageTemplate> {
        let page_id = self.page_id(page)?;
        let geometry = self.page_geometry(page)?;
        let resources = self.resources(page_id);
        let objects = collect_closure(&self.doc, &Object::Dictionary(resources.clone()), page)?;
        let content = self.page_content(page, page_id)?;

        log::trace!(
            "captured page {}: {} content bytes, {} resource objects",
            page,
            content.len(),
            objects.len()
        );

        Ok(PageTemplate {
            page,
            content,
            resources,
            objects,
            bbox: geometry.media_box(),
        })
    }
}

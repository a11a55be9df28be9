//! PDF output using lopdf.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::model::PageGeometry;
use crate::options::{ReconstructOptions, TextMode};
use crate::render::{deflate, text_operations, OverlayFont, TextDraw, FONT_RESOURCE};
use crate::source::PageTemplate;

use super::import::ObjectImporter;
use super::{no_open_page, DocumentSink};

/// Resource name of the page template on every output page.
const TEMPLATE_RESOURCE: &str = "Tpl";

const PDF_VERSION: &str = "1.7";

/// Page being assembled.
struct OpenPage {
    geometry: PageGeometry,
    template: Option<ObjectId>,
    text: Vec<Operation>,
}

/// Builds the output PDF: one page per source page, each painting the
/// captured template as a Form XObject with the text layer on top.
pub struct PdfWriter {
    doc: Document,
    pages_id: ObjectId,
    font_id: ObjectId,
    font: OverlayFont,
    importer: ObjectImporter,
    kids: Vec<ObjectId>,
    current: Option<OpenPage>,
    text_mode: TextMode,
    fit_width: bool,
    compress: bool,
    title: Option<String>,
    replaced: usize,
}

impl PdfWriter {
    /// Create a writer, loading the font the options name.
    pub fn new(options: &ReconstructOptions) -> Result<Self> {
        let font = OverlayFont::load(&options.font)?;
        Ok(Self::with_font(font, options))
    }

    /// Create a writer with an already loaded font.
    pub fn with_font(font: OverlayFont, options: &ReconstructOptions) -> Self {
        let mut doc = Document::with_version(PDF_VERSION);
        let pages_id = doc.new_object_id();
        let font_id = doc.new_object_id();

        Self {
            doc,
            pages_id,
            font_id,
            font,
            importer: ObjectImporter::new(),
            kids: Vec::new(),
            current: None,
            text_mode: options.text_mode,
            fit_width: options.fit_width,
            compress: options.compress,
            title: options.title.clone(),
            replaced: 0,
        }
    }

    fn current(&mut self) -> Result<&mut OpenPage> {
        self.current.as_mut().ok_or_else(no_open_page)
    }

    fn stream(&self, dict: Dictionary, data: Vec<u8>) -> Result<Stream> {
        if self.compress {
            let mut dict = dict;
            dict.set("Filter", "FlateDecode");
            Ok(Stream::new(dict, deflate(&data)?))
        } else {
            Ok(Stream::new(dict, data))
        }
    }

    /// Finalize the document and serialize it.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        if self.current.is_some() {
            return Err(Error::PdfWrite("last page was not ended".to_string()));
        }

        self.font.write_objects(&mut self.doc, self.font_id)?;

        let kids: Vec<Object> = self.kids.iter().map(|id| Object::Reference(*id)).collect();
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => self.kids.len() as i64,
            }),
        );

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });

        let mut info = dictionary! {
            "Producer" => Object::string_literal(format!("searchable-pdf {}", crate::VERSION)),
            "CreationDate" => Object::string_literal(format_pdf_date(&Utc::now())),
        };
        if let Some(title) = &self.title {
            info.set("Title", Object::string_literal(title.as_str()));
        }
        let info_id = self.doc.add_object(info);

        self.doc.trailer.set("Root", catalog_id);
        self.doc.trailer.set("Info", info_id);

        log::debug!(
            "writing {} pages, {} imported objects",
            self.kids.len(),
            self.importer.len()
        );

        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| Error::PdfWrite(e.to_string()))?;
        Ok(buffer)
    }

    /// Finalize the document and write it to `path` atomically.
    ///
    /// The bytes go to a temporary file in the destination directory, which
    /// is renamed over `path` only once everything has been written. On any
    /// error the temporary file is removed and `path` is left untouched.
    pub fn save_atomic<P: AsRef<Path>>(self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.finish()?;
        write_atomic(path, &bytes)
    }
}

/// Write `bytes` to `path` through a temporary file in the same directory.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let output_error = |source: std::io::Error| Error::OutputWrite {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir).map_err(output_error)?;
    file.write_all(bytes).map_err(output_error)?;
    file.flush().map_err(output_error)?;
    file.persist(path).map_err(|e| output_error(e.error))?;
    Ok(())
}

/// Format a timestamp as a PDF date string (`D:YYYYMMDDHHmmSS+00'00'`).
pub fn format_pdf_date(time: &DateTime<Utc>) -> String {
    format!("D:{}+00'00'", time.format("%Y%m%d%H%M%S"))
}

impl DocumentSink for PdfWriter {
    fn begin_page(&mut self, geometry: &PageGeometry) -> Result<()> {
        if self.current.is_some() {
            return Err(Error::PdfWrite("previous page was not ended".to_string()));
        }
        self.current = Some(OpenPage {
            geometry: *geometry,
            template: None,
            text: Vec::new(),
        });
        Ok(())
    }

    fn draw_text(&mut self, draw: &TextDraw) -> Result<()> {
        if self.current.is_none() {
            return Err(no_open_page());
        }
        let encoded = self.font.encode(&draw.text);
        self.replaced += encoded.unencodable;

        let (mode, fit, embedded) = (self.text_mode, self.fit_width, self.font.is_embedded());
        let page = self.current()?;
        page.text.extend(text_operations(
            draw,
            &encoded,
            &page.geometry,
            mode,
            fit,
            embedded,
        ));
        Ok(())
    }

    fn stamp_template(&mut self, template: PageTemplate) -> Result<()> {
        if self.current.is_none() {
            return Err(no_open_page());
        }

        let resources = self
            .importer
            .import(&mut self.doc, &template.resources, template.objects);

        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "FormType" => 1,
            "BBox" => template.bbox.iter().map(|v| Object::Real(*v as f32)).collect::<Vec<_>>(),
            "Resources" => resources,
        };
        let form = self.stream(dict, template.content)?;
        let form_id = self.doc.add_object(form);

        log::trace!("stamped source page {} as {:?}", template.page, form_id);
        self.current()?.template = Some(form_id);
        Ok(())
    }

    fn end_page(&mut self) -> Result<()> {
        let page = self.current.take().ok_or_else(no_open_page)?;

        let mut operations = Vec::with_capacity(page.text.len() + 4);
        let mut xobjects = Dictionary::new();
        if let Some(form_id) = page.template {
            xobjects.set(TEMPLATE_RESOURCE, form_id);
            operations.push(Operation::new("q", vec![]));
            operations.push(Operation::new(
                "cm",
                vec![1.into(), 0.into(), 0.into(), 1.into(), 0.into(), 0.into()],
            ));
            operations.push(Operation::new(
                "Do",
                vec![Object::Name(TEMPLATE_RESOURCE.as_bytes().to_vec())],
            ));
            operations.push(Operation::new("Q", vec![]));
        }
        operations.extend(page.text);

        let content = Content { operations }.encode()?;
        let content = self.stream(Dictionary::new(), content)?;
        let content_id = self.doc.add_object(content);

        let mut fonts = Dictionary::new();
        fonts.set(FONT_RESOURCE, self.font_id);

        let mut page_dict = dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => page
                .geometry
                .media_box()
                .iter()
                .map(|v| Object::Real(*v as f32))
                .collect::<Vec<_>>(),
            "Resources" => dictionary! {
                "XObject" => xobjects,
                "Font" => fonts,
            },
            "Contents" => content_id,
        };
        if page.geometry.rotation != 0 {
            page_dict.set("Rotate", page.geometry.rotation);
        }

        let page_id = self.doc.add_object(page_dict);
        self.kids.push(page_id);
        Ok(())
    }

    fn replaced_characters(&self) -> usize {
        self.replaced
    }
}

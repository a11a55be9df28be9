//! Overlay fonts.
//!
//! The text layer is normally invisible, so the font only has to give every
//! character a code and a plausible advance width. Two flavours exist:
//!
//! - the built-in Helvetica, referenced by name with WinAnsi encoding and a
//!   flat 500/1000 em width for every code (a glyphless font)
//! - an embedded TrueType/OpenType font, written as a Type0 font with
//!   Identity-H encoding, a `W` array and a ToUnicode CMap, for scripts
//!   WinAnsi cannot represent

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};
use ttf_parser::{name_id, Face, GlyphId};

use crate::detect::{detect_font_format, FontFormat};
use crate::error::{Error, Result};

use super::deflate;

/// Advance width of every glyph in the built-in font, in 1/1000 em.
pub const GLYPHLESS_ADVANCE: u16 = 500;

/// Replacement for characters the font cannot encode.
const REPLACEMENT: char = '?';

const BUILTIN_NAME: &str = "Helvetica";
const FIRST_CODE: u8 = 32;
const LAST_CODE: u8 = 255;

/// Where the overlay font comes from.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FontSource {
    /// Built-in glyphless Helvetica (WinAnsi encoding).
    #[default]
    Builtin,
    /// A TrueType/OpenType file on disk.
    File(PathBuf),
    /// TrueType/OpenType data already in memory.
    Bytes(Vec<u8>),
}

impl FontSource {
    /// Font file on disk.
    pub fn file<P: AsRef<Path>>(path: P) -> Self {
        FontSource::File(path.as_ref().to_path_buf())
    }

    fn origin(&self) -> String {
        match self {
            FontSource::Builtin => BUILTIN_NAME.to_string(),
            FontSource::File(path) => path.display().to_string(),
            FontSource::Bytes(_) => "<memory>".to_string(),
        }
    }
}

/// A string encoded for a `Tj` operand.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedText {
    /// Character codes in the font's encoding
    pub bytes: Vec<u8>,

    /// Sum of glyph advances, in 1/1000 em
    pub advance: f64,

    /// Characters replaced because the font has no code for them
    pub unencodable: usize,
}

impl EncodedText {
    /// Rendered width of the text at `font_size`, in points.
    pub fn width(&self, font_size: f64) -> f64 {
        self.advance * font_size / 1000.0
    }

    /// The `Tj` operand, a literal string for simple fonts and a hex
    /// string for two-byte CID fonts.
    pub fn operand(&self, embedded: bool) -> Object {
        let format = if embedded {
            StringFormat::Hexadecimal
        } else {
            StringFormat::Literal
        };
        Object::String(self.bytes.clone(), format)
    }
}

/// The font the text layer is drawn with.
#[derive(Debug, Default)]
pub enum OverlayFont {
    /// Built-in Helvetica with uniform advances.
    #[default]
    Builtin,
    /// A font program embedded in the output.
    Embedded(EmbeddedFont),
}

impl OverlayFont {
    /// Resolve a font source into a usable font.
    pub fn load(source: &FontSource) -> Result<Self> {
        match source {
            FontSource::Builtin => Ok(OverlayFont::Builtin),
            FontSource::File(path) => {
                let data = std::fs::read(path).map_err(|e| Error::FontLoad {
                    origin: source.origin(),
                    reason: e.to_string(),
                })?;
                Self::from_bytes(data, &source.origin())
            }
            FontSource::Bytes(data) => Self::from_bytes(data.clone(), &source.origin()),
        }
    }

    /// Parse TrueType/OpenType data. `origin` names the data in errors.
    pub fn from_bytes(data: Vec<u8>, origin: &str) -> Result<Self> {
        EmbeddedFont::parse(data, origin).map(OverlayFont::Embedded)
    }

    /// Whether the font program is embedded in the output.
    pub fn is_embedded(&self) -> bool {
        matches!(self, OverlayFont::Embedded(_))
    }

    /// PostScript name written as `BaseFont`.
    pub fn base_font(&self) -> &str {
        match self {
            OverlayFont::Builtin => BUILTIN_NAME,
            OverlayFont::Embedded(font) => &font.name,
        }
    }

    /// Encode text, recording glyph usage for the font's width and
    /// ToUnicode tables.
    pub fn encode(&mut self, text: &str) -> EncodedText {
        match self {
            OverlayFont::Builtin => encode_win_ansi(text),
            OverlayFont::Embedded(font) => font.encode(text),
        }
    }

    /// Write the font dictionary (and for embedded fonts, its descendants)
    /// into `doc` under the pre-allocated `font_id`.
    pub(crate) fn write_objects(&self, doc: &mut Document, font_id: ObjectId) -> Result<()> {
        match self {
            OverlayFont::Builtin => {
                let widths: Vec<Object> = (FIRST_CODE..=LAST_CODE)
                    .map(|_| Object::Integer(i64::from(GLYPHLESS_ADVANCE)))
                    .collect();
                doc.objects.insert(
                    font_id,
                    Object::Dictionary(dictionary! {
                        "Type" => "Font",
                        "Subtype" => "Type1",
                        "BaseFont" => BUILTIN_NAME,
                        "Encoding" => "WinAnsiEncoding",
                        "FirstChar" => i64::from(FIRST_CODE),
                        "LastChar" => i64::from(LAST_CODE),
                        "Widths" => widths,
                    }),
                );
                Ok(())
            }
            OverlayFont::Embedded(font) => font.write_objects(doc, font_id),
        }
    }
}

/// Encode text as WinAnsi (Windows-1252) bytes.
pub fn encode_win_ansi(text: &str) -> EncodedText {
    let mut bytes = Vec::with_capacity(text.len());
    let mut unencodable = 0;
    for ch in text.chars() {
        match win_ansi_code(ch) {
            Some(code) => bytes.push(code),
            None => {
                unencodable += 1;
                bytes.push(REPLACEMENT as u8);
            }
        }
    }
    EncodedText {
        advance: bytes.len() as f64 * f64::from(GLYPHLESS_ADVANCE),
        bytes,
        unencodable,
    }
}

/// WinAnsi code for a character, if it has one in the printable range.
pub fn win_ansi_code(ch: char) -> Option<u8> {
    let code = match ch {
        ' '..='~' => ch as u8,
        '\u{00A0}'..='\u{00FF}' => ch as u32 as u8,
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        _ => return None,
    };
    Some(code)
}

/// Metrics and glyph tables of an embedded TrueType/OpenType font.
#[derive(Debug)]
pub struct EmbeddedFont {
    /// PostScript name
    pub name: String,
    format: FontFormat,
    data: Vec<u8>,
    /// Unicode → glyph id (Basic Multilingual Plane)
    glyphs: HashMap<char, u16>,
    /// Glyph advances in 1/1000 em, indexed by glyph id
    widths: Vec<u16>,
    /// Glyphs drawn so far and the character each stands for
    used: BTreeMap<u16, char>,
    ascent: i64,
    descent: i64,
    cap_height: i64,
    bbox: [i64; 4],
    flags: i64,
    stem_v: i64,
}

impl EmbeddedFont {
    fn parse(data: Vec<u8>, origin: &str) -> Result<Self> {
        let fail = |reason: String| Error::FontLoad {
            origin: origin.to_string(),
            reason,
        };

        let format = match detect_font_format(&data) {
            Some(FontFormat::Collection) => {
                return Err(fail("font collections cannot be embedded".to_string()))
            }
            Some(format) => format,
            None => return Err(fail("not a TrueType or OpenType font".to_string())),
        };

        let face = Face::parse(&data, 0).map_err(|e| fail(e.to_string()))?;
        let units_per_em = f64::from(face.units_per_em());
        let scale = |v: i16| (f64::from(v) * 1000.0 / units_per_em).round() as i64;

        let name = face
            .names()
            .into_iter()
            .find(|name| name.name_id == name_id::POST_SCRIPT_NAME)
            .and_then(|name| name.to_string())
            .map(|name| name.replace(|c: char| c.is_whitespace() || c == '/', ""))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "EmbeddedFont".to_string());

        let mut glyphs = HashMap::new();
        for codepoint in 0..=0xFFFF_u32 {
            if let Some(ch) = char::from_u32(codepoint) {
                if let Some(gid) = face.glyph_index(ch) {
                    glyphs.insert(ch, gid.0);
                }
            }
        }

        let widths = (0..face.number_of_glyphs())
            .map(|gid| {
                let advance = face.glyph_hor_advance(GlyphId(gid)).unwrap_or(0);
                (f64::from(advance) * 1000.0 / units_per_em).round() as u16
            })
            .collect();

        let ascent = scale(face.ascender());
        let bbox = face.global_bounding_box();
        let mut flags = 32; // Nonsymbolic
        if face.is_monospaced() {
            flags |= 1;
        }

        log::debug!(
            "loaded font {} ({} glyphs, {} mapped characters)",
            name,
            face.number_of_glyphs(),
            glyphs.len()
        );

        Ok(Self {
            name,
            format,
            glyphs,
            widths,
            used: BTreeMap::new(),
            ascent,
            descent: scale(face.descender()),
            cap_height: face.capital_height().map(scale).unwrap_or(ascent),
            bbox: [
                scale(bbox.x_min),
                scale(bbox.y_min),
                scale(bbox.x_max),
                scale(bbox.y_max),
            ],
            flags,
            stem_v: if face.is_bold() { 140 } else { 80 },
            data,
        })
    }

    /// Glyph id for a character.
    pub fn glyph_id(&self, ch: char) -> Option<u16> {
        self.glyphs.get(&ch).copied()
    }

    /// Advance width of a glyph, in 1/1000 em.
    pub fn glyph_width(&self, gid: u16) -> u16 {
        self.widths
            .get(usize::from(gid))
            .copied()
            .unwrap_or(GLYPHLESS_ADVANCE)
    }

    /// Number of distinct glyphs drawn so far.
    pub fn used_glyph_count(&self) -> usize {
        self.used.len()
    }

    fn encode(&mut self, text: &str) -> EncodedText {
        let mut bytes = Vec::with_capacity(text.len() * 2);
        let mut advance = 0.0;
        let mut unencodable = 0;

        for ch in text.chars() {
            let gid = match self.glyph_id(ch) {
                Some(gid) => {
                    self.used.entry(gid).or_insert(ch);
                    gid
                }
                None => {
                    unencodable += 1;
                    0
                }
            };
            bytes.extend_from_slice(&gid.to_be_bytes());
            advance += f64::from(self.glyph_width(gid));
        }

        EncodedText {
            bytes,
            advance,
            unencodable,
        }
    }

    fn widths_array(&self) -> Vec<Object> {
        let mut result = Vec::new();
        let glyphs: Vec<u16> = self.used.keys().copied().collect();

        let mut i = 0;
        while i < glyphs.len() {
            let start = glyphs[i];
            let mut widths = vec![Object::Integer(i64::from(self.glyph_width(start)))];
            while i + 1 < glyphs.len() && glyphs[i + 1] == glyphs[i] + 1 {
                i += 1;
                widths.push(Object::Integer(i64::from(self.glyph_width(glyphs[i]))));
            }
            result.push(Object::Integer(i64::from(start)));
            result.push(Object::Array(widths));
            i += 1;
        }
        result
    }

    /// ToUnicode CMap mapping each used glyph back to its character.
    pub fn to_unicode_cmap(&self) -> String {
        let mut cmap = String::new();
        cmap.push_str("/CIDInit /ProcSet findresource begin\n");
        cmap.push_str("12 dict begin\n");
        cmap.push_str("begincmap\n");
        cmap.push_str("/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
        cmap.push_str("/CMapName /Adobe-Identity-UCS def\n");
        cmap.push_str("/CMapType 2 def\n");
        cmap.push_str("1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n");

        let mappings: Vec<(u16, char)> = self.used.iter().map(|(g, c)| (*g, *c)).collect();
        for chunk in mappings.chunks(100) {
            let _ = writeln!(cmap, "{} beginbfchar", chunk.len());
            for (gid, ch) in chunk {
                let mut units = [0u16; 2];
                let hex: String = ch
                    .encode_utf16(&mut units)
                    .iter()
                    .map(|u| format!("{:04X}", u))
                    .collect();
                let _ = writeln!(cmap, "<{:04X}> <{}>", gid, hex);
            }
            cmap.push_str("endbfchar\n");
        }

        cmap.push_str("endcmap\n");
        cmap.push_str("CMapName currentdict /CMap defineresource pop\n");
        cmap.push_str("end\nend\n");
        cmap
    }

    fn write_objects(&self, doc: &mut Document, font_id: ObjectId) -> Result<()> {
        let (file_key, program, cid_subtype) = match self.format {
            FontFormat::OpenType => {
                let dict = dictionary! {
                    "Subtype" => "OpenType",
                    "Filter" => "FlateDecode",
                };
                ("FontFile3", Stream::new(dict, deflate(&self.data)?), "CIDFontType0")
            }
            _ => {
                let dict = dictionary! {
                    "Length1" => self.data.len() as i64,
                    "Filter" => "FlateDecode",
                };
                ("FontFile2", Stream::new(dict, deflate(&self.data)?), "CIDFontType2")
            }
        };
        let program_id = doc.add_object(program);

        let mut descriptor = dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => Object::Name(self.name.clone().into_bytes()),
            "Flags" => self.flags,
            "FontBBox" => self.bbox.iter().map(|v| Object::Integer(*v)).collect::<Vec<_>>(),
            "ItalicAngle" => 0,
            "Ascent" => self.ascent,
            "Descent" => self.descent,
            "CapHeight" => self.cap_height,
            "StemV" => self.stem_v,
        };
        descriptor.set(file_key, program_id);
        let descriptor_id = doc.add_object(descriptor);

        let mut cid_font = dictionary! {
            "Type" => "Font",
            "Subtype" => cid_subtype,
            "BaseFont" => Object::Name(self.name.clone().into_bytes()),
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::string_literal("Adobe"),
                "Ordering" => Object::string_literal("Identity"),
                "Supplement" => 0,
            },
            "FontDescriptor" => descriptor_id,
            "DW" => i64::from(GLYPHLESS_ADVANCE),
            "W" => self.widths_array(),
        };
        if cid_subtype == "CIDFontType2" {
            cid_font.set("CIDToGIDMap", "Identity");
        }
        let cid_font_id = doc.add_object(cid_font);

        let cmap = self.to_unicode_cmap();
        let to_unicode_id = doc.add_object(Stream::new(
            dictionary! { "Filter" => "FlateDecode" },
            deflate(cmap.as_bytes())?,
        ));

        doc.objects.insert(
            font_id,
            Object::Dictionary(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type0",
                "BaseFont" => Object::Name(self.name.clone().into_bytes()),
                "Encoding" => "Identity-H",
                "DescendantFonts" => vec![Object::Reference(cid_font_id)],
                "ToUnicode" => to_unicode_id,
            }),
        );
        Ok(())
    }
}

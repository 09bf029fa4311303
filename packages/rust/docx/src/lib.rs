//! biddoc-docx: a small logic-less templating engine for `.docx` packages.
//!
//! Placeholders are written in the template as `{name}`; sections as
//! `{#list}…{/list}` (repeat per item, or once when truthy) and
//! `{^list}…{/list}` (render when falsy or empty). Only the text of the
//! document body, headers, footers and notes is processed; every other
//! package entry is carried through untouched.

mod render;
mod xml;

use std::io::{Cursor, Read, Write};
use std::sync::LazyLock;

use biddoc_shared::{BidDocError, Result};
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, instrument};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::xml::{Element, Piece, element, split_pieces, unescape};

/// MIME type of a WordprocessingML document.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Main document part; a package without it is not a Word document.
const DOCUMENT_PART: &str = "word/document.xml";

static CONTENT_PART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^word/(document|header\d*|footer\d*|footnotes|endnotes)\.xml$")
        .expect("valid regex")
});

/// Engine switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOptions {
    /// Drop the paragraphs holding section tags when the tags stand alone.
    pub paragraph_loop: bool,
    /// Turn `\n` in values into Word line breaks.
    pub linebreaks: bool,
}

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    is_dir: bool,
    data: Vec<u8>,
}

/// An opened template package.
#[derive(Debug, Clone)]
pub struct DocxTemplate {
    entries: Vec<Entry>,
    options: EngineOptions,
}

impl DocxTemplate {
    /// Open a template package from its bytes.
    #[instrument(skip_all, fields(bytes = bytes.len()))]
    pub fn load(bytes: &[u8], options: EngineOptions) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| BidDocError::template(format!("not a valid docx package: {e}")))?;

        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| BidDocError::template(format!("unreadable package entry: {e}")))?;
            let name = file.name().to_string();
            let mut data = Vec::new();
            file.read_to_end(&mut data).map_err(|e| {
                BidDocError::template(format!("failed to read package entry {name}: {e}"))
            })?;
            entries.push(Entry {
                is_dir: file.is_dir(),
                name,
                data,
            });
        }

        if !entries.iter().any(|e| e.name == DOCUMENT_PART) {
            return Err(BidDocError::template(format!(
                "package has no {DOCUMENT_PART}"
            )));
        }
        debug!(entries = entries.len(), "loaded template package");
        Ok(Self { entries, options })
    }

    /// Substitute `data` into every content part.
    #[instrument(skip_all, fields(keys = data.len()))]
    pub fn render(&mut self, data: &Map<String, Value>) -> Result<()> {
        let root = Value::Object(data.clone());
        let mut rendered = 0usize;

        for entry in self
            .entries
            .iter_mut()
            .filter(|e| CONTENT_PART.is_match(&e.name))
        {
            let xml = std::str::from_utf8(&entry.data).map_err(|e| {
                BidDocError::template(format!("{} is not valid UTF-8: {e}", entry.name))
            })?;
            let output = render::render_part(xml, &root, self.options)
                .map_err(|e| in_part(e, &entry.name))?;
            entry.data = output.into_bytes();
            rendered += 1;
        }

        debug!(parts = rendered, "rendered template");
        Ok(())
    }

    /// Re-zip the package (deflate), preserving entry order.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for entry in &self.entries {
            if entry.is_dir {
                writer
                    .add_directory(entry.name.as_str(), options)
                    .map_err(zip_error)?;
            } else {
                writer
                    .start_file(entry.name.as_str(), options)
                    .map_err(zip_error)?;
                writer
                    .write_all(&entry.data)
                    .map_err(|e| BidDocError::render(format!("failed to write {}: {e}", entry.name)))?;
            }
        }

        let cursor = writer.finish().map_err(zip_error)?;
        Ok(cursor.into_inner())
    }

    /// Entry names in package order.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Raw XML of a package part, if present and UTF-8.
    pub fn xml_part(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .and_then(|e| std::str::from_utf8(&e.data).ok())
    }

    /// Plain text of the document body: one line per paragraph, breaks as
    /// newlines, tabs as `\t`.
    pub fn document_text(&self) -> Result<String> {
        let xml = self
            .xml_part(DOCUMENT_PART)
            .ok_or_else(|| BidDocError::template(format!("package has no {DOCUMENT_PART}")))?;

        let mut text = String::new();
        for piece in split_pieces(xml)? {
            match piece {
                Piece::Text(t) => text.push_str(&unescape(&t)),
                Piece::Markup(m) => match element(&m) {
                    Some(Element::Close("w:p")) | Some(Element::Empty("w:br")) => text.push('\n'),
                    Some(Element::Empty("w:tab")) => text.push('\t'),
                    _ => {}
                },
            }
        }
        Ok(text)
    }
}

fn zip_error(e: zip::result::ZipError) -> BidDocError {
    BidDocError::render(format!("failed to write package: {e}"))
}

fn in_part(err: BidDocError, part: &str) -> BidDocError {
    match err {
        BidDocError::Render { message } => BidDocError::render(format!("{message} in {part}")),
        other => other,
    }
}

//! DOCX extraction: raw text plus an HTML rendering with image interception.
//!
//! A .docx file is a ZIP container. Two entries matter here:
//! `word/document.xml` (the body) and `word/_rels/document.xml.rels` (the
//! relationship map resolving image references to `word/media/…` entries).
//!
//! The extractor walks `document.xml` once, producing in parallel:
//! - raw paragraph text, and
//! - a minimal HTML rendering in which every embedded image (`a:blip`)
//!   is intercepted: its bytes are copied out of the container to the
//!   output directory under a run-wide `image_<n>.<ext>` name, and the
//!   HTML carries an `<img src="…">` pointing at the saved file.
//!
//! The result is a single synthetic page whose text is a labeled HTML block
//! followed by a labeled raw-text block. The model sees both: HTML carries
//! structure (paragraph boundaries, image positions), raw text guards
//! against anything the simple renderer dropped.

use crate::error::Doc2MdError;
use crate::pipeline::{Extraction, ImageCounter, PageContent, SavedImage};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Extract a DOCX document as one synthetic page.
pub fn extract(
    docx_path: &Path,
    output_dir: &Path,
    counter: &mut ImageCounter,
) -> Result<Extraction, Doc2MdError> {
    let extraction_err = |detail: String| Doc2MdError::ExtractionFailed {
        path: docx_path.to_path_buf(),
        detail,
    };

    let file = std::fs::File::open(docx_path).map_err(|e| extraction_err(e.to_string()))?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| extraction_err(format!("not a DOCX container: {e}")))?;

    let relationships = read_relationships(&mut archive).map_err(extraction_err)?;
    let document_xml =
        read_entry_string(&mut archive, "word/document.xml").map_err(extraction_err)?;

    let mut walker = BodyWalker::new(relationships);
    walker.walk(&document_xml).map_err(extraction_err)?;

    let mut saved_images = Vec::new();
    let mut html = walker.html;

    // Second pass over intercepted image relationships: copy bytes out of
    // the container and patch the placeholder references in the HTML.
    for (image_index, target) in walker.image_targets.iter().enumerate() {
        let bytes = read_media_bytes(&mut archive, target).map_err(extraction_err)?;
        let extension = media_extension(target);
        let filename = counter.next_filename(extension);

        let dest = output_dir.join(&filename);
        std::fs::write(&dest, &bytes).map_err(|e| Doc2MdError::OutputWriteFailed {
            path: dest.clone(),
            source: e,
        })?;
        debug!("Saved embedded image {} from {}", filename, target);

        html = html.replacen(&placeholder(image_index), &filename, 1);
        saved_images.push(SavedImage {
            page_number: 1,
            image_index,
            filename,
        });
    }

    info!(
        "DOCX extracted: {} chars text, {} embedded images",
        walker.text.len(),
        saved_images.len()
    );

    let text = format!(
        "--- HTML ---\n{}\n\n--- RAW TEXT ---\n{}",
        html.trim_end(),
        walker.text.trim_end()
    );

    Ok(Extraction {
        pages: vec![PageContent {
            page_number: 1,
            text,
            page_image: None,
            image_filenames: Vec::new(),
        }],
        saved_images,
    })
}

/// Placeholder written into the HTML while walking; patched once the image
/// bytes have been copied out and a filename allocated.
fn placeholder(image_index: usize) -> String {
    format!("__DOC2MD_IMAGE_{image_index}__")
}

/// Extension inferred from the media target, `png` when absent or unknown.
fn media_extension(target: &str) -> &str {
    match Path::new(target).extension().and_then(|e| e.to_str()) {
        Some(ext) if crate::pipeline::input::IMAGE_EXTENSIONS
            .contains(&ext.to_lowercase().as_str()) =>
        {
            ext
        }
        _ => "png",
    }
}

/// Streaming walker over `word/document.xml`.
struct BodyWalker {
    relationships: HashMap<String, String>,
    text: String,
    html: String,
    /// Resolved `word/media/…` targets in document order.
    image_targets: Vec<String>,
    in_text_run: bool,
    paragraph_open: bool,
}

impl BodyWalker {
    fn new(relationships: HashMap<String, String>) -> Self {
        Self {
            relationships,
            text: String::new(),
            html: String::new(),
            image_targets: Vec::new(),
            in_text_run: false,
            paragraph_open: false,
        }
    }

    fn walk(&mut self, document_xml: &str) -> Result<(), String> {
        let mut reader = Reader::from_str(document_xml);

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"w:p" => {
                        self.html.push_str("<p>");
                        self.paragraph_open = true;
                    }
                    b"w:t" => self.in_text_run = true,
                    b"a:blip" => self.intercept_image(&e),
                    _ => {}
                },
                Ok(Event::Empty(e)) => match e.name().as_ref() {
                    b"a:blip" => self.intercept_image(&e),
                    b"w:br" => {
                        self.text.push('\n');
                        if self.paragraph_open {
                            self.html.push_str("<br>");
                        }
                    }
                    b"w:tab" => self.text.push('\t'),
                    _ => {}
                },
                Ok(Event::Text(t)) => {
                    if self.in_text_run {
                        let value = t.unescape().map_err(|e| e.to_string())?;
                        self.text.push_str(&value);
                        self.html.push_str(&escape_html(&value));
                    }
                }
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"w:p" => {
                        self.text.push('\n');
                        self.html.push_str("</p>\n");
                        self.paragraph_open = false;
                    }
                    b"w:t" => self.in_text_run = false,
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(format!("malformed document.xml: {e}")),
                _ => {}
            }
        }

        Ok(())
    }

    /// Record an embedded-image reference and leave a placeholder in the
    /// HTML; the actual file is written after the walk.
    fn intercept_image(&mut self, e: &quick_xml::events::BytesStart<'_>) {
        let Some(rid) = attribute_value(e, b"r:embed") else {
            return;
        };
        let Some(target) = self.relationships.get(&rid) else {
            debug!("No relationship for image {rid}, skipping");
            return;
        };

        let index = self.image_targets.len();
        self.image_targets.push(target.clone());
        self.html
            .push_str(&format!("<img src=\"{}\">", placeholder(index)));
    }
}

/// Parse `word/_rels/document.xml.rels` into an Id → Target map.
fn read_relationships<R: Read + std::io::Seek>(
    archive: &mut zip::ZipArchive<R>,
) -> Result<HashMap<String, String>, String> {
    // Documents without images may ship without a rels entry worth parsing;
    // an empty map simply means no image reference can resolve.
    let xml = match read_entry_string(archive, "word/_rels/document.xml.rels") {
        Ok(xml) => xml,
        Err(_) => return Ok(HashMap::new()),
    };

    let mut map = HashMap::new();
    let mut reader = Reader::from_str(&xml);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e))
                if e.name().as_ref() == b"Relationship" =>
            {
                if let (Some(id), Some(target)) =
                    (attribute_value(&e, b"Id"), attribute_value(&e, b"Target"))
                {
                    map.insert(id, target);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("malformed document.xml.rels: {e}")),
            _ => {}
        }
    }

    Ok(map)
}

fn attribute_value(e: &quick_xml::events::BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

/// Read a ZIP entry as UTF-8 text.
fn read_entry_string<R: Read + std::io::Seek>(
    archive: &mut zip::ZipArchive<R>,
    name: &str,
) -> Result<String, String> {
    let mut entry = archive
        .by_name(name)
        .map_err(|e| format!("missing {name}: {e}"))?;
    let mut contents = String::new();
    entry
        .read_to_string(&mut contents)
        .map_err(|e| format!("reading {name}: {e}"))?;
    Ok(contents)
}

/// Read an image's bytes from the container, resolving the rels target
/// relative to `word/`.
fn read_media_bytes<R: Read + std::io::Seek>(
    archive: &mut zip::ZipArchive<R>,
    target: &str,
) -> Result<Vec<u8>, String> {
    let entry_name = if let Some(stripped) = target.strip_prefix('/') {
        stripped.to_string()
    } else {
        format!("word/{target}")
    };

    let mut entry = archive
        .by_name(&entry_name)
        .map_err(|e| format!("missing media entry {entry_name}: {e}"))?;
    let mut bytes = Vec::new();
    entry
        .read_to_end(&mut bytes)
        .map_err(|e| format!("reading {entry_name}: {e}"))?;
    Ok(bytes)
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

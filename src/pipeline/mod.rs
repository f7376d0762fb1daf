//! Pipeline stages for document-to-Markdown conversion.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a different wire backend) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ pdf/docx/image ──▶ assemble ──▶ client ──▶ postprocess ──▶ reconcile
//! (path)     (extraction)      (prompt)     (stream)   (cleanup)       (image GC)
//! ```
//!
//! 1. [`input`]     — existence check and extension dispatch
//! 2. [`pdf`] / [`docx`] / [`image`] — extract [`PageContent`] and write
//!    embedded images to the output directory
//! 3. [`assemble`]  — build the instruction + per-page message parts
//! 4. [`client`]    — stream the model response and concatenate it; the only
//!    stage with network I/O
//! 5. [`postprocess`] — deterministic text-cleanup rules for model quirks
//! 6. [`reconcile`] — delete saved images the Markdown never references

pub mod assemble;
pub mod client;
pub mod docx;
pub mod image;
pub mod input;
pub mod pdf;
pub mod postprocess;
pub mod reconcile;

use serde::{Deserialize, Serialize};

/// Detected input kind, dispatched from the lower-cased file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileKind {
    Pdf,
    Docx,
    /// A bare raster image (png, jpg, jpeg, gif, webp).
    Image,
}

/// A base64-encoded image payload ready for the multimodal request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageImage {
    /// Base64-encoded bytes (standard alphabet, no data-URI prefix).
    pub data: String,
    /// Mime type, e.g. `image/png`.
    pub mime_type: String,
}

/// Normalised content of one logical page.
///
/// PDF inputs produce one entry per page with contiguous `page_number`
/// starting at 1; DOCX and bare-image inputs produce exactly one entry with
/// `page_number == 1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageContent {
    /// 1-based position in document order.
    pub page_number: usize,
    /// Extracted text; empty string permitted.
    pub text: String,
    /// Rendered page screenshot (PDF) or the file's own bytes (bare image).
    pub page_image: Option<PageImage>,
    /// Filenames of embedded images physically located on this page.
    pub image_filenames: Vec<String>,
}

/// Record of one embedded image written to the output directory.
///
/// Saved images become ordinary files owned by the current run; the
/// reconciler may delete them based solely on absence from the generated
/// Markdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedImage {
    /// 1-based page the image was found on.
    pub page_number: usize,
    /// 0-based index of the image within its page.
    pub image_index: usize,
    /// `image_<n>.<ext>`, unique across the run.
    pub filename: String,
}

/// Everything the extractor produces for one input document.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub pages: Vec<PageContent>,
    pub saved_images: Vec<SavedImage>,
}

impl Default for PageContent {
    fn default() -> Self {
        Self {
            page_number: 1,
            text: String::new(),
            page_image: None,
            image_filenames: Vec::new(),
        }
    }
}

/// Allocates `image_<n>.<ext>` filenames with `n` monotonically increasing
/// from 1 across the whole run.
///
/// The counter is an explicit value owned by the extractor call rather than
/// a captured external variable, so it stays correct if extraction branches
/// are ever parallelised behind it.
#[derive(Debug, Default)]
pub struct ImageCounter {
    next: usize,
}

impl ImageCounter {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    /// Return the next filename for the given extension.
    pub fn next_filename(&mut self, extension: &str) -> String {
        self.next += 1;
        format!("image_{}.{}", self.next, extension)
    }

    /// Number of filenames handed out so far.
    pub fn allocated(&self) -> usize {
        self.next
    }
}

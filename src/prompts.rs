//! Instruction templates for the conversion request.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing the conversion behaviour (table
//!    handling, separator policy) requires editing exactly one place.
//!
//! 2. **Testability** — unit tests can inspect prompts directly without a
//!    live endpoint, so prompt regressions are cheap to catch.
//!
//! The instruction sent with the user message is selected by
//! [`instruction_for`] from four fixed templates keyed on the input kind and
//! the `respect_pages` flag; the system message by [`system_prompt_for`]
//! from two.

use crate::pipeline::FileKind;

/// System message for PDF and DOCX inputs.
pub const SYSTEM_PROMPT_DOCUMENT: &str = "You are an expert document converter. \
You transform extracted document content into clean, well-structured Markdown. \
Preserve all textual content faithfully. Output ONLY Markdown, with no commentary \
and no surrounding code fences.";

/// System message for bare-image inputs.
pub const SYSTEM_PROMPT_IMAGE: &str = "You are an expert OCR and document-structure \
engine. You read images and transcribe their content as clean, well-structured \
Markdown. Output ONLY Markdown, with no commentary and no surrounding code fences.";

/// Instruction for bare-image inputs (OCR and structure).
const INSTRUCTION_IMAGE: &str = "Transcribe the attached image into Markdown.\n\
\n\
- Extract ALL visible text accurately, in reading order.\n\
- Reconstruct structure: headings, lists, and tables in GFM pipe format.\n\
- Use **bold** and *italic* to match visual emphasis.\n\
- Do not describe the image; transcribe its content.";

/// Instruction for DOCX inputs (HTML + raw text to Markdown).
const INSTRUCTION_DOCX: &str = "Convert the following document to Markdown. \
You are given two views of the same content: an HTML rendering (which preserves \
paragraph structure and the position of embedded images) and the raw extracted text.\n\
\n\
- Use the HTML as the primary structural guide and the raw text to recover \
anything the HTML rendering dropped.\n\
- Keep every <img> reference as a Markdown image using its src filename, \
e.g. ![image](image_1.png), at the same position in the content.\n\
- Reconstruct headings, lists, and tables in GFM pipe format.";

/// Instruction for PDF inputs when page boundaries must be preserved.
const INSTRUCTION_PDF_RESPECT_PAGES: &str = "Convert the following PDF content to \
Markdown, page by page. Each page is given as its extracted text plus a screenshot \
of the rendered page.\n\
\n\
- Use each page's screenshot to recover layout the extracted text lost: \
headings, multi-column reading order, and tables in GFM pipe format.\n\
- Preserve page boundaries: end every page with a horizontal rule (---) so \
the page structure of the original survives in the Markdown.\n\
- Where a page lists saved image filenames, place each as a Markdown image \
(![image](filename)) at its position on that page.";

/// Instruction for PDF inputs when continuous content is merged (the default).
const INSTRUCTION_PDF_MERGE: &str = "Convert the following PDF content to a single \
continuous Markdown document. Each page is given as its extracted text plus a \
screenshot of the rendered page.\n\
\n\
- Use the screenshots to recover layout the extracted text lost: headings, \
multi-column reading order, and tables in GFM pipe format.\n\
- Merge content that continues across pages; do NOT insert page separators, \
horizontal rules, or page markers between pages.\n\
- Strip repeated page headers, footers, and page numbers that appear on \
every page.\n\
- Where a page lists saved image filenames, place each as a Markdown image \
(![image](filename)) at its position in the content.";

/// Select the instruction template for the input kind and separator policy.
///
/// `respect_pages` only matters for PDFs; image and DOCX inputs have a
/// single template each.
pub fn instruction_for(kind: FileKind, respect_pages: bool) -> &'static str {
    match kind {
        FileKind::Image => INSTRUCTION_IMAGE,
        FileKind::Docx => INSTRUCTION_DOCX,
        FileKind::Pdf if respect_pages => INSTRUCTION_PDF_RESPECT_PAGES,
        FileKind::Pdf => INSTRUCTION_PDF_MERGE,
    }
}

/// Select the system message for the input kind.
pub fn system_prompt_for(kind: FileKind) -> &'static str {
    match kind {
        FileKind::Image => SYSTEM_PROMPT_IMAGE,
        FileKind::Pdf | FileKind::Docx => SYSTEM_PROMPT_DOCUMENT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_instruction_forbids_separators() {
        let prompt = instruction_for(FileKind::Pdf, false);
        assert!(prompt.contains("do NOT insert page separators"));
        assert!(prompt.contains("Strip repeated page headers"));
    }

    #[test]
    fn respect_pages_instruction_references_screenshots() {
        let prompt = instruction_for(FileKind::Pdf, true);
        assert!(prompt.contains("screenshot"));
        assert!(prompt.contains("Preserve page boundaries"));
        assert!(prompt.contains("horizontal rule"));
    }

    #[test]
    fn image_and_docx_ignore_respect_pages() {
        assert_eq!(
            instruction_for(FileKind::Image, true),
            instruction_for(FileKind::Image, false)
        );
        assert_eq!(
            instruction_for(FileKind::Docx, true),
            instruction_for(FileKind::Docx, false)
        );
    }

    #[test]
    fn system_prompt_split_by_kind() {
        assert_eq!(system_prompt_for(FileKind::Image), SYSTEM_PROMPT_IMAGE);
        assert_eq!(system_prompt_for(FileKind::Pdf), SYSTEM_PROMPT_DOCUMENT);
        assert_eq!(system_prompt_for(FileKind::Docx), SYSTEM_PROMPT_DOCUMENT);
    }
}

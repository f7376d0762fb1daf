//! Error types for the doc2md library.
//!
//! Every variant of [`Doc2MdError`] is **fatal**: the conversion aborts and
//! no Markdown file is written. The single non-fatal failure mode in the
//! pipeline — a saved image that cannot be deleted during reconciliation —
//! is deliberately *not* represented here. It happens strictly after the
//! Markdown file exists, cannot roll the run back, and is therefore logged
//! and counted inside [`crate::pipeline::reconcile`] instead of propagated.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the doc2md library.
#[derive(Debug, Error)]
pub enum Doc2MdError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// The input extension is outside the supported set.
    #[error(
        "Unsupported file type: '.{extension}'\n\
Supported types: .pdf, .docx, .png, .jpg, .jpeg, .gif, .webp"
    )]
    UnsupportedFileType { extension: String },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// A parsing collaborator (pdfium, zip, quick-xml) failed.
    ///
    /// The collaborator's message is passed through unchanged; there is no
    /// partial-success state to protect, so no recovery is attempted.
    #[error("Failed to extract content from '{path}': {detail}")]
    ExtractionFailed { path: PathBuf, detail: String },

    // ── Generation errors ─────────────────────────────────────────────────
    /// No API credential could be resolved.
    #[error(
        "No API key configured.\n\
Set the DOC2MD_API_KEY environment variable, or run: doc2md setup"
    )]
    MissingApiKey,

    /// The chat-completions endpoint returned an error or the stream broke.
    #[error("Markdown generation failed: {detail}")]
    GenerationFailed { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output Markdown file or a saved image.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_file_type_display_lists_supported_set() {
        let e = Doc2MdError::UnsupportedFileType {
            extension: "txt".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("'.txt'"), "got: {msg}");
        assert!(msg.contains(".docx"));
        assert!(msg.contains(".webp"));
    }

    #[test]
    fn missing_api_key_display_has_remediation() {
        let msg = Doc2MdError::MissingApiKey.to_string();
        assert!(msg.contains("DOC2MD_API_KEY"));
        assert!(msg.contains("doc2md setup"));
    }

    #[test]
    fn extraction_failed_passes_detail_through() {
        let e = Doc2MdError::ExtractionFailed {
            path: PathBuf::from("a.pdf"),
            detail: "broken xref".into(),
        };
        assert!(e.to_string().contains("broken xref"));
    }
}

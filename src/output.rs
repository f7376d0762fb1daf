//! Conversion output types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The result of one conversion run.
///
/// A run keeps no state across invocations; everything a caller may want to
/// inspect afterwards lives here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Where the Markdown file was written.
    pub output_path: PathBuf,
    /// The final Markdown, post-processed and reconciled.
    pub markdown: String,
    /// Run statistics.
    pub stats: ConversionStats,
}

/// Statistics for one conversion run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Logical pages extracted (PDF page count; 1 for DOCX and bare images).
    pub pages: usize,
    /// Embedded images written to the output directory during extraction.
    pub images_saved: usize,
    /// Saved images deleted because the Markdown never referenced them.
    pub images_deleted: usize,
    /// Byte length of the final Markdown.
    pub markdown_bytes: usize,
    /// Wall-clock time spent in extraction.
    pub extract_duration_ms: u64,
    /// Wall-clock time spent streaming the model response.
    pub generate_duration_ms: u64,
    /// Total wall-clock time for the run.
    pub total_duration_ms: u64,
}

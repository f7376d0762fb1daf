//! Progress-callback trait for pipeline stage events.
//!
//! Inject an [`Arc<dyn ConversionProgress>`] via
//! [`crate::config::ConversionConfigBuilder::progress`] to receive events as
//! the pipeline moves through its stages.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers
//! can forward events to a terminal spinner, a WebSocket, or a log record
//! without the library knowing anything about how the host application
//! communicates. All methods have default no-op implementations so callers
//! only override what they care about.

use crate::output::ConversionStats;
use std::sync::Arc;

/// Called by the conversion pipeline at stage boundaries.
///
/// Implementations must be `Send + Sync`; the generation callback fires from
/// the async task consuming the response stream.
pub trait ConversionProgress: Send + Sync {
    /// Called once extraction has finished and embedded images are on disk.
    fn on_extraction_complete(&self, pages: usize, images_saved: usize) {
        let _ = (pages, images_saved);
    }

    /// Called just before the model request is sent.
    fn on_generation_start(&self) {}

    /// Called as streamed response text accumulates.
    ///
    /// `total_chars` is the running total, not a delta.
    fn on_generation_progress(&self, total_chars: usize) {
        let _ = total_chars;
    }

    /// Called once after the Markdown is written and unused images removed.
    fn on_complete(&self, stats: &ConversionStats) {
        let _ = stats;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgress;

impl ConversionProgress for NoopProgress {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgress>;

//! # doc2md
//!
//! Convert PDF, DOCX, and image files to Markdown with a vision language
//! model.
//!
//! Extraction pulls out whatever each format offers cheaply: PDF pages
//! become embedded text plus a page screenshot, with embedded raster
//! images saved to disk; DOCX becomes an HTML-ish rendering of the
//! document body with its media files saved alongside; a standalone image
//! is sent as-is for OCR. Everything goes into one multimodal request,
//! the streamed response is cleaned up and written next to the saved
//! images, and any saved image the final Markdown never references is
//! deleted.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF / DOCX / image
//!  │
//!  ├─ 1. Detect    file type by extension
//!  ├─ 2. Extract   text + page screenshots, save embedded images to disk
//!  ├─ 3. Assemble  one multimodal user message (text and image parts)
//!  ├─ 4. Generate  streamed chat completion (OpenAI-compatible endpoint)
//!  ├─ 5. Polish    deterministic Markdown cleanup
//!  ├─ 6. Write     atomic write of the .md file
//!  └─ 7. Reconcile delete saved images the Markdown does not reference
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doc2md::{convert_to_file, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // API key from DOC2MD_API_KEY or a doc2md config file
//!     let config = ConversionConfig::default();
//!     let output = convert_to_file("report.pdf", "report.md", &config).await?;
//!     println!("wrote {} ({} bytes)", output.output_path.display(),
//!         output.stats.markdown_bytes);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doc2md` binary (clap + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! doc2md = { version = "0.1", default-features = false }
//! ```

pub mod config;
pub mod convert;
pub mod credentials;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

pub use config::{ConversionConfig, ConversionConfigBuilder};
pub use convert::{convert_to_file, convert_to_file_sync};
pub use error::Doc2MdError;
pub use output::{ConversionOutput, ConversionStats};
pub use progress::{ConversionProgress, NoopProgress};

//! Conversion entry points.
//!
//! [`convert_to_file`] runs the whole pipeline for one input file: detect
//! the file type, extract text and images, assemble the model request,
//! stream the response, post-process, write the Markdown, then delete the
//! saved images the Markdown never references.
//!
//! Saved images land in the output file's directory before the model is
//! called, so a fatal generation error can leave image files behind next
//! to no Markdown. Re-running the conversion reconciles them.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use tracing::{debug, info};

use crate::config::ConversionConfig;
use crate::credentials;
use crate::error::Doc2MdError;
use crate::output::{ConversionOutput, ConversionStats};
use crate::pipeline::client::{ChatBackend, GenerationRequest, OpenAiBackend};
use crate::pipeline::{assemble, docx, image, input, pdf, postprocess, reconcile};
use crate::pipeline::{Extraction, FileKind, ImageCounter};
use crate::prompts;

/// Convert one document to a Markdown file.
///
/// The output file's directory receives the extracted images
/// (`image_1.png`, `image_2.png`, ...) alongside the Markdown; images the
/// final document does not reference are deleted before returning.
///
/// # Errors
///
/// Fatal errors abort before the Markdown file is written:
/// missing input, unsupported extension, extraction failure, missing API
/// key, or a generation failure. Image deletion failures are logged and
/// counted but never returned as errors.
pub async fn convert_to_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Doc2MdError> {
    let total_start = Instant::now();
    let input_path = input_path.as_ref();
    let output_path = output_path.as_ref().to_path_buf();
    info!("Converting {} -> {}", input_path.display(), output_path.display());

    let kind = input::detect_kind(input_path)?;

    // Fail on a missing key before any extraction work happens.
    let backend = resolve_backend(config)?;

    let output_dir = match output_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    tokio::fs::create_dir_all(&output_dir)
        .await
        .map_err(|e| Doc2MdError::OutputWriteFailed {
            path: output_dir.clone(),
            source: e,
        })?;

    // Step 1: extraction. Images are written to the output directory now
    // so the model can reference them by filename.
    let extract_start = Instant::now();
    let extraction = extract(kind, input_path, &output_dir, config).await?;
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;
    info!(
        "Extracted {} pages, {} images in {}ms",
        extraction.pages.len(),
        extraction.saved_images.len(),
        extract_duration_ms
    );

    if let Some(ref cb) = config.progress {
        cb.on_extraction_complete(extraction.pages.len(), extraction.saved_images.len());
    }

    // Step 2: assemble and stream the completion.
    let request = GenerationRequest {
        system: prompts::system_prompt_for(kind).to_string(),
        parts: assemble::assemble_parts(&extraction.pages, kind, config.respect_pages),
        model: config.model.clone(),
        temperature: config.temperature,
        max_tokens: config.max_tokens,
    };

    if let Some(ref cb) = config.progress {
        cb.on_generation_start();
    }

    let generate_start = Instant::now();
    let streamed_chars = AtomicUsize::new(0);
    let progress = config.progress.clone();
    let on_delta = move |delta: &str| {
        let total = streamed_chars.fetch_add(delta.chars().count(), Ordering::Relaxed)
            + delta.chars().count();
        if let Some(ref cb) = progress {
            cb.on_generation_progress(total);
        }
    };
    let raw = backend.complete(&request, &on_delta).await?;
    let generate_duration_ms = generate_start.elapsed().as_millis() as u64;
    debug!("Model returned {} chars in {}ms", raw.len(), generate_duration_ms);

    // Step 3: clean up and write atomically (temp file + rename).
    let markdown = postprocess::clean_markdown(&raw);

    let tmp_path = output_path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, &markdown)
        .await
        .map_err(|e| Doc2MdError::OutputWriteFailed {
            path: output_path.clone(),
            source: e,
        })?;
    tokio::fs::rename(&tmp_path, &output_path)
        .await
        .map_err(|e| Doc2MdError::OutputWriteFailed {
            path: output_path.clone(),
            source: e,
        })?;

    // Step 4: remove images the final Markdown does not reference.
    let images_deleted =
        reconcile::delete_unreferenced(&markdown, &extraction.saved_images, &output_dir);

    let stats = ConversionStats {
        pages: extraction.pages.len(),
        images_saved: extraction.saved_images.len(),
        images_deleted,
        markdown_bytes: markdown.len(),
        extract_duration_ms,
        generate_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {} pages, {} bytes, {} images kept, {}ms total",
        stats.pages,
        stats.markdown_bytes,
        stats.images_saved - stats.images_deleted,
        stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress {
        cb.on_complete(&stats);
    }

    Ok(ConversionOutput {
        output_path,
        markdown,
        stats,
    })
}

/// Synchronous wrapper around [`convert_to_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_to_file_sync(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Doc2MdError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Doc2MdError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(convert_to_file(input_path, output_path, config))
}

/// Pick the backend: an injected one, or the OpenAI-compatible default.
fn resolve_backend(
    config: &ConversionConfig,
) -> Result<std::sync::Arc<dyn ChatBackend>, Doc2MdError> {
    if let Some(ref backend) = config.backend {
        return Ok(std::sync::Arc::clone(backend));
    }

    let api_key = config
        .api_key
        .clone()
        .or_else(credentials::resolve_api_key)
        .ok_or(Doc2MdError::MissingApiKey)?;

    Ok(std::sync::Arc::new(OpenAiBackend::new(
        config.base_url.clone(),
        api_key,
    )))
}

/// Dispatch extraction by file type.
///
/// PDF and DOCX parsing run on the blocking pool; the image counter rides
/// along by value so filenames stay unique across a run.
async fn extract(
    kind: FileKind,
    input_path: &Path,
    output_dir: &Path,
    config: &ConversionConfig,
) -> Result<Extraction, Doc2MdError> {
    let counter = ImageCounter::default();
    match kind {
        FileKind::Pdf => {
            let (extraction, _counter) =
                pdf::extract(input_path, output_dir, config.render_scale, counter).await?;
            Ok(extraction)
        }
        FileKind::Docx => {
            let path = input_path.to_path_buf();
            let dir = output_dir.to_path_buf();
            tokio::task::spawn_blocking(move || {
                let mut counter = counter;
                docx::extract(&path, &dir, &mut counter)
            })
            .await
            .map_err(|e| Doc2MdError::Internal(format!("docx extraction task failed: {e}")))?
        }
        FileKind::Image => image::extract(input_path),
    }
}

//! PDF extraction: page text, page screenshots, and embedded images via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto a dedicated thread pool
//! thread, preventing Tokio workers from stalling during CPU-heavy rendering.
//!
//! ## Three page-aligned extractions
//!
//! Each page yields a rendered screenshot (layout context for the model),
//! its raw text, and any embedded raster images. All three share the same
//! 0-based page index, so [`crate::pipeline::PageContent`] is a simple zip.
//! Embedded images are re-encoded to PNG and written next to the output file
//! using the run-wide [`ImageCounter`], never a per-page one.

use crate::error::Doc2MdError;
use crate::pipeline::{Extraction, ImageCounter, PageContent, PageImage, SavedImage};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Extract all pages of a PDF.
///
/// Runs inside `spawn_blocking` since pdfium operations are CPU-bound.
/// The counter is taken by value and handed back so the caller keeps
/// explicit ownership of filename allocation across extraction branches.
pub async fn extract(
    pdf_path: &Path,
    output_dir: &Path,
    render_scale: f32,
    counter: ImageCounter,
) -> Result<(Extraction, ImageCounter), Doc2MdError> {
    let path = pdf_path.to_path_buf();
    let out_dir = output_dir.to_path_buf();

    tokio::task::spawn_blocking(move || extract_blocking(&path, &out_dir, render_scale, counter))
        .await
        .map_err(|e| Doc2MdError::Internal(format!("Extraction task panicked: {e}")))?
}

/// Blocking implementation of PDF extraction.
fn extract_blocking(
    pdf_path: &Path,
    output_dir: &Path,
    render_scale: f32,
    mut counter: ImageCounter,
) -> Result<(Extraction, ImageCounter), Doc2MdError> {
    let extraction_err = |detail: String| Doc2MdError::ExtractionFailed {
        path: pdf_path.to_path_buf(),
        detail,
    };

    let pdfium = Pdfium::default();

    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| extraction_err(format!("{e:?}")))?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let render_config = PdfRenderConfig::new().scale_page_by_factor(render_scale);

    let mut extraction = Extraction::default();

    for (idx, page) in pages.iter().enumerate() {
        let page_number = idx + 1;

        let text = page
            .text()
            .map(|t| t.all())
            .map_err(|e| extraction_err(format!("text extraction failed on page {page_number}: {e:?}")))?;

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| extraction_err(format!("rasterisation failed on page {page_number}: {e:?}")))?;
        let screenshot = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            page_number,
            screenshot.width(),
            screenshot.height()
        );

        let screenshot_b64 = encode_png_base64(&screenshot)
            .map_err(|e| extraction_err(format!("screenshot encoding failed on page {page_number}: {e}")))?;

        let mut image_filenames = Vec::new();
        for (image_index, object) in page
            .objects()
            .iter()
            .filter_map(|o| {
                o.as_image_object()
                    .map(|img| img.get_raw_image())
                    .map(|r| r.map_err(|e| extraction_err(format!("{e:?}"))))
            })
            .enumerate()
        {
            let embedded: DynamicImage = object?;
            let filename = counter.next_filename("png");
            write_png(&embedded, &output_dir.join(&filename))?;
            debug!("Saved embedded image {} (page {})", filename, page_number);

            extraction.saved_images.push(SavedImage {
                page_number,
                image_index,
                filename: filename.clone(),
            });
            image_filenames.push(filename);
        }

        extraction.pages.push(PageContent {
            page_number,
            text,
            page_image: Some(PageImage {
                data: screenshot_b64,
                mime_type: "image/png".to_string(),
            }),
            image_filenames,
        });
    }

    // `document` drops here, releasing the pdfium handle before we return.
    Ok((extraction, counter))
}

/// Encode a rendered page as base64 PNG.
///
/// PNG over JPEG: lossless compression preserves text crispness, which
/// matters far more than payload size for reading accuracy.
fn encode_png_base64(img: &DynamicImage) -> Result<String, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    Ok(STANDARD.encode(&buf))
}

/// Write an embedded image to disk as PNG.
fn write_png(img: &DynamicImage, path: &PathBuf) -> Result<(), Doc2MdError> {
    img.save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| Doc2MdError::OutputWriteFailed {
            path: path.clone(),
            source: std::io::Error::other(e),
        })
}

//! Bare-image extraction: the whole file becomes one page's image payload.
//!
//! No rendering, no text, no saved-image records — the file's own bytes are
//! base64-encoded as the single page's `page_image` and the model does the
//! rest. Mime type is mapped from the extension, `image/png` by default.

use crate::error::Doc2MdError;
use crate::pipeline::input::mime_for_extension;
use crate::pipeline::{Extraction, PageContent, PageImage};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;
use tracing::debug;

/// Extract a bare raster image as one synthetic page.
pub fn extract(image_path: &Path) -> Result<Extraction, Doc2MdError> {
    let bytes = std::fs::read(image_path).map_err(|e| Doc2MdError::ExtractionFailed {
        path: image_path.to_path_buf(),
        detail: e.to_string(),
    })?;

    let extension = image_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    let mime_type = mime_for_extension(extension);
    debug!(
        "Bare image: {} bytes, mime {}",
        bytes.len(),
        mime_type
    );

    Ok(Extraction {
        pages: vec![PageContent {
            page_number: 1,
            text: String::new(),
            page_image: Some(PageImage {
                data: STANDARD.encode(&bytes),
                mime_type: mime_type.to_string(),
            }),
            image_filenames: Vec::new(),
        }],
        saved_images: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn bare_image_is_a_single_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(&[0xFF, 0xD8, 0xFF, 0xE0]).unwrap();

        let extraction = extract(&path).unwrap();
        assert_eq!(extraction.pages.len(), 1);
        assert_eq!(extraction.pages[0].page_number, 1);
        assert!(extraction.pages[0].text.is_empty());
        assert!(extraction.saved_images.is_empty());

        let img = extraction.pages[0].page_image.as_ref().unwrap();
        assert_eq!(img.mime_type, "image/jpeg");
        assert_eq!(
            STANDARD.decode(&img.data).unwrap(),
            vec![0xFF, 0xD8, 0xFF, 0xE0]
        );
    }

    #[test]
    fn unknown_extension_defaults_to_png_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pic.png");
        std::fs::write(&path, [0x89, b'P']).unwrap();

        let extraction = extract(&path).unwrap();
        assert_eq!(
            extraction.pages[0].page_image.as_ref().unwrap().mime_type,
            "image/png"
        );
    }

    #[test]
    fn missing_file_is_extraction_failure() {
        let result = extract(Path::new("/no/such/pic.png"));
        assert!(matches!(result, Err(Doc2MdError::ExtractionFailed { .. })));
    }
}

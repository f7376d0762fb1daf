//! Input validation: existence check and extension dispatch.
//!
//! Dispatch happens strictly in two steps so the error the user sees matches
//! what is actually wrong: first the path must resolve to a readable file
//! (`FileNotFound`), then the lower-cased extension must belong to the
//! supported set (`UnsupportedFileType`). Nothing reads the file's content
//! before both checks pass.

use crate::error::Doc2MdError;
use crate::pipeline::FileKind;
use std::path::Path;
use tracing::debug;

/// Extensions accepted as bare-image inputs, and the extensions the
/// reconciler recognises inside Markdown image references.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

/// Validate the input path and detect its kind.
pub fn detect_kind(path: &Path) -> Result<FileKind, Doc2MdError> {
    if !path.is_file() {
        return Err(Doc2MdError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let kind = match extension.as_str() {
        "pdf" => FileKind::Pdf,
        "docx" => FileKind::Docx,
        ext if IMAGE_EXTENSIONS.contains(&ext) => FileKind::Image,
        _ => {
            return Err(Doc2MdError::UnsupportedFileType { extension });
        }
    };

    debug!("Detected {:?} input: {}", kind, path.display());
    Ok(kind)
}

/// Map an image extension to its mime type, defaulting to `image/png`.
pub fn mime_for_extension(extension: &str) -> &'static str {
    match extension.to_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "image/png",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn touch(dir: &Path, name: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"x").unwrap();
        path
    }

    #[test]
    fn detects_supported_kinds() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            detect_kind(&touch(dir.path(), "a.pdf")).unwrap(),
            FileKind::Pdf
        );
        assert_eq!(
            detect_kind(&touch(dir.path(), "b.docx")).unwrap(),
            FileKind::Docx
        );
        assert_eq!(
            detect_kind(&touch(dir.path(), "c.webp")).unwrap(),
            FileKind::Image
        );
    }

    #[test]
    fn extension_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            detect_kind(&touch(dir.path(), "REPORT.PDF")).unwrap(),
            FileKind::Pdf
        );
        assert_eq!(
            detect_kind(&touch(dir.path(), "photo.JPeG")).unwrap(),
            FileKind::Image
        );
    }

    #[test]
    fn missing_file_before_extension_check() {
        // Even a supported extension fails with FileNotFound when absent.
        let result = detect_kind(Path::new("/definitely/not/here.pdf"));
        assert!(matches!(result, Err(Doc2MdError::FileNotFound { .. })));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = detect_kind(&touch(dir.path(), "notes.txt"));
        match result {
            Err(Doc2MdError::UnsupportedFileType { extension }) => {
                assert_eq!(extension, "txt");
            }
            other => panic!("expected UnsupportedFileType, got {other:?}"),
        }
    }

    #[test]
    fn no_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = detect_kind(&touch(dir.path(), "README"));
        assert!(matches!(
            result,
            Err(Doc2MdError::UnsupportedFileType { .. })
        ));
    }

    #[test]
    fn mime_mapping_defaults_to_png() {
        assert_eq!(mime_for_extension("jpg"), "image/jpeg");
        assert_eq!(mime_for_extension("JPEG"), "image/jpeg");
        assert_eq!(mime_for_extension("gif"), "image/gif");
        assert_eq!(mime_for_extension("webp"), "image/webp");
        assert_eq!(mime_for_extension("png"), "image/png");
        assert_eq!(mime_for_extension("bmp"), "image/png");
    }
}

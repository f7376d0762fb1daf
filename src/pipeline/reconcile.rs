//! Image reconciliation: delete saved images the Markdown never mentions.
//!
//! Extraction writes every candidate image to the output directory before
//! the model runs, because the model has to be able to reference them.
//! Afterwards, any file the final Markdown does not link is an orphan and
//! gets removed. Deletion failures are logged and counted, never fatal:
//! a stray file next to a correct document is not worth failing the run.

use std::collections::HashSet;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::pipeline::SavedImage;

/// Markdown image links whose target carries a raster-image extension.
///
/// Deliberately narrow: HTML `<img>` tags and reference-style links are not
/// matched, so images the model emits that way would be deleted. The
/// prompts instruct the model to use inline Markdown links only.
static RE_IMAGE_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"!\[[^\]]*\]\(([^)\s]+\.(?i:png|jpg|jpeg|gif|webp))\)").unwrap()
});

/// Collect the target of every image link in `markdown`.
///
/// Targets are kept verbatim apart from lowercasing the extension: the
/// saved files are always written as bare `image_<n>.<ext>` names next to
/// the Markdown, and the prompts instruct the model to link them exactly
/// that way. A path-qualified reference like `./figs/image_1.png` does
/// not match the saved `image_1.png`, so that file is deleted.
pub fn referenced_image_names(markdown: &str) -> HashSet<String> {
    RE_IMAGE_LINK
        .captures_iter(markdown)
        .map(|caps| fold_extension(&caps[1]))
        .collect()
}

/// Lowercase the extension, leaving the rest of the name untouched.
fn fold_extension(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}.{}", ext.to_ascii_lowercase()),
        None => name.to_string(),
    }
}

/// Delete saved images that `markdown` does not reference.
///
/// Returns the number of files actually deleted. Already-missing files are
/// skipped silently, so running twice over the same output is harmless.
pub fn delete_unreferenced(
    markdown: &str,
    saved_images: &[SavedImage],
    output_dir: &Path,
) -> usize {
    let referenced = referenced_image_names(markdown);
    let mut deleted = 0usize;

    for image in saved_images {
        if referenced.contains(&fold_extension(&image.filename)) {
            continue;
        }

        let path = output_dir.join(&image.filename);
        if !path.exists() {
            continue;
        }

        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!("Deleted unreferenced image {}", image.filename);
                deleted += 1;
            }
            Err(e) => {
                warn!("Failed to delete unreferenced image {}: {e}", image.filename);
            }
        }
    }

    deleted
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn saved(filename: &str) -> SavedImage {
        SavedImage {
            page_number: 1,
            image_index: 0,
            filename: filename.to_string(),
        }
    }

    #[test]
    fn finds_inline_image_links() {
        let md = "Intro\n\n![diagram](image_1.png)\n\nSee ![photo](image_2.JPG) too.\n";
        let names = referenced_image_names(md);
        assert!(names.contains("image_1.png"));
        assert!(names.contains("image_2.jpg"));
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn relative_path_reference_does_not_protect_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("image_1.png"), b"a").unwrap();

        let deleted =
            delete_unreferenced("![x](./figs/image_1.png)", &[saved("image_1.png")], dir.path());
        assert_eq!(deleted, 1);
        assert!(!dir.path().join("image_1.png").exists());
    }

    #[test]
    fn ignores_non_image_links_and_html() {
        let md = "[doc](report.pdf) ![x](notes.txt) <img src=\"image_1.png\">";
        assert!(referenced_image_names(md).is_empty());
    }

    #[test]
    fn referenced_file_survives_unreferenced_deleted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("image_1.png"), b"a").unwrap();
        fs::write(dir.path().join("image_2.png"), b"b").unwrap();

        let md = "![kept](image_1.png)\n";
        let images = vec![saved("image_1.png"), saved("image_2.png")];

        let deleted = delete_unreferenced(md, &images, dir.path());
        assert_eq!(deleted, 1);
        assert!(dir.path().join("image_1.png").exists());
        assert!(!dir.path().join("image_2.png").exists());
    }

    #[test]
    fn extension_case_is_folded_but_stem_is_not() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("image_1.png"), b"a").unwrap();
        fs::write(dir.path().join("image_2.png"), b"b").unwrap();

        let md = "![x](image_1.PNG) ![y](IMAGE_2.png)";
        let images = vec![saved("image_1.png"), saved("image_2.png")];

        let deleted = delete_unreferenced(md, &images, dir.path());
        assert_eq!(deleted, 1);
        assert!(dir.path().join("image_1.png").exists());
        assert!(!dir.path().join("image_2.png").exists());
    }

    #[test]
    fn missing_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let images = vec![saved("image_1.png")];

        assert_eq!(delete_unreferenced("no links", &images, dir.path()), 0);
        // Second run over the same already-clean directory.
        assert_eq!(delete_unreferenced("no links", &images, dir.path()), 0);
    }
}

//! Prompt assembly: turn extracted pages into an ordered message-part list.
//!
//! Pure data transformation — no I/O, no business logic beyond template
//! selection and the conditional filename trailer. The assembled sequence is
//! one instruction text part followed, per page, by an optional text part
//! and an optional image part, exactly in document order.

use crate::pipeline::{FileKind, PageContent};
use crate::prompts;

/// One ordered element of the user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagePart {
    Text(String),
    Image {
        /// Base64 payload, no data-URI prefix.
        data: String,
        mime_type: String,
    },
}

/// Build the user-message parts for an extracted document.
pub fn assemble_parts(
    pages: &[PageContent],
    kind: FileKind,
    respect_pages: bool,
) -> Vec<MessagePart> {
    let mut parts = Vec::with_capacity(1 + pages.len() * 2);
    parts.push(MessagePart::Text(
        prompts::instruction_for(kind, respect_pages).to_string(),
    ));

    for page in pages {
        // Image inputs carry no extracted text; the page image is the content.
        if kind != FileKind::Image {
            parts.push(MessagePart::Text(page_text_block(page)));
        }

        if let Some(ref img) = page.page_image {
            parts.push(MessagePart::Image {
                data: img.data.clone(),
                mime_type: img.mime_type.clone(),
            });
        }
    }

    parts
}

/// Format one page's text block: header, body (or placeholder), and the
/// saved-image trailer when the page carries embedded images.
fn page_text_block(page: &PageContent) -> String {
    let mut block = format!("--- Page {} ---\n", page.page_number);

    if page.text.trim().is_empty() {
        block.push_str("(No text extracted)");
    } else {
        block.push_str(&page.text);
    }

    if !page.image_filenames.is_empty() {
        block.push_str(&format!(
            "\n\nImages saved from this page: {}",
            page.image_filenames.join(", ")
        ));
    }

    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PageImage;

    fn page(n: usize, text: &str) -> PageContent {
        PageContent {
            page_number: n,
            text: text.to_string(),
            page_image: None,
            image_filenames: Vec::new(),
        }
    }

    #[test]
    fn first_part_is_the_instruction() {
        let pages = vec![page(1, "hello")];
        let parts = assemble_parts(&pages, FileKind::Pdf, false);
        match &parts[0] {
            MessagePart::Text(t) => {
                assert_eq!(t, prompts::instruction_for(FileKind::Pdf, false));
            }
            other => panic!("expected instruction text, got {other:?}"),
        }
    }

    #[test]
    fn pages_emit_headers_in_order() {
        let pages = vec![page(1, "one"), page(2, "two")];
        let parts = assemble_parts(&pages, FileKind::Pdf, false);
        let texts: Vec<&String> = parts
            .iter()
            .filter_map(|p| match p {
                MessagePart::Text(t) => Some(t),
                _ => None,
            })
            .collect();
        assert!(texts[1].starts_with("--- Page 1 ---\none"));
        assert!(texts[2].starts_with("--- Page 2 ---\ntwo"));
    }

    #[test]
    fn empty_text_uses_placeholder() {
        let pages = vec![page(3, "   ")];
        let parts = assemble_parts(&pages, FileKind::Pdf, false);
        match &parts[1] {
            MessagePart::Text(t) => {
                assert!(t.contains("--- Page 3 ---"));
                assert!(t.contains("(No text extracted)"));
            }
            other => panic!("expected text part, got {other:?}"),
        }
    }

    #[test]
    fn filename_trailer_only_when_images_present() {
        let mut with_images = page(1, "body");
        with_images.image_filenames = vec!["image_1.png".into(), "image_2.png".into()];
        let parts = assemble_parts(&[with_images], FileKind::Pdf, false);
        match &parts[1] {
            MessagePart::Text(t) => {
                assert!(t.contains("Images saved from this page: image_1.png, image_2.png"));
            }
            other => panic!("expected text part, got {other:?}"),
        }

        let parts = assemble_parts(&[page(1, "body")], FileKind::Pdf, false);
        match &parts[1] {
            MessagePart::Text(t) => assert!(!t.contains("Images saved")),
            other => panic!("expected text part, got {other:?}"),
        }
    }

    #[test]
    fn image_kind_omits_text_blocks() {
        let pages = vec![PageContent {
            page_number: 1,
            text: String::new(),
            page_image: Some(PageImage {
                data: "QUJD".into(),
                mime_type: "image/jpeg".into(),
            }),
            image_filenames: Vec::new(),
        }];
        let parts = assemble_parts(&pages, FileKind::Image, false);
        assert_eq!(parts.len(), 2); // instruction + image only
        assert!(matches!(
            &parts[1],
            MessagePart::Image { mime_type, .. } if mime_type == "image/jpeg"
        ));
    }

    #[test]
    fn image_part_follows_its_page_text() {
        let pages = vec![PageContent {
            page_number: 1,
            text: "text".into(),
            page_image: Some(PageImage {
                data: "QUJD".into(),
                mime_type: "image/png".into(),
            }),
            image_filenames: Vec::new(),
        }];
        let parts = assemble_parts(&pages, FileKind::Pdf, false);
        assert_eq!(parts.len(), 3);
        assert!(matches!(&parts[1], MessagePart::Text(_)));
        assert!(matches!(&parts[2], MessagePart::Image { .. }));
    }

    #[test]
    fn docx_page_has_no_image_part() {
        let pages = vec![page(1, "--- HTML ---\n<p>x</p>\n\n--- RAW TEXT ---\nx")];
        let parts = assemble_parts(&pages, FileKind::Docx, false);
        assert_eq!(parts.len(), 2);
        assert!(matches!(&parts[1], MessagePart::Text(_)));
    }
}

//! PDF decoding for the outline extractor.
//!
//! Turns PDF bytes into the ordered [`Fragment`] stream and page sizes that
//! [`outline_core`] consumes.  Everything lopdf-specific stays behind
//! [`backend::PdfBackend`].

use outline_core::{Fragment, PageSize};
use thiserror::Error;

use backend::{LopdfBackend, PdfBackend};

pub mod backend;
pub mod cmap;
pub mod layout;

pub use layout::extract_page_fragments;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Document is encrypted")]
    Encrypted,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// A decoded PDF: every page's size and all text fragments in document
/// order.
#[derive(Debug, Clone, Default)]
pub struct DecodedDocument {
    /// Size of each page, indexed by 0-based page number.
    pub page_sizes: Vec<PageSize>,
    /// Fragments of all pages, pages ascending, stream order within a page.
    pub fragments: Vec<Fragment>,
}

impl DecodedDocument {
    /// Decode PDF bytes.
    ///
    /// Fails only when the document itself cannot be opened.  A page whose
    /// content cannot be decoded is logged and contributes no fragments.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PdfError> {
        let backend = LopdfBackend::load_bytes(bytes)?;
        Ok(Self::decode(&backend))
    }

    /// Read and decode a file.
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, PdfError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Decode every page the backend reports.
    pub fn decode(backend: &dyn PdfBackend) -> Self {
        let mut doc = DecodedDocument::default();

        for (page_index, (&page_num, &page_id)) in backend.pages().iter().enumerate() {
            let size = backend.page_size(page_id).unwrap_or_else(|e| {
                log::warn!("page {}: {}; assuming US Letter", page_num, e);
                PageSize::LETTER
            });
            doc.page_sizes.push(size);

            match extract_page_fragments(backend, page_id, page_index, size) {
                Ok(fragments) => doc.fragments.extend(fragments),
                Err(e) => log::warn!("page {}: skipped: {}", page_num, e),
            }
        }

        log::debug!(
            "decoded {} pages, {} fragments",
            doc.page_count(),
            doc.fragments.len()
        );
        doc
    }

    pub fn page_count(&self) -> usize {
        self.page_sizes.len()
    }

    /// Size used for position scoring: the first page, or US Letter for a
    /// document without pages.
    pub fn primary_page_size(&self) -> PageSize {
        self.page_sizes.first().copied().unwrap_or(PageSize::LETTER)
    }
}

#[cfg(test)]
mod tests {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    use super::*;

    /// Build a PDF with one page per entry; each page shows its lines with
    /// `(font key, size, x, y, text)`.
    fn build_pdf(pages: &[Vec<(&str, i64, i64, i64, &str)>]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let bold = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular,
                "F2" => bold,
            },
        });

        let mut kids: Vec<Object> = Vec::new();
        for lines in pages {
            let mut operations = Vec::new();
            for &(font, size, x, y, text) in lines {
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new("Tf", vec![font.into(), size.into()]));
                operations.push(Operation::new("Td", vec![x.into(), y.into()]));
                operations.push(Operation::new("Tj", vec![Object::string_literal(text)]));
                operations.push(Operation::new("ET", vec![]));
            }
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().expect("encode content"),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("save pdf");
        bytes
    }

    #[test]
    fn test_decodes_fragments_in_page_order() {
        let bytes = build_pdf(&[
            vec![
                ("F2", 20, 200, 780, "Annual Report"),
                ("F1", 10, 72, 700, "Body text on the first page"),
            ],
            vec![("F2", 14, 72, 780, "Background")],
        ]);
        let doc = DecodedDocument::from_bytes(&bytes).unwrap();

        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.primary_page_size(), PageSize::new(595.0, 842.0));

        let texts: Vec<_> = doc.fragments.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(
            texts,
            ["Annual Report", "Body text on the first page", "Background"]
        );
        let pages: Vec<_> = doc.fragments.iter().map(|f| f.page_number).collect();
        assert_eq!(pages, [0, 0, 1]);

        let title = &doc.fragments[0];
        assert!(title.bold);
        assert_eq!(title.font_size, 20.0);
        // 842 - 780 - 20
        assert_eq!(title.y, 42.0);
        assert!(!doc.fragments[1].bold);
    }

    #[test]
    fn test_decoded_fragments_feed_the_extractor() {
        let bytes = build_pdf(&[vec![
            ("F2", 24, 220, 790, "Introduction"),
            ("F1", 10, 72, 600, "the quick brown fox jumps over the lazy dog again"),
        ]]);
        let doc = DecodedDocument::from_bytes(&bytes).unwrap();
        let outline = outline_core::extract_outline(&doc.fragments, doc.primary_page_size());
        assert_eq!(outline.title, "Introduction");
        assert_eq!(outline.outline.len(), 1);
    }

    /// One page showing `<00030004>` in a Type0 Identity-H font whose
    /// `/ToUnicode` maps 3 to "H" and 4 to "i".
    fn build_identity_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let cmap = b"/CIDInit /ProcSet findresource begin\n\
            begincmap\n\
            1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n\
            2 beginbfchar\n<0003> <0048>\n<0004> <0069>\nendbfchar\n\
            endcmap\n";
        let cmap_id = doc.add_object(Stream::new(dictionary! {}, cmap.to_vec()));
        let font = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "ABCDEF+Calibri-Bold",
            "Encoding" => "Identity-H",
            "ToUnicode" => cmap_id,
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font },
        });

        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 18.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new(
                    "Tj",
                    vec![Object::String(
                        vec![0x00, 0x03, 0x00, 0x04],
                        lopdf::StringFormat::Hexadecimal,
                    )],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("save pdf");
        bytes
    }

    #[test]
    fn test_identity_font_text_goes_through_to_unicode() {
        let doc = DecodedDocument::from_bytes(&build_identity_pdf()).unwrap();
        let texts: Vec<_> = doc.fragments.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(texts, ["Hi"]);
        assert!(doc.fragments[0].bold);
    }

    #[test]
    fn test_empty_document_defaults_to_letter() {
        let doc = DecodedDocument::default();
        assert_eq!(doc.primary_page_size(), PageSize::LETTER);
    }

    #[test]
    fn test_invalid_bytes_fail_to_parse() {
        assert!(matches!(
            DecodedDocument::from_bytes(b"%PDF-1.4 garbage"),
            Err(PdfError::Parse(_))
        ));
    }

    #[test]
    fn test_open_missing_file_is_io_error() {
        assert!(matches!(
            DecodedDocument::open("/nonexistent/file.pdf"),
            Err(PdfError::Io(_))
        ));
    }
}

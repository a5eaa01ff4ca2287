//! PDF text extraction

use sha2::{Digest, Sha256};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::{PageText, ParsedPdf, UploadedFile};

/// How long whole-document extraction may run before it is abandoned
const PDF_EXTRACT_TIMEOUT: Duration = Duration::from_secs(60);

/// Result of the lopdf pass; a page count of 0 means the document did not load
#[derive(Debug, Default)]
struct PageExtraction {
    page_count: u32,
    pages: Vec<PageText>,
    failed_pages: Vec<u32>,
}

/// PDF parser: lopdf page by page, pdf-extract as fallback
pub struct PdfParser;

impl PdfParser {
    /// Extract the text of every page, concatenated in page order
    pub fn extract_text(file: &UploadedFile) -> Result<ParsedPdf> {
        let filename = file.filename.as_str();

        if file.extension() != "pdf" {
            return Err(Error::UnsupportedFileType(format!(
                "{} - only PDF documents can be processed",
                filename
            )));
        }
        if !file.data.starts_with(b"%PDF-") {
            return Err(Error::file_parse(filename, "Missing %PDF- header"));
        }

        let content_hash = hex::encode(Sha256::digest(&file.data));

        let lopdf = match Self::extract_pages(&file.data) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("lopdf could not read {}: {}, trying fallback", filename, e);
                PageExtraction::default()
            }
        };

        let (text, pages, failed_pages) =
            Self::reconcile(filename, lopdf.pages, lopdf.failed_pages, || {
                Self::extract_with_timeout(filename, &file.data)
            })?;
        let page_count = lopdf.page_count;
        let text = text.replace('\0', "");

        tracing::info!(
            "Extracted {} characters from {} ({} pages)",
            text.len(),
            filename,
            page_count
        );

        Ok(ParsedPdf {
            filename: filename.to_string(),
            content_hash,
            page_count,
            pages,
            failed_pages,
            text,
        })
    }

    /// Decide between per-page text and whole-document fallback text.
    ///
    /// The fallback runs when any page failed or nothing was extracted. If it
    /// also fails, pages that did extract are kept and the failures reported.
    fn reconcile(
        filename: &str,
        pages: Vec<PageText>,
        failed_pages: Vec<u32>,
        fallback: impl FnOnce() -> Result<String>,
    ) -> Result<(String, Vec<PageText>, Vec<u32>)> {
        let text: String = pages.iter().map(|p| p.content.as_str()).collect();
        let blank = text.trim().is_empty();

        if failed_pages.is_empty() && !blank {
            return Ok((text, pages, failed_pages));
        }

        tracing::debug!("Using pdf-extract for {}", filename);
        match fallback() {
            Ok(whole) if !whole.trim().is_empty() => Ok((whole, Vec::new(), Vec::new())),
            Ok(_) if blank => Ok((String::new(), Vec::new(), failed_pages)),
            Err(e) if blank => Err(e),
            result => {
                if let Err(e) = result {
                    tracing::warn!("pdf-extract failed for {}: {}", filename, e);
                }
                tracing::warn!(
                    "{}: keeping {} extracted pages, pages {:?} have no text",
                    filename,
                    pages.len(),
                    failed_pages
                );
                Ok((text, pages, failed_pages))
            }
        }
    }

    /// Page-by-page extraction with lopdf
    fn extract_pages(data: &[u8]) -> std::result::Result<PageExtraction, lopdf::Error> {
        let doc = lopdf::Document::load_mem(data)?;
        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();

        let mut extraction = PageExtraction {
            page_count: page_numbers.len() as u32,
            ..Default::default()
        };
        for page_number in page_numbers {
            match doc.extract_text(&[page_number]) {
                Ok(content) => extraction.pages.push(PageText {
                    page_number,
                    content,
                }),
                Err(e) => {
                    tracing::warn!("Could not extract text from page {}: {}", page_number, e);
                    extraction.failed_pages.push(page_number);
                }
            }
        }

        Ok(extraction)
    }

    /// Whole-document extraction on a worker thread so a pathological font cannot hang us
    fn extract_with_timeout(filename: &str, data: &[u8]) -> Result<String> {
        let data_vec = data.to_vec();
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let result = pdf_extract::extract_text_from_mem(&data_vec);
            let _ = tx.send(result);
        });

        match rx.recv_timeout(PDF_EXTRACT_TIMEOUT) {
            Ok(Ok(text)) => {
                let _ = handle.join();
                Ok(text)
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(Error::file_parse(filename, e.to_string()))
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::error!("PDF extraction timeout after {:?} for {}", PDF_EXTRACT_TIMEOUT, filename);
                Err(Error::file_parse(filename, "Text extraction timed out"))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                tracing::error!("PDF extraction thread crashed for {}", filename);
                Err(Error::file_parse(filename, "Text extraction crashed"))
            }
        }
    }
}

/// Extract and concatenate the text of every uploaded file, in upload order
pub fn get_pdf_text(files: &[UploadedFile]) -> Result<(String, Vec<ParsedPdf>)> {
    let mut text = String::new();
    let mut parsed = Vec::with_capacity(files.len());

    for file in files {
        let doc = PdfParser::extract_text(file)?;
        text.push_str(&doc.text);
        parsed.push(doc);
    }

    Ok((text, parsed))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    /// Build a minimal PDF with one Courier text line per page
    pub(crate) fn make_pdf(page_texts: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in page_texts {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
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
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn test_rejects_non_pdf_extension() {
        let file = UploadedFile::new("notes.txt", b"hello".to_vec());
        assert!(matches!(
            PdfParser::extract_text(&file),
            Err(Error::UnsupportedFileType(_))
        ));
    }

    #[test]
    fn test_rejects_missing_header() {
        let file = UploadedFile::new("fake.pdf", b"<html></html>".to_vec());
        assert!(matches!(
            PdfParser::extract_text(&file),
            Err(Error::FileParse { .. })
        ));
    }

    #[test]
    fn test_pages_concatenated_in_order() {
        let data = make_pdf(&["Alpha page", "Bravo page"]);
        let parsed = PdfParser::extract_text(&UploadedFile::new("two.pdf", data)).unwrap();

        assert_eq!(parsed.page_count, 2);
        let alpha = parsed.text.find("Alpha").unwrap();
        let bravo = parsed.text.find("Bravo").unwrap();
        assert!(alpha < bravo);
        assert_eq!(parsed.content_hash.len(), 64);
    }

    #[test]
    fn test_get_pdf_text_keeps_upload_order() {
        let files = vec![
            UploadedFile::new("b.pdf", make_pdf(&["Second file"])),
            UploadedFile::new("a.pdf", make_pdf(&["First file"])),
        ];
        let (text, parsed) = get_pdf_text(&files).unwrap();

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].filename, "b.pdf");
        assert!(text.find("Second").unwrap() < text.find("First").unwrap());
    }

    fn page(n: u32, text: &str) -> PageText {
        PageText { page_number: n, content: text.to_string() }
    }

    #[test]
    fn test_failed_page_triggers_fallback() {
        let (text, pages, failed) = PdfParser::reconcile(
            "partial.pdf",
            vec![page(1, "first"), page(3, "third")],
            vec![2],
            || Ok("first second third".to_string()),
        )
        .unwrap();

        assert_eq!(text, "first second third");
        assert!(pages.is_empty());
        assert!(failed.is_empty());
    }

    #[test]
    fn test_failed_page_reported_when_fallback_fails() {
        let (text, pages, failed) = PdfParser::reconcile(
            "partial.pdf",
            vec![page(1, "first"), page(3, "third")],
            vec![2],
            || Err(Error::file_parse("partial.pdf", "bad font")),
        )
        .unwrap();

        assert_eq!(text, "firstthird");
        assert_eq!(pages.len(), 2);
        assert_eq!(failed, vec![2]);
    }

    #[test]
    fn test_clean_pages_skip_fallback() {
        let (text, _, failed) = PdfParser::reconcile(
            "clean.pdf",
            vec![page(1, "only")],
            Vec::new(),
            || panic!("fallback must not run"),
        )
        .unwrap();
        assert_eq!(text, "only");
        assert!(failed.is_empty());
    }

    #[test]
    fn test_blank_document_propagates_fallback_error() {
        let result = PdfParser::reconcile("blank.pdf", Vec::new(), Vec::new(), || {
            Err(Error::file_parse("blank.pdf", "no text"))
        });
        assert!(matches!(result, Err(Error::FileParse { .. })));
    }

    #[test]
    fn test_unloadable_document_reports_zero_pages() {
        let file = UploadedFile::new("broken.pdf", b"%PDF-1.5\nnot really a pdf".to_vec());
        match PdfParser::extract_text(&file) {
            Ok(parsed) => assert_eq!(parsed.page_count, 0),
            Err(e) => assert!(matches!(e, Error::FileParse { .. })),
        }
    }

    #[test]
    fn test_one_bad_file_fails_batch() {
        let files = vec![
            UploadedFile::new("good.pdf", make_pdf(&["ok"])),
            UploadedFile::new("bad.pdf", b"garbage".to_vec()),
        ];
        assert!(get_pdf_text(&files).is_err());
    }
}

//! Uploaded and parsed document types

use serde::{Deserialize, Serialize};

/// A file received from the upload widget
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Filename as sent by the browser
    pub filename: String,
    /// Raw file bytes
    pub data: Vec<u8>,
}

impl UploadedFile {
    /// Create a new uploaded file
    pub fn new(filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }

    /// Lowercased extension, empty when there is none
    pub fn extension(&self) -> String {
        match self.filename.rsplit_once('.') {
            Some((_, ext)) => ext.to_lowercase(),
            None => String::new(),
        }
    }
}

/// Text of a single PDF page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageText {
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Extracted text
    pub content: String,
}

/// A PDF after text extraction
#[derive(Debug, Clone)]
pub struct ParsedPdf {
    /// Original filename
    pub filename: String,
    /// SHA-256 of the raw bytes, hex encoded
    pub content_hash: String,
    /// Number of pages in the document
    pub page_count: u32,
    /// Per-page text, empty when only whole-document extraction succeeded
    pub pages: Vec<PageText>,
    /// Pages whose text could not be recovered by either extractor
    pub failed_pages: Vec<u32>,
    /// All page text concatenated in page order
    pub text: String,
}

/// Summary of one processed document, returned to the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// Original filename
    pub filename: String,
    /// Number of pages
    pub pages: u32,
    /// Characters of extracted text
    pub characters: usize,
    /// SHA-256 of the upload
    pub content_hash: String,
    /// Pages left out of the index because no text could be extracted
    #[serde(default)]
    pub failed_pages: Vec<u32>,
}

impl From<&ParsedPdf> for DocumentSummary {
    fn from(parsed: &ParsedPdf) -> Self {
        Self {
            filename: parsed.filename.clone(),
            pages: parsed.page_count,
            characters: parsed.text.chars().count(),
            content_hash: parsed.content_hash.clone(),
            failed_pages: parsed.failed_pages.clone(),
        }
    }
}

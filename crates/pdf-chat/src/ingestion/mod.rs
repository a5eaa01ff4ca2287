//! Document ingestion: PDF text extraction and chunking

mod parser;
mod splitter;

pub use parser::{get_pdf_text, PdfParser};
pub use splitter::{get_text_chunks, CharacterTextSplitter};

#[cfg(test)]
pub(crate) use parser::tests::make_pdf;

//! Document processing and question handling
//!
//! Process: extract text → split → embed + index → bind a conversation.
//! Ask: run one turn through the conversation and render the history.

use std::sync::Arc;
use std::time::Instant;

use crate::chain::ConversationChain;
use crate::config::ChatConfig;
use crate::error::{Error, Result};
use crate::ingestion::{get_pdf_text, get_text_chunks, CharacterTextSplitter};
use crate::providers::{ChatModel, EmbeddingProvider};
use crate::retrieval::VectorIndex;
use crate::types::{render_history, DocumentSummary, RenderedMessage, UploadedFile};

/// Result of processing a batch of uploads
pub struct ProcessedDocuments {
    /// Fresh conversation bound to the new index
    pub chain: ConversationChain,
    /// Per-document extraction summary
    pub documents: Vec<DocumentSummary>,
    /// Total pages across all documents
    pub pages: u32,
    /// Number of indexed chunks
    pub chunks: usize,
}

/// Wires the ingestion, retrieval and chat pieces together
pub struct Pipeline {
    splitter: CharacterTextSplitter,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn ChatModel>,
    top_k: usize,
}

impl Pipeline {
    /// Create a new pipeline
    pub fn new(
        config: &ChatConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn ChatModel>,
    ) -> Result<Self> {
        Ok(Self {
            splitter: CharacterTextSplitter::from_config(&config.chunking)?,
            embedder,
            llm,
            top_k: config.retrieval.top_k,
        })
    }

    /// Build a new index and conversation from uploaded PDFs
    pub async fn process(&self, files: Vec<UploadedFile>) -> Result<ProcessedDocuments> {
        if files.is_empty() {
            return Err(Error::NoDocuments("no files were uploaded".to_string()));
        }

        let start = Instant::now();
        let splitter = self.splitter.clone();

        let (parsed, chunks) = tokio::task::spawn_blocking(move || {
            let (raw_text, parsed) = get_pdf_text(&files)?;
            let chunks = get_text_chunks(&splitter, &raw_text);
            Ok::<_, Error>((parsed, chunks))
        })
        .await
        .map_err(|e| Error::Internal(format!("Task join error: {}", e)))??;

        let documents: Vec<DocumentSummary> = parsed.iter().map(DocumentSummary::from).collect();
        let pages: u32 = parsed.iter().map(|p| p.page_count).sum();
        let chunk_count = chunks.len();

        let index = VectorIndex::from_texts(chunks, self.embedder.as_ref()).await?;
        let chain = self.get_conversation_chain(Arc::new(index));

        tracing::info!(
            "Processed {} documents ({} pages, {} chunks) in {}ms",
            documents.len(),
            pages,
            chunk_count,
            start.elapsed().as_millis()
        );

        Ok(ProcessedDocuments {
            chain,
            documents,
            pages,
            chunks: chunk_count,
        })
    }

    /// Bind a fresh conversation with empty memory to an index
    pub fn get_conversation_chain(&self, index: Arc<VectorIndex>) -> ConversationChain {
        ConversationChain::new(
            index,
            Arc::clone(&self.embedder),
            Arc::clone(&self.llm),
            self.top_k,
        )
    }
}

/// Run one question through the conversation and render the whole history
pub async fn handle_user_input(
    chain: &mut ConversationChain,
    question: &str,
) -> Result<(String, Vec<RenderedMessage>)> {
    let output = chain.ask(question).await?;
    Ok((output.answer, render_history(&output.chat_history)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::make_pdf;
    use crate::testing::{KeywordEmbedder, ScriptedChat};
    use crate::types::Role;

    fn pipeline(llm: ScriptedChat) -> Pipeline {
        let embedder = Arc::new(KeywordEmbedder::new(&["refund", "shipping"]));
        Pipeline::new(&ChatConfig::default(), embedder, Arc::new(llm)).unwrap()
    }

    #[tokio::test]
    async fn test_process_then_ask() {
        let pipeline = pipeline(ScriptedChat::new().reply("Within 14 days."));
        let files = vec![
            UploadedFile::new("policy.pdf", make_pdf(&["Refund requests within 14 days"])),
            UploadedFile::new("faq.pdf", make_pdf(&["Shipping takes 3 days", "Tracking by email"])),
        ];

        let mut processed = pipeline.process(files).await.unwrap();
        assert_eq!(processed.documents.len(), 2);
        assert_eq!(processed.pages, 3);
        assert!(processed.chunks >= 1);

        let (answer, history) = handle_user_input(&mut processed.chain, "refund window?")
            .await
            .unwrap();
        assert_eq!(answer, "Within 14 days.");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_process_without_files() {
        let pipeline = pipeline(ScriptedChat::new());
        assert!(matches!(
            pipeline.process(Vec::new()).await,
            Err(Error::NoDocuments(_))
        ));
    }

    #[tokio::test]
    async fn test_process_rejects_non_pdf() {
        let pipeline = pipeline(ScriptedChat::new());
        let files = vec![UploadedFile::new("notes.txt", b"plain text".to_vec())];
        assert!(matches!(
            pipeline.process(files).await,
            Err(Error::UnsupportedFileType(_))
        ));
    }

    #[tokio::test]
    async fn test_reprocess_starts_fresh_conversation() {
        let pipeline = pipeline(ScriptedChat::new().reply("first"));
        let mut first = pipeline
            .process(vec![UploadedFile::new("a.pdf", make_pdf(&["Refund policy"]))])
            .await
            .unwrap();
        first.chain.ask("refund?").await.unwrap();
        assert_eq!(first.chain.history().len(), 2);

        let second = pipeline
            .process(vec![UploadedFile::new("b.pdf", make_pdf(&["Shipping policy"]))])
            .await
            .unwrap();
        assert!(second.chain.history().is_empty());
        assert!(!Arc::ptr_eq(first.chain.index(), second.chain.index()));
    }
}

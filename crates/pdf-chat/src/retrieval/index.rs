//! In-memory similarity index over chunk embeddings

use hnsw_rs::hnsw::{Hnsw, Neighbour};
use hnsw_rs::prelude::*;

use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;

/// HNSW connections per node
const MAX_NB_CONNECTION: usize = 16;
/// HNSW layer cap
const MAX_LAYER: usize = 16;
/// HNSW candidate list size during construction
const EF_CONSTRUCTION: usize = 200;

/// A retrieved chunk with its distance to the query
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// Position of the chunk in the indexed list
    pub chunk_index: usize,
    /// Chunk text
    pub content: String,
    /// L2 distance to the query (lower is closer)
    pub distance: f32,
}

/// Vector index mapping chunk embeddings to chunk text
pub struct VectorIndex {
    hnsw: Hnsw<'static, f32, DistL2>,
    chunks: Vec<String>,
    dimensions: usize,
}

impl VectorIndex {
    /// Embed every chunk and build the index
    pub async fn from_texts(chunks: Vec<String>, embedder: &dyn EmbeddingProvider) -> Result<Self> {
        if chunks.is_empty() {
            return Err(Error::NoDocuments(
                "no text could be extracted from the uploaded documents".to_string(),
            ));
        }

        tracing::info!("Embedding {} chunks with {}", chunks.len(), embedder.name());
        let embeddings = embedder.embed_documents(&chunks).await?;

        tokio::task::spawn_blocking(move || Self::build(chunks, embeddings))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
    }

    /// Build the index from precomputed embeddings
    pub fn build(chunks: Vec<String>, embeddings: Vec<Vec<f32>>) -> Result<Self> {
        if chunks.is_empty() {
            return Err(Error::NoDocuments("nothing to index".to_string()));
        }
        if chunks.len() != embeddings.len() {
            return Err(Error::vector_index(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        let dimensions = embeddings[0].len();
        if dimensions == 0 {
            return Err(Error::vector_index("Embeddings have zero dimensions"));
        }

        for (i, vector) in embeddings.iter().enumerate() {
            if vector.len() != dimensions {
                return Err(Error::vector_index(format!(
                    "Embedding {} has wrong dimensions: expected {}, got {}",
                    i,
                    dimensions,
                    vector.len()
                )));
            }
            if vector.iter().any(|v| !v.is_finite()) {
                return Err(Error::vector_index(format!(
                    "Embedding {} contains NaN or Infinity values",
                    i
                )));
            }
        }

        let mut hnsw: Hnsw<'static, f32, DistL2> = Hnsw::new(
            MAX_NB_CONNECTION,
            chunks.len(),
            MAX_LAYER,
            EF_CONSTRUCTION,
            DistL2 {},
        );

        for (id, vector) in embeddings.iter().enumerate() {
            hnsw.insert((vector.as_slice(), id));
        }
        hnsw.set_searching_mode(true);

        tracing::info!("Built vector index: {} chunks, {} dimensions", chunks.len(), dimensions);

        Ok(Self {
            hnsw,
            chunks,
            dimensions,
        })
    }

    /// Nearest chunks to a query vector, closest first
    pub fn search_by_vector(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if query.len() != self.dimensions {
            return Err(Error::vector_index(format!(
                "Query has wrong dimensions: expected {}, got {}",
                self.dimensions,
                query.len()
            )));
        }
        if query.iter().any(|v| !v.is_finite()) {
            return Err(Error::vector_index("Query contains NaN or Infinity values"));
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let ef_search = (k * 2).max(50);
        let neighbours: Vec<Neighbour> = self.hnsw.search(query, k, ef_search);

        let mut results: Vec<ScoredChunk> = neighbours
            .into_iter()
            .filter_map(|n| {
                self.chunks.get(n.d_id).map(|content| ScoredChunk {
                    chunk_index: n.d_id,
                    content: content.clone(),
                    distance: n.distance,
                })
            })
            .collect();

        results.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(k);

        Ok(results)
    }

    /// Embed the query text and return the nearest chunks
    pub async fn similarity_search(
        &self,
        query: &str,
        k: usize,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<Vec<ScoredChunk>> {
        let vector = embedder.embed_query(query).await?;
        self.search_by_vector(&vector, k)
    }

    /// Number of indexed chunks
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

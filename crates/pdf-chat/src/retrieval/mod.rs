//! Similarity search over embedded chunks

mod index;

pub use index::{ScoredChunk, VectorIndex};

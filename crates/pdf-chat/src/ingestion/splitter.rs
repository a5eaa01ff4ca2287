//! Separator-based text splitting into overlapping windows

use std::collections::VecDeque;

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};

/// Splits text on a separator, then greedily merges the pieces into windows
/// of at most `chunk_size` characters, carrying up to `chunk_overlap`
/// characters of trailing pieces into the next window.
///
/// Lengths are counted in `char`s. A single piece longer than `chunk_size`
/// is emitted as its own chunk rather than cut.
#[derive(Debug, Clone)]
pub struct CharacterTextSplitter {
    separator: String,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl CharacterTextSplitter {
    /// Create a new splitter
    pub fn new(separator: impl Into<String>, chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_overlap > chunk_size {
            return Err(Error::Config(format!(
                "Chunk overlap ({}) is larger than chunk size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            separator: separator.into(),
            chunk_size,
            chunk_overlap,
        })
    }

    /// Create from config
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.separator.clone(), config.chunk_size, config.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split text into chunks
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let pieces: Vec<&str> = text
            .split(self.separator.as_str())
            .filter(|piece| !piece.is_empty())
            .collect();

        self.merge_pieces(&pieces)
    }

    fn merge_pieces(&self, pieces: &[&str]) -> Vec<String> {
        let separator_len = char_len(&self.separator);
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);
            let joiner = if window.is_empty() { 0 } else { separator_len };

            if total + len + joiner > self.chunk_size {
                if total > self.chunk_size {
                    tracing::warn!(
                        "Created a chunk of size {}, which is longer than the specified {}",
                        total,
                        self.chunk_size
                    );
                }

                if !window.is_empty() {
                    if let Some(chunk) = self.join_window(&window) {
                        chunks.push(chunk);
                    }

                    // Shrink from the front until the window fits the overlap
                    // budget and leaves room for the next piece
                    loop {
                        let joiner = if window.is_empty() { 0 } else { separator_len };
                        let must_shrink = total > self.chunk_overlap
                            || (total + len + joiner > self.chunk_size && total > 0);
                        if !must_shrink {
                            break;
                        }
                        let extra = if window.len() > 1 { separator_len } else { 0 };
                        match window.pop_front() {
                            Some(first) => total = total.saturating_sub(char_len(first) + extra),
                            None => break,
                        }
                    }
                }
            }

            window.push_back(piece);
            total += len + if window.len() > 1 { separator_len } else { 0 };
        }

        if let Some(chunk) = self.join_window(&window) {
            chunks.push(chunk);
        }

        chunks
    }

    fn join_window(&self, window: &VecDeque<&str>) -> Option<String> {
        let joined = window
            .iter()
            .copied()
            .collect::<Vec<_>>()
            .join(&self.separator);
        let trimmed = joined.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

impl Default for CharacterTextSplitter {
    fn default() -> Self {
        Self {
            separator: "\n".to_string(),
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split concatenated document text into chunks
pub fn get_text_chunks(splitter: &CharacterTextSplitter, text: &str) -> Vec<String> {
    let chunks = splitter.split_text(text);
    tracing::debug!(
        "Split {} characters into {} chunks (size {}, overlap {})",
        text.len(),
        chunks.len(),
        splitter.chunk_size(),
        splitter.chunk_overlap()
    );
    chunks
}

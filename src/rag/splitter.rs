//! Recursive character text splitter.
//!
//! Splits on the coarsest separator present, recurses into pieces that are
//! still too long, then greedily merges neighbours back up to `chunk_size`
//! characters while carrying an overlapping tail into the next chunk.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::core::config::RagConfig;

pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitterConfig {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks
    pub chunk_overlap: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 150,
        }
    }
}

impl From<&RagConfig> for SplitterConfig {
    fn from(config: &RagConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        }
    }
}

/// A text chunk with source information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
    /// The text content
    pub text: String,
    /// Source file name
    pub source: String,
    /// Character offset in the source document
    pub start_offset: usize,
    /// Chunk index within the source
    pub chunk_index: usize,
}

pub struct RecursiveSplitter {
    config: SplitterConfig,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

impl RecursiveSplitter {
    pub fn new(config: SplitterConfig) -> Self {
        let chunk_size = config.chunk_size.max(1);
        Self {
            config: SplitterConfig {
                chunk_size,
                chunk_overlap: config.chunk_overlap.min(chunk_size - 1),
            },
        }
    }

    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }

    /// Split one document into chunks tagged with `source`.
    pub fn split_document(&self, text: &str, source: &str) -> Vec<TextChunk> {
        let pieces = self.split_text(text, &DEFAULT_SEPARATORS);

        let mut chunks = Vec::with_capacity(pieces.len());
        let mut search_from = 0usize;
        for (chunk_index, piece) in pieces.into_iter().enumerate() {
            let byte_offset = text[search_from..]
                .find(&piece)
                .map(|pos| search_from + pos)
                .or_else(|| text.find(&piece))
                .unwrap_or(0);
            let start_offset = char_len(&text[..byte_offset]);

            // Next chunk starts after this one's non-overlapping head.
            search_from = next_search_start(text, byte_offset, &piece, self.config.chunk_overlap);

            chunks.push(TextChunk {
                text: piece,
                source: source.to_string(),
                start_offset,
                chunk_index,
            });
        }

        chunks
    }

    fn split_text(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let mut separator = "";
        let mut remaining: &[&str] = &[];
        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() || text.contains(sep) {
                separator = sep;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let splits: Vec<String> = if separator.is_empty() {
            text.chars().map(String::from).collect()
        } else {
            text.split(separator)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        };

        let mut final_chunks = Vec::new();
        let mut good_splits: Vec<String> = Vec::new();

        for split in splits {
            if char_len(&split) < self.config.chunk_size {
                good_splits.push(split);
                continue;
            }

            if !good_splits.is_empty() {
                final_chunks.extend(self.merge_splits(&good_splits, separator));
                good_splits.clear();
            }

            if remaining.is_empty() {
                let trimmed = split.trim();
                if !trimmed.is_empty() {
                    final_chunks.push(trimmed.to_string());
                }
            } else {
                final_chunks.extend(self.split_text(&split, remaining));
            }
        }

        if !good_splits.is_empty() {
            final_chunks.extend(self.merge_splits(&good_splits, separator));
        }

        final_chunks
    }

    fn merge_splits(&self, splits: &[String], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let chunk_size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;

        let mut docs = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for split in splits {
            let len = char_len(split);
            let joiner = if current.is_empty() { 0 } else { sep_len };

            if total + len + joiner > chunk_size {
                if !current.is_empty() {
                    push_joined(&mut docs, &current, separator);

                    while total > overlap
                        || (total > 0
                            && total + len + if current.is_empty() { 0 } else { sep_len }
                                > chunk_size)
                    {
                        let Some(first) = current.pop_front() else {
                            break;
                        };
                        total -= char_len(first) + if current.is_empty() { 0 } else { sep_len };
                    }
                }
            }

            total += len + if current.is_empty() { 0 } else { sep_len };
            current.push_back(split);
        }

        push_joined(&mut docs, &current, separator);
        docs
    }
}

fn push_joined(docs: &mut Vec<String>, parts: &VecDeque<&str>, separator: &str) {
    let joined = parts.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        docs.push(trimmed.to_string());
    }
}

fn next_search_start(text: &str, byte_offset: usize, piece: &str, overlap: usize) -> usize {
    let advance_chars = char_len(piece).saturating_sub(overlap);
    let advance_bytes: usize = piece
        .chars()
        .take(advance_chars)
        .map(char::len_utf8)
        .sum();
    let mut next = (byte_offset + advance_bytes).min(text.len());
    while !text.is_char_boundary(next) {
        next -= 1;
    }
    next
}

//! Partitioning of documents into word-balanced chunks.

use std::num::NonZeroUsize;

/// Split `text` into at most `chunks` chunks of whitespace-delimited tokens.
///
/// Each chunk holds `floor(tokens / chunks)` tokens (at least one), except the last requested
/// chunk which also takes the remainder. Partitioning stops early once the tokens run out, so
/// fewer chunks than requested are returned for short documents and none for an empty one.
/// Tokens within a chunk are joined by single spaces.
pub fn partition(text: &str, chunks: NonZeroUsize) -> Vec<String> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let chunks = chunks.get();
    let per_chunk = (tokens.len() / chunks).max(1);
    (0..chunks)
        .map_while(|ordinal| {
            let start = ordinal * per_chunk;
            if start >= tokens.len() {
                return None;
            }
            let end = if ordinal == chunks - 1 {
                tokens.len()
            } else {
                start + per_chunk
            };
            Some(tokens[start..end].join(" "))
        })
        .collect()
}

//! Object key conventions shared by the pipeline stages.
//!
//! * Documents live anywhere, e.g. `input/hamlet.txt`.
//! * Chunks: `chunks/input/hamlet-chunk-0.txt`
//! * Word counts: `mapped/input/hamlet-chunk-0.json`
//! * Final results: `results/final-wordcount-1700000000.json`

/// Leading key segment of chunk objects.
pub const PARTITION_NAMESPACE: &str = "chunks";
/// Leading key segment of per-chunk word counts.
pub const RESULTS_NAMESPACE: &str = "mapped";
/// Leading key segment of final results.
pub const FINAL_NAMESPACE: &str = "results";
/// Extension of documents and chunks.
pub const SOURCE_EXTENSION: &str = "txt";
/// Extension of word counts and final results.
pub const RESULT_EXTENSION: &str = "json";

/// Returns `key` without a trailing `.extension`, if present.
fn strip_extension<'a>(key: &'a str, extension: &str) -> &'a str {
    key.strip_suffix(extension)
        .and_then(|stem| stem.strip_suffix('.'))
        .unwrap_or(key)
}

/// Returns the key of chunk `ordinal` of the document at `source_key`.
pub fn chunk_key(source_key: &str, ordinal: usize) -> String {
    let stem = strip_extension(source_key, SOURCE_EXTENSION);
    format!("{PARTITION_NAMESPACE}/{stem}-chunk-{ordinal}.{SOURCE_EXTENSION}")
}

/// Returns the key of the word counts for the chunk at `chunk_key`.
///
/// The leading partition namespace segment is replaced by the results namespace and the trailing
/// source extension by the result extension. A key outside the partition namespace is placed
/// beneath the results namespace, and one without the source extension gains the result
/// extension, so the result never overwrites its chunk. Nothing else in the key is touched.
pub fn result_key(chunk_key: &str) -> String {
    let relative = match chunk_key.split_once('/') {
        Some((PARTITION_NAMESPACE, rest)) => rest,
        _ => chunk_key,
    };
    let stem = strip_extension(relative, SOURCE_EXTENSION);
    format!("{RESULTS_NAMESPACE}/{stem}.{RESULT_EXTENSION}")
}

/// Returns the key of a final result written at `timestamp` seconds since the Unix epoch.
pub fn final_key(timestamp: u64) -> String {
    format!("{FINAL_NAMESPACE}/final-wordcount-{timestamp}.{RESULT_EXTENSION}")
}

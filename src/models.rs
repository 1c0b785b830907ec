//! Data types and associated functions and methods

use crate::error::PipelineError;
use crate::word_counts::WordCounts;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;
use validator::{Validate, ValidationError};

/// Scheme assumed for object references that do not carry one.
pub const DEFAULT_SCHEME: &str = "s3";

/// Number of chunks a document is split into when the request does not say.
pub const DEFAULT_CHUNKS: NonZeroUsize = match NonZeroUsize::new(3) {
    Some(chunks) => chunks,
    None => panic!("default chunk count must be non-zero"),
};

/// Maximum number of entries in a ranked result.
pub const TOP_WORDS: usize = 10;

/// Reference to an object in the object store, rendered as `scheme://bucket/key`.
///
/// Parsing strips the optional `scheme://` prefix and splits the remainder once on the first
/// `/`. Both the bucket and the key must be non-empty.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectUrl {
    scheme: String,
    bucket: String,
    key: String,
}

impl ObjectUrl {
    /// Return a new ObjectUrl.
    pub fn new(scheme: &str, bucket: &str, key: &str) -> Self {
        ObjectUrl {
            scheme: scheme.to_string(),
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    }

    /// Parse an object reference.
    ///
    /// # Arguments
    ///
    /// * `url`: Object reference of the form `scheme://bucket/key` or `bucket/key`
    pub fn parse(url: &str) -> Result<Self, PipelineError> {
        let (scheme, path) = url.split_once("://").unwrap_or((DEFAULT_SCHEME, url));
        match path.split_once('/') {
            Some((bucket, key)) if !scheme.is_empty() && !bucket.is_empty() && !key.is_empty() => {
                Ok(Self::new(scheme, bucket, key))
            }
            _ => Err(PipelineError::InvalidObjectUrl {
                url: url.to_string(),
            }),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Return a reference to another object in the same bucket.
    pub fn with_key(&self, key: impl Into<String>) -> Self {
        ObjectUrl {
            scheme: self.scheme.clone(),
            bucket: self.bucket.clone(),
            key: key.into(),
        }
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", self.scheme, self.bucket, self.key)
    }
}

impl FromStr for ObjectUrl {
    type Err = PipelineError;

    fn from_str(url: &str) -> Result<Self, Self::Err> {
        Self::parse(url)
    }
}

impl TryFrom<String> for ObjectUrl {
    type Error = PipelineError;

    fn try_from(url: String) -> Result<Self, Self::Error> {
        Self::parse(&url)
    }
}

impl From<ObjectUrl> for String {
    fn from(url: ObjectUrl) -> Self {
        url.to_string()
    }
}

/// Request data for the split operation
#[derive(Debug, Deserialize, PartialEq, Validate)]
#[serde(deny_unknown_fields)]
pub struct SplitRequest {
    /// Document to partition
    pub s3_url: ObjectUrl,
    /// Requested number of chunks. Zero or absent selects [DEFAULT_CHUNKS].
    pub chunks: Option<usize>,
}

impl SplitRequest {
    /// Returns the effective number of chunks to request.
    pub fn chunks(&self) -> NonZeroUsize {
        self.chunks
            .and_then(NonZeroUsize::new)
            .unwrap_or(DEFAULT_CHUNKS)
    }
}

/// Response data for the split operation
#[derive(Debug, Deserialize, PartialEq, Serialize)]
pub struct SplitResponse {
    /// Chunk objects in ordinal order
    pub chunk_urls: Vec<ObjectUrl>,
    pub processing_time_ms: f64,
}

/// Request data for the map operation
#[derive(Debug, Deserialize, PartialEq, Validate)]
#[serde(deny_unknown_fields)]
pub struct MapRequest {
    /// Chunk to count
    pub chunk_url: ObjectUrl,
}

/// Response data for the map operation
#[derive(Debug, Deserialize, PartialEq, Serialize)]
pub struct MapResponse {
    /// Persisted word counts
    pub result_url: ObjectUrl,
    /// Number of distinct words in the chunk
    pub word_count: usize,
    pub processing_time_ms: f64,
}

/// Request data for the reduce operation
#[derive(Debug, Deserialize, PartialEq, Validate)]
#[serde(deny_unknown_fields)]
#[validate(schema(function = "validate_single_bucket"))]
pub struct ReduceRequest {
    /// Word counts to merge. All must reside in the same bucket.
    #[validate(length(min = 1, message = "result_urls must not be empty"))]
    pub result_urls: Vec<ObjectUrl>,
}

/// Validate that every result URL shares the bucket of the first
fn validate_single_bucket(request: &ReduceRequest) -> Result<(), ValidationError> {
    let mut urls = request.result_urls.iter();
    if let Some(first) = urls.next() {
        if let Some(other) = urls.find(|url| url.bucket() != first.bucket()) {
            let mut error = ValidationError::new("result_urls must all be in the same bucket");
            error.add_param("expected".into(), &first.bucket());
            error.add_param("found".into(), &other.bucket());
            return Err(error);
        }
    }
    Ok(())
}

/// A word and the number of times it occurs
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct WordCount {
    pub word: String,
    pub count: u64,
}

impl WordCount {
    /// Return a new WordCount object.
    pub fn new(word: &str, count: u64) -> Self {
        WordCount {
            word: word.to_string(),
            count,
        }
    }
}

/// Response data for the reduce operation
#[derive(Debug, Deserialize, PartialEq, Serialize)]
pub struct ReduceResponse {
    /// Persisted [FinalResult]
    pub final_url: ObjectUrl,
    /// Sum of all word counts
    pub total_words: u64,
    /// Number of distinct words
    pub unique_words: usize,
    /// Most frequent words, by descending count then ascending word
    pub top_10_words: Vec<WordCount>,
    pub processing_time_ms: f64,
}

/// The ranked result persisted by the reduce operation.
#[derive(Debug, Serialize)]
pub struct FinalResult<'a> {
    pub word_counts: &'a WordCounts,
    pub total_words: u64,
    pub unique_words: usize,
    pub top_10_words: &'a [WordCount],
}

impl<'a> FinalResult<'a> {
    /// Return a FinalResult for merged word counts and their ranking.
    ///
    /// Fails if the total number of words does not fit in a u64.
    pub fn new(
        word_counts: &'a WordCounts,
        top_10_words: &'a [WordCount],
    ) -> Result<Self, PipelineError> {
        Ok(FinalResult {
            word_counts,
            total_words: word_counts.total()?,
            unique_words: word_counts.unique(),
            top_10_words,
        })
    }
}

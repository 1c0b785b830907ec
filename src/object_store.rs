//! Object store interface used by the pipeline stages.

use crate::error::PipelineError;

use async_trait::async_trait;
use bytes::Bytes;

/// Object store trait.
///
/// Defines the interface through which the stages read their inputs and write their outputs.
/// Reads are always fresh fetches and writes are unconditional, so concurrent writers to the
/// same key race with the last write winning.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the contents of an object.
    ///
    /// # Arguments
    ///
    /// * `bucket`: Name of the bucket
    /// * `key`: Name of the object in the bucket
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, PipelineError>;

    /// Create or replace an object.
    ///
    /// # Arguments
    ///
    /// * `bucket`: Name of the bucket
    /// * `key`: Name of the object in the bucket
    /// * `body`: Object contents
    /// * `content_type`: MIME type of the contents
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), PipelineError>;
}

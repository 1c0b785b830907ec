use crate::app_state::AppState;
use crate::error::PipelineError;

use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use validator::Validate;

/// Trait for pipeline stage operations.
///
/// This forms the contract between the API layer and operations. An operation reads its input
/// from the object store, transforms it, writes its output back and summarises the result.
pub trait Operation {
    /// Request data accepted by the operation.
    type Request: DeserializeOwned + Validate + std::fmt::Debug + Send + 'static;
    /// Response data returned by the operation.
    type Response: Serialize + Send;

    /// Execute the operation.
    ///
    /// # Arguments
    ///
    /// * `state`: Shared application state
    /// * `request`: Request data, already validated
    fn execute(
        state: &AppState,
        request: Self::Request,
    ) -> impl Future<Output = Result<Self::Response, PipelineError>> + Send;
}

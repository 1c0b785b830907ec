//! Resource management

use crate::error::PipelineError;

use tokio::sync::{Semaphore, SemaphorePermit};

/// [crate::resource_manager::ResourceManager] provides a simple way to allocate various resources
/// to tasks. Resource management is performed using a Tokio Semaphore for each type of resource.
/// All requests handled by a process share the same limits.
#[derive(Debug)]
pub struct ResourceManager {
    /// Optional semaphore for object store connections.
    s3_connections: Option<Semaphore>,

    /// Optional semaphore for CPU-bound tasks.
    tasks: Option<Semaphore>,
}

impl ResourceManager {
    /// Returns a new ResourceManager object.
    pub fn new(s3_connection_limit: Option<usize>, task_limit: Option<usize>) -> Self {
        Self {
            s3_connections: s3_connection_limit.map(Semaphore::new),
            tasks: task_limit.map(Semaphore::new),
        }
    }

    /// Acquire an object store connection resource.
    pub async fn s3_connection(&self) -> Result<Option<SemaphorePermit>, PipelineError> {
        optional_acquire(&self.s3_connections).await
    }

    /// Acquire a task resource.
    pub async fn task(&self) -> Result<Option<SemaphorePermit>, PipelineError> {
        optional_acquire(&self.tasks).await
    }
}

/// Acquire a permit on an optional Semaphore, if present.
async fn optional_acquire(
    sem: &Option<Semaphore>,
) -> Result<Option<SemaphorePermit>, PipelineError> {
    if let Some(sem) = sem {
        sem.acquire()
            .await
            .map(Some)
            .map_err(|err| err.into())
    } else {
        Ok(None)
    }
}

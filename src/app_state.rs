use crate::cli::CommandLineArgs;
use crate::object_store::ObjectStore;
use crate::resource_manager::ResourceManager;
use crate::s3_client::S3Client;

use std::sync::Arc;

/// Shared application state passed to each operation request handler.
pub struct AppState {
    /// Command line arguments.
    pub args: CommandLineArgs,

    /// Resource manager.
    pub resource_manager: ResourceManager,

    /// Object store holding documents, chunks and results.
    pub store: Box<dyn ObjectStore>,
}

impl AppState {
    /// Create and return an [AppState] backed by S3.
    pub fn new(args: &CommandLineArgs) -> Self {
        Self::with_store(args, Box::new(S3Client::from_args(args)))
    }

    /// Create and return an [AppState] backed by `store`.
    pub fn with_store(args: &CommandLineArgs, store: Box<dyn ObjectStore>) -> Self {
        let task_limit = args
            .thread_limit
            .or_else(|| Some(num_cpus::get().saturating_sub(1).max(1)));
        let resource_manager = ResourceManager::new(args.connection_limit_s3, task_limit);

        Self {
            args: args.clone(),
            resource_manager,
            store,
        }
    }
}

/// AppState wrapped in an Atomic Reference Count (Arc) to allow multiple references.
pub type SharedAppState = Arc<AppState>;

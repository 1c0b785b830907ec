use crate::app_state::{AppState, SharedAppState};
use crate::cli::CommandLineArgs;
use crate::error::PipelineError;
use crate::object_store::ObjectStore;

use async_trait::async_trait;
use bytes::Bytes;
use clap::Parser;
use hashbrown::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Create a CommandLineArgs object with default values.
pub(crate) fn get_test_args() -> CommandLineArgs {
    CommandLineArgs::parse_from(["mapreduce-wordcount"])
}

/// Create a SharedAppState backed by `store` with default arguments.
pub(crate) fn get_test_state(store: &MemoryStore) -> SharedAppState {
    get_test_state_with_args(&get_test_args(), store)
}

/// Create a SharedAppState backed by `store`.
pub(crate) fn get_test_state_with_args(
    args: &CommandLineArgs,
    store: &MemoryStore,
) -> SharedAppState {
    Arc::new(AppState::with_store(args, Box::new(store.clone())))
}

/// Stored object contents and content type.
type Object = (Bytes, String);

/// In-memory object store.
///
/// Clones share the same objects, so a test may keep one clone while the application state owns
/// another.
#[derive(Clone, Debug, Default)]
pub(crate) struct MemoryStore {
    objects: Arc<Mutex<HashMap<(String, String), Object>>>,
    /// Number of puts that succeed before all further puts fail.
    put_limit: Option<usize>,
    puts: Arc<AtomicUsize>,
    /// Time each get takes to complete.
    get_delay: Option<Duration>,
    gets_in_flight: Arc<AtomicUsize>,
    max_gets_in_flight: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Fail every put after the first `limit`.
    pub(crate) fn fail_puts_after(mut self, limit: usize) -> Self {
        self.put_limit = Some(limit);
        self
    }

    /// Delay every get by `delay`, so that concurrent gets overlap.
    pub(crate) fn delay_gets(mut self, delay: Duration) -> Self {
        self.get_delay = Some(delay);
        self
    }

    /// Highest number of gets observed in flight at once.
    pub(crate) fn max_gets_in_flight(&self) -> usize {
        self.max_gets_in_flight.load(Ordering::SeqCst)
    }

    /// Insert a text object directly, bypassing any put limit.
    pub(crate) fn insert(&self, bucket: &str, key: &str, data: impl Into<Bytes>) {
        self.objects.lock().unwrap().insert(
            (bucket.to_string(), key.to_string()),
            (data.into(), mime::TEXT_PLAIN_UTF_8.to_string()),
        );
    }

    pub(crate) fn object(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.lookup(bucket, key).map(|(data, _)| data)
    }

    pub(crate) fn content_type(&self, bucket: &str, key: &str) -> Option<String> {
        self.lookup(bucket, key).map(|(_, content_type)| content_type)
    }

    /// Number of stored objects.
    pub(crate) fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    fn lookup(&self, bucket: &str, key: &str) -> Option<Object> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, PipelineError> {
        let in_flight = self.gets_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_gets_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        if let Some(delay) = self.get_delay {
            tokio::time::sleep(delay).await;
        }
        self.gets_in_flight.fetch_sub(1, Ordering::SeqCst);
        self.object(bucket, key)
            .ok_or_else(|| PipelineError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), PipelineError> {
        let puts = self.puts.fetch_add(1, Ordering::SeqCst);
        if self.put_limit.is_some_and(|limit| puts >= limit) {
            let error = std::io::Error::from(std::io::ErrorKind::ConnectionReset);
            return Err(PipelineError::S3ByteStream(error.into()));
        }
        self.objects.lock().unwrap().insert(
            (bucket.to_string(), key.to_string()),
            (body, content_type.to_string()),
        );
        Ok(())
    }
}

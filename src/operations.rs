//! Pipeline stage operations.
//!
//! Each stage is implemented as a struct that implements the
//! [Operation](crate::operation::Operation) trait.

use crate::app_state::AppState;
use crate::error::PipelineError;
use crate::keys;
use crate::metrics::{OBJECT_STORE_REQUESTS, WORDS_PROCESSED};
use crate::models::{
    FinalResult, MapRequest, MapResponse, ObjectUrl, ReduceRequest, ReduceResponse, SplitRequest,
    SplitResponse, TOP_WORDS,
};
use crate::operation::Operation;
use crate::partition::partition;
use crate::word_counts::WordCounts;

use bytes::Bytes;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::panic::{self, AssertUnwindSafe};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::Instrument;
use validator::{Validate, ValidationError};

/// Returns the milliseconds elapsed since `start`.
fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Returns the number of seconds since the Unix epoch.
fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

/// Fetch an object, holding an object store connection permit for the duration.
async fn fetch(state: &AppState, url: &ObjectUrl) -> Result<Bytes, PipelineError> {
    let _conn_permit = state.resource_manager.s3_connection().await?;
    OBJECT_STORE_REQUESTS.with_label_values(&["get"]).inc();
    state
        .store
        .get(url.bucket(), url.key())
        .instrument(tracing::Span::current())
        .await
}

/// Fetch an object and decode it as text, replacing invalid UTF-8.
async fn fetch_text(state: &AppState, url: &ObjectUrl) -> Result<String, PipelineError> {
    let data = fetch(state, url).await?;
    Ok(String::from_utf8_lossy(&data).into_owned())
}

/// Fetch an object and decode it as word counts.
async fn fetch_word_counts(state: &AppState, url: &ObjectUrl) -> Result<WordCounts, PipelineError> {
    let data = fetch(state, url).await?;
    Ok(serde_json::from_slice(&data)?)
}

/// Store an object, holding an object store connection permit for the duration.
async fn store(
    state: &AppState,
    url: &ObjectUrl,
    body: Bytes,
    content_type: &str,
) -> Result<(), PipelineError> {
    let _conn_permit = state.resource_manager.s3_connection().await?;
    OBJECT_STORE_REQUESTS.with_label_values(&["put"]).inc();
    state
        .store
        .put(url.bucket(), url.key(), body, content_type)
        .instrument(tracing::Span::current())
        .await
}

/// Run a CPU-bound function, on the Rayon thread pool if enabled.
///
/// A panic in `f` is reported as [PipelineError::TaskPanicked].
async fn cpu_bound<F, R>(state: &AppState, f: F) -> Result<R, PipelineError>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let task = move || panic::catch_unwind(AssertUnwindSafe(f));
    let result = if state.args.use_rayon {
        let _task_permit = state.resource_manager.task().await?;
        tokio_rayon::spawn(task).await
    } else {
        task()
    };
    result.map_err(|_| {
        tracing::error!("CPU-bound task panicked");
        PipelineError::TaskPanicked
    })
}

/// Split a document into word-balanced chunks.
pub struct Split {}

impl Operation for Split {
    type Request = SplitRequest;
    type Response = SplitResponse;

    #[tracing::instrument(level = "DEBUG", skip(state))]
    async fn execute(
        state: &AppState,
        request: SplitRequest,
    ) -> Result<SplitResponse, PipelineError> {
        let start = Instant::now();
        let source = &request.s3_url;
        let text = fetch_text(state, source).await?;
        let chunks = request.chunks();
        let contents = cpu_bound(state, move || partition(&text, chunks)).await?;

        // Chunks are written in order. A failed write leaves earlier chunks in place.
        let mut chunk_urls = Vec::with_capacity(contents.len());
        for (ordinal, content) in contents.into_iter().enumerate() {
            let chunk_url = source.with_key(keys::chunk_key(source.key(), ordinal));
            store(
                state,
                &chunk_url,
                content.into(),
                mime::TEXT_PLAIN_UTF_8.as_ref(),
            )
            .await?;
            chunk_urls.push(chunk_url);
        }
        tracing::debug!("split {} into {} chunks", source, chunk_urls.len());

        Ok(SplitResponse {
            chunk_urls,
            processing_time_ms: elapsed_ms(start),
        })
    }
}

/// Count the words of a chunk.
pub struct Map {}

impl Operation for Map {
    type Request = MapRequest;
    type Response = MapResponse;

    #[tracing::instrument(level = "DEBUG", skip(state))]
    async fn execute(state: &AppState, request: MapRequest) -> Result<MapResponse, PipelineError> {
        let start = Instant::now();
        let chunk_url = &request.chunk_url;
        let text = fetch_text(state, chunk_url).await?;
        let counts = cpu_bound(state, move || WordCounts::from_text(&text)).await?;

        let result_url = chunk_url.with_key(keys::result_key(chunk_url.key()));
        let body = serde_json::to_vec_pretty(&counts)?;
        store(state, &result_url, body.into(), mime::APPLICATION_JSON.as_ref()).await?;
        WORDS_PROCESSED
            .with_label_values(&["map"])
            .inc_by(counts.total()?);

        Ok(MapResponse {
            result_url,
            word_count: counts.unique(),
            processing_time_ms: elapsed_ms(start),
        })
    }
}

/// Merge per-chunk word counts and rank the most frequent words.
pub struct Reduce {}

impl Operation for Reduce {
    type Request = ReduceRequest;
    type Response = ReduceResponse;

    #[tracing::instrument(level = "DEBUG", skip(state))]
    async fn execute(
        state: &AppState,
        request: ReduceRequest,
    ) -> Result<ReduceResponse, PipelineError> {
        let start = Instant::now();
        request.validate()?;
        let first = request
            .result_urls
            .first()
            .ok_or_else(|| ValidationError::new("result_urls must not be empty"))?;

        // Merging is commutative, so inputs are merged in whatever order they arrive.
        let fetch_futures: Vec<_> = request
            .result_urls
            .iter()
            .map(|url| fetch_word_counts(state, url))
            .collect();
        let mut fetches = stream::iter(fetch_futures)
            .buffer_unordered(state.args.reduce_fetch_limit.get());
        let mut merged = WordCounts::default();
        while let Some(counts) = fetches.try_next().await? {
            merged.merge(counts)?;
        }

        let (merged, top_words) = cpu_bound(state, move || {
            let top_words = merged.top(TOP_WORDS);
            (merged, top_words)
        })
        .await?;

        let final_url = first.with_key(keys::final_key(unix_timestamp()));
        let result = FinalResult::new(&merged, &top_words)?;
        let body = serde_json::to_vec_pretty(&result)?;
        store(state, &final_url, body.into(), mime::APPLICATION_JSON.as_ref()).await?;
        WORDS_PROCESSED
            .with_label_values(&["reduce"])
            .inc_by(result.total_words);
        tracing::debug!(
            "merged {} word counts into {}",
            request.result_urls.len(),
            final_url
        );

        Ok(ReduceResponse {
            total_words: result.total_words,
            unique_words: result.unique_words,
            final_url,
            top_10_words: top_words,
            processing_time_ms: elapsed_ms(start),
        })
    }
}

//! This crate provides a word count service built as three MapReduce stages over an S3-compatible
//! object store.
//!
//! * `/split` partitions a text document into word-balanced chunks.
//! * `/map` counts the words of one chunk.
//! * `/reduce` merges per-chunk counts and ranks the most frequent words.
//!
//! Each stage reads its input from the object store and writes its output back, returning
//! references to the objects it wrote. A process may serve any subset of the stages, so stages can
//! be deployed and scaled independently.
//!
//! The service is built on top of a number of open source components.
//!
//! * [Tokio](tokio), the most popular asynchronous Rust runtime.
//! * [Axum](axum) web framework, built by the Tokio team.
//! * [Serde](serde) performs (de)serialisation of JSON request and response data.
//! * [AWS SDK for S3](aws-sdk-s3) is used to interact with S3-compatible object stores.
//! * [Rayon](rayon) optionally runs CPU-bound counting and ranking off the async runtime.

pub mod app;
pub mod app_state;
pub mod cli;
pub mod error;
pub mod keys;
pub mod metrics;
pub mod models;
pub mod object_store;
pub mod operation;
pub mod operations;
pub mod partition;
pub mod resource_manager;
pub mod s3_client;
pub mod server;
#[cfg(test)]
pub mod test_utils;
pub mod tracing;
pub mod validated_json;
pub mod word_counts;

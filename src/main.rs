//! This file defines the mapreduce-wordcount binary entry point.

use mapreduce_wordcount::app;
use mapreduce_wordcount::cli;
use mapreduce_wordcount::metrics;
use mapreduce_wordcount::server;
use mapreduce_wordcount::tracing;

/// Application entry point
#[tokio::main]
async fn main() {
    let args = cli::parse();
    tracing::init_tracing(&args);
    metrics::register_metrics();
    app::init(&args);
    let service = app::service(&args);
    server::serve(&args, service).await;
    tracing::shutdown_tracing();
}

//! Command Line Interface (CLI) arguments.

use clap::{Parser, ValueEnum};
use std::num::NonZeroUsize;
use strum_macros::Display;
use url::Url;

/// A pipeline stage that a server process may expose.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, ValueEnum)]
#[strum(serialize_all = "lowercase")]
pub enum Stage {
    /// Partition documents into chunks (`/split`)
    Split,
    /// Count the words of a chunk (`/map`)
    Map,
    /// Merge and rank word counts (`/reduce`)
    Reduce,
}

/// Word count service command line interface
#[derive(Clone, Debug, Parser)]
pub struct CommandLineArgs {
    /// The IP address on which the server should listen
    #[arg(long, default_value = "0.0.0.0", env = "WORDCOUNT_HOST")]
    pub host: String,
    /// The port to which the server should bind
    #[arg(long, default_value_t = 8080, env = "PORT")]
    pub port: u16,
    /// Flag indicating whether HTTPS should be used
    #[arg(long, default_value_t = false, env = "WORDCOUNT_HTTPS")]
    pub https: bool,
    /// Path to the certificate file to be used for HTTPS encryption
    #[arg(
        long,
        default_value = "~/.config/mapreduce-wordcount/certs/cert.pem",
        env = "WORDCOUNT_CERT_FILE"
    )]
    pub cert_file: String,
    /// Path to the key file to be used for HTTPS encryption
    #[arg(
        long,
        default_value = "~/.config/mapreduce-wordcount/certs/key.pem",
        env = "WORDCOUNT_KEY_FILE"
    )]
    pub key_file: String,
    /// Maximum time in seconds to wait for operations to complete upon receiving `ctrl+c` signal.
    #[arg(long, default_value_t = 60, env = "WORDCOUNT_SHUTDOWN_TIMEOUT")]
    pub graceful_shutdown_timeout: u64,
    /// Whether to enable sending traces to Jaeger.
    #[arg(long, default_value_t = false, env = "WORDCOUNT_ENABLE_JAEGER")]
    pub enable_jaeger: bool,
    /// Pipeline stages served by this process.
    #[arg(
        long,
        value_enum,
        value_delimiter = ',',
        default_values = ["split", "map", "reduce"],
        env = "WORDCOUNT_STAGES"
    )]
    pub stages: Vec<Stage>,
    /// URL of an S3-compatible object store. The AWS endpoint for the region is used if unset.
    #[arg(long, env = "WORDCOUNT_S3_ENDPOINT")]
    pub s3_endpoint: Option<Url>,
    /// Region of the object store
    #[arg(long, default_value = "us-east-1", env = "AWS_REGION")]
    pub s3_region: String,
    /// Access key for the object store
    #[arg(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    pub s3_access_key: Option<String>,
    /// Secret key for the object store
    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub s3_secret_key: Option<String>,
    /// Maximum number of simultaneous outbound object store requests
    #[arg(long, env = "WORDCOUNT_CONNECTION_LIMIT_S3")]
    pub connection_limit_s3: Option<usize>,
    /// Maximum number of word count objects fetched concurrently by one reduce request
    #[arg(long, default_value = "16", env = "WORDCOUNT_REDUCE_FETCH_LIMIT")]
    pub reduce_fetch_limit: NonZeroUsize,
    /// Whether to use Rayon for execution of CPU-bound tasks.
    #[arg(long, default_value_t = false, env = "WORDCOUNT_USE_RAYON")]
    pub use_rayon: bool,
    /// Maximum number of CPU-bound tasks in flight. Defaults to the number of CPUs minus one.
    #[arg(long, env = "WORDCOUNT_THREAD_LIMIT")]
    pub thread_limit: Option<usize>,
}

impl CommandLineArgs {
    /// Returns whether `stage` is served by this process.
    pub fn serves(&self, stage: Stage) -> bool {
        self.stages.contains(&stage)
    }
}

/// Returns parsed command line arguments.
pub fn parse() -> CommandLineArgs {
    CommandLineArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_from_list() {
        let args = CommandLineArgs::parse_from(["mapreduce-wordcount", "--stages", "map,reduce"]);
        assert_eq!(vec![Stage::Map, Stage::Reduce], args.stages);
        assert!(!args.serves(Stage::Split));
        assert!(args.serves(Stage::Reduce));
    }

    #[test]
    fn s3_endpoint() {
        let args = CommandLineArgs::parse_from([
            "mapreduce-wordcount",
            "--s3-endpoint",
            "http://localhost:9000",
            "--connection-limit-s3",
            "4",
        ]);
        assert_eq!(
            Some(Url::parse("http://localhost:9000").unwrap()),
            args.s3_endpoint
        );
        assert_eq!(Some(4), args.connection_limit_s3);
    }

    #[test]
    fn reduce_fetch_limit() {
        let args = CommandLineArgs::parse_from(["mapreduce-wordcount"]);
        assert_eq!(16, args.reduce_fetch_limit.get());
        let args =
            CommandLineArgs::parse_from(["mapreduce-wordcount", "--reduce-fetch-limit", "3"]);
        assert_eq!(3, args.reduce_fetch_limit.get());
        assert!(CommandLineArgs::try_parse_from([
            "mapreduce-wordcount",
            "--reduce-fetch-limit",
            "0"
        ])
        .is_err());
    }

    #[test]
    fn stage_display() {
        assert_eq!("split", Stage::Split.to_string());
        assert_eq!("reduce", Stage::Reduce.to_string());
    }
}

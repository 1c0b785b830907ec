//! A simplified S3 client that supports downloading and uploading objects.
//! It attempts to hide the complexities of working with the AWS SDK for S3.

use crate::cli::CommandLineArgs;
use crate::error::PipelineError;
use crate::object_store::ObjectStore;

use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::BehaviorVersion;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use aws_types::region::Region;
use bytes::Bytes;
use tracing::Instrument;
use url::Url;

#[derive(Clone, Eq, Hash, PartialEq)]
pub enum S3Credentials {
    AccessKey {
        access_key: String,
        secret_key: String,
    },
    None,
}

impl S3Credentials {
    /// Create an access key credential.
    pub fn access_key(access_key: &str, secret_key: &str) -> Self {
        S3Credentials::AccessKey {
            access_key: access_key.to_string(),
            secret_key: secret_key.to_string(),
        }
    }

    /// Create a credential from an optional access key and secret key pair.
    ///
    /// Returns [S3Credentials::None] unless both are provided.
    pub fn from_keys(access_key: Option<&str>, secret_key: Option<&str>) -> Self {
        match (access_key, secret_key) {
            (Some(access_key), Some(secret_key)) => Self::access_key(access_key, secret_key),
            _ => S3Credentials::None,
        }
    }
}

/// S3 client object.
#[derive(Clone, Debug)]
pub struct S3Client {
    /// Underlying AWS SDK S3 client object.
    client: Client,
}

impl S3Client {
    /// Creates an S3Client object
    ///
    /// # Arguments
    ///
    /// * `endpoint`: Optional S3-compatible object storage API URL. Path-style addressing is used
    ///   when provided.
    /// * `region`: Object storage region
    /// * `credentials`: Object storage account credentials
    pub fn new(endpoint: Option<&Url>, region: &str, credentials: S3Credentials) -> Self {
        let builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Some(Region::new(region.to_string())));
        let builder = match credentials {
            S3Credentials::AccessKey {
                access_key,
                secret_key,
            } => {
                let credentials = Credentials::from_keys(access_key, secret_key, None);
                builder.credentials_provider(credentials)
            }
            S3Credentials::None => builder,
        };
        let builder = match endpoint {
            Some(url) => builder.endpoint_url(url.to_string()).force_path_style(true),
            None => builder,
        };
        let client = Client::from_conf(builder.build());
        Self { client }
    }

    /// Creates an S3Client object from command line arguments.
    pub fn from_args(args: &CommandLineArgs) -> Self {
        let credentials =
            S3Credentials::from_keys(args.s3_access_key.as_deref(), args.s3_secret_key.as_deref());
        Self::new(args.s3_endpoint.as_ref(), &args.s3_region, credentials)
    }

    /// Downloads an object from object storage and returns the data as Bytes
    ///
    /// # Arguments
    ///
    /// * `bucket`: Name of the bucket
    /// * `key`: Name of the object in the bucket
    pub async fn download_object(&self, bucket: &str, key: &str) -> Result<Bytes, PipelineError> {
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .instrument(tracing::Span::current())
            .await
            .map_err(|err| {
                if err
                    .as_service_error()
                    .is_some_and(GetObjectError::is_no_such_key)
                {
                    PipelineError::ObjectNotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    }
                } else {
                    err.into()
                }
            })?;
        let data = response
            .body
            .collect()
            .instrument(tracing::Span::current())
            .await?;
        Ok(data.into_bytes())
    }

    /// Uploads an object to object storage
    ///
    /// # Arguments
    ///
    /// * `bucket`: Name of the bucket
    /// * `key`: Name of the object in the bucket
    /// * `body`: Object contents
    /// * `content_type`: MIME type of the contents
    pub async fn upload_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), PipelineError> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .instrument(tracing::Span::current())
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    #[tracing::instrument(level = "DEBUG", skip(self))]
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, PipelineError> {
        self.download_object(bucket, key).await
    }

    #[tracing::instrument(level = "DEBUG", skip(self, body), fields(size = body.len()))]
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), PipelineError> {
        self.upload_object(bucket, key, body, content_type).await
    }
}

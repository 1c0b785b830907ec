/// Benchmarks for S3 client implementation.
///
/// Requires an S3-compatible object store such as minio listening on localhost:9000.
use aws_credential_types::Credentials;
use aws_sdk_s3::config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_types::region::Region;
use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mapreduce_wordcount::s3_client::{S3Client, S3Credentials};
use url::Url;

async fn create_bucket(url: &Url, username: &str, password: &str, bucket: &str) {
    let credentials = Credentials::from_keys(username, password, None);
    let s3_config = aws_sdk_s3::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .credentials_provider(credentials)
        .region(Some(Region::new("us-east-1")))
        .endpoint_url(url.to_string())
        .force_path_style(true)
        .build();
    let client = Client::from_conf(s3_config);
    let head = client.head_bucket().bucket(bucket).send().await;
    if head.is_err() {
        client.create_bucket().bucket(bucket).send().await.unwrap();
    };
}

fn criterion_benchmark(c: &mut Criterion) {
    let url = Url::parse("http://localhost:9000").unwrap();
    let username = "minioadmin";
    let password = "minioadmin";
    let credentials = S3Credentials::access_key(username, password);
    let client = S3Client::new(Some(&url), "us-east-1", credentials);
    let bucket = "s3-client-bench";
    let runtime = tokio::runtime::Runtime::new().unwrap();
    runtime.block_on(create_bucket(&url, username, password, bucket));
    for size_k in [64, 256, 1024] {
        let size = size_k * 1024;
        let bytes = Bytes::from("word ".repeat(size / 5));
        let key = format!("data-{}.txt", size);
        let name = format!("upload({})", size);
        c.bench_function(&name, |b| {
            b.to_async(&runtime).iter(|| async {
                client
                    .upload_object(black_box(bucket), &key, bytes.clone(), "text/plain")
                    .await
                    .unwrap();
            })
        });
        let name = format!("download({})", size);
        c.bench_function(&name, |b| {
            b.to_async(&runtime).iter(|| async {
                client
                    .download_object(black_box(bucket), &key)
                    .await
                    .unwrap();
            })
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

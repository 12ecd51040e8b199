//! Where rendered exports go and how the caller gets them back.

use anyhow::anyhow;
use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use chrono::{DateTime, SecondsFormat, Utc};
use std::time::Duration;
use tracing::debug;

/// How long a download link stays valid.
pub const LINK_VALIDITY: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Clone)]
pub struct ExportObject {
    pub key: String,
    pub body: Vec<u8>,
    pub content_type: &'static str,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait ExportSink: Send + Sync {
    async fn upload(&self, object: ExportObject) -> anyhow::Result<()>;

    /// A time-limited GET link for an uploaded object.
    async fn download_link(&self, key: &str, valid_for: Duration) -> anyhow::Result<String>;
}

pub struct S3ExportSink {
    client: Client,
    bucket: String,
}

impl S3ExportSink {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ExportSink for S3ExportSink {
    async fn upload(&self, object: ExportObject) -> anyhow::Result<()> {
        let size = object.body.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&object.key)
            .content_type(object.content_type)
            .metadata(
                "created-at",
                object.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            )
            .body(ByteStream::from(object.body))
            .send()
            .await
            .map_err(|err| anyhow!("put_object failed: {}", DisplayErrorContext(err)))?;

        debug!(bucket = %self.bucket, key = %object.key, size, "uploaded export");
        Ok(())
    }

    async fn download_link(&self, key: &str, valid_for: Duration) -> anyhow::Result<String> {
        let presigning = PresigningConfig::expires_in(valid_for)?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|err| anyhow!("presigning get_object failed: {}", DisplayErrorContext(err)))?;
        Ok(request.uri().to_string())
    }
}

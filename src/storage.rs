use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

use crate::config::StorageConfig;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Blob storage for uploaded profile images.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Stores `body` under `key` and returns the location to persist on the user.
    async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<String, StorageError>;

    /// Removes an object by the location `put_object` returned.
    async fn delete_object(&self, location: &str) -> Result<(), StorageError>;
}

pub async fn from_config(cfg: &StorageConfig) -> anyhow::Result<Box<dyn StorageClient>> {
    let client: Box<dyn StorageClient> = match cfg {
        StorageConfig::Local { upload_dir } => Box::new(LocalStorage::new(upload_dir)),
        StorageConfig::S3 {
            endpoint,
            bucket,
            access_key,
            secret_key,
            region,
        } => Box::new(S3Storage::new(endpoint, bucket, access_key, secret_key, region).await?),
    };
    Ok(client)
}

pub fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        _ => None,
    }
}

/// Writes objects under a directory on local disk.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl StorageClient for LocalStorage {
    async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.root.join(key);
        tokio::fs::write(&path, &body).await?;
        debug!(path = %path.display(), bytes = body.len(), "image written");
        Ok(path.to_string_lossy().into_owned())
    }

    async fn delete_object(&self, location: &str) -> Result<(), StorageError> {
        tokio::fs::remove_file(Path::new(location)).await?;
        debug!(path = location, "image removed");
        Ok(())
    }
}

/// S3 or MinIO bucket.
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
}

impl S3Storage {
    pub async fn new(
        endpoint: &str,
        bucket: &str,
        access_key: &str,
        secret_key: &str,
        region: &str,
    ) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(Credentials::new(
                access_key, secret_key, None, None, "static",
            ))
            .endpoint_url(endpoint)
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: bucket.to_string(),
        })
    }
}

#[async_trait]
impl StorageClient for S3Storage {
    async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<String, StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .context("s3 put_object")?;
        Ok(key.to_string())
    }

    async fn delete_object(&self, location: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(location)
            .send()
            .await
            .context("s3 delete_object")?;
        Ok(())
    }
}

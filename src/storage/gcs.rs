// src/storage/gcs.rs

use anyhow::{Context, Result};
use async_trait::async_trait;
use google_cloud_storage::{
    client::{Client, ClientConfig},
    http::{
        objects::{
            delete::DeleteObjectRequest,
            download::Range,
            get::GetObjectRequest,
            upload::{Media, UploadObjectRequest, UploadType},
        },
        Error as GcsError,
    },
};
use tracing::debug;

use super::ObjectStore;

/// Google Cloud Storage backed by application default credentials.
pub struct GcsStore {
    client: Client,
}

impl GcsStore {
    pub async fn new() -> Result<Self> {
        let config = ClientConfig::default()
            .with_auth()
            .await
            .context("authenticating GCS client")?;
        Ok(Self {
            client: Client::new(config),
        })
    }

    fn object_request(bucket: &str, path: &str) -> GetObjectRequest {
        GetObjectRequest {
            bucket: bucket.to_string(),
            object: path.to_string(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl ObjectStore for GcsStore {
    async fn put(&self, bucket: &str, path: &str, data: Vec<u8>) -> Result<()> {
        let len = data.len();
        let mut media = Media::new(path.to_string());
        media.content_length = Some(len as u64);
        let request = UploadObjectRequest {
            bucket: bucket.to_string(),
            ..Default::default()
        };

        self.client
            .upload_object(&request, data, &UploadType::Simple(media))
            .await
            .with_context(|| format!("uploading gs://{}/{}", bucket, path))?;

        debug!(bucket, object = path, bytes = len, "put object");
        Ok(())
    }

    async fn exists(&self, bucket: &str, path: &str) -> Result<bool> {
        match self
            .client
            .get_object(&Self::object_request(bucket, path))
            .await
        {
            Ok(_) => Ok(true),
            Err(GcsError::Response(resp)) if resp.code == 404 => Ok(false),
            Err(e) => Err(e).with_context(|| format!("checking gs://{}/{}", bucket, path)),
        }
    }

    async fn get(&self, bucket: &str, path: &str) -> Result<Vec<u8>> {
        self.client
            .download_object(&Self::object_request(bucket, path), &Range::default())
            .await
            .with_context(|| format!("downloading gs://{}/{}", bucket, path))
    }

    async fn delete(&self, bucket: &str, path: &str) -> Result<()> {
        let request = DeleteObjectRequest {
            bucket: bucket.to_string(),
            object: path.to_string(),
            ..Default::default()
        };
        self.client
            .delete_object(&request)
            .await
            .with_context(|| format!("deleting gs://{}/{}", bucket, path))
    }
}

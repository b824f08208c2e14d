use std::path::PathBuf;
use std::time::Duration;

use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_sdk_s3 as s3;
use aws_sdk_s3::presigning::PresigningConfig;

use crate::shared::ports::audio_store::{AudioStoreError, AudioStoreFuture, AudioStorePort};

/// Audio Store backed by S3-compatible object storage. One blob per user per
/// date under the `audio/` prefix.
#[derive(Clone)]
pub struct S3AudioStore {
    client: s3::Client,
    bucket: String,
}

impl S3AudioStore {
    pub async fn from_env(bucket: String) -> Self {
        let region_provider = RegionProviderChain::default_provider().or_default_provider();
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .load()
            .await;
        Self {
            client: s3::Client::new(&config),
            bucket,
        }
    }
}

impl AudioStorePort for S3AudioStore {
    fn exists(&self, path: String) -> AudioStoreFuture<bool> {
        let client = self.client.clone();
        let bucket = self.bucket.clone();
        Box::pin(async move {
            match client.head_object().bucket(&bucket).key(&path).send().await {
                Ok(_) => Ok(true),
                Err(err) => {
                    let service_err = err.into_service_error();
                    if service_err.is_not_found() {
                        Ok(false)
                    } else {
                        Err(AudioStoreError::Backend(service_err.to_string()))
                    }
                }
            }
        })
    }

    fn download_to(&self, path: String, local: PathBuf) -> AudioStoreFuture<()> {
        let client = self.client.clone();
        let bucket = self.bucket.clone();
        Box::pin(async move {
            let resp = client
                .get_object()
                .bucket(&bucket)
                .key(&path)
                .send()
                .await
                .map_err(|err| {
                    let service_err = err.into_service_error();
                    if service_err.is_no_such_key() {
                        AudioStoreError::NotFound(path.clone())
                    } else {
                        AudioStoreError::Backend(service_err.to_string())
                    }
                })?;

            let bytes = resp
                .body
                .collect()
                .await
                .map_err(|e| AudioStoreError::Io(e.to_string()))?
                .into_bytes();
            tokio::fs::write(&local, &bytes)
                .await
                .map_err(|e| AudioStoreError::Io(e.to_string()))?;
            log::debug!(
                "[storage] downloaded s3://{}/{} ({} bytes)",
                bucket,
                path,
                bytes.len()
            );
            Ok(())
        })
    }

    fn presign_put(
        &self,
        path: String,
        content_type: String,
        expiry: Duration,
    ) -> AudioStoreFuture<String> {
        let client = self.client.clone();
        let bucket = self.bucket.clone();
        Box::pin(async move {
            let presigning = PresigningConfig::expires_in(expiry)
                .map_err(|e| AudioStoreError::Backend(e.to_string()))?;
            let presigned = client
                .put_object()
                .bucket(&bucket)
                .key(&path)
                .content_type(&content_type)
                .presigned(presigning)
                .await
                .map_err(|e| AudioStoreError::Backend(e.to_string()))?;
            Ok(presigned.uri().to_string())
        })
    }
}

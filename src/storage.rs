//! Upload side: an S3-compatible bucket (Cloudflare R2).

use crate::config::Config;
use crate::error::{Error, Result, UploadError};
use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::region::Region;
use tokio::runtime::Runtime;

/// Stores one object under a key. Writing an existing key replaces it.
pub trait ObjectStore: Send + Sync {
    fn put(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> std::result::Result<(), UploadError>;
}

pub struct R2Storage {
    bucket: Box<Bucket>,
    runtime: Runtime,
}

impl R2Storage {
    pub fn new(
        bucket_name: &str,
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
    ) -> Result<Self> {
        let region = Region::Custom {
            region: region.to_string(),
            endpoint: endpoint.to_string(),
        };
        let credentials = Credentials::new(Some(access_key), Some(secret_key), None, None, None)
            .map_err(|e| Error::StorageClient(e.to_string()))?;
        let bucket = Bucket::new(bucket_name, region, credentials)
            .map_err(|e| Error::StorageClient(e.to_string()))?
            .with_path_style();

        // Workers call `block_on` from their own threads; the runtime only
        // drives the sockets.
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("tinyr2-s3")
            .enable_all()
            .build()
            .map_err(|e| Error::StorageClient(format!("Failed to create runtime: {}", e)))?;

        Ok(Self { bucket, runtime })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.bucket_name,
            &config.r2_endpoint_url,
            &config.r2_region,
            &config.r2_access_key,
            &config.r2_secret_access_key,
        )
    }

    pub fn bucket_name(&self) -> String {
        self.bucket.name()
    }
}

impl ObjectStore for R2Storage {
    fn put(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> std::result::Result<(), UploadError> {
        let response = self
            .runtime
            .block_on(
                self.bucket
                    .put_object_with_content_type(key, data, content_type),
            )
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            return Err(UploadError::Status {
                status,
                key: key.to_string(),
            });
        }
        Ok(())
    }
}

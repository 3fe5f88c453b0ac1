use async_trait::async_trait;
use aws_sdk_s3 as s3;
#[cfg(test)]
use mockall::automock;
use s3::primitives::ByteStream;
use std::path::Path;
use tokio::fs;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Writes the object's bytes to `path`.
    async fn download(&self, bucket: &str, key: &str, path: &Path) -> anyhow::Result<()>;

    /// Stores the file at `path` as `bucket`/`key`.
    async fn upload(&self, path: &Path, bucket: &str, key: &str) -> anyhow::Result<()>;
}

#[derive(Clone, Debug)]
pub struct S3Store {
    inner: s3::Client,
}

impl S3Store {
    pub fn new(inner: s3::Client) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    #[tracing::instrument(skip(self))]
    async fn download(&self, bucket: &str, key: &str, path: &Path) -> anyhow::Result<()> {
        let cmd_output = self.inner.get_object().bucket(bucket).key(key).send().await?;
        let data = cmd_output
            .body
            .collect()
            .await
            .map(|data| data.into_bytes())?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, &data).await?;

        tracing::debug!("staged {} bytes", data.len());

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn upload(&self, path: &Path, bucket: &str, key: &str) -> anyhow::Result<()> {
        let body = ByteStream::from_path(path).await?;

        self.inner
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .send()
            .await?;

        Ok(())
    }
}

use anyhow::Context;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use axum::async_trait;
use bytes::Bytes;

#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()>;
    async fn delete_object(&self, key: &str) -> anyhow::Result<()>;
    /// Public URL under which the object at `key` is reachable.
    fn public_url(&self, key: &str) -> String;
    /// Inverse of `public_url`: the storage key for a URL we minted, or
    /// None for URLs that point outside this store.
    fn key_from_url<'a>(&self, url: &'a str) -> Option<&'a str>;
}

#[derive(Clone)]
pub struct Storage {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl Storage {
    pub async fn new(
        endpoint: &str,
        bucket: &str,
        access_key: &str,
        secret_key: &str,
        region: &str,
        public_base_url: &str,
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
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl StorageClient for Storage {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .context("s3 put_object")?;
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .context("s3 delete_object")?;
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }

    fn key_from_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(self.public_base_url.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|key| !key.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn make_storage() -> Storage {
        Storage::new(
            "http://localhost:9000",
            "cardbox",
            "minio",
            "minio123",
            "us-east-1",
            "https://cards.example.com/files/",
        )
        .await
        .expect("client construction is offline")
    }

    #[tokio::test]
    async fn public_url_and_key_round_trip() {
        let storage = make_storage().await;
        let url = storage.public_url("card-images/123-abc123.jpg");
        assert_eq!(
            url,
            "https://cards.example.com/files/card-images/123-abc123.jpg"
        );
        assert_eq!(
            storage.key_from_url(&url),
            Some("card-images/123-abc123.jpg")
        );
    }

    #[tokio::test]
    async fn key_from_url_rejects_foreign_urls() {
        let storage = make_storage().await;
        assert_eq!(storage.key_from_url("https://elsewhere.example/x.jpg"), None);
        assert_eq!(storage.key_from_url("https://cards.example.com/files/"), None);
    }
}

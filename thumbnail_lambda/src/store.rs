use crate::error::StoreError;
use async_trait::async_trait;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;

/// An object read fully into memory, with the response stream already released.
#[derive(Debug, Clone)]
pub struct FetchedObject {
    pub body: Bytes,
    pub content_type: Option<String>,
}

/// The two object store operations the handler needs.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get(&self, bucket: &str, key: &str) -> Result<FetchedObject, StoreError>;

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), StoreError>;
}

/// [`ObjectStore`] backed by S3. The client is built once per process and reused
/// across invocations.
#[derive(Clone, Debug)]
pub struct S3Store {
    client: S3Client,
}

impl S3Store {
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn get(&self, bucket: &str, key: &str) -> Result<FetchedObject, StoreError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                if matches!(err.as_service_error(), Some(GetObjectError::NoSuchKey(_))) {
                    StoreError::NotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    }
                } else {
                    StoreError::Request {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                        source: Box::new(err),
                    }
                }
            })?;

        let content_type = output.content_type().map(str::to_owned);
        let body = output
            .body
            .collect()
            .await
            .map_err(|err| StoreError::Body {
                bucket: bucket.to_string(),
                key: key.to_string(),
                source: Box::new(err),
            })?
            .into_bytes();

        Ok(FetchedObject { body, content_type })
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), StoreError> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|err| StoreError::Request {
                bucket: bucket.to_string(),
                key: key.to_string(),
                source: Box::new(err),
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::operation::get_object::GetObjectOutput;
    use aws_sdk_s3::operation::put_object::PutObjectOutput;
    use aws_sdk_s3::types::error::NoSuchKey;
    use aws_smithy_mocks::{mock, mock_client};

    #[tokio::test]
    async fn test_get_reads_body_and_content_type() {
        let get_rule = mock!(aws_sdk_s3::Client::get_object)
            .match_requests(|req| req.bucket() == Some("uploads") && req.key() == Some("a.jpg"))
            .then_output(|| {
                GetObjectOutput::builder()
                    .content_type("image/jpeg")
                    .body(ByteStream::from_static(b"jpeg bytes"))
                    .build()
            });
        let store = S3Store::new(mock_client!(aws_sdk_s3, [&get_rule]));

        let object = store.get("uploads", "a.jpg").await.unwrap();
        assert_eq!(object.body, Bytes::from_static(b"jpeg bytes"));
        assert_eq!(object.content_type.as_deref(), Some("image/jpeg"));
        assert_eq!(get_rule.num_calls(), 1);
    }

    #[tokio::test]
    async fn test_get_maps_missing_key_to_not_found() {
        let get_rule = mock!(aws_sdk_s3::Client::get_object)
            .then_error(|| GetObjectError::NoSuchKey(NoSuchKey::builder().build()));
        let store = S3Store::new(mock_client!(aws_sdk_s3, [&get_rule]));

        let err = store.get("uploads", "missing.jpg").await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::NotFound { ref bucket, ref key } if bucket == "uploads" && key == "missing.jpg"
        ));
    }

    #[tokio::test]
    async fn test_put_sends_content_type() {
        let put_rule = mock!(aws_sdk_s3::Client::put_object)
            .match_requests(|req| {
                req.bucket() == Some("thumbnails")
                    && req.key() == Some("a.jpg")
                    && req.content_type() == Some("image/jpeg")
                    && req.body().bytes() == Some(b"thumb".as_slice())
            })
            .then_output(|| PutObjectOutput::builder().build());
        let store = S3Store::new(mock_client!(aws_sdk_s3, [&put_rule]));

        store
            .put("thumbnails", "a.jpg", Bytes::from_static(b"thumb"), "image/jpeg")
            .await
            .unwrap();
        assert_eq!(put_rule.num_calls(), 1);
    }
}

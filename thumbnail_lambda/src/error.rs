use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures talking to the object store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object s3://{bucket}/{key} does not exist")]
    NotFound { bucket: String, key: String },

    #[error("request for s3://{bucket}/{key} failed: {source}")]
    Request {
        bucket: String,
        key: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to read body of s3://{bucket}/{key}: {source}")]
    Body {
        bucket: String,
        key: String,
        #[source]
        source: BoxError,
    },
}

/// Fatal errors for a single invocation. The Lambda adapter hands these back to
/// the runtime so the invocation is marked failed.
#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("failed to fetch source object: {0}")]
    Fetch(#[source] StoreError),

    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode thumbnail: {0}")]
    Encode(#[source] image::ImageError),

    #[error("failed to write thumbnail: {0}")]
    Write(#[source] StoreError),

    #[error("image task panicked: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration from environment: {0}")]
    Env(#[from] envy::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

use crate::config::HandlerConfig;
use crate::error::ThumbnailError;
use crate::store::ObjectStore;
use crate::thumbnail::{ThumbnailConfig, ThumbnailProcessor};
use aws_lambda_events::event::s3::S3Event;
use lambda_runtime::{tracing, Error, LambdaEvent};
use std::error::Error as _;

/// The object an event refers to, with the key already URL-decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ObjectRef {
    bucket: String,
    key: String,
}

impl ObjectRef {
    /// Only the first record is consulted.
    fn from_event(event: &S3Event) -> Option<Self> {
        let record = event.records.first()?;
        let bucket = record.s3.bucket.name.clone()?;
        let raw_key = record.s3.object.key.as_deref()?;
        Some(Self {
            bucket,
            key: decode_key(raw_key),
        })
    }
}

/// S3 notifications URL-encode keys and use `+` for spaces.
fn decode_key(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailOutcome {
    /// No record, or the event came from the output bucket.
    Skipped,
    /// Fetched, but the key does not carry the configured suffix.
    NotQualifying,
    /// Thumbnail written. `content_type` is the source object's, not the thumbnail's.
    Written { content_type: String, frames: usize },
}

impl ThumbnailOutcome {
    /// Value handed back to the Lambda runtime.
    pub fn into_response(self) -> Option<String> {
        match self {
            Self::Skipped => None,
            Self::NotQualifying => Some(String::new()),
            Self::Written { content_type, .. } => Some(content_type),
        }
    }
}

pub struct ThumbnailHandler<S> {
    store: S,
    config: HandlerConfig,
    processor: ThumbnailProcessor,
}

impl<S: ObjectStore> ThumbnailHandler<S> {
    pub fn new(store: S, config: HandlerConfig) -> Self {
        let processor = ThumbnailProcessor::new(ThumbnailConfig {
            width: config.thumbnail_width,
            quality: config.jpeg_quality,
        });
        Self {
            store,
            config,
            processor,
        }
    }

    pub async fn handle(&self, event: &S3Event) -> Result<ThumbnailOutcome, ThumbnailError> {
        let Some(target) = ObjectRef::from_event(event) else {
            tracing::warn!("No usable records found in S3 event");
            return Ok(ThumbnailOutcome::Skipped);
        };
        if target.bucket == self.config.output_bucket {
            tracing::info!(bucket = %target.bucket, key = %target.key, "Ignoring event from output bucket");
            return Ok(ThumbnailOutcome::Skipped);
        }

        self.process(&target)
            .await
            .inspect_err(|err| log_failure(&target, err))
    }

    async fn process(&self, target: &ObjectRef) -> Result<ThumbnailOutcome, ThumbnailError> {
        tracing::info!("Trying to get object {} from bucket {}", target.key, target.bucket);
        let object = self
            .store
            .get(&target.bucket, &target.key)
            .await
            .map_err(ThumbnailError::Fetch)?;
        let content_type = object.content_type.unwrap_or_default();
        tracing::info!(
            bucket = %target.bucket,
            key = %target.key,
            content_type = %content_type,
            size = object.body.len(),
            "Got object"
        );

        if !target.key.ends_with(&self.config.key_suffix) {
            tracing::info!(key = %target.key, suffix = %self.config.key_suffix, "Key does not qualify, skipping resize");
            return Ok(ThumbnailOutcome::NotQualifying);
        }

        let decoded = ThumbnailProcessor::decode_async(object.body).await?;
        let frames = decoded.frames.len();
        if frames > 1 {
            tracing::warn!(
                key = %target.key,
                frames,
                "Multi-frame image, every frame is written to the same key"
            );
        }

        for frame in decoded.frames {
            let thumb = self.processor.render_async(frame, decoded.format).await?;
            self.store
                .put(
                    &self.config.output_bucket,
                    &target.key,
                    thumb.data,
                    thumb.content_type,
                )
                .await
                .map_err(ThumbnailError::Write)?;
            tracing::info!(
                bucket = %self.config.output_bucket,
                key = %target.key,
                width = thumb.width,
                height = thumb.height,
                "Wrote thumbnail"
            );
        }

        let outcome = ThumbnailOutcome::Written {
            content_type,
            frames,
        };
        tracing::info!(key = %target.key, ?outcome, "Finished processing object");
        Ok(outcome)
    }
}

fn log_failure(target: &ObjectRef, err: &ThumbnailError) {
    let caused_by: Vec<String> = std::iter::successors(err.source(), |&e| e.source())
        .map(ToString::to_string)
        .collect();
    tracing::error!(
        bucket = %target.bucket,
        key = %target.key,
        error = %err,
        ?caused_by,
        "Error processing object {} from bucket {}",
        target.key,
        target.bucket
    );
}

pub(crate) async fn function_handler<S: ObjectStore>(
    event: LambdaEvent<S3Event>,
    handler: &ThumbnailHandler<S>,
) -> Result<Option<String>, Error> {
    let outcome = handler.handle(&event.payload).await?;
    Ok(outcome.into_response())
}

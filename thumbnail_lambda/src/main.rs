use aws_config::BehaviorVersion;
use aws_sdk_s3::Client as S3Client;
use lambda_runtime::{run, service_fn, tracing, Error};
mod config;
mod error;
mod event_handler;
mod store;
mod thumbnail;
use config::HandlerConfig;
use event_handler::{function_handler, ThumbnailHandler};
use store::S3Store;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::subscriber::fmt().json().init();
    let config = HandlerConfig::from_env()?;
    tracing::info!(
        output_bucket = %config.output_bucket,
        width = config.thumbnail_width,
        suffix = %config.key_suffix,
        "Configuration loaded"
    );
    let shared_config = aws_config::load_defaults(BehaviorVersion::v2025_01_17()).await;
    let handler = ThumbnailHandler::new(S3Store::new(S3Client::new(&shared_config)), config);
    run(service_fn(|event| function_handler(event, &handler))).await
}

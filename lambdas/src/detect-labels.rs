use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::Value;
use shared::{
    config::{get_sdk_cfg, get_service_cfg},
    label::RekognitionDetector,
    notify::SnsNotifier,
    processor::Processor,
    storage::S3Store,
};

type LabelProcessor = Processor<RekognitionDetector, S3Store, SnsNotifier>;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        // CloudWatch adds the ingestion time and the function name.
        .with_target(false)
        .without_time()
        .init();

    let sdk_cfg = get_sdk_cfg().await;
    let cfg = get_service_cfg(&sdk_cfg, "image-labeler").await?;
    let processor = Processor::new(
        RekognitionDetector::new(aws_sdk_rekognition::Client::new(&sdk_cfg)),
        S3Store::new(aws_sdk_s3::Client::new(&sdk_cfg)),
        SnsNotifier::new(aws_sdk_sns::Client::new(&sdk_cfg)),
        cfg,
    );

    tracing::info!(
        destination_bucket = %processor.cfg().destination_bucket,
        "ready"
    );

    run(service_fn(|event| detect_labels(event, &processor))).await
}

async fn detect_labels(
    event: LambdaEvent<Value>,
    processor: &LabelProcessor,
) -> Result<Vec<bool>, Error> {
    Ok(processor.handle(&event.payload).await?)
}

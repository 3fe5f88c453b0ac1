use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_appconfig as app_cfg;
use lambda_runtime::Error;
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, env, path::PathBuf};

const DEFAULT_LABELS: [&str; 8] = [
    "Dog", "Cat", "Apple", "Banana", "Cherry", "Pumpkin", "Onion", "Potato",
];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Label names that route an image to the destination bucket.
    pub allow_list: HashSet<String>,

    /// A label must score strictly above this (0-100) to match.
    pub confidence_threshold: f32,

    /// Matched images are copied here, keyed by filename only.
    pub destination_bucket: String,

    /// SNS target for matched images.
    pub success_target: String,

    /// SNS target for images without a match.
    pub failure_target: String,

    /// Where object bytes are staged between download and upload.
    pub scratch_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            allow_list: DEFAULT_LABELS.iter().map(|l| l.to_string()).collect(),
            confidence_threshold: 90.0,
            destination_bucket: "analyzed-image-bucket".to_string(),
            success_target: "arn:aws:sns:us-east-1:365848237714:success-topic-sns".to_string(),
            failure_target: "arn:aws:sns:us-east-1:365848237714:failure-topic-sns".to_string(),
            scratch_dir: PathBuf::from("/tmp"),
        }
    }
}

impl Config {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Applies deployment overrides, `lookup` resolves a variable name to its value.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(labels) = lookup("ALLOW_LIST") {
            self.allow_list = labels
                .split(',')
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(threshold) = lookup("CONFIDENCE_THRESHOLD") {
            self.confidence_threshold = threshold
                .trim()
                .parse()
                .map_err(|e| format!("invalid CONFIDENCE_THRESHOLD {:?}: {}", threshold, e))?;
        }
        if let Some(bucket) = lookup("DESTINATION_BUCKET") {
            self.destination_bucket = bucket;
        }
        if let Some(arn) = lookup("SUCCESS_TOPIC_ARN") {
            self.success_target = arn;
        }
        if let Some(arn) = lookup("FAILURE_TOPIC_ARN") {
            self.failure_target = arn;
        }
        if let Some(dir) = lookup("SCRATCH_DIR") {
            self.scratch_dir = PathBuf::from(dir);
        }

        Ok(self)
    }
}

pub async fn get_sdk_cfg() -> SdkConfig {
    aws_config::load_defaults(BehaviorVersion::latest()).await
}

/// Loads the service config: AppConfig document when `APP_CONFIGURATION` is set,
/// defaults otherwise, then environment overrides.
pub async fn get_service_cfg(sdk_cfg: &SdkConfig, app_client: &str) -> Result<Config, Error> {
    let config = match env::var("APP_CONFIGURATION") {
        Ok(configuration) => fetch_app_cfg(sdk_cfg, app_client, &configuration).await?,
        Err(_) => Config::default(),
    };
    let config = config.with_overrides(|name| env::var(name).ok())?;

    tracing::event!(tracing::Level::DEBUG, "{:?}", config);

    Ok(config)
}

#[allow(deprecated)]
async fn fetch_app_cfg(
    sdk_cfg: &SdkConfig,
    app_client: &str,
    configuration: &str,
) -> Result<Config, Error> {
    let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "local".to_string());
    let application =
        env::var("APP_CONFIG_APPLICATION").unwrap_or_else(|_| "image-labeler".to_string());
    let client = app_cfg::Client::new(sdk_cfg);

    let res = client
        .get_configuration()
        .client_id(app_client)
        .environment(&environment)
        .application(&application)
        .configuration(configuration)
        .send()
        .await?;
    let content = res
        .content()
        .ok_or_else(|| Error::from("AppConfig returned no content"))?;
    let raw_string = std::str::from_utf8(content.as_ref())?;

    Ok(Config::from_json(raw_string)?)
}

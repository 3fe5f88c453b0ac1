use crate::{config::Config, error::ProcessError, event::ObjectRef};
use async_trait::async_trait;
use aws_sdk_rekognition as rekognition;
#[cfg(test)]
use mockall::automock;
use rekognition::types::{Image, S3Object};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub name: String,
    /// Percentage, 0-100.
    pub confidence: f32,
}

impl Label {
    pub fn new(name: impl Into<String>, confidence: f32) -> Self {
        Label {
            name: name.into(),
            confidence,
        }
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait LabelDetector: Send + Sync {
    /// Labels detected in the stored object, in the order the service returns them.
    async fn detect_labels(&self, bucket: &str, key: &str) -> anyhow::Result<Vec<Label>>;
}

#[derive(Clone, Debug)]
pub struct RekognitionDetector {
    inner: rekognition::Client,
}

impl RekognitionDetector {
    pub fn new(inner: rekognition::Client) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl LabelDetector for RekognitionDetector {
    #[tracing::instrument(skip(self))]
    async fn detect_labels(&self, bucket: &str, key: &str) -> anyhow::Result<Vec<Label>> {
        let image = Image::builder()
            .s3_object(S3Object::builder().bucket(bucket).name(key).build())
            .build();
        let output = self.inner.detect_labels().image(image).send().await?;

        // Labels missing a name or a score can never match.
        let labels = output
            .labels()
            .iter()
            .filter_map(|label| Some(Label::new(label.name()?, label.confidence()?)))
            .collect::<Vec<_>>();

        tracing::debug!("{} labels detected", labels.len());

        Ok(labels)
    }
}

/// First label in `labels` that is allow-listed and scores strictly above `threshold`.
///
/// Later labels are ignored even when they score higher.
pub fn first_match<'a>(
    labels: &'a [Label],
    allow_list: &HashSet<String>,
    threshold: f32,
) -> Option<&'a Label> {
    labels
        .iter()
        .find(|label| allow_list.contains(&label.name) && label.confidence > threshold)
}

pub async fn classify<D: LabelDetector + ?Sized>(
    detector: &D,
    cfg: &Config,
    obj: &ObjectRef,
) -> Result<Option<Label>, ProcessError> {
    let labels = detector
        .detect_labels(&obj.bucket, &obj.key)
        .await
        .map_err(|source| ProcessError::Detection {
            bucket: obj.bucket.clone(),
            key: obj.key.clone(),
            source,
        })?;

    Ok(first_match(&labels, &cfg.allow_list, cfg.confidence_threshold).cloned())
}

#[cfg(test)]
mod tests {
    use super::{classify, first_match, Label, MockLabelDetector};
    use crate::{config::Config, error::ProcessError, event::ObjectRef};
    use std::collections::HashSet;

    fn allow_list() -> HashSet<String> {
        Config::default().allow_list
    }

    #[test]
    fn first_qualifying_label_wins() {
        let labels = vec![
            Label::new("Animal", 99.9),
            Label::new("Cat", 92.5),
            Label::new("Dog", 99.1),
        ];

        let found = first_match(&labels, &allow_list(), 90.0);

        assert_eq!(found, Some(&Label::new("Cat", 92.5)));
    }

    #[test]
    fn threshold_is_exclusive() {
        let labels = vec![Label::new("Cat", 90.0), Label::new("Dog", 90.01)];

        assert_eq!(
            first_match(&labels, &allow_list(), 90.0),
            Some(&Label::new("Dog", 90.01))
        );
        assert_eq!(first_match(&labels[..1], &allow_list(), 90.0), None);
    }

    #[test]
    fn no_match() {
        let labels = vec![
            Label::new("Pet", 99.0),
            Label::new("Mammal", 98.0),
            Label::new("Banana", 45.3),
        ];

        assert_eq!(first_match(&labels, &allow_list(), 90.0), None);
        assert_eq!(first_match(&[], &allow_list(), 90.0), None);
    }

    #[test]
    fn names_are_case_sensitive() {
        let labels = vec![Label::new("cat", 99.0)];

        assert_eq!(first_match(&labels, &allow_list(), 90.0), None);
    }

    #[tokio::test]
    async fn classify_queries_by_reference() {
        let mut detector = MockLabelDetector::new();
        detector
            .expect_detect_labels()
            .withf(|bucket: &str, key: &str| bucket == "raw" && key == "pets/cat.jpg")
            .times(1)
            .returning(|_, _| Ok(vec![Label::new("Pumpkin", 97.0), Label::new("Cat", 99.0)]));

        let found = classify(
            &detector,
            &Config::default(),
            &ObjectRef::new("raw", "pets/cat.jpg"),
        )
        .await
        .unwrap();

        assert_eq!(found, Some(Label::new("Pumpkin", 97.0)));
    }

    #[tokio::test]
    async fn classify_propagates_service_error() {
        let mut detector = MockLabelDetector::new();
        detector
            .expect_detect_labels()
            .returning(|_, _| Err(anyhow::anyhow!("InvalidS3ObjectException")));

        let res = classify(&detector, &Config::default(), &ObjectRef::new("raw", "a.jpg")).await;

        match res {
            Err(ProcessError::Detection { bucket, key, .. }) => {
                assert_eq!(bucket, "raw");
                assert_eq!(key, "a.jpg");
            }
            other => panic!("unexpected result {:?}", other),
        }
    }
}

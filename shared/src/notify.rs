use crate::label::Label;
use async_trait::async_trait;
use aws_sdk_sns as sns;
#[cfg(test)]
use mockall::automock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub message: String,
}

impl Notification {
    pub fn success(label: &Label) -> Self {
        Notification {
            subject: "SUCCESS".to_string(),
            // Debug keeps the trailing `.0` on whole scores, `95.0` rather than `95`.
            message: format!(
                "Image detected: {} with a confidence of: {:?}",
                label.name, label.confidence
            ),
        }
    }

    pub fn failure() -> Self {
        Notification {
            subject: "FAILURE".to_string(),
            message: "Detected nothing".to_string(),
        }
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, target: &str, message: &str, subject: &str) -> anyhow::Result<()>;
}

#[derive(Clone, Debug)]
pub struct SnsNotifier {
    inner: sns::Client,
}

impl SnsNotifier {
    pub fn new(inner: sns::Client) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Notifier for SnsNotifier {
    #[tracing::instrument(skip(self, message))]
    async fn publish(&self, target: &str, message: &str, subject: &str) -> anyhow::Result<()> {
        let output = self
            .inner
            .publish()
            .target_arn(target)
            .message(message)
            .subject(subject)
            .send()
            .await?;

        tracing::debug!(message_id = ?output.message_id(), "published");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Notification;
    use crate::label::Label;

    #[test]
    fn success_message() {
        let n = Notification::success(&Label::new("Cat", 95.2));

        assert_eq!(n.subject, "SUCCESS");
        assert_eq!(n.message, "Image detected: Cat with a confidence of: 95.2");
    }

    #[test]
    fn success_message_whole_score() {
        let n = Notification::success(&Label::new("Onion", 97.0));

        assert_eq!(n.message, "Image detected: Onion with a confidence of: 97.0");
    }

    #[test]
    fn failure_message() {
        assert_eq!(
            Notification::failure(),
            Notification {
                subject: "FAILURE".to_string(),
                message: "Detected nothing".to_string(),
            }
        );
    }
}

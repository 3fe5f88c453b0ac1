#[derive(thiserror::Error, Debug)]
pub enum ProcessError {
    #[error("malformed event: {0}")]
    MalformedEvent(String),

    #[error("unable to parse event: {0}")]
    Event(#[from] serde_json::Error),

    #[error("unusable object key {key:?}: {reason}")]
    Key { key: String, reason: String },

    #[error("label detection failed for {key} in bucket {bucket}: {source:#}")]
    Detection {
        bucket: String,
        key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("storage operation failed for {key} in bucket {bucket}: {source:#}")]
    Storage {
        bucket: String,
        key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to publish notification to {target}: {source:#}")]
    Notification {
        target: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::ProcessError;

    #[test]
    fn service_errors_carry_their_cause() {
        let storage = ProcessError::Storage {
            bucket: "raw".to_string(),
            key: "potato.jpg".to_string(),
            source: anyhow::anyhow!("NoSuchKey: The specified key does not exist."),
        };
        assert_eq!(
            storage.to_string(),
            "storage operation failed for potato.jpg in bucket raw: \
             NoSuchKey: The specified key does not exist."
        );

        let detection = ProcessError::Detection {
            bucket: "raw".to_string(),
            key: "cat.jpg".to_string(),
            source: anyhow::anyhow!("InvalidS3ObjectException").context("DetectLabels"),
        };
        let message = detection.to_string();
        assert!(message.contains("DetectLabels"));
        assert!(message.contains("InvalidS3ObjectException"));

        let notification = ProcessError::Notification {
            target: "arn:aws:sns:us-east-1:000000000000:ok".to_string(),
            source: anyhow::anyhow!("AuthorizationError"),
        };
        assert!(notification.to_string().ends_with(": AuthorizationError"));
    }
}

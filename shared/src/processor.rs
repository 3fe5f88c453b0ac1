use crate::{
    config::Config,
    dispatch::dispatch,
    error::ProcessError,
    event::{decode_event, ObjectRef},
    label::{classify, LabelDetector},
    notify::Notifier,
    storage::ObjectStore,
};
use serde_json::Value;

/// Routes uploaded images by label. Clients are built once per process and
/// reused across invocations.
pub struct Processor<D, S, N> {
    detector: D,
    store: S,
    notifier: N,
    cfg: Config,
}

impl<D, S, N> Processor<D, S, N>
where
    D: LabelDetector,
    S: ObjectStore,
    N: Notifier,
{
    pub fn new(detector: D, store: S, notifier: N, cfg: Config) -> Self {
        Processor {
            detector,
            store,
            notifier,
            cfg,
        }
    }

    pub fn cfg(&self) -> &Config {
        &self.cfg
    }

    /// Processes every object referenced by `payload`, in order, returning one
    /// outcome per object. The first failure aborts the invocation.
    pub async fn handle(&self, payload: &Value) -> Result<Vec<bool>, ProcessError> {
        let objects = decode_event(payload).map_err(|e| {
            tracing::error!("failed to decode event: {}", e);
            e
        })?;

        let mut outcomes = Vec::with_capacity(objects.len());

        for obj in &objects {
            match self.process_record(obj).await {
                Ok(matched) => outcomes.push(matched),
                Err(e) => {
                    tracing::error!(
                        bucket = %obj.bucket,
                        key = %obj.key,
                        "error processing object {} from bucket {}: {}",
                        obj.key,
                        obj.bucket,
                        e
                    );
                    return Err(e);
                }
            }
        }

        Ok(outcomes)
    }

    #[tracing::instrument(skip(self, obj), fields(bucket = %obj.bucket, key = %obj.key))]
    pub async fn process_record(&self, obj: &ObjectRef) -> Result<bool, ProcessError> {
        let outcome = classify(&self.detector, &self.cfg, obj).await?;

        match &outcome {
            Some(label) => tracing::info!(
                label = %label.name,
                confidence = label.confidence,
                "label matched"
            ),
            None => tracing::info!("no allow-listed label matched"),
        }

        dispatch(
            outcome.as_ref(),
            obj,
            &self.cfg,
            &self.store,
            &self.notifier,
        )
        .await
    }
}

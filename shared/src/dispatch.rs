use crate::{
    config::Config,
    error::ProcessError,
    event::ObjectRef,
    label::Label,
    notify::{Notification, Notifier},
    storage::ObjectStore,
};
use std::path::PathBuf;
use tokio::fs;

/// Copies a matched object and announces the result.
///
/// A match is downloaded to the scratch dir, uploaded to the destination
/// bucket under its filename and published to the success target. No match
/// only publishes to the failure target. Returns whether a label matched.
pub async fn dispatch<S, N>(
    outcome: Option<&Label>,
    obj: &ObjectRef,
    cfg: &Config,
    store: &S,
    notifier: &N,
) -> Result<bool, ProcessError>
where
    S: ObjectStore + ?Sized,
    N: Notifier + ?Sized,
{
    let (target, notification) = match outcome {
        Some(label) => {
            copy_to_destination(obj, cfg, store).await?;
            (&cfg.success_target, Notification::success(label))
        }
        None => (&cfg.failure_target, Notification::failure()),
    };

    notifier
        .publish(target, &notification.message, &notification.subject)
        .await
        .map_err(|source| ProcessError::Notification {
            target: target.to_string(),
            source,
        })?;

    Ok(outcome.is_some())
}

async fn copy_to_destination<S>(obj: &ObjectRef, cfg: &Config, store: &S) -> Result<(), ProcessError>
where
    S: ObjectStore + ?Sized,
{
    let filename = obj.filename();
    if filename.is_empty() || filename == "." || filename == ".." {
        return Err(ProcessError::Key {
            key: obj.key.clone(),
            reason: "key does not end in a filename".to_string(),
        });
    }
    let scratch_path: PathBuf = cfg.scratch_dir.join(filename);

    let copied = match store.download(&obj.bucket, &obj.key, &scratch_path).await {
        Ok(()) => store
            .upload(&scratch_path, &cfg.destination_bucket, filename)
            .await
            .map_err(|source| ProcessError::Storage {
                bucket: cfg.destination_bucket.clone(),
                key: filename.to_string(),
                source,
            }),
        Err(source) => Err(ProcessError::Storage {
            bucket: obj.bucket.clone(),
            key: obj.key.clone(),
            source,
        }),
    };

    // A failed download can still leave a partial file behind.
    match fs::remove_file(&scratch_path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %scratch_path.display(), "failed to remove scratch file: {}", e)
        }
    }

    copied
}

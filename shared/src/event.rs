use crate::error::ProcessError;
use serde::Deserialize;
use serde_json::Value;

/// Location of an uploaded object, with the key already URL-decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

impl ObjectRef {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        ObjectRef {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Last path segment of the key, `folder/img.jpg` -> `img.jpg`.
    pub fn filename(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct S3Record {
    s3: S3Entity,
}

#[derive(Debug, Deserialize)]
struct S3Entity {
    bucket: S3Bucket,
    object: S3Object,
}

#[derive(Debug, Deserialize)]
struct S3Bucket {
    name: String,
}

#[derive(Debug, Deserialize)]
struct S3Object {
    key: String,
}

/// Extracts every object referenced by an invocation payload.
///
/// The payload is an SQS style envelope whose `body` carries an S3
/// notification, either as a JSON string or as a nested document. Records
/// without a `body` but with an `s3` entry are plain S3 notification records.
pub fn decode_event(payload: &Value) -> Result<Vec<ObjectRef>, ProcessError> {
    let records = payload
        .get("Records")
        .and_then(Value::as_array)
        .ok_or_else(|| ProcessError::MalformedEvent("missing Records".to_string()))?;

    let mut objects = vec![];

    for record in records {
        match record.get("body") {
            Some(Value::String(raw)) => {
                let body: Value = serde_json::from_str(raw)?;
                decode_body(&body, &mut objects)?;
            }
            Some(body) if body.is_object() => decode_body(body, &mut objects)?,
            Some(_) => {
                return Err(ProcessError::MalformedEvent(
                    "record body is neither a string nor an object".to_string(),
                ))
            }
            None if record.get("s3").is_some() => objects.push(decode_s3_record(record)?),
            None => {
                return Err(ProcessError::MalformedEvent(
                    "record has neither a body nor an s3 entry".to_string(),
                ))
            }
        }
    }

    Ok(objects)
}

fn decode_body(body: &Value, objects: &mut Vec<ObjectRef>) -> Result<(), ProcessError> {
    let entries = body
        .as_object()
        .ok_or_else(|| ProcessError::MalformedEvent("body is not an object".to_string()))?;

    // S3 sends this once when the bucket notification is configured.
    if entries.get("Event").and_then(Value::as_str) == Some("s3:TestEvent") {
        tracing::info!("skipping s3:TestEvent");
        return Ok(());
    }

    // Document order, serde_json is built with `preserve_order`.
    for (name, value) in entries {
        let sub_records = value.as_array().ok_or_else(|| {
            ProcessError::MalformedEvent(format!("body entry {} is not a list of records", name))
        })?;

        for sub_record in sub_records {
            objects.push(decode_s3_record(sub_record)?);
        }
    }

    Ok(())
}

fn decode_s3_record(record: &Value) -> Result<ObjectRef, ProcessError> {
    let record = S3Record::deserialize(record)?;
    let key = decode_key(&record.s3.object.key)?;

    Ok(ObjectRef::new(record.s3.bucket.name, key))
}

/// Decodes an S3 notification key: `+` is a space, then percent-escapes.
pub fn decode_key(raw: &str) -> Result<String, ProcessError> {
    let spaced = raw.replace('+', " ");

    urlencoding::decode(&spaced)
        .map(|key| key.into_owned())
        .map_err(|e| ProcessError::Key {
            key: raw.to_string(),
            reason: e.to_string(),
        })
}

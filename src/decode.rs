use crate::error::{ClientError, Result};
use crate::types::{ApriltagDetection, CameraInfo};
use serde_json::Value;

/// Decode the reply to `info`.
///
/// Any missing or mistyped field fails the whole record.
pub fn decode_camera_info(text: &str) -> Result<CameraInfo> {
    let value = parse(text)?;
    reject_sensor_error(&value)?;

    let mut info: CameraInfo = serde_json::from_value(value)?;
    info.raw = text.to_string();
    Ok(info)
}

/// Decode the reply to `fa`. An empty array is a valid reply with no tags;
/// one bad element fails the whole reply.
pub fn decode_apriltags(text: &str) -> Result<Vec<ApriltagDetection>> {
    let value = parse(text)?;
    reject_sensor_error(&value)?;

    let elements: Vec<Value> = serde_json::from_value(value)?;
    elements
        .into_iter()
        .map(|element| -> Result<ApriltagDetection> {
            let raw = element.to_string();
            let mut detection: ApriltagDetection = serde_json::from_value(element)?;
            detection.raw = raw;
            Ok(detection)
        })
        .collect()
}

/// The sensor reports failures as `{"error": "..."}` objects
pub fn sensor_error(value: &Value) -> Option<&str> {
    value.get("error").and_then(Value::as_str)
}

fn parse(text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|e| match unquoted_sensor_error(text) {
        Some(message) => ClientError::Sensor(message),
        None => e.into(),
    })
}

/// Some sensor error replies carry raw newlines inside the message string,
/// which is not valid JSON. Recover the message from `{"error" : "..."}`.
fn unquoted_sensor_error(text: &str) -> Option<String> {
    let rest = text
        .trim_start()
        .strip_prefix('{')?
        .trim_start()
        .strip_prefix("\"error\"")?
        .trim_start()
        .strip_prefix(':')?;
    let message = rest.trim().strip_suffix('}')?.trim_end();
    let message = message.strip_prefix('"')?.strip_suffix('"')?;
    Some(message.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn reject_sensor_error(value: &Value) -> Result<()> {
    if let Some(warning) = value.get("warning").and_then(Value::as_str) {
        log::warn!("⚠️ Sensor warning: {}", warning.trim());
    }
    match sensor_error(value) {
        Some(message) => Err(ClientError::Sensor(message.trim().to_string())),
        None => Ok(()),
    }
}

//! Records decoded from sensor replies.
//!
//! Each record is a snapshot built fresh for one request/reply cycle. The
//! serde attributes describe the sensor's snake_case wire format; `raw`
//! is filled in by the decoder, never read from the wire.

use serde::de::{Error, Unexpected};
use serde::{Deserialize, Deserializer};

/// One color-tracking profile configured on the camera
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ColorSample {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub difference: f64,
    pub blur: f64,
}

/// Camera configuration reported by the `info` command
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CameraInfo {
    #[serde(rename = "cam_name")]
    pub camera_name: String,
    pub identifier: String,
    pub horizontal_focal_length: f64,
    pub vertical_focal_length: f64,
    pub height: f64,
    #[serde(deserialize_with = "integral")]
    pub horizontal_resolution_pixels: i32,
    #[serde(deserialize_with = "integral")]
    pub vertical_resolution_pixels: i32,
    #[serde(deserialize_with = "integral")]
    pub processing_scale: i32,
    pub tilt_angle_radians: f64,
    pub horizontal_field_of_view_radians: f64,
    pub vertical_field_of_view_radians: f64,
    /// Index into `color_list`; the sensor reports -1 when the list is empty
    #[serde(deserialize_with = "integral")]
    pub active_color: i32,
    pub color_list: Vec<ColorSample>,
    /// Reply text this record was decoded from
    #[serde(skip)]
    pub raw: String,
}

impl CameraInfo {
    /// The color sample selected by `active_color`, if it is in range
    pub fn active_sample(&self) -> Option<&ColorSample> {
        let index = usize::try_from(self.active_color).ok()?;
        self.color_list.get(index)
    }

    /// True for the zero-valued record returned when no usable reply arrived
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A fiducial marker seen by the sensor, as reported by the `fa` command
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ApriltagDetection {
    #[serde(deserialize_with = "tag_id_as_text")]
    pub tag_id: String,
    /// Translation of the tag relative to the camera (x, y, z)
    pub position: [f64; 3],
    /// Euler angles of the tag (x, y, z)
    pub orientation: [f64; 3],
    pub distance: f64,
    pub horizontal_angle: f64,
    pub vertical_angle: f64,
    /// JSON text of this detection
    #[serde(skip)]
    pub raw: String,
}

/// The sensor stores some integer settings as floats (`640.0`). Accept any
/// whole number that fits in an `i32`.
fn integral<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if value.fract() != 0.0 || value < i32::MIN as f64 || value > i32::MAX as f64 {
        return Err(D::Error::invalid_value(
            Unexpected::Float(value),
            &"a whole number",
        ));
    }
    Ok(value as i32)
}

/// The sensor emits tag ids as numbers; older firmware sent strings
fn tag_id_as_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TagId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match TagId::deserialize(deserializer)? {
        TagId::Text(text) => text,
        TagId::Number(number) => number.to_string(),
    })
}

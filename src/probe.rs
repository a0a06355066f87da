//! Prober output model.
//!
//! The engine does not run the prober itself; it is handed the JSON the
//! prober printed (`-print_format json -show_format -show_streams
//! -show_frames`). [`ProbeOutput`] is the typed view of that document.
//! Stream and format sections are kept as open JSON maps because they are
//! passed through to the report untouched. Numeric frame fields are kept as
//! raw JSON values since probers emit them as numbers, numeric strings or
//! `"N/A"` depending on version.
//!
//! # Example
//!
//! ```
//! use mediastruct::ProbeOutput;
//!
//! let probe = ProbeOutput::from_json(r#"{"frames": [{"media_type": "audio", "pkt_size": "12"}]}"#)?;
//! assert_eq!(probe.frames.len(), 1);
//! assert!(probe.first_stream("video").is_none());
//! # Ok::<(), mediastruct::MediaStructError>(())
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::MediaStructError;

/// The complete prober output for one media file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbeOutput {
    /// Container-level format section.
    #[serde(default)]
    pub format: Map<String, Value>,
    /// Stream sections, one per elementary stream.
    #[serde(default)]
    pub streams: Vec<Map<String, Value>>,
    /// Per-frame records in decode order, audio and video interleaved.
    #[serde(default)]
    pub frames: Vec<RawFrame>,
}

/// One frame record as emitted by the prober.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFrame {
    /// `"video"`, `"audio"`, or another media type.
    #[serde(default)]
    pub media_type: Option<String>,
    /// `"I"`, `"P"`, `"B"` for video frames.
    #[serde(default)]
    pub pict_type: Option<String>,
    /// Key frame indicator (`1`/`0`, or a boolean).
    #[serde(default)]
    pub key_frame: Option<Value>,
    /// Packet size in bytes.
    #[serde(default)]
    pub pkt_size: Option<Value>,
    /// Frame duration in seconds.
    #[serde(default)]
    pub duration_time: Option<Value>,
    /// Packet decode timestamp in seconds.
    #[serde(default)]
    pub pkt_dts_time: Option<Value>,
    /// Packet byte position in the container.
    #[serde(default)]
    pub pkt_pos: Option<Value>,
}

impl ProbeOutput {
    /// Parse the prober's JSON output.
    ///
    /// # Errors
    ///
    /// [`MediaStructError::ProbeParseError`] if the text is not JSON or does
    /// not have the prober's top-level shape.
    pub fn from_json(text: &str) -> Result<Self, MediaStructError> {
        serde_json::from_str(text).map_err(|e| MediaStructError::ProbeParseError(e.to_string()))
    }

    /// Read and parse a file holding the prober's JSON output.
    ///
    /// # Errors
    ///
    /// [`MediaStructError::IoError`] if the file cannot be read, otherwise as
    /// [`from_json`](Self::from_json).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MediaStructError> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    /// The first stream section whose `codec_type` equals `codec_type`.
    pub fn first_stream(&self, codec_type: &str) -> Option<&Map<String, Value>> {
        self.streams
            .iter()
            .find(|stream| stream.get("codec_type").and_then(Value::as_str) == Some(codec_type))
    }
}

/// Read a prober value as an unsigned integer.
pub(crate) fn value_as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Read a prober value as a float. `"N/A"` and other non-numeric text yield
/// `None`.
pub(crate) fn value_as_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Read a prober flag. Integers are true when non-zero.
pub(crate) fn value_as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::Number(number) => number.as_i64().map(|v| v != 0),
        Value::String(text) => match text.trim() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn lenient_numbers() {
        assert_eq!(value_as_u64(&json!("1024")), Some(1024));
        assert_eq!(value_as_u64(&json!(7)), Some(7));
        assert_eq!(value_as_u64(&json!("N/A")), None);
        assert_eq!(value_as_f64(&json!("0.040000")), Some(0.04));
        assert_eq!(value_as_f64(&json!("N/A")), None);
        assert_eq!(value_as_f64(&json!("nan")), None);
        assert_eq!(value_as_bool(&json!(1)), Some(true));
        assert_eq!(value_as_bool(&json!(0)), Some(false));
        assert_eq!(value_as_bool(&json!(null)), None);
    }

    #[test]
    fn malformed_json_is_a_probe_error() {
        assert!(matches!(
            ProbeOutput::from_json("{\"frames\": ["),
            Err(MediaStructError::ProbeParseError(_))
        ));
        assert!(matches!(
            ProbeOutput::from_json("[1, 2, 3]"),
            Err(MediaStructError::ProbeParseError(_))
        ));
    }

    #[test]
    fn first_stream_by_codec_type() {
        let probe = ProbeOutput::from_json(
            r#"{"streams": [{"index": 0, "codec_type": "audio"}, {"index": 1, "codec_type": "video"}]}"#,
        )
        .unwrap();
        let video = probe.first_stream("video").unwrap();
        assert_eq!(video.get("index"), Some(&json!(1)));
    }
}

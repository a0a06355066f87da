//! Probed frame records.
//!
//! A [`ProbedFrame`] is one entry of the prober's per-frame listing after it
//! has been classified. Video frames carry a closed [`PictureType`]; the key
//! flag only exists on I-frames, where it decides whether a GOP is closed.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::Serialize;

use crate::error::MediaStructError;
use crate::probe::{RawFrame, value_as_bool, value_as_f64, value_as_u64};

/// Media type of a probed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    /// A video frame.
    Video,
    /// An audio frame.
    Audio,
}

/// Coding type of a video frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PictureType {
    /// Intra-coded frame. `is_key` is `true` only when the prober flagged it
    /// as a key frame (an IDR picture), which is what makes a GOP closed.
    I {
        /// Whether the prober reported this I-frame as a key frame.
        is_key: bool,
    },
    /// Predicted frame.
    P,
    /// Bidirectionally predicted frame.
    B,
}

impl PictureType {
    /// Single-character symbol used in GOP patterns: `I` for a key I-frame,
    /// `i` for a non-key I-frame, `P` and `B` otherwise.
    pub fn symbol(self) -> char {
        match self {
            PictureType::I { is_key: true } => 'I',
            PictureType::I { is_key: false } => 'i',
            PictureType::P => 'P',
            PictureType::B => 'B',
        }
    }

    /// Returns `true` for I-frames, key or not.
    pub fn is_intra(self) -> bool {
        matches!(self, PictureType::I { .. })
    }

    /// Returns `true` only for key I-frames.
    pub fn is_key_intra(self) -> bool {
        matches!(self, PictureType::I { is_key: true })
    }

    /// The plain picture type letter (`"I"`, `"P"` or `"B"`) as reported by
    /// the prober.
    pub fn letter(self) -> &'static str {
        match self {
            PictureType::I { .. } => "I",
            PictureType::P => "P",
            PictureType::B => "B",
        }
    }

    fn classify(pict_type: &str, key_frame: Option<bool>) -> Option<Self> {
        match pict_type.trim() {
            "I" => Some(PictureType::I {
                is_key: key_frame == Some(true),
            }),
            "P" => Some(PictureType::P),
            "B" => Some(PictureType::B),
            _ => None,
        }
    }
}

impl Display for PictureType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.symbol())
    }
}

/// What kind of frame a [`ProbedFrame`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// A video frame with its picture type.
    Video(PictureType),
    /// An audio frame.
    Audio,
}

impl FrameKind {
    /// The media type of this frame.
    pub fn media_type(self) -> MediaType {
        match self {
            FrameKind::Video(_) => MediaType::Video,
            FrameKind::Audio => MediaType::Audio,
        }
    }
}

/// A classified frame from the prober output.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbedFrame {
    /// Position of the frame in the prober's listing (decode order, audio
    /// and video interleaved).
    pub index: u64,
    /// Media and picture type.
    pub kind: FrameKind,
    /// The key frame flag exactly as reported. `None` means the prober did
    /// not say, which is not the same as `Some(false)`.
    pub key_frame: Option<bool>,
    /// Packet size in bytes.
    pub size_bytes: u64,
    /// Frame duration in seconds.
    pub duration_time: Option<f64>,
    /// Decode timestamp in seconds.
    pub decode_timestamp: Option<f64>,
    /// Byte offset of the packet in the container.
    pub byte_offset: Option<u64>,
}

impl ProbedFrame {
    /// Classify a raw prober frame record.
    ///
    /// Returns `Ok(None)` for frames that cannot be classified (a media type
    /// other than audio/video, or a video frame without an I/P/B picture
    /// type). The caller decides how to report those.
    ///
    /// # Errors
    ///
    /// [`MediaStructError::ProbeParseError`] if a classifiable frame has no
    /// usable `pkt_size`.
    pub fn from_raw(index: u64, raw: &RawFrame) -> Result<Option<Self>, MediaStructError> {
        let key_frame = raw.key_frame.as_ref().and_then(value_as_bool);

        let kind = match raw.media_type.as_deref() {
            Some("video") => {
                match raw
                    .pict_type
                    .as_deref()
                    .and_then(|pict| PictureType::classify(pict, key_frame))
                {
                    Some(picture) => FrameKind::Video(picture),
                    None => return Ok(None),
                }
            }
            Some("audio") => FrameKind::Audio,
            _ => return Ok(None),
        };

        let size_bytes = raw
            .pkt_size
            .as_ref()
            .and_then(value_as_u64)
            .ok_or_else(|| {
                MediaStructError::ProbeParseError(format!(
                    "frame {index} has no usable pkt_size"
                ))
            })?;

        Ok(Some(ProbedFrame {
            index,
            kind,
            key_frame,
            size_bytes,
            duration_time: raw.duration_time.as_ref().and_then(value_as_f64),
            decode_timestamp: raw.pkt_dts_time.as_ref().and_then(value_as_f64),
            byte_offset: raw.pkt_pos.as_ref().and_then(value_as_u64),
        }))
    }

    /// The picture type, for video frames.
    pub fn picture_type(&self) -> Option<PictureType> {
        match self.kind {
            FrameKind::Video(picture) => Some(picture),
            FrameKind::Audio => None,
        }
    }

    /// Returns `true` for video frames.
    pub fn is_video(&self) -> bool {
        matches!(self.kind, FrameKind::Video(_))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn raw(value: serde_json::Value) -> RawFrame {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn key_flag_only_matters_on_i_frames() {
        let frame = ProbedFrame::from_raw(
            0,
            &raw(json!({"media_type": "video", "pict_type": "I", "key_frame": 1, "pkt_size": "100"})),
        )
        .unwrap()
        .unwrap();
        assert_eq!(frame.kind, FrameKind::Video(PictureType::I { is_key: true }));

        let frame = ProbedFrame::from_raw(
            1,
            &raw(json!({"media_type": "video", "pict_type": "P", "key_frame": 1, "pkt_size": 10})),
        )
        .unwrap()
        .unwrap();
        assert_eq!(frame.kind, FrameKind::Video(PictureType::P));
        assert_eq!(frame.key_frame, Some(true));
    }

    #[test]
    fn missing_key_flag_stays_unknown() {
        let frame = ProbedFrame::from_raw(
            3,
            &raw(json!({"media_type": "video", "pict_type": "I", "pkt_size": "42"})),
        )
        .unwrap()
        .unwrap();
        assert_eq!(frame.key_frame, None);
        assert_eq!(frame.picture_type().map(PictureType::symbol), Some('i'));
    }

    #[test]
    fn unclassifiable_frames_are_skipped() {
        let data = raw(json!({"media_type": "subtitle", "pkt_size": "1"}));
        assert!(ProbedFrame::from_raw(0, &data).unwrap().is_none());

        let unknown_picture = raw(json!({"media_type": "video", "pict_type": "?", "pkt_size": "1"}));
        assert!(ProbedFrame::from_raw(0, &unknown_picture).unwrap().is_none());
    }

    #[test]
    fn missing_size_is_a_parse_error() {
        let data = raw(json!({"media_type": "audio"}));
        assert!(matches!(
            ProbedFrame::from_raw(7, &data),
            Err(MediaStructError::ProbeParseError(_))
        ));
    }
}

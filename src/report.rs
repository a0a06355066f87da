//! Stream structure reports.
//!
//! [`StreamReport`] turns a complete prober output into the structural
//! summary downstream QC and ad-placement tooling consume: stream info with
//! the maximum GOP size, a GOP table, and reduced per-frame tables for video
//! and audio.
//!
//! # Example
//!
//! ```
//! use mediastruct::{AnalysisOptions, StreamReport};
//!
//! let probe = r#"{
//!     "format": {"format_name": "mov,mp4"},
//!     "streams": [{"codec_type": "video", "codec_name": "h264"}],
//!     "frames": [
//!         {"media_type": "video", "pict_type": "I", "key_frame": 1, "pkt_size": "900"},
//!         {"media_type": "video", "pict_type": "P", "key_frame": 0, "pkt_size": "120"},
//!         {"media_type": "audio", "pkt_size": "40"}
//!     ]
//! }"#;
//!
//! let report = StreamReport::from_probe_json(probe, &AnalysisOptions::default())?;
//! assert_eq!(report.video_stream_info.max_gop_size, Some(2));
//! assert_eq!(report.gop_table[0].pattern, "IP");
//! assert_eq!(report.audio_frames.len(), 1);
//! assert!(report.audio_stream_info.is_empty());
//! # Ok::<(), mediastruct::MediaStructError>(())
//! ```

use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::AnalysisOptions;
use crate::error::MediaStructError;
use crate::frame::{FrameKind, ProbedFrame};
use crate::gop::{Gop, GopAccumulator, GopStatistics, GopSummary};
use crate::parallel::map_ordered;
use crate::probe::ProbeOutput;
use crate::validation::{ValidationReport, validate_stream_report};

/// Stream-level fields passed through from the prober, plus the computed
/// maximum GOP size for video.
///
/// A missing stream is an empty mapping, never a missing key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StreamInfo {
    /// The prober's stream section, unchanged.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    /// Largest GOP in frames. Absent when there are no video frames.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_gop_size: Option<usize>,
}

impl StreamInfo {
    /// Returns `true` when no stream information is present.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.max_gop_size.is_none()
    }

    /// A string field of the stream section, e.g. `codec_name`.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}

/// Reduced record of a video frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoFrameRecord {
    /// Position in the prober's frame listing.
    pub frame_index: u64,
    /// Packet size in bytes.
    pub size_bytes: u64,
    /// Frame duration in seconds.
    pub duration_time: Option<f64>,
    /// Decode timestamp in seconds.
    pub pkt_dts_time: Option<f64>,
    /// Byte offset in the container.
    pub pkt_pos: Option<u64>,
    /// `"I"`, `"P"` or `"B"`.
    #[serde(rename = "type")]
    pub picture_type: &'static str,
    /// Key frame flag, `null` when the prober did not report one.
    pub key_frame: Option<bool>,
}

/// Reduced record of an audio frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioFrameRecord {
    /// Position in the prober's frame listing.
    pub frame_index: u64,
    /// Packet size in bytes.
    pub size_bytes: u64,
    /// Frame duration in seconds.
    pub duration_time: Option<f64>,
    /// Decode timestamp in seconds.
    pub pkt_dts_time: Option<f64>,
}

/// Structural report for one probed media file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StreamReport {
    /// First video stream plus `max_gop_size`.
    pub video_stream_info: StreamInfo,
    /// Reduced video frame records in decode order.
    pub video_frames: Vec<VideoFrameRecord>,
    /// First audio stream.
    pub audio_stream_info: StreamInfo,
    /// Reduced audio frame records in decode order.
    pub audio_frames: Vec<AudioFrameRecord>,
    /// Container format section, unchanged.
    pub container_format_info: Map<String, Value>,
    /// One row per GOP. Empty exactly when there are no video frames.
    pub gop_table: Vec<GopSummary>,
}

impl StreamReport {
    /// Parse prober JSON and build the report.
    ///
    /// # Errors
    ///
    /// [`MediaStructError::ProbeParseError`] if the JSON is malformed or a
    /// frame has no usable packet size.
    pub fn from_probe_json(text: &str, options: &AnalysisOptions) -> Result<Self, MediaStructError> {
        let probe = ProbeOutput::from_json(text)?;
        Self::from_probe(&probe, options)
    }

    /// Read a prober JSON file and build the report.
    pub fn from_probe_file<P: AsRef<Path>>(path: P, options: &AnalysisOptions) -> Result<Self, MediaStructError> {
        let probe = ProbeOutput::from_file(path)?;
        Self::from_probe(&probe, options)
    }

    /// Build the report from parsed prober output.
    ///
    /// Frames are visited once. Video frames feed the GOP accumulator and
    /// the video table, audio frames go straight to the audio table, and
    /// anything else is dropped with a warning.
    pub fn from_probe(probe: &ProbeOutput, options: &AnalysisOptions) -> Result<Self, MediaStructError> {
        log::debug!(
            "Building stream report ({} streams, {} frames)",
            probe.streams.len(),
            probe.frames.len()
        );

        let mut accumulator = GopAccumulator::new();
        let mut gops: Vec<Gop> = Vec::new();
        let mut video_frames = Vec::new();
        let mut audio_frames = Vec::new();

        for (index, raw) in probe.frames.iter().enumerate() {
            let Some(frame) = ProbedFrame::from_raw(index as u64, raw)? else {
                log::warn!(
                    "dropping unclassified frame {index} (media_type={:?}, pict_type={:?})",
                    raw.media_type,
                    raw.pict_type
                );
                continue;
            };

            match frame.kind {
                FrameKind::Video(picture) => {
                    if options.include_frame_tables {
                        video_frames.push(VideoFrameRecord {
                            frame_index: frame.index,
                            size_bytes: frame.size_bytes,
                            duration_time: frame.duration_time,
                            pkt_dts_time: frame.decode_timestamp,
                            pkt_pos: frame.byte_offset,
                            picture_type: picture.letter(),
                            key_frame: frame.key_frame,
                        });
                    }
                    gops.extend(accumulator.push(frame));
                }
                FrameKind::Audio => {
                    if options.include_frame_tables {
                        audio_frames.push(AudioFrameRecord {
                            frame_index: frame.index,
                            size_bytes: frame.size_bytes,
                            duration_time: frame.duration_time,
                            pkt_dts_time: frame.decode_timestamp,
                        });
                    }
                }
            }
        }
        gops.extend(accumulator.finish());

        let max_gop_size = gops.iter().map(Gop::len).max();
        let video_stream_info = StreamInfo {
            fields: probe.first_stream("video").cloned().unwrap_or_default(),
            max_gop_size,
        };
        let audio_stream_info = StreamInfo {
            fields: probe.first_stream("audio").cloned().unwrap_or_default(),
            max_gop_size: None,
        };

        Ok(StreamReport {
            video_stream_info,
            video_frames,
            audio_stream_info,
            audio_frames,
            container_format_info: probe.format.clone(),
            gop_table: gops.iter().map(Gop::summary).collect(),
        })
    }

    /// Aggregate GOP statistics, or `None` without video frames.
    pub fn gop_statistics(&self) -> Option<GopStatistics> {
        GopStatistics::from_table(&self.gop_table)
    }

    /// Check the report for structural issues such as open GOPs or
    /// zero-size packets.
    pub fn validate(&self) -> ValidationReport {
        validate_stream_report(self)
    }

    /// Serialize the report as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, MediaStructError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Build reports for several prober outputs.
///
/// Each input succeeds or fails on its own; results are returned in input
/// order. With [`AnalysisOptions::parallel`] and the `rayon` feature the
/// inputs are analyzed concurrently.
pub fn analyze_probe_batch(
    inputs: &[&str],
    options: &AnalysisOptions,
) -> Vec<Result<StreamReport, MediaStructError>> {
    map_ordered(inputs, options, |_, text| StreamReport::from_probe_json(text, options))
}

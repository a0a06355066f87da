//! # mediastruct
//!
//! Structural analysis of media streams and DASH manifests.
//!
//! `mediastruct` turns two kinds of input into plain, serializable reports:
//! the per-frame JSON a media prober prints for a file, which becomes a
//! Group-of-Pictures summary, and an MPD manifest, which becomes a
//! description of its periods, representations, codecs, DRM signaling and
//! SCTE-35 ad cues. Every analysis is a pure function of its input; nothing
//! is fetched, decoded or cached.
//!
//! ## Quick Start
//!
//! ### GOP structure from prober output
//!
//! ```
//! use mediastruct::{AnalysisOptions, StreamReport};
//!
//! // ffprobe -print_format json -show_format -show_streams -show_frames input.mp4
//! let probe = r#"{"frames": [
//!     {"media_type": "video", "pict_type": "I", "key_frame": 1, "pkt_size": "4000"},
//!     {"media_type": "video", "pict_type": "B", "key_frame": 0, "pkt_size": "300"},
//!     {"media_type": "video", "pict_type": "P", "key_frame": 0, "pkt_size": "900"},
//!     {"media_type": "video", "pict_type": "I", "key_frame": 0, "pkt_size": "3900"}
//! ]}"#;
//!
//! let report = StreamReport::from_probe_json(probe, &AnalysisOptions::default())?;
//! let patterns: Vec<_> = report.gop_table.iter().map(|row| row.pattern.as_str()).collect();
//! assert_eq!(patterns, ["IBP", "i"]);
//! # Ok::<(), mediastruct::MediaStructError>(())
//! ```
//!
//! ### Manifest layout
//!
//! ```
//! use mediastruct::{AnalysisOptions, analyze_manifest_str};
//!
//! let mpd = r#"<MPD xmlns="urn:mpeg:dash:schema:mpd:2011" minBufferTime="PT4S">
//!   <Period id="ad-1"><AdaptationSet mimeType="video/mp4">
//!     <Representation id="v"><SegmentTemplate media="asset/ad-1/$Number$.mp4"/></Representation>
//!   </AdaptationSet></Period>
//! </MPD>"#;
//!
//! let report = analyze_manifest_str(mpd, &AnalysisOptions::default())?;
//! let period = report.analyzed_periods().next().unwrap();
//! assert_eq!(period.content, Some(mediastruct::manifest::PeriodContent::Ad));
//! # Ok::<(), mediastruct::MediaStructError>(())
//! ```
//!
//! ## Features
//!
//! - **GOP classification**: single-pass partitioning on I-frames, closed vs.
//!   open GOPs, maximum GOP size and GOP statistics
//! - **Reduced frame tables**: per-frame size and timing for video and audio
//! - **Manifest walking**: manifest, period and representation attributes,
//!   segment timeline durations per media kind, trick-mode detection
//! - **Codec resolution**: AVC profile and level from `avc1` codec tags
//! - **SCTE-35 cues**: splice insert and time signal extraction
//! - **Duration codec**: conversions between `HHH:MM:SS.mmm`, H/M/S letter
//!   strings, truncated ISO 8601 durations and seconds, plus arithmetic
//! - **Validation**: QC findings over stream and manifest reports
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `rayon` | Analyze manifest periods and batch probe inputs in parallel |
//! | `full` | Enables all of the above |
//!
//! ## Logging
//!
//! The crate logs through the [`log`](https://crates.io/crates/log) facade:
//! dropped frames and degraded optional fields are reported at `warn`,
//! analysis steps at `debug`. Install any logger (the `mediastruct` binary
//! uses `env_logger`) to see them.

pub mod codec;
pub mod config;
pub mod duration;
pub mod error;
pub mod frame;
pub mod gop;
pub mod manifest;
mod parallel;
pub mod probe;
pub mod report;
pub mod scte35;
pub mod validation;
pub mod xml;

pub use codec::{AvcProfileLevel, CodecProperty, avc_profile_and_level};
pub use config::AnalysisOptions;
pub use error::MediaStructError;
pub use frame::{FrameKind, MediaType, PictureType, ProbedFrame};
pub use gop::{Gop, GopAccumulator, GopClassifier, GopStatistics, GopSummary};
pub use manifest::{
    ManifestAnalyzer, ManifestReport, ManifestSummary, PeriodOutcome, PeriodReport,
    PeriodSummary, RepresentationSummary, analyze_manifest_file, analyze_manifest_str,
};
pub use probe::{ProbeOutput, RawFrame};
pub use report::{StreamReport, analyze_probe_batch};
pub use scte35::{Scte35Cue, Scte35Kind};
pub use validation::ValidationReport;
pub use xml::Namespace;

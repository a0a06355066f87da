//! Quality-control checks over analysis reports.
//!
//! Provides [`StreamReport::validate`](crate::StreamReport::validate) and
//! [`ManifestReport::validate`](crate::ManifestReport::validate), which look
//! for structural problems that downstream QC gating cares about and collect
//! them in a [`ValidationReport`].
//!
//! # Example
//!
//! ```
//! use mediastruct::{AnalysisOptions, StreamReport};
//!
//! let report = StreamReport::from_probe_json(
//!     r#"{"frames": [{"media_type": "video", "pict_type": "P", "pkt_size": "0"}]}"#,
//!     &AnalysisOptions::default(),
//! )?;
//! let validation = report.validate();
//! assert!(validation.is_valid());
//! for warning in &validation.warnings {
//!     println!("Warning: {warning}");
//! }
//! # Ok::<(), mediastruct::MediaStructError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::Serialize;

use crate::manifest::{ManifestReport, ManifestType, PeriodContent, PeriodOutcome};
use crate::report::StreamReport;
use crate::scte35::Scte35Kind;

const ZERO_DURATION: &str = "000:00:00.000";

/// Findings of a validation pass.
///
/// Contains lists of informational notices, warnings, and errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Informational notices (not problems).
    pub info: Vec<String>,
    /// Non-fatal issues worth a look before the report is used.
    pub warnings: Vec<String>,
    /// Issues that make the analyzed input unusable.
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// Returns `true` if no errors were found.
    ///
    /// Warnings do not affect this result, only errors make the report
    /// invalid.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Total number of issues (info + warnings + errors).
    pub fn issue_count(&self) -> usize {
        self.info.len() + self.warnings.len() + self.errors.len()
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for item in &self.info {
            writeln!(f, "[INFO] {item}")?;
        }
        for item in &self.warnings {
            writeln!(f, "[WARN] {item}")?;
        }
        for item in &self.errors {
            writeln!(f, "[ERROR] {item}")?;
        }
        if self.issue_count() == 0 {
            writeln!(f, "No issues found.")?;
        }
        Ok(())
    }
}

/// Run validation checks on a stream report.
pub(crate) fn validate_stream_report(stream: &StreamReport) -> ValidationReport {
    let mut report = ValidationReport::default();

    let has_video = !stream.gop_table.is_empty() || !stream.video_stream_info.fields.is_empty();
    let has_audio = !stream.audio_frames.is_empty() || !stream.audio_stream_info.fields.is_empty();

    // ── Stream presence ────────────────────────────────────────────
    if !has_video && !has_audio {
        report
            .errors
            .push("Probe output contains neither video nor audio".to_string());
    }
    if !has_video {
        report.info.push("No video stream found".to_string());
    }
    if !has_audio {
        report.info.push("No audio stream found".to_string());
    }

    // ── GOP structure ──────────────────────────────────────────────
    if let Some(stats) = stream.gop_statistics() {
        report.info.push(format!(
            "Video: {} GOPs, {}..{} frames (average {:.1})",
            stats.count, stats.min_size, stats.max_size, stats.average_size,
        ));

        if stats.open_count() > 0 {
            report
                .warnings
                .push(format!("{} of {} GOPs are open", stats.open_count(), stats.count));
        }

        // The final GOP is usually cut short by the end of the stream.
        let sizes: Vec<usize> = stream.gop_table.iter().map(|row| row.frame_count).collect();
        let complete = sizes.split_last().map_or(&[][..], |(_, rest)| rest);
        if let (Some(min), Some(max)) = (complete.iter().min(), complete.iter().max()) {
            if min != max {
                report
                    .warnings
                    .push(format!("Irregular GOP sizes: {min}..{max} frames"));
            }
        }
    } else if has_video {
        report
            .warnings
            .push("Video stream present but no video frames were probed".to_string());
    }

    // ── Frame sizes ────────────────────────────────────────────────
    let empty_video = stream.video_frames.iter().filter(|f| f.size_bytes == 0).count();
    if empty_video > 0 {
        report
            .warnings
            .push(format!("{empty_video} video frames have a zero packet size"));
    }
    let empty_audio = stream.audio_frames.iter().filter(|f| f.size_bytes == 0).count();
    if empty_audio > 0 {
        report
            .warnings
            .push(format!("{empty_audio} audio frames have a zero packet size"));
    }

    report
}

/// Run validation checks on a manifest report.
pub(crate) fn validate_manifest_report(manifest: &ManifestReport) -> ValidationReport {
    let mut report = ValidationReport::default();
    let summary = &manifest.manifest;

    // ── Manifest ───────────────────────────────────────────────────
    if summary.manifest_type == ManifestType::Dynamic && summary.minimum_update_period_seconds.is_none() {
        report
            .warnings
            .push("Dynamic manifest has no usable minimumUpdatePeriod".to_string());
    }
    if summary.period_count == 0 {
        report.errors.push("Manifest has no periods".to_string());
    }

    // ── Periods ────────────────────────────────────────────────────
    let mut ads = 0;
    let mut content = 0;
    for outcome in &manifest.periods {
        let period = match outcome {
            PeriodOutcome::Analyzed(period) => period,
            PeriodOutcome::Failed { index, id, error } => {
                report
                    .errors
                    .push(format!("Period {index} ({}) failed: {error}", id.as_deref().unwrap_or("no id")));
                continue;
            }
        };
        let name = period.summary.id.as_deref().unwrap_or("no id");

        if period.adaptation_set_count == 0 {
            report
                .warnings
                .push(format!("Period {} ({name}) has no adaptation sets", period.index));
        }
        if period.scte35.kind == Scte35Kind::SpliceInsert
            && period.scte35.duration.as_deref() == Some(ZERO_DURATION)
        {
            report.warnings.push(format!(
                "Period {} ({name}) has a splice insert with zero break duration",
                period.index
            ));
        }
        match period.content {
            Some(PeriodContent::Ad) => ads += 1,
            Some(PeriodContent::Content) => content += 1,
            None => {}
        }
    }

    report.info.push(format!(
        "{} periods: {ads} ad, {content} content, {} failed",
        manifest.periods.len(),
        manifest.failed_count(),
    ));

    report
}

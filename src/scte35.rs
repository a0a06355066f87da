//! SCTE-35 cue extraction.
//!
//! A period announces an ad break through the first `EventStream` it
//! carries. The event either holds a `SpliceInsert` command or a time signal
//! with a `SegmentationDescriptor`; [`Scte35Cue::from_period`] tells the two
//! apart and normalizes the fields downstream ad-decisioning reads.
//!
//! The two signaling styles default their duration differently: a splice
//! insert without a `BreakDuration` reports a zero duration, while a
//! segmentation descriptor without `segmentationDuration` reports none.
//! Consumers rely on both conventions.

use std::str::FromStr;

use roxmltree::Node;
use serde::Serialize;

use crate::duration::seconds_to_hms;
use crate::xml::{ElementExt, Namespace};

/// Which SCTE-35 signaling a period carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scte35Kind {
    /// A `SpliceInsert` command.
    SpliceInsert,
    /// A time signal with a `SegmentationDescriptor`.
    TimeSignal,
    /// No cue in this period.
    None,
}

/// Normalized ad-break metadata of one period.
///
/// Splice-insert fields are empty for time signals and vice versa; a cue of
/// kind [`Scte35Kind::None`] has every field empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scte35Cue {
    /// Signaling style.
    pub kind: Scte35Kind,
    /// `spliceEventId` or `segmentationEventId`.
    pub event_id: Option<u64>,
    /// `uniqueProgramId` (splice insert).
    pub unique_program_id: Option<u64>,
    /// `availNum` (splice insert).
    pub avail_num: Option<u32>,
    /// `availsExpected` (splice insert).
    pub avails_expected: Option<u32>,
    /// `outOfNetworkIndicator` (splice insert).
    pub out_of_network: Option<bool>,
    /// `spliceEventCancelIndicator` (splice insert).
    pub cancel_indicator: Option<bool>,
    /// `spliceImmediateFlag` (splice insert).
    pub immediate_flag: Option<bool>,
    /// `segmentationTypeId` (time signal).
    pub segmentation_type_id: Option<u32>,
    /// Break duration as `HHH:MM:SS.mmm`.
    pub duration: Option<String>,
}

impl Default for Scte35Cue {
    fn default() -> Self {
        Self::none()
    }
}

impl Scte35Cue {
    /// The empty cue.
    pub fn none() -> Self {
        Scte35Cue {
            kind: Scte35Kind::None,
            event_id: None,
            unique_program_id: None,
            avail_num: None,
            avails_expected: None,
            out_of_network: None,
            cancel_indicator: None,
            immediate_flag: None,
            segmentation_type_id: None,
            duration: None,
        }
    }

    /// Extract the cue of a `Period` element.
    ///
    /// Malformed cue attributes degrade to absent values with a warning;
    /// extraction itself never fails.
    pub fn from_period(period: Node<'_, '_>) -> Self {
        let Some(stream) = period.child_in(Namespace::Mpd, "EventStream") else {
            return Self::none();
        };
        let timescale = match optional::<u64>(stream, "timescale") {
            Some(0) => {
                log::warn!("EventStream@timescale is zero, cue durations dropped");
                None
            }
            Some(timescale) => Some(timescale),
            None if stream.attr("timescale").is_some() => None,
            None => Some(1),
        };

        if let Some(splice) = stream.descendant_in(Namespace::Scte35, "SpliceInsert") {
            let duration = match splice.descendant_in(Namespace::Scte35, "BreakDuration") {
                Some(element) => scaled_duration(element, "duration", timescale),
                None => Some(seconds_to_hms(0.0)),
            };
            return Scte35Cue {
                kind: Scte35Kind::SpliceInsert,
                event_id: optional(splice, "spliceEventId"),
                unique_program_id: optional(splice, "uniqueProgramId"),
                avail_num: optional(splice, "availNum"),
                avails_expected: optional(splice, "availsExpected"),
                out_of_network: flag(splice, "outOfNetworkIndicator"),
                cancel_indicator: flag(splice, "spliceEventCancelIndicator"),
                immediate_flag: flag(splice, "spliceImmediateFlag"),
                duration,
                ..Self::none()
            };
        }

        if let Some(descriptor) = stream.descendant_in(Namespace::Scte35, "SegmentationDescriptor") {
            return Scte35Cue {
                kind: Scte35Kind::TimeSignal,
                event_id: optional(descriptor, "segmentationEventId"),
                segmentation_type_id: optional(descriptor, "segmentationTypeId"),
                duration: scaled_duration(descriptor, "segmentationDuration", timescale),
                ..Self::none()
            };
        }

        Self::none()
    }

    /// Returns `true` when the period carries a cue.
    pub fn is_present(&self) -> bool {
        self.kind != Scte35Kind::None
    }
}

fn optional<T: FromStr>(element: Node<'_, '_>, name: &str) -> Option<T> {
    element.parse_attr(name).unwrap_or_else(|error| {
        log::warn!("ignoring SCTE-35 attribute: {error}");
        None
    })
}

fn flag(element: Node<'_, '_>, name: &str) -> Option<bool> {
    match element.attr(name)? {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        other => {
            log::warn!("ignoring SCTE-35 flag {name}={other:?}");
            None
        }
    }
}

/// Ticks in attribute `name` divided by the event stream timescale.
fn scaled_duration(element: Node<'_, '_>, name: &str, timescale: Option<u64>) -> Option<String> {
    let ticks: u64 = optional(element, name)?;
    let timescale = timescale?;
    Some(seconds_to_hms(ticks as f64 / timescale as f64))
}

//! DASH manifest walker.
//!
//! [`ManifestAnalyzer`] reads a parsed MPD document and describes it at four
//! levels: the manifest itself, each period, each representation of a
//! period, and the SCTE-35 cue a period carries. [`ManifestAnalyzer::analyze`]
//! combines them into a [`ManifestReport`] in which every period succeeds or
//! fails on its own.
//!
//! # Example
//!
//! ```
//! use mediastruct::{AnalysisOptions, analyze_manifest_str};
//! use mediastruct::manifest::PeriodOutcome;
//!
//! let mpd = r#"<MPD xmlns="urn:mpeg:dash:schema:mpd:2011" type="static" minBufferTime="PT2S">
//!   <Period id="main" duration="PT30S">
//!     <AdaptationSet mimeType="video/mp4" id="1">
//!       <SegmentTemplate timescale="90000" media="main/$Number$.m4s">
//!         <SegmentTimeline><S d="180000" r="14"/></SegmentTimeline>
//!       </SegmentTemplate>
//!       <Representation id="v1" codecs="avc1.64001F" bandwidth="3000000"/>
//!     </AdaptationSet>
//!   </Period>
//! </MPD>"#;
//!
//! let report = analyze_manifest_str(mpd, &AnalysisOptions::default())?;
//! assert_eq!(report.manifest.min_buffer_time_seconds, 2.0);
//! let PeriodOutcome::Analyzed(period) = &report.periods[0] else { panic!() };
//! assert_eq!(period.summary.max_duration_by_kind.video, "000:00:30.000");
//! assert_eq!(period.representations[0].codec_profile.unwrap().as_str(), "High");
//! # Ok::<(), mediastruct::MediaStructError>(())
//! ```

use std::fs;
use std::path::Path;
use std::str::FromStr;

use roxmltree::{Document, Node};
use serde::Serialize;

use crate::codec::{CodecProperty, avc_profile_and_level};
use crate::config::AnalysisOptions;
use crate::duration::{iso_duration_to_seconds, seconds_to_hms, truncated_duration_to_hms};
use crate::error::MediaStructError;
use crate::parallel::map_ordered;
use crate::scte35::Scte35Cue;
use crate::validation::{ValidationReport, validate_manifest_report};
use crate::xml::{ElementExt, Namespace};

const TRICK_MODE_SCHEME: &str = "http://dashif.org/guidelines/trickmode";
const NO_LABEL: &str = "N/A";

/// `MPD@type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestType {
    /// On-demand presentation.
    #[default]
    Static,
    /// Live presentation that is updated over time.
    Dynamic,
}

/// Manifest-level attributes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestSummary {
    /// `availabilityStartTime`, verbatim.
    pub availability_start_time: Option<String>,
    /// `publishTime`, verbatim.
    pub publish_time: Option<String>,
    /// `minBufferTime` in seconds.
    pub min_buffer_time_seconds: f64,
    /// `suggestedPresentationDelay` in seconds.
    pub suggested_presentation_delay_seconds: Option<f64>,
    /// `minimumUpdatePeriod` in seconds.
    pub minimum_update_period_seconds: Option<f64>,
    /// `timeShiftBufferDepth` in the H/M/S letter form.
    pub time_shift_buffer: Option<String>,
    /// `MPD@type`, static when absent.
    pub manifest_type: ManifestType,
    /// Number of `Period` elements.
    pub period_count: usize,
    /// Number of `AdaptationSet` elements in the first period.
    pub adaptation_set_count_of_first_period: usize,
    /// Manifest-level `BaseURL`.
    pub base_url: Option<String>,
    /// Manifest-level `Location`.
    pub location: Option<String>,
}

/// Longest segment timeline per media kind, each as `HHH:MM:SS.mmm`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaxDurationByKind {
    /// Longest `video/*` timeline.
    pub video: String,
    /// Longest `audio/*` timeline.
    pub audio: String,
    /// Longest `application/*` (subtitle) timeline.
    pub subtitle: String,
}

/// Period-level attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodSummary {
    /// `Period@id`.
    pub id: Option<String>,
    /// `Period@duration` in the H/M/S letter form. Usually absent for the
    /// last period of a live manifest.
    pub duration: Option<String>,
    /// `Period@start` in the H/M/S letter form.
    pub start: Option<String>,
    /// Period-level `BaseURL`.
    pub base_url: Option<String>,
    /// Longest segment timeline per media kind.
    pub max_duration_by_kind: MaxDurationByKind,
}

/// One representation, with the adaptation set attributes it inherits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepresentationSummary {
    /// `AdaptationSet@id`.
    pub adaptation_set_id: Option<String>,
    /// `Representation@id`.
    pub representation_id: Option<String>,
    /// DRM identifiers of the `ContentProtection` elements that apply, in
    /// document order.
    pub content_protection_schemes: Vec<String>,
    /// Mime type, suffixed `_TrickMode` for trick-mode adaptation sets.
    pub mime_type: Option<String>,
    /// `AdaptationSet@lang`.
    pub language: Option<String>,
    /// Text of the adaptation set `Label`, `"N/A"` when there is none.
    pub language_label: String,
    /// `codecs` attribute.
    pub codec_tag: Option<String>,
    /// AVC profile, absent for other codecs.
    pub codec_profile: Option<CodecProperty>,
    /// AVC level, absent for other codecs.
    pub codec_level: Option<CodecProperty>,
    /// `Representation@bandwidth` in bits per second.
    pub bandwidth: Option<u64>,
    /// Width in pixels.
    pub width: Option<u32>,
    /// Height in pixels.
    pub height: Option<u32>,
    /// `frameRate`, from the representation or else its adaptation set.
    pub frame_rate: Option<String>,
    /// `audioSamplingRate`, from the representation or else its adaptation
    /// set.
    pub audio_sampling_rate: Option<String>,
}

/// Whether a period plays an ad or the main content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodContent {
    /// The sampled segment template contains the asset marker.
    Ad,
    /// The sampled segment template does not contain the asset marker.
    Content,
}

/// Everything extracted from one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodReport {
    /// Position of the period in the manifest.
    pub index: usize,
    /// Period-level attributes.
    pub summary: PeriodSummary,
    /// Number of adaptation sets in the period.
    pub adaptation_set_count: usize,
    /// Representations in document order.
    pub representations: Vec<RepresentationSummary>,
    /// SCTE-35 cue of the period.
    pub scte35: Scte35Cue,
    /// Ad or content, absent for a period without representations.
    pub content: Option<PeriodContent>,
}

/// Result of analyzing one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PeriodOutcome {
    /// The period was analyzed.
    Analyzed(PeriodReport),
    /// A mandatory period value was unusable.
    Failed {
        /// Position of the period in the manifest.
        index: usize,
        /// `Period@id`, if any.
        id: Option<String>,
        /// What went wrong.
        error: String,
    },
}

impl PeriodOutcome {
    /// The report, if the period was analyzed.
    pub fn report(&self) -> Option<&PeriodReport> {
        match self {
            PeriodOutcome::Analyzed(report) => Some(report),
            PeriodOutcome::Failed { .. } => None,
        }
    }
}

/// Structured description of a whole manifest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestReport {
    /// Manifest-level attributes.
    pub manifest: ManifestSummary,
    /// One outcome per period, in document order.
    pub periods: Vec<PeriodOutcome>,
}

impl ManifestReport {
    /// Reports of the periods that were analyzed.
    pub fn analyzed_periods(&self) -> impl Iterator<Item = &PeriodReport> {
        self.periods.iter().filter_map(PeriodOutcome::report)
    }

    /// Number of periods that failed.
    pub fn failed_count(&self) -> usize {
        self.periods.len() - self.analyzed_periods().count()
    }

    /// Check the report for failed periods, missing adaptation sets and
    /// other issues.
    pub fn validate(&self) -> ValidationReport {
        validate_manifest_report(self)
    }

    /// Serialize the report as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, MediaStructError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Walker over a parsed MPD document.
///
/// The analyzer borrows the document and holds no other state, so every
/// call on the same document returns the same result.
#[derive(Debug, Clone, Copy)]
pub struct ManifestAnalyzer<'a, 'input> {
    root: Node<'a, 'input>,
}

impl<'a, 'input> ManifestAnalyzer<'a, 'input> {
    /// Wrap a parsed document.
    ///
    /// # Errors
    ///
    /// [`MediaStructError::MalformedManifest`] if the root element is not an
    /// `MPD` element.
    pub fn new(document: &'a Document<'input>) -> Result<Self, MediaStructError> {
        let root = document.root_element();
        if !root.has_name(Namespace::Mpd, "MPD") {
            return Err(MediaStructError::MalformedManifest(format!(
                "root element is <{}>, expected <MPD>",
                root.tag_name().name()
            )));
        }
        Ok(ManifestAnalyzer { root })
    }

    /// Manifest-level attributes.
    ///
    /// # Errors
    ///
    /// [`MediaStructError::MalformedManifest`] if `minBufferTime` is missing
    /// and [`MediaStructError::MalformedDuration`] if it cannot be parsed.
    pub fn manifest_info(&self) -> Result<ManifestSummary, MediaStructError> {
        let root = self.root;
        let min_buffer_time = root.attr("minBufferTime").ok_or_else(|| {
            MediaStructError::MalformedManifest("MPD@minBufferTime is missing".to_string())
        })?;

        let manifest_type = match root.attr("type") {
            None | Some("static") => ManifestType::Static,
            Some("dynamic") => ManifestType::Dynamic,
            Some(other) => {
                log::warn!("unknown MPD@type {other:?}, treating as static");
                ManifestType::Static
            }
        };

        let periods = self.periods();
        let adaptation_set_count_of_first_period = periods
            .first()
            .map_or(0, |period| period.children_in(Namespace::Mpd, "AdaptationSet").count());

        Ok(ManifestSummary {
            availability_start_time: root.attr("availabilityStartTime").map(str::to_string),
            publish_time: root.attr("publishTime").map(str::to_string),
            min_buffer_time_seconds: iso_duration_to_seconds(min_buffer_time)?,
            suggested_presentation_delay_seconds: optional_seconds(root, "suggestedPresentationDelay"),
            minimum_update_period_seconds: optional_seconds(root, "minimumUpdatePeriod"),
            time_shift_buffer: root.attr("timeShiftBufferDepth").and_then(|value| {
                let converted = truncated_duration_to_hms(value);
                if converted.is_none() {
                    log::warn!("ignoring MPD@timeShiftBufferDepth {value:?}");
                }
                converted
            }),
            manifest_type,
            period_count: periods.len(),
            adaptation_set_count_of_first_period,
            base_url: child_text(root, "BaseURL"),
            location: child_text(root, "Location"),
        })
    }

    /// The `Period` elements in document order.
    pub fn periods(&self) -> Vec<Node<'a, 'input>> {
        self.root.children_in(Namespace::Mpd, "Period").collect()
    }

    /// Period-level attributes and the longest segment timeline per media
    /// kind.
    ///
    /// Representations without a segment timeline do not contribute.
    ///
    /// # Errors
    ///
    /// [`MediaStructError::MalformedManifest`] if a timescale is zero or not
    /// a number, or a timeline segment has an unusable `d` or `r`.
    pub fn period_info(&self, period: Node<'a, 'input>) -> Result<PeriodSummary, MediaStructError> {
        let id = period.attr("id").map(str::to_string);
        log::debug!("Analyzing period {id:?}");

        let mut video = 0.0_f64;
        let mut audio = 0.0_f64;
        let mut subtitle = 0.0_f64;

        for set in period.children_in(Namespace::Mpd, "AdaptationSet") {
            let set_template = set.child_in(Namespace::Mpd, "SegmentTemplate");
            for representation in set.children_in(Namespace::Mpd, "Representation") {
                let Some(mime) = set.attr("mimeType").or_else(|| representation.attr("mimeType")) else {
                    continue;
                };
                if mime.contains("image") {
                    continue;
                }
                let slot = if mime.starts_with("video/") {
                    &mut video
                } else if mime.starts_with("audio/") {
                    &mut audio
                } else if mime.starts_with("application/") {
                    &mut subtitle
                } else {
                    continue;
                };

                let template = representation.child_in(Namespace::Mpd, "SegmentTemplate");
                let Some(timeline) = [template, set_template]
                    .into_iter()
                    .flatten()
                    .find_map(|template| template.child_in(Namespace::Mpd, "SegmentTimeline"))
                else {
                    log::debug!(
                        "representation {:?} has no segment timeline",
                        representation.attr("id")
                    );
                    continue;
                };

                let timescale = effective_timescale(template, set_template)?;
                let seconds = timeline_ticks(timeline)? as f64 / timescale as f64;
                *slot = slot.max(seconds);
            }
        }

        Ok(PeriodSummary {
            duration: period
                .attr("duration")
                .and_then(|value| letter_form(value, "Period@duration")),
            start: period
                .attr("start")
                .and_then(|value| letter_form(value, "Period@start")),
            base_url: child_text(period, "BaseURL"),
            max_duration_by_kind: MaxDurationByKind {
                video: seconds_to_hms(video),
                audio: seconds_to_hms(audio),
                subtitle: seconds_to_hms(subtitle),
            },
            id,
        })
    }

    /// One summary per representation of the period, in document order.
    ///
    /// Subtitle (`application/mp4`) adaptation sets carry their codec on the
    /// adaptation set, so the codec tag is read there first.
    pub fn adaptation_set_info(&self, period: Node<'a, 'input>) -> Vec<RepresentationSummary> {
        let mut summaries = Vec::new();

        for set in period.children_in(Namespace::Mpd, "AdaptationSet") {
            let language_label = set
                .descendant_in(Namespace::Mpd, "Label")
                .and_then(ElementExt::trimmed_text)
                .unwrap_or(NO_LABEL)
                .to_string();
            let trick_mode = is_trick_mode(set);

            for representation in set.children_in(Namespace::Mpd, "Representation") {
                let mime = set.attr("mimeType").or_else(|| representation.attr("mimeType"));
                let codec_tag = if mime == Some("application/mp4") {
                    set.attr("codecs").or_else(|| representation.attr("codecs"))
                } else {
                    representation.attr("codecs").or_else(|| set.attr("codecs"))
                };
                let avc = codec_tag.and_then(avc_profile_and_level);

                let mut schemes: Vec<String> = Vec::new();
                for protection in set
                    .children_in(Namespace::Mpd, "ContentProtection")
                    .chain(representation.descendants_in(Namespace::Mpd, "ContentProtection"))
                {
                    let Some(scheme) = protection.attr("value").or_else(|| protection.attr("schemeIdUri")) else {
                        continue;
                    };
                    if !schemes.iter().any(|known| known == scheme) {
                        schemes.push(scheme.to_string());
                    }
                }

                summaries.push(RepresentationSummary {
                    adaptation_set_id: set.attr("id").map(str::to_string),
                    representation_id: representation.attr("id").map(str::to_string),
                    content_protection_schemes: schemes,
                    mime_type: mime.map(|mime| {
                        if trick_mode {
                            format!("{mime}_TrickMode")
                        } else {
                            mime.to_string()
                        }
                    }),
                    language: set.attr("lang").map(str::to_string),
                    language_label: language_label.clone(),
                    codec_tag: codec_tag.map(str::to_string),
                    codec_profile: avc.map(|avc| avc.profile),
                    codec_level: avc.map(|avc| avc.level),
                    bandwidth: lenient(representation, "bandwidth"),
                    width: lenient(representation, "width").or_else(|| lenient(set, "width")),
                    height: lenient(representation, "height").or_else(|| lenient(set, "height")),
                    frame_rate: inherited(representation, set, "frameRate"),
                    audio_sampling_rate: inherited(representation, set, "audioSamplingRate"),
                });
            }
        }

        summaries
    }

    /// The SCTE-35 cue of the period.
    pub fn scte35_cue(&self, period: Node<'a, 'input>) -> Scte35Cue {
        Scte35Cue::from_period(period)
    }

    /// Whether `period` is an ad period, judged by the segment media
    /// template of its first representation in its first adaptation set.
    ///
    /// Only that one pair is sampled; ad signaling is assumed uniform within
    /// a period. Returns `None` when the period has no such pair.
    pub fn period_content(&self, period: Node<'a, 'input>, marker: &str) -> Option<PeriodContent> {
        let set = period.child_in(Namespace::Mpd, "AdaptationSet")?;
        let representation = set.child_in(Namespace::Mpd, "Representation")?;
        let media = representation
            .child_in(Namespace::Mpd, "SegmentTemplate")
            .or_else(|| set.child_in(Namespace::Mpd, "SegmentTemplate"))
            .and_then(|template| template.attr("media"))
            .unwrap_or("");

        if media.contains(marker) {
            Some(PeriodContent::Ad)
        } else {
            Some(PeriodContent::Content)
        }
    }

    /// Periods whose sampled segment template contains `marker`.
    pub fn find_periods_with_asset_representation(&self, marker: &str) -> Vec<Node<'a, 'input>> {
        self.periods()
            .into_iter()
            .filter(|period| self.period_content(*period, marker) == Some(PeriodContent::Ad))
            .collect()
    }

    /// Periods whose sampled segment template does not contain `marker`.
    pub fn find_periods_without_asset_representation(&self, marker: &str) -> Vec<Node<'a, 'input>> {
        self.periods()
            .into_iter()
            .filter(|period| self.period_content(*period, marker) == Some(PeriodContent::Content))
            .collect()
    }

    /// Analyze the manifest and each of its periods.
    ///
    /// A period whose mandatory values are unusable becomes a
    /// [`PeriodOutcome::Failed`] entry; the other periods are unaffected.
    ///
    /// # Errors
    ///
    /// Fails only when the manifest-level attributes are unusable, see
    /// [`manifest_info`](Self::manifest_info).
    pub fn analyze(&self, options: &AnalysisOptions) -> Result<ManifestReport, MediaStructError> {
        log::debug!("Analyzing manifest");
        let manifest = self.manifest_info()?;
        let periods = self.periods();
        let periods = map_ordered(&periods, options, |index, period| {
            self.analyze_period(index, *period, options)
        });
        Ok(ManifestReport { manifest, periods })
    }

    fn analyze_period(&self, index: usize, period: Node<'a, 'input>, options: &AnalysisOptions) -> PeriodOutcome {
        match self.period_info(period) {
            Ok(summary) => PeriodOutcome::Analyzed(PeriodReport {
                index,
                summary,
                adaptation_set_count: period.children_in(Namespace::Mpd, "AdaptationSet").count(),
                representations: self.adaptation_set_info(period),
                scte35: self.scte35_cue(period),
                content: self.period_content(period, &options.asset_marker),
            }),
            Err(error) => {
                log::warn!("period {index} failed: {error}");
                PeriodOutcome::Failed {
                    index,
                    id: period.attr("id").map(str::to_string),
                    error: error.to_string(),
                }
            }
        }
    }
}

/// Parse MPD text and analyze it.
///
/// # Errors
///
/// [`MediaStructError::Xml`] if the text is not well-formed, otherwise as
/// [`ManifestAnalyzer::new`] and [`ManifestAnalyzer::analyze`].
pub fn analyze_manifest_str(text: &str, options: &AnalysisOptions) -> Result<ManifestReport, MediaStructError> {
    let document = Document::parse(text)?;
    ManifestAnalyzer::new(&document)?.analyze(options)
}

/// Read an MPD file and analyze it.
///
/// # Errors
///
/// [`MediaStructError::IoError`] if the file cannot be read, otherwise as
/// [`analyze_manifest_str`].
pub fn analyze_manifest_file<P: AsRef<Path>>(
    path: P,
    options: &AnalysisOptions,
) -> Result<ManifestReport, MediaStructError> {
    let text = fs::read_to_string(path.as_ref())?;
    analyze_manifest_str(&text, options)
}

/// Convert a period-style duration to the H/M/S letter form.
///
/// Values that already contain `H`, `M` or `S` only lose their `PT` prefix
/// and `S` letters; bare or `PT`-prefixed seconds are converted.
fn letter_form(value: &str, what: &str) -> Option<String> {
    if value.contains(['H', 'M', 'S']) {
        return Some(value.replace("PT", "").replace('S', ""));
    }
    let converted = truncated_duration_to_hms(value);
    if converted.is_none() {
        log::warn!("ignoring {what} {value:?}");
    }
    converted
}

fn optional_seconds(element: Node<'_, '_>, name: &str) -> Option<f64> {
    let value = element.attr(name)?;
    iso_duration_to_seconds(value)
        .inspect_err(|error| log::warn!("ignoring MPD@{name}: {error}"))
        .ok()
}

fn child_text(element: Node<'_, '_>, name: &'static str) -> Option<String> {
    element
        .child_in(Namespace::Mpd, name)
        .and_then(ElementExt::trimmed_text)
        .map(str::to_string)
}

fn lenient<T: FromStr>(element: Node<'_, '_>, name: &str) -> Option<T> {
    element.parse_attr(name).unwrap_or_else(|error| {
        log::warn!("ignoring attribute: {error}");
        None
    })
}

fn inherited(representation: Node<'_, '_>, set: Node<'_, '_>, name: &str) -> Option<String> {
    representation
        .attr(name)
        .or_else(|| set.attr(name))
        .map(str::to_string)
}

fn is_trick_mode(set: Node<'_, '_>) -> bool {
    set.attr("codingDependency") == Some("false")
        || set.child_in(Namespace::Mpd, "codingDependency").is_some()
        || ["EssentialProperty", "SupplementalProperty"].into_iter().any(|property| {
            set.children_in(Namespace::Mpd, property)
                .any(|element| element.attr("schemeIdUri") == Some(TRICK_MODE_SCHEME))
        })
}

/// Representation template timescale, else adaptation set template
/// timescale, else 1.
fn effective_timescale(template: Option<Node<'_, '_>>, set_template: Option<Node<'_, '_>>) -> Result<u64, MediaStructError> {
    let mut timescale = None;
    for template in [template, set_template].into_iter().flatten() {
        if let Some(value) = template.parse_attr::<u64>("timescale")? {
            timescale = Some(value);
            break;
        }
    }
    match timescale {
        Some(0) => Err(MediaStructError::bad_attribute("SegmentTemplate", "timescale", "0")),
        Some(value) => Ok(value),
        None => Ok(1),
    }
}

/// Total ticks of a segment timeline: every `S` contributes `d * (r + 1)`,
/// so an open-ended `r="-1"` contributes zero.
fn timeline_ticks(timeline: Node<'_, '_>) -> Result<u128, MediaStructError> {
    let mut total: u128 = 0;
    for segment in timeline.children_in(Namespace::Mpd, "S") {
        let duration: u64 = segment
            .parse_attr("d")?
            .ok_or_else(|| MediaStructError::MalformedManifest("S@d is missing".to_string()))?;
        let repeat: i64 = segment.parse_attr("r")?.unwrap_or(0);
        // r="-1" repeats until the next S or the period end; it adds nothing here.
        let occurrences = u128::try_from(i128::from(repeat) + 1).unwrap_or(0);
        total = (duration as u128)
            .checked_mul(occurrences)
            .and_then(|ticks| total.checked_add(ticks))
            .ok_or_else(|| MediaStructError::MalformedManifest("SegmentTimeline duration overflows".to_string()))?;
    }
    Ok(total)
}

//! Manifest walker integration tests.
//!
//! Uses the live manifest in `tests/fixtures/live.mpd`: a content period, an
//! ad period with a splice insert, and an open-ended content period with a
//! time signal.

use std::io::Write;

use mediastruct::codec::CodecProperty;
use mediastruct::manifest::{ManifestType, PeriodContent, PeriodOutcome};
use mediastruct::{
    AnalysisOptions, ManifestAnalyzer, ManifestReport, MediaStructError, Scte35Kind,
    analyze_manifest_file, analyze_manifest_str,
};
use roxmltree::Document;

const LIVE: &str = include_str!("fixtures/live.mpd");

fn live_report() -> ManifestReport {
    analyze_manifest_str(LIVE, &AnalysisOptions::default()).expect("Failed to analyze fixture")
}

#[test]
fn manifest_summary() {
    let manifest = live_report().manifest;

    assert_eq!(manifest.manifest_type, ManifestType::Dynamic);
    assert_eq!(manifest.availability_start_time.as_deref(), Some("2024-05-01T10:00:00Z"));
    assert_eq!(manifest.publish_time.as_deref(), Some("2024-05-01T12:00:00Z"));
    assert_eq!(manifest.min_buffer_time_seconds, 6.0);
    assert_eq!(manifest.minimum_update_period_seconds, Some(2.0));
    assert_eq!(manifest.suggested_presentation_delay_seconds, Some(10.5));
    assert_eq!(manifest.time_shift_buffer.as_deref(), Some("0H5M0.0"));
    assert_eq!(manifest.period_count, 3);
    assert_eq!(manifest.adaptation_set_count_of_first_period, 5);
    assert_eq!(manifest.base_url.as_deref(), Some("https://origin.example/live/"));
    assert_eq!(
        manifest.location.as_deref(),
        Some("https://origin.example/live/manifest.mpd")
    );
}

#[test]
fn period_summaries() {
    let report = live_report();
    let periods: Vec<_> = report.analyzed_periods().collect();
    assert_eq!(periods.len(), 3);

    let first = &periods[0].summary;
    assert_eq!(first.id.as_deref(), Some("content-1"));
    assert_eq!(first.start.as_deref(), Some("0"));
    assert_eq!(first.duration.as_deref(), Some("60"));
    assert_eq!(first.max_duration_by_kind.video, "000:01:00.000");
    assert_eq!(first.max_duration_by_kind.audio, "000:01:01.000");
    assert_eq!(first.max_duration_by_kind.subtitle, "000:01:00.000");

    let ad = &periods[1].summary;
    assert_eq!(ad.duration.as_deref(), Some("30"));
    assert_eq!(ad.max_duration_by_kind.video, "000:00:30.030");

    let live_edge = &periods[2].summary;
    assert_eq!(live_edge.start.as_deref(), Some("90"));
    assert_eq!(live_edge.duration, None);
    assert_eq!(live_edge.max_duration_by_kind.video, "000:00:00.000", "open-ended r=-1 adds no duration");
    assert_eq!(live_edge.max_duration_by_kind.audio, "000:00:00.000");
}

#[test]
fn representation_attributes() {
    let report = live_report();
    let period = report.analyzed_periods().next().expect("first period");
    let ids: Vec<_> = period
        .representations
        .iter()
        .map(|r| r.representation_id.as_deref().unwrap_or("-"))
        .collect();
    assert_eq!(ids, ["v-720", "v-1080", "v-trick", "a-en", "s-fr", "thumbs"]);

    let hd = &period.representations[0];
    assert_eq!(hd.adaptation_set_id.as_deref(), Some("1"));
    assert_eq!(hd.mime_type.as_deref(), Some("video/mp4"));
    assert_eq!(hd.codec_tag.as_deref(), Some("avc1.64001F"));
    assert_eq!(hd.codec_profile, Some(CodecProperty::Known("High")));
    assert_eq!(hd.codec_level, Some(CodecProperty::Known("3.1")));
    assert_eq!(hd.bandwidth, Some(3_000_000));
    assert_eq!((hd.width, hd.height), (Some(1280), Some(720)));
    assert_eq!(hd.frame_rate.as_deref(), Some("25"), "falls back to the adaptation set");
    assert_eq!(
        hd.content_protection_schemes,
        ["cenc", "urn:uuid:edef8ba9-79d6-4ace-a3c8-27dcd51d21ed"]
    );
    assert_eq!(hd.language_label, "N/A");

    let full_hd = &period.representations[1];
    assert_eq!(full_hd.frame_rate.as_deref(), Some("50"));
    assert_eq!(full_hd.codec_level, Some(CodecProperty::Known("4")));

    let trick = &period.representations[2];
    assert_eq!(trick.mime_type.as_deref(), Some("video/mp4_TrickMode"));
    assert_eq!(trick.codec_profile, Some(CodecProperty::Known("Main")));
    assert_eq!(trick.codec_level, Some(CodecProperty::Known("1.3")));

    let audio = &period.representations[3];
    assert_eq!(audio.language.as_deref(), Some("en"));
    assert_eq!(audio.language_label, "English");
    assert_eq!(audio.codec_profile, None);
    assert_eq!(audio.audio_sampling_rate.as_deref(), Some("48000"));

    let subtitles = &period.representations[4];
    assert_eq!(subtitles.codec_tag.as_deref(), Some("stpp"), "read from the adaptation set");
    assert_eq!(subtitles.codec_level, None);
}

#[test]
fn ad_and_content_periods() {
    let report = live_report();
    let content: Vec<_> = report.analyzed_periods().map(|p| p.content).collect();
    assert_eq!(
        content,
        [
            Some(PeriodContent::Content),
            Some(PeriodContent::Ad),
            Some(PeriodContent::Content)
        ]
    );

    let document = Document::parse(LIVE).expect("Failed to parse fixture");
    let analyzer = ManifestAnalyzer::new(&document).expect("MPD root");
    let ads = analyzer.find_periods_with_asset_representation("asset");
    assert_eq!(ads.len(), 1);
    assert_eq!(ads[0].attribute("id"), Some("ad-1"));
    assert_eq!(analyzer.find_periods_without_asset_representation("asset").len(), 2);
}

#[test]
fn custom_asset_marker() {
    let options = AnalysisOptions::new().with_asset_marker("trick");
    let report = analyze_manifest_str(LIVE, &options).expect("Failed to analyze fixture");
    assert!(
        report
            .analyzed_periods()
            .all(|p| p.content == Some(PeriodContent::Content)),
        "only the first pair of each period is sampled"
    );
}

#[test]
fn cues_per_period() {
    let report = live_report();
    let cues: Vec<_> = report.analyzed_periods().map(|p| &p.scte35).collect();

    assert_eq!(cues[0].kind, Scte35Kind::None);

    assert_eq!(cues[1].kind, Scte35Kind::SpliceInsert);
    assert_eq!(cues[1].event_id, Some(1001));
    assert_eq!(cues[1].duration.as_deref(), Some("000:00:30.000"));
    assert_eq!(cues[1].out_of_network, Some(true));

    assert_eq!(cues[2].kind, Scte35Kind::TimeSignal);
    assert_eq!(cues[2].event_id, Some(2002));
    assert_eq!(cues[2].segmentation_type_id, Some(53));
    assert_eq!(cues[2].duration, None);
}

#[test]
fn analysis_is_idempotent() {
    let document = Document::parse(LIVE).expect("Failed to parse fixture");
    let analyzer = ManifestAnalyzer::new(&document).expect("MPD root");
    let options = AnalysisOptions::default();

    let first = analyzer.analyze(&options).expect("first run");
    let second = analyzer.analyze(&options).expect("second run");
    assert_eq!(first, second);
    assert_eq!(
        first.to_json_pretty().expect("serialize"),
        second.to_json_pretty().expect("serialize")
    );
}

#[test]
fn parallel_analysis_matches_sequential() {
    let sequential = live_report();
    let parallel = analyze_manifest_str(LIVE, &AnalysisOptions::new().with_parallel(true))
        .expect("Failed to analyze fixture");
    assert_eq!(sequential, parallel);
}

#[test]
fn failed_period_does_not_abort_siblings() {
    let mpd = r#"<MPD xmlns="urn:mpeg:dash:schema:mpd:2011" minBufferTime="PT2S">
        <Period id="good"><AdaptationSet mimeType="video/mp4">
            <SegmentTemplate timescale="1"><SegmentTimeline><S d="4"/></SegmentTimeline></SegmentTemplate>
            <Representation id="v"/></AdaptationSet></Period>
        <Period id="bad"><AdaptationSet mimeType="video/mp4">
            <SegmentTemplate timescale="1"><SegmentTimeline><S d="four"/></SegmentTimeline></SegmentTemplate>
            <Representation id="v"/></AdaptationSet></Period>
        <Period id="also-good"/>
    </MPD>"#;
    let report = analyze_manifest_str(mpd, &AnalysisOptions::default()).expect("manifest level is fine");

    assert_eq!(report.periods.len(), 3);
    assert!(matches!(&report.periods[0], PeriodOutcome::Analyzed(p) if p.index == 0));
    match &report.periods[1] {
        PeriodOutcome::Failed { index, id, error } => {
            assert_eq!(*index, 1);
            assert_eq!(id.as_deref(), Some("bad"));
            assert!(error.contains("S@d"), "unexpected error {error}");
        }
        other => panic!("expected a failed period, got {other:?}"),
    }
    assert!(matches!(&report.periods[2], PeriodOutcome::Analyzed(p) if p.index == 2));
    assert_eq!(report.failed_count(), 1);

    let value = serde_json::to_value(&report).expect("serialize");
    assert_eq!(value["periods"][0]["status"], "analyzed");
    assert_eq!(value["periods"][1]["status"], "failed");
}

#[test]
fn timeline_overflow_fails_the_period() {
    let segment = r#"<S d="18446744073709551615" r="9223372036854775807"/>"#;
    let mpd = format!(
        r#"<MPD xmlns="urn:mpeg:dash:schema:mpd:2011" minBufferTime="PT2S">
        <Period id="huge"><AdaptationSet mimeType="video/mp4">
            <SegmentTemplate timescale="1"><SegmentTimeline>{segment}{segment}{segment}</SegmentTimeline></SegmentTemplate>
            <Representation id="v"/></AdaptationSet></Period>
        <Period id="fine"/>
    </MPD>"#
    );
    let report = analyze_manifest_str(&mpd, &AnalysisOptions::default()).expect("manifest level is fine");

    match &report.periods[0] {
        PeriodOutcome::Failed { id, error, .. } => {
            assert_eq!(id.as_deref(), Some("huge"));
            assert!(error.contains("overflows"), "unexpected error {error}");
        }
        other => panic!("expected a failed period, got {other:?}"),
    }
    assert!(report.periods[1].report().is_some());
}

#[test]
fn open_ended_repeat_adds_no_duration() {
    let report = analyze_manifest_str(
        r#"<MPD xmlns="urn:mpeg:dash:schema:mpd:2011" minBufferTime="PT2S">
        <Period><AdaptationSet mimeType="audio/mp4">
            <SegmentTemplate timescale="1"><SegmentTimeline><S d="2" r="0"/><S d="3" r="-1"/></SegmentTimeline></SegmentTemplate>
            <Representation id="a"/></AdaptationSet></Period>
    </MPD>"#,
        &AnalysisOptions::default(),
    )
    .expect("Failed to analyze");

    let period = report.analyzed_periods().next().expect("period");
    assert_eq!(period.summary.max_duration_by_kind.audio, "000:00:02.000");
}

#[test]
fn dependent_coding_is_not_trick_mode() {
    let report = analyze_manifest_str(
        r#"<MPD xmlns="urn:mpeg:dash:schema:mpd:2011" minBufferTime="PT2S"><Period>
        <AdaptationSet mimeType="video/mp4" codingDependency="true">
            <Representation id="dependent" codecs="avc1.64001F"/>
        </AdaptationSet>
        <AdaptationSet mimeType="video/mp4" codingDependency="false">
            <EssentialProperty schemeIdUri="http://dashif.org/guidelines/trickmode" value="1"/>
            <Representation id="trick" codecs="avc1.64001F"/>
        </AdaptationSet>
    </Period></MPD>"#,
        &AnalysisOptions::default(),
    )
    .expect("Failed to analyze");

    let period = report.analyzed_periods().next().expect("period");
    assert_eq!(period.representations[0].mime_type.as_deref(), Some("video/mp4"));
    assert_eq!(period.representations[1].mime_type.as_deref(), Some("video/mp4_TrickMode"));
}

#[test]
fn period_without_adaptation_sets() {
    let report = analyze_manifest_str(
        r#"<MPD xmlns="urn:mpeg:dash:schema:mpd:2011" minBufferTime="PT2S"><Period id="empty"/></MPD>"#,
        &AnalysisOptions::default(),
    )
    .expect("Failed to analyze");

    let period = report.analyzed_periods().next().expect("period");
    let durations = &period.summary.max_duration_by_kind;
    assert_eq!(durations.video, "000:00:00.000");
    assert_eq!(durations.audio, "000:00:00.000");
    assert_eq!(durations.subtitle, "000:00:00.000");
    assert!(period.representations.is_empty());
    assert_eq!(period.content, None);
    assert_eq!(report.manifest.adaptation_set_count_of_first_period, 0);
}

#[test]
fn manifest_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(LIVE.as_bytes()).expect("Failed to write manifest");

    let report = analyze_manifest_file(file.path(), &AnalysisOptions::default())
        .expect("Failed to analyze manifest file");
    assert_eq!(report, live_report());
}

#[test]
fn missing_min_buffer_time_is_fatal() {
    let result = analyze_manifest_str(
        r#"<MPD xmlns="urn:mpeg:dash:schema:mpd:2011"><Period/></MPD>"#,
        &AnalysisOptions::default(),
    );
    assert!(matches!(result, Err(MediaStructError::MalformedManifest(_))));
}

//! Benchmarks for GOP classification, manifest walking and duration
//! conversion.
//!
//! Run with: cargo bench
//! Run with all features: cargo bench --all-features

use std::hint::black_box;

use criterion::Criterion;
use mediastruct::duration::{add_duration_to_timestamp, hms_string_to_seconds, seconds_to_hms};
use mediastruct::{AnalysisOptions, ProbeOutput, StreamReport, analyze_manifest_str, analyze_probe_batch};

const PROBE: &str = include_str!("../tests/fixtures/probe.json");
const LIVE: &str = include_str!("../tests/fixtures/live.mpd");

/// Prober output for `gops` GOPs of `I` followed by 29 `B`/`P` frames, with
/// an audio frame after every video frame.
fn long_probe(gops: usize) -> String {
    let mut frames = Vec::with_capacity(gops * 60);
    for gop in 0..gops {
        for position in 0..30 {
            let (pict_type, key_frame, size) = match position {
                0 => ("I", 1, 48_000),
                n if n % 3 == 0 => ("P", 0, 9_000),
                _ => ("B", 0, 2_500),
            };
            let time = (gop * 30 + position) as f64 / 30.0;
            frames.push(format!(
                r#"{{"media_type":"video","pict_type":"{pict_type}","key_frame":{key_frame},"pkt_size":"{size}","duration_time":"0.033333","pkt_dts_time":"{time:.6}","pkt_pos":"{}"}}"#,
                (gop * 30 + position) * 10_000
            ));
            frames.push(format!(
                r#"{{"media_type":"audio","key_frame":1,"pkt_size":"372","duration_time":"0.021333","pkt_dts_time":"{time:.6}"}}"#
            ));
        }
    }
    format!(
        r#"{{"format":{{"format_name":"mov,mp4"}},"streams":[{{"codec_type":"video","codec_name":"h264"}},{{"codec_type":"audio","codec_name":"aac"}}],"frames":[{}]}}"#,
        frames.join(",")
    )
}

/// A static manifest with `periods` periods, every fourth of them an ad.
fn long_manifest(periods: usize) -> String {
    let mut body = String::new();
    for index in 0..periods {
        let media = if index % 4 == 3 { "asset" } else { "main" };
        body.push_str(&format!(
            r#"<Period id="p{index}" duration="PT60S">
              <AdaptationSet id="1" mimeType="video/mp4">
                <SegmentTemplate timescale="90000" media="{media}/{index}/$Time$.m4s">
                  <SegmentTimeline><S d="180000" r="29"/></SegmentTimeline>
                </SegmentTemplate>
                <Representation id="v1" codecs="avc1.64001F" bandwidth="3000000" width="1280" height="720"/>
                <Representation id="v2" codecs="avc1.4D401E" bandwidth="1500000" width="854" height="480"/>
              </AdaptationSet>
              <AdaptationSet id="2" mimeType="audio/mp4" lang="en">
                <SegmentTemplate timescale="48000" media="{media}/{index}/audio/$Time$.m4s">
                  <SegmentTimeline><S d="96000" r="29"/></SegmentTimeline>
                </SegmentTemplate>
                <Representation id="a1" codecs="mp4a.40.2" bandwidth="128000"/>
              </AdaptationSet>
            </Period>"#
        ));
    }
    format!(r#"<MPD xmlns="urn:mpeg:dash:schema:mpd:2011" type="static" minBufferTime="PT2S">{body}</MPD>"#)
}

fn benchmark_stream_report(criterion: &mut Criterion) {
    let options = AnalysisOptions::default();
    let long = long_probe(200);
    let parsed = ProbeOutput::from_json(&long).unwrap();

    criterion.bench_function("stream report (fixture)", |bencher| {
        bencher.iter(|| StreamReport::from_probe_json(black_box(PROBE), &options).unwrap());
    });

    criterion.bench_function("stream report (6000 video frames, parse + analyze)", |bencher| {
        bencher.iter(|| StreamReport::from_probe_json(black_box(&long), &options).unwrap());
    });

    criterion.bench_function("stream report (6000 video frames, analyze only)", |bencher| {
        bencher.iter(|| StreamReport::from_probe(black_box(&parsed), &options).unwrap());
    });

    let without_tables = AnalysisOptions::new().with_frame_tables(false);
    criterion.bench_function("stream report (6000 video frames, no frame tables)", |bencher| {
        bencher.iter(|| StreamReport::from_probe(black_box(&parsed), &without_tables).unwrap());
    });
}

fn benchmark_probe_batch(criterion: &mut Criterion) {
    let long = long_probe(50);
    let inputs: Vec<&str> = std::iter::repeat_n(long.as_str(), 8).collect();

    criterion.bench_function("probe batch of 8 (sequential)", |bencher| {
        let options = AnalysisOptions::default();
        bencher.iter(|| analyze_probe_batch(black_box(&inputs), &options));
    });

    #[cfg(feature = "rayon")]
    criterion.bench_function("probe batch of 8 (parallel)", |bencher| {
        let options = AnalysisOptions::new().with_parallel(true);
        bencher.iter(|| analyze_probe_batch(black_box(&inputs), &options));
    });
}

fn benchmark_manifest(criterion: &mut Criterion) {
    let options = AnalysisOptions::default();
    let long = long_manifest(120);

    criterion.bench_function("manifest analysis (fixture)", |bencher| {
        bencher.iter(|| analyze_manifest_str(black_box(LIVE), &options).unwrap());
    });

    criterion.bench_function("manifest analysis (120 periods)", |bencher| {
        bencher.iter(|| analyze_manifest_str(black_box(&long), &options).unwrap());
    });

    #[cfg(feature = "rayon")]
    criterion.bench_function("manifest analysis (120 periods, parallel)", |bencher| {
        let options = AnalysisOptions::new().with_parallel(true);
        bencher.iter(|| analyze_manifest_str(black_box(&long), &options).unwrap());
    });
}

fn benchmark_durations(criterion: &mut Criterion) {
    criterion.bench_function("seconds_to_hms", |bencher| {
        bencher.iter(|| seconds_to_hms(black_box(3725.2504)));
    });

    criterion.bench_function("hms_string_to_seconds", |bencher| {
        bencher.iter(|| hms_string_to_seconds(black_box("1H2M5.25")).unwrap());
    });

    criterion.bench_function("add_duration_to_timestamp", |bencher| {
        bencher.iter(|| {
            add_duration_to_timestamp(black_box("2024-05-01T10:00:00.250+10:00"), black_box("0H1M30.5")).unwrap()
        });
    });
}

criterion::criterion_group!(
    benches,
    benchmark_stream_report,
    benchmark_probe_batch,
    benchmark_manifest,
    benchmark_durations,
);
criterion::criterion_main!(benches);

use std::{fs, io::Read};

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use colored::Colorize;
use serde_json::json;
use mediastruct::{
    AnalysisOptions, ManifestReport, StreamReport, analyze_manifest_str, analyze_probe_batch,
    config::DEFAULT_ASSET_MARKER,
    duration::{
        add_duration_to_timestamp, add_durations, hms_string_to_seconds, seconds_to_hms,
        subtract_durations, truncated_duration_to_hms,
    },
    manifest::PeriodOutcome,
};

const CLI_AFTER_HELP: &str = "Examples:\n  ffprobe -print_format json -show_format -show_streams -show_frames input.mp4 > probe.json\n  mediastruct gop probe.json\n  mediastruct manifest live.mpd --json\n  curl -s https://origin.example/live.mpd | mediastruct manifest -\n  mediastruct duration add 1H2M3.5 0H0M30\n  mediastruct completions zsh > _mediastruct";

#[derive(Debug, Parser)]
#[command(
    name = "mediastruct",
    version,
    about = "Analyze GOP structure of probed media and DASH manifest layout",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging output (RUST_LOG overrides).
    #[arg(long, global = true)]
    verbose: bool,

    /// Leave the per-frame tables out of stream reports.
    #[arg(long, global = true)]
    no_frames: bool,

    /// Analyze periods and batch inputs in parallel (needs the `rayon` feature).
    #[arg(long, global = true)]
    parallel: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build a GOP structure report from prober JSON output.
    #[command(
        about = "Report GOP structure from prober output",
        after_help = "Examples:\n  mediastruct gop probe.json\n  mediastruct gop a.json b.json --json --no-frames"
    )]
    Gop {
        /// Prober JSON files, or `-` for stdin.
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output the report as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Describe a DASH manifest.
    #[command(
        about = "Report DASH manifest structure",
        after_help = "Examples:\n  mediastruct manifest vod.mpd\n  mediastruct manifest live.mpd --json --asset-marker adbreak"
    )]
    Manifest {
        /// Manifest path, or `-` for stdin.
        input: String,

        /// Output the report as machine-readable JSON.
        #[arg(long)]
        json: bool,

        /// Segment media template marker that identifies ad periods.
        #[arg(long, default_value = DEFAULT_ASSET_MARKER)]
        asset_marker: String,
    },

    /// Convert and combine duration strings.
    #[command(about = "Duration conversions and arithmetic")]
    Duration {
        #[command(subcommand)]
        action: DurationCommand,
    },

    /// Run quality-control checks and print the findings.
    #[command(
        about = "Validate a probe result or manifest",
        after_help = "Examples:\n  mediastruct validate probe probe.json\n  mediastruct validate manifest live.mpd"
    )]
    Validate {
        /// What the input contains.
        #[arg(value_enum)]
        kind: InputKind,

        /// Input path, or `-` for stdin.
        input: String,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Subcommand)]
enum DurationCommand {
    /// Format seconds as HHH:MM:SS.mmm.
    #[command(allow_negative_numbers = true)]
    ToHms { seconds: f64 },
    /// Parse an H/M/S string into seconds.
    ToSeconds { duration: String },
    /// Convert a truncated ISO 8601 duration (PT12.5S) to the H/M/S form.
    Iso { duration: String },
    /// Add two H/M/S durations.
    Add { left: String, right: String },
    /// Subtract the second H/M/S duration from the first.
    Subtract { left: String, right: String },
    /// Offset a timestamp by an H/M/S duration.
    Shift { timestamp: String, duration: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum InputKind {
    /// Prober JSON output.
    Probe,
    /// DASH manifest.
    Manifest,
}

fn init_logging(global: &GlobalOptions) {
    let default_filter = if global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn analysis_options(global: &GlobalOptions) -> AnalysisOptions {
    if global.parallel && !cfg!(feature = "rayon") {
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            "--parallel requires building with the `rayon` feature".yellow()
        );
    }
    AnalysisOptions::new()
        .with_frame_tables(!global.no_frames)
        .with_parallel(global.parallel)
}

fn read_input(input: &str) -> Result<String, Box<dyn std::error::Error>> {
    if input == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        fs::read_to_string(input).map_err(|error| format!("cannot read {input}: {error}").into())
    }
}

fn print_stream_report(report: &StreamReport) {
    let format = report
        .container_format_info
        .get("format_name")
        .and_then(|value| value.as_str())
        .unwrap_or("unknown");
    println!("Container: {format}");

    match report.video_stream_info.field_str("codec_name") {
        Some(codec) => println!("Video: {codec}"),
        None => println!("Video: {}", "none".dimmed()),
    }
    match report.audio_stream_info.field_str("codec_name") {
        Some(codec) => println!("Audio: {codec}"),
        None => println!("Audio: {}", "none".dimmed()),
    }

    let Some(stats) = report.gop_statistics() else {
        println!("No video frames, no GOPs.");
        return;
    };
    println!(
        "GOPs: {} (max {} frames, min {}, average {:.1}, {} open)",
        stats.count,
        stats.max_size,
        stats.min_size,
        stats.average_size,
        stats.open_count()
    );
    for (index, row) in report.gop_table.iter().enumerate() {
        let status = if row.closed {
            "closed".green()
        } else {
            "open".yellow()
        };
        println!("  #{index:<4} {:>4} frames  {status:<6}  {}", row.frame_count, row.pattern);
    }
}

fn print_manifest_report(report: &ManifestReport) {
    let manifest = &report.manifest;
    println!("Type: {:?}", manifest.manifest_type);
    println!("Min buffer: {:.3}s", manifest.min_buffer_time_seconds);
    if let Some(delay) = manifest.suggested_presentation_delay_seconds {
        println!("Presentation delay: {delay:.3}s");
    }
    if let Some(update) = manifest.minimum_update_period_seconds {
        println!("Update period: {update:.3}s");
    }
    if let Some(depth) = &manifest.time_shift_buffer {
        println!("Time shift buffer: {depth}");
    }
    if let Some(base_url) = &manifest.base_url {
        println!("Base URL: {base_url}");
    }
    println!("Periods: {}", manifest.period_count);

    for outcome in &report.periods {
        let period = match outcome {
            PeriodOutcome::Analyzed(period) => period,
            PeriodOutcome::Failed { index, id, error } => {
                println!(
                    "{} {index} {}: {}",
                    "Period".bold(),
                    id.as_deref().unwrap_or("-"),
                    error.red()
                );
                continue;
            }
        };
        let summary = &period.summary;
        let content = match period.content {
            Some(content) => format!("{content:?}").to_lowercase(),
            None => "-".to_string(),
        };
        println!(
            "{} {} {} start={} duration={} [{}]",
            "Period".bold(),
            period.index,
            summary.id.as_deref().unwrap_or("-"),
            summary.start.as_deref().unwrap_or("-"),
            summary.duration.as_deref().unwrap_or("-"),
            content.cyan()
        );
        println!(
            "  longest timelines: video {} audio {} subtitle {}",
            summary.max_duration_by_kind.video,
            summary.max_duration_by_kind.audio,
            summary.max_duration_by_kind.subtitle
        );
        if period.scte35.is_present() {
            println!(
                "  SCTE-35 {:?} event={} duration={}",
                period.scte35.kind,
                period
                    .scte35
                    .event_id
                    .map_or_else(|| "-".to_string(), |id| id.to_string()),
                period.scte35.duration.as_deref().unwrap_or("-")
            );
        }
        for representation in &period.representations {
            let profile = match (representation.codec_profile, representation.codec_level) {
                (Some(profile), Some(level)) => format!(" {profile}@{level}"),
                _ => String::new(),
            };
            println!(
                "  {} {} {}{} {}bps{}",
                representation.representation_id.as_deref().unwrap_or("-"),
                representation.mime_type.as_deref().unwrap_or("-"),
                representation.codec_tag.as_deref().unwrap_or("-"),
                profile,
                representation
                    .bandwidth
                    .map_or_else(|| "?".to_string(), |bandwidth| bandwidth.to_string()),
                if representation.content_protection_schemes.is_empty() {
                    String::new()
                } else {
                    format!(" drm={}", representation.content_protection_schemes.join(","))
                }
            );
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.global);
    let options = analysis_options(&cli.global);

    match cli.command {
        Commands::Gop { inputs, json } => {
            let texts = inputs
                .iter()
                .map(|input| read_input(input))
                .collect::<Result<Vec<_>, _>>()?;
            let borrowed: Vec<&str> = texts.iter().map(String::as_str).collect();
            let results = analyze_probe_batch(&borrowed, &options);

            if let [single] = results.as_slice() {
                let report = single.as_ref().map_err(|error| error.to_string())?;
                if json {
                    println!("{}", report.to_json_pretty()?);
                } else {
                    print_stream_report(report);
                }
                return Ok(());
            }

            if json {
                let payload: Vec<_> = inputs
                    .iter()
                    .zip(&results)
                    .map(|(input, result)| match result {
                        Ok(report) => json!({ "input": input, "report": report }),
                        Err(error) => json!({ "input": input, "error": error.to_string() }),
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                for (input, result) in inputs.iter().zip(&results) {
                    println!("{}", format!("== {input}").bold());
                    match result {
                        Ok(report) => print_stream_report(report),
                        Err(error) => println!("{} {error}", "error:".red().bold()),
                    }
                }
            }
            if results.iter().any(Result::is_err) {
                return Err("some inputs could not be analyzed".into());
            }
        }
        Commands::Manifest {
            input,
            json,
            asset_marker,
        } => {
            let text = read_input(&input)?;
            let report = analyze_manifest_str(&text, &options.with_asset_marker(asset_marker))?;
            if json {
                println!("{}", report.to_json_pretty()?);
            } else {
                print_manifest_report(&report);
            }
        }
        Commands::Duration { action } => match action {
            DurationCommand::ToHms { seconds } => println!("{}", seconds_to_hms(seconds)),
            DurationCommand::ToSeconds { duration } => {
                println!("{}", hms_string_to_seconds(&duration)?)
            }
            DurationCommand::Iso { duration } => {
                let converted = truncated_duration_to_hms(&duration)
                    .ok_or(format!("not a truncated ISO 8601 duration: {duration}"))?;
                println!("{converted}");
            }
            DurationCommand::Add { left, right } => println!("{}", add_durations(&left, &right)?),
            DurationCommand::Subtract { left, right } => {
                println!("{}", subtract_durations(&left, &right)?)
            }
            DurationCommand::Shift {
                timestamp,
                duration,
            } => {
                let shifted = add_duration_to_timestamp(&timestamp, &duration)?;
                println!("{}", shifted.to_rfc3339());
            }
        },
        Commands::Validate { kind, input } => {
            let text = read_input(&input)?;
            let report = match kind {
                InputKind::Probe => StreamReport::from_probe_json(&text, &options)?.validate(),
                InputKind::Manifest => analyze_manifest_str(&text, &options)?.validate(),
            };
            print!("{report}");
            if !report.is_valid() {
                return Err(format!("{} validation errors", report.errors.len()).into());
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "mediastruct", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

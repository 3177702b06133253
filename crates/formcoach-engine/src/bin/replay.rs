//! Replay recorded pose frames through the coaching pipeline
//!
//! Reads one JSON object per line, either a full frame
//! `{"timestamp": <ns>, "keypoints": [...]}` or a missed detection
//! `{"timestamp": <ns>, "keypoints": null}`, and prints the session summary.
//!
//! Usage: cargo run --bin formcoach-replay -- --exercise squat --input frames.jsonl

use std::error::Error;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use clap::Parser;
use formcoach_core::{ExerciseKind, FrameSample, Keypoint, Timestamp};
use formcoach_engine::{Coach, CoachConfig, FrameInput};
use serde::Deserialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "formcoach-replay")]
#[command(about = "Count reps and score form on a recorded pose stream")]
struct Args {
    /// Exercise performed in the recording (squat, push-up)
    #[arg(short, long)]
    exercise: ExerciseKind,

    /// JSON-lines file of pose frames
    #[arg(short, long)]
    input: PathBuf,

    /// Configuration file (toml, yaml or json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Name stored in the session record
    #[arg(short, long, default_value = "athlete")]
    user: String,

    /// Print the session statistics as JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Deserialize)]
struct FrameLine {
    timestamp: Timestamp,
    keypoints: Option<Vec<Keypoint>>,
}

impl FrameLine {
    fn into_input(self) -> formcoach_core::Result<FrameInput> {
        match self.keypoints {
            Some(keypoints) => Ok(FrameInput::Detected(FrameSample::new(
                self.timestamp,
                keypoints,
            )?)),
            None => Ok(FrameInput::NoDetection(self.timestamp)),
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => CoachConfig::from_file(path)?,
        None => CoachConfig::from_env()?,
    };

    let reader = BufReader::new(File::open(&args.input)?);
    let mut coach: Option<Coach> = None;
    let mut last_ts = None;
    let mut frames = 0usize;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let input = serde_json::from_str::<FrameLine>(&line)
            .map_err(|e| format!("line {}: {}", idx + 1, e))?
            .into_input()
            .map_err(|e| format!("line {}: {}", idx + 1, e))?;

        let ts = input.timestamp();
        let coach =
            coach.get_or_insert_with(|| Coach::new(config, args.exercise, args.user.clone(), ts));
        let report = coach.process(input);
        frames += 1;
        last_ts = Some(ts);

        if report.rep_completed {
            info!(
                rep = report.rep_count,
                quality = report.quality.as_ref().map(|q| q.quality_score),
                "Rep counted"
            );
        } else {
            debug!(phase = %report.phase_name, message = %report.feedback_message, "Frame processed");
        }
    }

    let (Some(mut coach), Some(end)) = (coach, last_ts) else {
        return Err(format!("{}: no frames", args.input.display()).into());
    };
    info!(frames, "Replay finished");

    let stats = coach.finish(end);
    if args.json {
        println!("{}", stats.to_json()?);
    } else {
        println!("{}", stats.summary_text());
    }
    Ok(())
}

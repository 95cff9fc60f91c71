//! sample_loop — play a WAV loop at a fixed pitch and speed.
//!
//! Useful for checking an audio device and a loop file before wiring up a
//! hand source.
//!
//! ```text
//! sample_loop loop.wav --pitch -5 --rate 1.25 --seconds 10
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use clap::Parser;
use hand_geometry::mapper::{clamp_pitch, clamp_rate};
use hand_geometry::{ControlSink, ControlValues};
use sample_engine::{AudioBackend, AudioEngine};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sample_loop", about = "Loop a WAV file with fixed pitch and speed")]
struct Args {
    /// WAV file to loop
    file: PathBuf,

    /// Pitch shift in semitones (-12..=12)
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pitch: i32,

    /// Playback rate (0.5..=2.0)
    #[arg(long, default_value_t = 1.0)]
    rate: f64,

    /// How long to play
    #[arg(long, default_value_t = 5)]
    seconds: u64,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let controls = ControlValues {
        pitch_semitones: clamp_pitch(args.pitch as f64),
        playback_rate:   clamp_rate(args.rate),
    };

    println!("╔══════════════════════════════════════╗");
    println!("║  sample_loop                         ║");
    println!("╚══════════════════════════════════════╝");
    println!("  file  : {}", args.file.display());
    println!("  pitch : {:+} st", controls.pitch_semitones);
    println!("  rate  : {:.2}x", controls.playback_rate);

    let mut engine = match AudioEngine::load(&args.file) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    engine.write_controls(controls);
    if let Err(e) = engine.start() {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    thread::sleep(Duration::from_secs(args.seconds));
    engine.stop();
    ExitCode::SUCCESS
}

//! hand_audio — command-line entry point.
//!
//! ```text
//! hand_audio run   --audio loop.wav --source detector --camera 1
//! hand_audio serve --port 3000 --public web/
//! hand_audio --config hand_audio.toml run --engine midi
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use hand_audio::app;
use hand_audio::config::{AppConfig, EngineKind, PipelineOverrides, SourceKind};
use hand_audio::error::AppError;
use hand_audio::server;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hand_audio", version, about = "Control a looping sample's pitch and speed with hand shapes")]
struct Cli {
    /// TOML configuration file; flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Desktop mode: landmark source, audio backend and visualizer window
    Run(RunArgs),
    /// Browser mode: serve the page, the audio file and /controls
    Serve(ServeArgs),
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// Audio file to loop
    #[arg(long)]
    audio: Option<PathBuf>,

    /// Camera index passed to the detector
    #[arg(long)]
    camera: Option<u32>,

    #[arg(long, value_enum)]
    source: Option<SourceKind>,

    #[arg(long, value_enum)]
    engine: Option<EngineKind>,

    /// Substring of the MIDI output port name
    #[arg(long)]
    midi_port: Option<String>,

    #[command(flatten)]
    pipeline: PipelineOverrides,
}

impl RunArgs {
    fn apply(self, cfg: &mut AppConfig) {
        if let Some(a) = self.audio     { cfg.audio = a; }
        if let Some(c) = self.camera    { cfg.camera = c; }
        if let Some(s) = self.source    { cfg.source = s; }
        if let Some(e) = self.engine    { cfg.engine = e; }
        if let Some(p) = self.midi_port { cfg.midi.port_hint = Some(p); }
        self.pipeline.apply(&mut cfg.pipeline);
    }
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Audio file delivered at /audio
    #[arg(long)]
    audio: Option<PathBuf>,

    #[arg(long)]
    port: Option<u16>,

    /// Directory holding index.html and the page assets
    #[arg(long)]
    public: Option<PathBuf>,

    /// Don't open the page in a browser
    #[arg(long)]
    no_open: bool,

    #[command(flatten)]
    pipeline: PipelineOverrides,
}

impl ServeArgs {
    fn apply(self, cfg: &mut AppConfig) {
        if let Some(a) = self.audio  { cfg.audio = a; }
        if let Some(p) = self.port   { cfg.server.port = p; }
        if let Some(d) = self.public { cfg.server.public_dir = d; }
        if self.no_open              { cfg.server.open_browser = false; }
        self.pipeline.apply(&mut cfg.server.pipeline);
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║        Hand Audio — shape-controlled pitch and speed         ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli) -> Result<(), AppError> {
    let mut cfg = AppConfig::load_or_default(cli.config.as_deref())?;

    match cli.command.unwrap_or(Command::Run(RunArgs::default())) {
        Command::Run(args) => {
            args.apply(&mut cfg);
            #[cfg(feature = "leap")]
            println!("  Sources: sim, detector, leap");
            #[cfg(not(feature = "leap"))]
            println!("  Sources: sim, detector  (use --features leap for hardware)");
            println!("  Source : {:?}   Engine: {:?}", cfg.source, cfg.engine);
            println!("  Audio  : {}", cfg.audio.display());
            println!(
                "  Shape  : {} / {}",
                cfg.pipeline.selection.name(),
                cfg.pipeline.mapping.name()
            );
            println!();
            println!("  Opening visualizer window…");
            println!();
            app::run(cfg)
        }
        Command::Serve(args) => {
            args.apply(&mut cfg);
            println!("  Audio  : {}", cfg.audio.display());
            println!("  Public : {}", cfg.server.public_dir.display());
            println!();
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(AppError::Server)?;
            runtime.block_on(server::serve(cfg))
        }
    }
}

//! Desktop application: frame handler and main loop.
//!
//! `AppState` owns the pipeline configuration and the audio backend.  Every
//! landmark frame goes through [`AppState::handle_frame`]; the render loop
//! only reads the state back out.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use hand_geometry::{ControlValues, DetectedHand, FrameOutcome, Pipeline};
use sample_engine::{AudioBackend, AudioEngine, MidiControlOut, NullEngine};
use tracing::{info, warn};

use crate::config::{AppConfig, EngineKind, SourceKind};
use crate::error::AppError;
use crate::source::{
    spawn_landmark_source, DetectorHandle, DetectorProcess, HandFrame, SimInput,
    SimLandmarkSource, SourceEvent,
};
use crate::visualizer::Visualizer;

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    pipeline: Pipeline,
    engine:   Box<dyn AudioBackend>,

    // ── last frame, for the render loop ──────────────────────────────────
    hands:    Vec<DetectedHand>,
    outcome:  FrameOutcome,

    // ── counters ─────────────────────────────────────────────────────────
    frames:   u64,
    updates:  u64,

    pub status: String,
}

impl AppState {
    pub fn new(pipeline: Pipeline, engine: Box<dyn AudioBackend>) -> Self {
        let status = format!(
            "Ready - {} / {} via {}",
            pipeline.selection.name(),
            pipeline.mapping.name(),
            engine.name()
        );
        AppState {
            pipeline,
            engine,
            hands:   Vec::new(),
            outcome: FrameOutcome::NoHands,
            frames:  0,
            updates: 0,
            status,
        }
    }

    pub fn start(&mut self) -> Result<(), AppError> {
        self.engine.start()?;
        info!(engine = self.engine.name(), "audio backend started");
        Ok(())
    }

    pub fn shutdown(&mut self) {
        self.engine.stop();
        info!(frames = self.frames, updates = self.updates, "audio backend stopped");
    }

    // ── process one landmark frame ───────────────────────────────────────

    pub fn handle_frame(&mut self, frame: HandFrame) {
        self.frames += 1;
        let outcome = self.pipeline.process(&frame.hands, &mut *self.engine);
        if outcome.is_update() {
            self.updates += 1;
        }
        self.status = outcome.summary();
        self.hands = frame.hands;
        self.outcome = outcome;
    }

    // ── Accessors for the render loop ─────────────────────────────────────

    pub fn hands(&self)    -> &[DetectedHand]  { &self.hands }
    pub fn outcome(&self)  -> &FrameOutcome    { &self.outcome }
    pub fn pipeline(&self) -> &Pipeline        { &self.pipeline }
    pub fn controls(&self) -> ControlValues    { self.engine.current() }
    pub fn frames(&self)   -> u64              { self.frames }
    pub fn updates(&self)  -> u64              { self.updates }
}

// ════════════════════════════════════════════════════════════════════════════
// Construction helpers
// ════════════════════════════════════════════════════════════════════════════

pub fn build_engine(cfg: &AppConfig) -> Result<Box<dyn AudioBackend>, AppError> {
    Ok(match cfg.engine {
        EngineKind::Cpal => Box::new(AudioEngine::load(&cfg.audio)?),
        EngineKind::Midi => Box::new(MidiControlOut::new(
            cfg.midi.port_hint.clone(),
            cfg.midi.channel,
            cfg.midi.rate_cc,
        )),
        EngineKind::Null => Box::new(NullEngine::new()),
    })
}

/// A running landmark source: the frame channel, the sim-key sender when the
/// source is simulated, and the detector process guard when there is one.
pub struct SourceHandles {
    pub frames:   Receiver<SourceEvent>,
    pub sim_tx:   Option<Sender<SimInput>>,
    pub detector: Option<DetectorHandle>,
}

pub fn start_source(cfg: &AppConfig) -> Result<SourceHandles, AppError> {
    match cfg.source {
        SourceKind::Sim => {
            let (sim_tx, sim_rx) = mpsc::channel();
            Ok(SourceHandles {
                frames:   spawn_landmark_source(SimLandmarkSource::new(sim_rx)),
                sim_tx:   Some(sim_tx),
                detector: None,
            })
        }
        SourceKind::Detector => {
            let (process, handle) = DetectorProcess::spawn(&cfg.detector, cfg.camera)?;
            Ok(SourceHandles {
                frames:   spawn_landmark_source(process),
                sim_tx:   None,
                detector: Some(handle),
            })
        }
        #[cfg(feature = "leap")]
        SourceKind::Leap => Ok(SourceHandles {
            frames:   spawn_landmark_source(crate::source::LeapLandmarkSource),
            sim_tx:   None,
            detector: None,
        }),
        #[cfg(not(feature = "leap"))]
        SourceKind::Leap => Err(AppError::SourceUnavailable("leap")),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the desktop application.
///
/// Creates the audio backend, the landmark source and the visualizer, then
/// drives the input/frame/render loop at ~60 fps until the window closes or
/// Q/Esc is pressed.
pub fn run(cfg: AppConfig) -> Result<(), AppError> {
    let mut app = AppState::new(cfg.pipeline, build_engine(&cfg)?);
    app.start()?;

    let SourceHandles { frames, sim_tx, detector } = match start_source(&cfg) {
        Ok(s) => s,
        Err(e) => {
            app.shutdown();
            return Err(e);
        }
    };

    let mut vis = match Visualizer::new(sim_tx) {
        Ok(v) => v,
        Err(e) => {
            app.shutdown();
            return Err(e);
        }
    };

    let mut source_open = true;
    'main: while vis.is_open() {
        // 1. Poll window input → sim keys
        if !vis.poll_input() { break; }

        // 2. Drain landmark frames
        while source_open {
            match frames.try_recv() {
                Ok(SourceEvent::Frame(frame)) => app.handle_frame(frame),
                Ok(SourceEvent::Quit) => break 'main,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("landmark source closed");
                    app.status = "landmark source closed - holding last controls".to_string();
                    source_open = false;
                }
            }
        }

        // 3. Render
        vis.render(app.hands(), app.outcome(), app.controls(), app.pipeline(), &app.status);
    }

    app.shutdown();
    drop(detector);
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

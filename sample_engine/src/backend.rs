//! The backend seam: anything that can receive controls and be started.

use hand_geometry::{ControlSink, ControlValues};
use tracing::info;

use crate::error::EngineError;

/// A control sink with a lifecycle.  `write_controls` may be called before
/// `start`; the values are held and take effect once playback begins.
pub trait AudioBackend: ControlSink {
    fn name(&self) -> &'static str;
    fn start(&mut self) -> Result<(), EngineError>;
    fn stop(&mut self);
    /// The most recently written controls.
    fn current(&self) -> ControlValues;
}

// ── null backend (no audio device, tests, headless runs) ──────────────────

#[derive(Clone, Debug, Default)]
pub struct NullEngine {
    current: ControlValues,
    running: bool,
    writes:  u64,
}

impl NullEngine {
    pub fn new() -> Self { Self::default() }
    pub fn is_running(&self) -> bool { self.running }
    pub fn writes(&self) -> u64 { self.writes }
}

impl ControlSink for NullEngine {
    fn write_controls(&mut self, controls: ControlValues) {
        self.current = controls;
        self.writes += 1;
    }
}

impl AudioBackend for NullEngine {
    fn name(&self) -> &'static str { "null" }

    fn start(&mut self) -> Result<(), EngineError> {
        info!("null audio backend started; controls are tracked but not played");
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) { self.running = false; }

    fn current(&self) -> ControlValues { self.current }
}

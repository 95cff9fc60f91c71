//! Shape metrics → pitch (semitones) and playback rate.
//!
//! Two modes, picked at configuration time:
//!
//! * [`MappingMode::AverageSide`] — a bigger quadrilateral raises pitch; a
//!   larger area speeds playback up.
//! * [`MappingMode::BoundingBox`] — horizontal stretch sets pitch, vertical
//!   stretch sets speed, both relative to a neutral `reference_size`.
//!
//! Both clamp saturatingly into `[-12, 12]` semitones and `[0.5, 2.0]`×.

use serde::{Deserialize, Serialize};

use crate::shape::OrderedShape;

pub const MIN_PITCH_SEMITONES: i32 = -12;
pub const MAX_PITCH_SEMITONES: i32 = 12;
pub const MIN_PLAYBACK_RATE:   f64 = 0.5;
pub const MAX_PLAYBACK_RATE:   f64 = 2.0;

/// Neutral hand span for [`MappingMode::BoundingBox`]: a third of the frame.
pub const DEFAULT_REFERENCE_SIZE: f64 = 1.0 / 3.0;

// Average-side calibration
const SIDE_BASELINE:      f64 = 0.1;
const SEMITONES_PER_SIDE: f64 = 24.0;
const RATE_PER_AREA:      f64 = 3.0;

// Bounding-box calibration
const SEMITONES_PER_SPAN: f64 = 12.0;
const RATE_PER_SPAN:      f64 = 1.5;

fn default_reference_size() -> f64 { DEFAULT_REFERENCE_SIZE }

// ════════════════════════════════════════════════════════════════════════════
// ControlValues
// ════════════════════════════════════════════════════════════════════════════

/// The two parameters written into the audio engine each frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlValues {
    /// Pitch offset, `-12..=12` semitones.
    pub pitch_semitones: i32,
    /// Speed multiplier, `0.5..=2.0`; 1.0 is the original speed.
    pub playback_rate:   f64,
}

impl ControlValues {
    /// Original pitch, original speed.
    pub const NEUTRAL: ControlValues = ControlValues { pitch_semitones: 0, playback_rate: 1.0 };
}

impl Default for ControlValues {
    fn default() -> Self { ControlValues::NEUTRAL }
}

/// Pin a raw pitch to the semitone range.  NaN maps to the lower bound.
pub fn clamp_pitch(raw: f64) -> i32 {
    if raw.is_nan() {
        return MIN_PITCH_SEMITONES;
    }
    raw.clamp(MIN_PITCH_SEMITONES as f64, MAX_PITCH_SEMITONES as f64) as i32
}

/// Pin a raw rate to the playback range.  NaN maps to the lower bound.
pub fn clamp_rate(raw: f64) -> f64 {
    if raw.is_nan() {
        return MIN_PLAYBACK_RATE;
    }
    raw.clamp(MIN_PLAYBACK_RATE, MAX_PLAYBACK_RATE)
}

/// Mapper output before clamping; kept for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RawControls {
    /// Already rounded to a whole number of semitones.
    pub pitch:         f64,
    pub playback_rate: f64,
}

impl RawControls {
    pub fn clamp(self) -> ControlValues {
        ControlValues {
            pitch_semitones: clamp_pitch(self.pitch),
            playback_rate:   clamp_rate(self.playback_rate),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MappingMode
// ════════════════════════════════════════════════════════════════════════════

/// Which shape metrics drive the two controls.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum MappingMode {
    /// Pitch from mean side length, rate from area.
    AverageSide,
    /// Pitch from width, rate from height, relative to `reference_size`.
    BoundingBox {
        #[serde(default = "default_reference_size")]
        reference_size: f64,
    },
}

impl Default for MappingMode {
    fn default() -> Self { MappingMode::AverageSide }
}

impl MappingMode {
    pub fn bounding_box() -> Self {
        MappingMode::BoundingBox { reference_size: DEFAULT_REFERENCE_SIZE }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MappingMode::AverageSide        => "average-side",
            MappingMode::BoundingBox { .. } => "bounding-box",
        }
    }

    /// Unclamped mapping of `shape`.
    pub fn raw(&self, shape: &OrderedShape) -> RawControls {
        match *self {
            MappingMode::AverageSide => RawControls {
                pitch: ((shape.average_side() - SIDE_BASELINE) * SEMITONES_PER_SIDE).floor()
                    + MIN_PITCH_SEMITONES as f64,
                playback_rate: MIN_PLAYBACK_RATE + shape.area * RATE_PER_AREA,
            },
            MappingMode::BoundingBox { reference_size } => {
                let bb = shape.bounding_box();
                let width_ratio  = bb.width() / reference_size;
                let height_ratio = bb.height() / reference_size;
                RawControls {
                    pitch:         round_half_up((width_ratio - 1.0) * SEMITONES_PER_SPAN),
                    playback_rate: height_ratio * RATE_PER_SPAN,
                }
            }
        }
    }
}

/// Nearest integer, with exact halves going toward +∞ (-7.5 → -7, 1.5 → 2).
fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

/// Map an ordered shape to clamped control values.
pub fn map_to_controls(shape: &OrderedShape, mode: MappingMode) -> ControlValues {
    mode.raw(shape).clamp()
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

//! Per-frame driver: select → build shape → map → write.
//!
//! [`Pipeline`] is a small `Copy` configuration object.  The frame loop owns
//! it together with a [`ControlSink`] and calls [`Pipeline::process`] once per
//! detector result.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::landmark::DetectedHand;
use crate::mapper::{ControlValues, MappingMode, RawControls};
use crate::select::{select, SelectedPoints, SelectionPolicy};
use crate::shape::{build_shape, OrderedShape};

// ════════════════════════════════════════════════════════════════════════════
// ControlSink
// ════════════════════════════════════════════════════════════════════════════

/// The live parameter slots of an audio engine.
///
/// A write replaces both values; the engine picks them up on its next
/// buffer.  Nothing is written on frames that are skipped.
pub trait ControlSink {
    fn write_controls(&mut self, controls: ControlValues);
}

impl<S: ControlSink + ?Sized> ControlSink for &mut S {
    fn write_controls(&mut self, controls: ControlValues) {
        (**self).write_controls(controls);
    }
}

impl<S: ControlSink + ?Sized> ControlSink for Box<S> {
    fn write_controls(&mut self, controls: ControlValues) {
        (**self).write_controls(controls);
    }
}

/// Keeps every write; handy for tests and offline analysis.
impl ControlSink for Vec<ControlValues> {
    fn write_controls(&mut self, controls: ControlValues) {
        self.push(controls);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FrameOutcome
// ════════════════════════════════════════════════════════════════════════════

/// Result of evaluating one frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FrameOutcome {
    /// Controls were computed (and written, when processed into a sink).
    Updated {
        selected: SelectedPoints,
        shape:    OrderedShape,
        raw:      RawControls,
        controls: ControlValues,
    },
    /// The detector reported no hands.
    NoHands,
    /// Hands were present but fewer than four points survived selection.
    InsufficientPoints { found: usize },
}

impl FrameOutcome {
    pub fn controls(&self) -> Option<ControlValues> {
        match self {
            FrameOutcome::Updated { controls, .. } => Some(*controls),
            _ => None,
        }
    }

    pub fn shape(&self) -> Option<&OrderedShape> {
        match self {
            FrameOutcome::Updated { shape, .. } => Some(shape),
            _ => None,
        }
    }

    pub fn is_update(&self) -> bool {
        matches!(self, FrameOutcome::Updated { .. })
    }

    /// One-line description for status bars.
    pub fn summary(&self) -> String {
        match self {
            FrameOutcome::Updated { controls, .. } => format!(
                "pitch {:+} st  speed {:.2}x",
                controls.pitch_semitones, controls.playback_rate
            ),
            FrameOutcome::NoHands => "no hands detected".to_string(),
            FrameOutcome::InsufficientPoints { found } => {
                format!("{} of 4 points - holding last controls", found)
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Pipeline
// ════════════════════════════════════════════════════════════════════════════

/// Selection policy, depth gate and mapping mode for one deployment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pipeline {
    pub selection:  SelectionPolicy,
    /// Drop points whose depth is missing or not negative.
    pub depth_gate: bool,
    pub mapping:    MappingMode,
}

impl Pipeline {
    pub fn new(selection: SelectionPolicy, mapping: MappingMode) -> Self {
        Pipeline { selection, depth_gate: false, mapping }
    }

    /// Single hand, five fingertips, average-side mapping.
    pub fn desktop() -> Self {
        Pipeline::default()
    }

    /// Two hands, thumb and index tips, bounding-box mapping.
    pub fn browser() -> Self {
        Pipeline::new(SelectionPolicy::TwoHandPinch, MappingMode::bounding_box())
    }

    pub fn with_depth_gate(mut self, on: bool) -> Self {
        self.depth_gate = on;
        self
    }

    /// Evaluate one frame without side effects.
    pub fn evaluate(&self, hands: &[DetectedHand]) -> FrameOutcome {
        if hands.is_empty() {
            return FrameOutcome::NoHands;
        }

        let selected = select(hands, self.selection, self.depth_gate);
        let Some(quad) = selected.quad() else {
            return FrameOutcome::InsufficientPoints { found: selected.len() };
        };

        let shape    = build_shape(quad);
        let raw      = self.mapping.raw(&shape);
        let controls = raw.clamp();
        FrameOutcome::Updated { selected, shape, raw, controls }
    }

    /// Evaluate one frame and write the controls into `sink` if there are any.
    pub fn process<S: ControlSink + ?Sized>(
        &self,
        hands: &[DetectedHand],
        sink:  &mut S,
    ) -> FrameOutcome {
        let outcome = self.evaluate(hands);
        match &outcome {
            FrameOutcome::Updated { shape, raw, controls, .. } => {
                debug!(
                    sides = ?shape.sides,
                    area = shape.area,
                    raw_pitch = raw.pitch,
                    raw_rate = raw.playback_rate,
                    "pitch {} rate {:.2}",
                    controls.pitch_semitones,
                    controls.playback_rate,
                );
                sink.write_controls(*controls);
            }
            FrameOutcome::NoHands => debug!("no hands in frame"),
            FrameOutcome::InsufficientPoints { found } => {
                debug!(found, "insufficient points, skipping frame")
            }
        }
        outcome
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

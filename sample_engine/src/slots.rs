//! Live parameter slots shared between the frame loop and the audio thread.

use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};

use hand_geometry::ControlValues;

/// Pitch and playback rate as two independent atomics.
///
/// A reader may observe the pitch of one write together with the rate of the
/// previous one; the next buffer sees both.
#[derive(Debug)]
pub struct ControlSlots {
    pitch:     AtomicI32,
    rate_bits: AtomicU64,
}

impl ControlSlots {
    pub fn new(initial: ControlValues) -> Self {
        ControlSlots {
            pitch:     AtomicI32::new(initial.pitch_semitones),
            rate_bits: AtomicU64::new(initial.playback_rate.to_bits()),
        }
    }

    pub fn store(&self, controls: ControlValues) {
        self.pitch.store(controls.pitch_semitones, Ordering::Relaxed);
        self.rate_bits.store(controls.playback_rate.to_bits(), Ordering::Relaxed);
    }

    pub fn load(&self) -> ControlValues {
        ControlValues {
            pitch_semitones: self.pitch.load(Ordering::Relaxed),
            playback_rate:   f64::from_bits(self.rate_bits.load(Ordering::Relaxed)),
        }
    }
}

impl Default for ControlSlots {
    fn default() -> Self {
        ControlSlots::new(ControlValues::NEUTRAL)
    }
}

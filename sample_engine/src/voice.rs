//! Variable-speed looping playback.

use std::sync::Arc;

use crate::sample::Sample;

/// Reads a [`Sample`] in a loop at a fractional position, advancing by
/// `playback_rate × source_rate / output_rate` per output frame.
#[derive(Clone, Debug)]
pub struct LoopVoice {
    sample:     Arc<Sample>,
    position:   f64,
    step_scale: f64,
}

impl LoopVoice {
    pub fn new(sample: Arc<Sample>, output_rate: u32) -> Self {
        let step_scale = sample.sample_rate() as f64 / output_rate.max(1) as f64;
        LoopVoice { sample, position: 0.0, step_scale }
    }

    /// Current read position in source frames, always in `[0, len)`.
    pub fn position(&self) -> f64 { self.position }

    /// Produce one output frame and advance.  Linear interpolation between
    /// neighbouring source frames; the last frame interpolates toward the first.
    pub fn next_frame(&mut self, playback_rate: f64) -> f32 {
        let frames = self.sample.frames();
        if frames.is_empty() {
            return 0.0;
        }
        let len = frames.len();

        let idx = (self.position.floor() as usize).min(len - 1);
        let frac = (self.position - idx as f64) as f32;
        let a = frames[idx];
        let b = frames[(idx + 1) % len];
        let out = a + (b - a) * frac;

        let step = playback_rate.max(0.0) * self.step_scale;
        self.position = (self.position + step) % len as f64;
        out
    }
}

//! Delay-line pitch shifter.
//!
//! Two read taps sweep through a short delay line half a window apart.  Each
//! tap's gain is a triangle that is zero where the tap wraps, so the two
//! gains always sum to one and the wrap is inaudible.  Sweeping the delay at
//! `1 - ratio` samples per sample transposes by `ratio` without changing
//! duration.

/// Default window length, in seconds.
pub const DEFAULT_WINDOW_SECS: f64 = 0.1;

#[derive(Clone, Debug)]
pub struct PitchShifter {
    buffer: Vec<f32>,
    write:  usize,
    /// Position of the first tap within the window, `[0, 1)`.
    phase:  f64,
    /// Window length in samples.
    window: f64,
}

impl PitchShifter {
    pub fn new(sample_rate: u32) -> Self {
        Self::with_window(sample_rate, DEFAULT_WINDOW_SECS)
    }

    pub fn with_window(sample_rate: u32, window_secs: f64) -> Self {
        let window = (window_secs * sample_rate as f64).max(4.0).floor();
        PitchShifter {
            buffer: vec![0.0; window as usize + 2],
            write:  0,
            phase:  0.0,
            window,
        }
    }

    pub fn window_len(&self) -> usize { self.window as usize }

    /// Push one input sample, shifted by `semitones`.  Zero is a bypass, but
    /// the delay line keeps filling so a later shift starts from real audio.
    pub fn process(&mut self, input: f32, semitones: i32) -> f32 {
        self.buffer[self.write] = input;

        let out = if semitones == 0 {
            input
        } else {
            let ratio = 2f64.powf(semitones as f64 / 12.0);
            self.phase = (self.phase + (1.0 - ratio) / self.window).rem_euclid(1.0);

            let mut y = 0.0;
            for tap in [self.phase, (self.phase + 0.5) % 1.0] {
                let gain = 1.0 - (2.0 * tap - 1.0).abs();
                y += gain * self.read_delayed(tap * self.window);
            }
            y as f32
        };

        self.write = (self.write + 1) % self.buffer.len();
        out
    }

    fn read_delayed(&self, delay: f64) -> f64 {
        let len = self.buffer.len();
        let pos = (self.write as f64 - delay).rem_euclid(len as f64);
        let i0 = pos.floor() as usize % len;
        let i1 = (i0 + 1) % len;
        let frac = pos - pos.floor();
        self.buffer[i0] as f64 * (1.0 - frac) + self.buffer[i1] as f64 * frac
    }
}

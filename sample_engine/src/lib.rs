//! # sample_engine
//!
//! The audio side of the hand controller: a looping sample whose pitch and
//! playback speed are read from two live slots on every output buffer.
//!
//! * [`ControlSlots`] — lock-free pitch/rate slots shared with the audio
//!   callback.  Writers overwrite; the callback reads once per buffer.
//! * [`Sample`] — a WAV file decoded with `hound` and mixed down to mono.
//! * [`LoopVoice`] + [`PitchShifter`] — the two DSP stages: variable-speed
//!   looping playback followed by a delay-line pitch shifter.
//! * [`AudioEngine`] — drives the DSP from a `cpal` output stream.
//! * [`MidiControlOut`] — alternative backend that forwards the controls to
//!   an external sampler as pitch bend and a controller change.
//! * [`NullEngine`] — keeps the last controls and makes no sound.
//!
//! All backends implement [`AudioBackend`], which extends
//! [`hand_geometry::ControlSink`] with start/stop lifecycle.

pub mod error;
pub mod slots;
pub mod sample;
pub mod voice;
pub mod shifter;
pub mod backend;
pub mod output;
pub mod midi;

pub use error::EngineError;
pub use slots::ControlSlots;
pub use sample::Sample;
pub use voice::LoopVoice;
pub use shifter::PitchShifter;
pub use backend::{AudioBackend, NullEngine};
pub use output::{AudioEngine, Renderer};
pub use midi::MidiControlOut;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to decode {path}: {source}")]
    Wav {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    #[error("audio file {0} contains no samples")]
    EmptySample(PathBuf),

    #[error("no audio output device found")]
    NoOutputDevice,

    #[error("audio device config: {0}")]
    DeviceConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("unsupported output sample format {0:?}")]
    UnsupportedFormat(cpal::SampleFormat),

    #[error("MIDI init: {0}")]
    MidiInit(#[from] midir::InitError),

    #[error("no MIDI output ports found")]
    NoMidiPort,

    #[error("MIDI connect: {0}")]
    MidiConnect(String),
}

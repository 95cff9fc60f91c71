//! Application configuration: TOML file, then CLI overrides.
//!
//! ```toml
//! audio  = "loop.wav"
//! camera = 0
//! engine = "cpal"
//! source = "detector"
//!
//! [pipeline.selection]
//! policy = "fingertips"
//! max_y  = 0.7
//!
//! [pipeline.mapping]
//! mode = "average-side"
//!
//! [detector]
//! command = "python3"
//! args    = ["hand_detect.py"]
//!
//! [server]
//! port         = 3000
//! open_browser = true
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use hand_geometry::mapper::DEFAULT_REFERENCE_SIZE;
use hand_geometry::select::DEFAULT_MAX_Y;
use hand_geometry::{MappingMode, Pipeline, SelectionPolicy};
use sample_engine::midi::DEFAULT_RATE_CC;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

// ════════════════════════════════════════════════════════════════════════════
// Enumerated choices
// ════════════════════════════════════════════════════════════════════════════

/// Which audio backend receives the controls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Loop the audio file through the default output device.
    #[default]
    Cpal,
    /// Send pitch bend and a rate controller to an external sampler.
    Midi,
    /// Track controls without producing sound.
    Null,
}

/// Where hand landmarks come from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Keyboard-driven synthetic hands.
    #[default]
    Sim,
    /// External hand detector process writing JSON lines.
    Detector,
    /// LeapMotion controller (`leap` feature).
    Leap,
}

// ════════════════════════════════════════════════════════════════════════════
// Sections
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub command: String,
    /// Arguments before the camera index, which is always appended last.
    pub args:    Vec<String>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            command: "python3".to_string(),
            args:    vec!["hand_detect.py".to_string()],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiConfig {
    /// Case-insensitive substring of the preferred port name.
    pub port_hint: Option<String>,
    pub channel:   u8,
    pub rate_cc:   u8,
}

impl Default for MidiConfig {
    fn default() -> Self {
        MidiConfig { port_hint: None, channel: 0, rate_cc: DEFAULT_RATE_CC }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port:         u16,
    pub public_dir:   PathBuf,
    pub pipeline:     Pipeline,
    /// Open the page in the default browser once listening.
    pub open_browser: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port:         3000,
            public_dir:   PathBuf::from("public"),
            pipeline:     Pipeline::browser(),
            open_browser: true,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Audio file looped by the engine and served at `/audio`.
    pub audio:    PathBuf,
    /// Capture device index handed to the detector.
    pub camera:   u32,
    pub pipeline: Pipeline,
    pub engine:   EngineKind,
    pub source:   SourceKind,
    pub detector: DetectorConfig,
    pub midi:     MidiConfig,
    pub server:   ServerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            audio:    PathBuf::from("loop.wav"),
            camera:   0,
            pipeline: Pipeline::desktop(),
            engine:   EngineKind::default(),
            source:   SourceKind::default(),
            detector: DetectorConfig::default(),
            midi:     MidiConfig::default(),
            server:   ServerConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, AppError> {
        toml::from_str(text).map_err(|source| AppError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = fs::read_to_string(path).map_err(|source| AppError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, path)
    }

    /// Load `path` if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, AppError> {
        match path {
            Some(p) => Self::load(p),
            None    => Ok(Self::default()),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// CLI overrides for a pipeline
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SelectionChoice {
    Fingertips,
    ExtendedFingers,
    TwoHandPinch,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum MappingChoice {
    AverageSide,
    BoundingBox,
}

/// Pipeline flags shared by `run` and `serve`.  Unset flags keep the
/// configured value; a bare `--max-y` or `--reference-size` adjusts the
/// configured policy/mode when it has that parameter.
#[derive(Clone, Debug, Default, Args)]
pub struct PipelineOverrides {
    /// Landmark selection policy
    #[arg(long, value_enum)]
    pub selection: Option<SelectionChoice>,

    /// Fingertip cut-off for the fingertips policy (0 = top of frame)
    #[arg(long)]
    pub max_y: Option<f64>,

    /// Shape-to-control mapping
    #[arg(long, value_enum)]
    pub mapping: Option<MappingChoice>,

    /// Neutral span for bounding-box mapping, as a fraction of the frame
    #[arg(long)]
    pub reference_size: Option<f64>,

    /// Keep only points in front of the hand plane (z < 0)
    #[arg(long)]
    pub depth_gate: bool,
}

impl PipelineOverrides {
    pub fn apply(&self, p: &mut Pipeline) {
        let current_max_y = match p.selection {
            SelectionPolicy::Fingertips { max_y } => max_y,
            _ => DEFAULT_MAX_Y,
        };
        let max_y = self.max_y.unwrap_or(current_max_y);
        p.selection = match (self.selection, p.selection) {
            (Some(SelectionChoice::Fingertips), _) | (None, SelectionPolicy::Fingertips { .. }) => {
                SelectionPolicy::Fingertips { max_y }
            }
            (Some(SelectionChoice::ExtendedFingers), _) => SelectionPolicy::ExtendedFingers,
            (Some(SelectionChoice::TwoHandPinch), _)    => SelectionPolicy::TwoHandPinch,
            (None, other) => other,
        };

        let current_ref = match p.mapping {
            MappingMode::BoundingBox { reference_size } => reference_size,
            MappingMode::AverageSide => DEFAULT_REFERENCE_SIZE,
        };
        let reference_size = self.reference_size.unwrap_or(current_ref);
        p.mapping = match (self.mapping, p.mapping) {
            (Some(MappingChoice::BoundingBox), _) | (None, MappingMode::BoundingBox { .. }) => {
                MappingMode::BoundingBox { reference_size }
            }
            (Some(MappingChoice::AverageSide), _) => MappingMode::AverageSide,
            (None, other) => other,
        };

        if self.depth_gate {
            p.depth_gate = true;
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

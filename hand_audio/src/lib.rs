//! # hand_audio
//!
//! Hand-shape controller for a looping audio sample.  Four tracked points
//! (fingertips, or thumb and index of two pinching hands) form a
//! quadrilateral; its size sets the pitch shift and its area or height sets
//! the playback speed.
//!
//! Two entry points share the same [`hand_geometry::Pipeline`]:
//!
//! * `hand_audio run` — desktop mode.  Landmarks arrive from a source
//!   thread, controls go to a [`sample_engine::AudioBackend`], and a
//!   `minifb` window draws the hand, the shape and the meters.
//! * `hand_audio serve` — browser mode.  An `axum` server delivers the page,
//!   the audio file and a `/controls` endpoint that maps posted landmarks.
//!
//! ## Landmark sources
//!
//! * `sim` (default) — keyboard-driven synthetic hands.
//! * `detector` — an external process printing one JSON detection per line.
//! * `leap` — a LeapMotion controller (`leap` feature).
//!
//! ### Simulation keyboard shortcuts
//!
//! | Key | Effect |
//! |---|---|
//! | `←` / `→` hold | Narrow / widen the finger spread |
//! | `↑` / `↓` hold | Lengthen / shorten the fingers |
//! | `W` `A` `S` `D` hold | Move the hand |
//! | `1`–`5` | Curl / extend thumb … pinky |
//! | `H` | Toggle the second (pinching) hand |
//! | `Q` / `Escape` | Quit |

pub mod config;
pub mod error;
pub mod source;
pub mod visualizer;
pub mod app;
pub mod server;

pub use config::{AppConfig, EngineKind, PipelineOverrides, SourceKind};
pub use error::AppError;

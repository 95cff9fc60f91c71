//! # hand_geometry
//!
//! Turns one frame of hand landmarks into a pair of bounded audio controls:
//! a pitch offset in semitones and a playback-rate multiplier.
//!
//! ## Pipeline
//!
//! ```text
//! [DetectedHand]  ──select──▶  SelectedPoints  ──build_shape──▶  OrderedShape
//!                                                                    │
//!                                      ControlSink ◀──write── map_to_controls
//! ```
//!
//! | Stage | Module | Strategy enum |
//! |---|---|---|
//! | Landmark selection | [`select`] | [`SelectionPolicy`] |
//! | Quadrilateral geometry | [`shape`] | — |
//! | Control mapping | [`mapper`] | [`MappingMode`] |
//! | Frame driver | [`pipeline`] | [`Pipeline`] |
//!
//! Every frame is evaluated from scratch.  A frame that yields fewer than
//! four usable points is reported as [`FrameOutcome::InsufficientPoints`] and
//! leaves the sink untouched, so the audio keeps its last pitch and speed.
//!
//! ## Quick start
//!
//! ```rust
//! use hand_geometry::{build_shape, map_to_controls, MappingMode, Point};
//!
//! let square = [
//!     Point::new(0.4, 0.4), Point::new(0.5, 0.4),
//!     Point::new(0.5, 0.5), Point::new(0.4, 0.5),
//! ];
//! let shape = build_shape(square);
//! let controls = map_to_controls(&shape, MappingMode::AverageSide);
//! assert_eq!(controls.pitch_semitones, -12);
//! assert!((controls.playback_rate - 0.53).abs() < 1e-9);
//! ```

pub mod error;
pub mod landmark;
pub mod select;
pub mod shape;
pub mod mapper;
pub mod pipeline;

pub use error::GeometryError;
pub use landmark::{DetectedHand, Handedness, LandmarkSet, Point, LANDMARK_COUNT};
pub use select::{select, SelectedPoints, SelectionPolicy};
pub use shape::{build_shape, BoundingBox, OrderedShape};
pub use mapper::{map_to_controls, ControlValues, MappingMode, RawControls};
pub use pipeline::{ControlSink, FrameOutcome, Pipeline};

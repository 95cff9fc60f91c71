//! Landmark types as delivered by the hand-pose detector.
//!
//! Coordinates are normalized to the image: `x` and `y` lie in `[0, 1]`
//! with `y` growing downward.  `z` is a relative depth where negative means
//! closer to the camera; not every source provides it.

use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

/// Number of landmarks per detected hand.
pub const LANDMARK_COUNT: usize = 21;

// ════════════════════════════════════════════════════════════════════════════
// Anatomical indices
// ════════════════════════════════════════════════════════════════════════════

/// Fixed landmark numbering used by the detector.
pub mod index {
    pub const WRIST:      usize = 0;
    pub const THUMB_CMC:  usize = 1;
    pub const THUMB_MCP:  usize = 2;
    pub const THUMB_IP:   usize = 3;
    pub const THUMB_TIP:  usize = 4;
    pub const INDEX_MCP:  usize = 5;
    pub const INDEX_PIP:  usize = 6;
    pub const INDEX_DIP:  usize = 7;
    pub const INDEX_TIP:  usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_DIP: usize = 11;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_MCP:   usize = 13;
    pub const RING_PIP:   usize = 14;
    pub const RING_DIP:   usize = 15;
    pub const RING_TIP:   usize = 16;
    pub const PINKY_MCP:  usize = 17;
    pub const PINKY_PIP:  usize = 18;
    pub const PINKY_DIP:  usize = 19;
    pub const PINKY_TIP:  usize = 20;

    /// Thumb, index, middle, ring, pinky.
    pub const FINGERTIPS: [usize; 5] = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

    /// Bone connections of the hand skeleton, for drawing.
    pub const CONNECTIONS: [(usize, usize); 21] = [
        (0, 1),  (1, 2),   (2, 3),   (3, 4),
        (0, 5),  (5, 6),   (6, 7),   (7, 8),
        (5, 9),  (9, 10),  (10, 11), (11, 12),
        (9, 13), (13, 14), (14, 15), (15, 16),
        (13, 17), (17, 18), (18, 19), (19, 20),
        (0, 17),
    ];
}

// ════════════════════════════════════════════════════════════════════════════
// Point
// ════════════════════════════════════════════════════════════════════════════

/// A normalized image-space coordinate with optional depth.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y, z: None }
    }

    pub const fn with_depth(x: f64, y: f64, z: f64) -> Self {
        Point { x, y, z: Some(z) }
    }

    /// Planar Euclidean distance; depth is ignored.
    pub fn distance(&self, other: &Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// True when the detector placed this point in front of the hand's
    /// reference plane (`z < 0`).  Points without depth are never in front.
    pub fn is_in_front(&self) -> bool {
        matches!(self.z, Some(z) if z < 0.0)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkSet
// ════════════════════════════════════════════════════════════════════════════

/// The 21 landmarks of one detected hand.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point>", into = "Vec<Point>")]
pub struct LandmarkSet {
    points: [Point; LANDMARK_COUNT],
}

impl LandmarkSet {
    pub fn new(points: [Point; LANDMARK_COUNT]) -> Self {
        LandmarkSet { points }
    }

    pub fn points(&self) -> &[Point; LANDMARK_COUNT] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        self.points.iter()
    }
}

impl Index<usize> for LandmarkSet {
    type Output = Point;

    fn index(&self, i: usize) -> &Point {
        &self.points[i]
    }
}

impl TryFrom<Vec<Point>> for LandmarkSet {
    type Error = GeometryError;

    fn try_from(points: Vec<Point>) -> Result<Self, Self::Error> {
        let found = points.len();
        let points: [Point; LANDMARK_COUNT] = points.try_into().map_err(|_| {
            GeometryError::LandmarkCount { expected: LANDMARK_COUNT, found }
        })?;
        Ok(LandmarkSet { points })
    }
}

impl From<LandmarkSet> for Vec<Point> {
    fn from(set: LandmarkSet) -> Self {
        set.points.to_vec()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// DetectedHand
// ════════════════════════════════════════════════════════════════════════════

/// Which hand the detector believes it saw.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
    #[default]
    Unknown,
}

impl Handedness {
    /// Parse a detector label; anything but `Left`/`Right` is `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "left"  => Handedness::Left,
            "right" => Handedness::Right,
            _       => Handedness::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Handedness::Left    => "Left",
            Handedness::Right   => "Right",
            Handedness::Unknown => "Unknown",
        }
    }
}

/// One hand from one detector invocation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectedHand {
    pub landmarks:  LandmarkSet,
    #[serde(default)]
    pub handedness: Handedness,
    /// Detector confidence, 0.0–1.0.
    #[serde(default)]
    pub score:      f64,
}

impl DetectedHand {
    pub fn new(landmarks: LandmarkSet, handedness: Handedness, score: f64) -> Self {
        DetectedHand { landmarks, handedness, score }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

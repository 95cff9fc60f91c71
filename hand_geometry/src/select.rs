//! Landmark selection — which points of which hands form the control shape.
//!
//! Three policies exist, one per deployment:
//!
//! * [`SelectionPolicy::Fingertips`] — the five fingertips of the first hand,
//!   keeping those above a horizontal cut-off (`y < max_y`).
//! * [`SelectionPolicy::ExtendedFingers`] — fingertips of the first hand whose
//!   tip sits higher on screen than a reference joint of the same finger.
//! * [`SelectionPolicy::TwoHandPinch`] — thumb tip and index tip of up to two
//!   hands, unconditionally, in detection order.
//!
//! An optional depth gate can drop every point not in front of the hand
//! plane (`z < 0`).  It is off by default.

use serde::{Deserialize, Serialize};

use crate::landmark::{index, DetectedHand, Point};

/// Default vertical cut-off for [`SelectionPolicy::Fingertips`].
pub const DEFAULT_MAX_Y: f64 = 0.7;

/// Hands considered by [`SelectionPolicy::TwoHandPinch`].
pub const MAX_PINCH_HANDS: usize = 2;

/// Points needed to build the control quadrilateral.
pub const QUAD_POINTS: usize = 4;

/// (fingertip, reference joint) pairs for the extension test.
pub const EXTENSION_REFERENCE: [(usize, usize); 5] = [
    (index::THUMB_TIP,  index::THUMB_IP),
    (index::INDEX_TIP,  index::INDEX_PIP),
    (index::MIDDLE_TIP, index::MIDDLE_PIP),
    (index::RING_TIP,   index::RING_PIP),
    (index::PINKY_TIP,  index::PINKY_PIP),
];

fn default_max_y() -> f64 { DEFAULT_MAX_Y }

// ════════════════════════════════════════════════════════════════════════════
// SelectionPolicy
// ════════════════════════════════════════════════════════════════════════════

/// How candidate points are drawn from the detected hands.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "kebab-case")]
pub enum SelectionPolicy {
    /// Fixed fingertip indices of the first hand, filtered by height.
    Fingertips {
        #[serde(default = "default_max_y")]
        max_y: f64,
    },
    /// Fingertips of the first hand that are extended.
    ExtendedFingers,
    /// Thumb and index tips of up to two hands.
    TwoHandPinch,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        SelectionPolicy::Fingertips { max_y: DEFAULT_MAX_Y }
    }
}

impl SelectionPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            SelectionPolicy::Fingertips { .. } => "fingertips",
            SelectionPolicy::ExtendedFingers   => "extended-fingers",
            SelectionPolicy::TwoHandPinch      => "two-hand-pinch",
        }
    }

    fn candidates(&self, hands: &[DetectedHand]) -> Vec<Point> {
        match *self {
            SelectionPolicy::Fingertips { max_y } => hands
                .first()
                .map(|hand| {
                    index::FINGERTIPS.iter()
                        .map(|&i| hand.landmarks[i])
                        .filter(|tip| tip.y < max_y)
                        .collect()
                })
                .unwrap_or_default(),

            SelectionPolicy::ExtendedFingers => hands
                .first()
                .map(|hand| {
                    let lm = &hand.landmarks;
                    EXTENSION_REFERENCE.iter()
                        .filter(|&&(tip, joint)| lm[tip].y < lm[joint].y)
                        .map(|&(tip, _)| lm[tip])
                        .collect()
                })
                .unwrap_or_default(),

            SelectionPolicy::TwoHandPinch => hands
                .iter()
                .take(MAX_PINCH_HANDS)
                .flat_map(|hand| {
                    [hand.landmarks[index::THUMB_TIP], hand.landmarks[index::INDEX_TIP]]
                })
                .collect(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SelectedPoints
// ════════════════════════════════════════════════════════════════════════════

/// Points that survived selection, in selection order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SelectedPoints {
    points: Vec<Point>,
}

impl SelectedPoints {
    pub fn len(&self) -> usize { self.points.len() }
    pub fn is_empty(&self) -> bool { self.points.is_empty() }
    pub fn as_slice(&self) -> &[Point] { &self.points }

    /// The first four points, or `None` if fewer than four survived.
    pub fn quad(&self) -> Option<[Point; QUAD_POINTS]> {
        match self.points.as_slice() {
            [a, b, c, d, ..] => Some([*a, *b, *c, *d]),
            _ => None,
        }
    }
}

impl From<Vec<Point>> for SelectedPoints {
    fn from(points: Vec<Point>) -> Self {
        SelectedPoints { points }
    }
}

/// Apply `policy` (and the depth gate, if enabled) to one frame of hands.
pub fn select(hands: &[DetectedHand], policy: SelectionPolicy, depth_gate: bool) -> SelectedPoints {
    let mut points = policy.candidates(hands);
    if depth_gate {
        points.retain(Point::is_in_front);
    }
    SelectedPoints { points }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{Handedness, LandmarkSet, LANDMARK_COUNT};

    /// A hand with every landmark at (0.5, 0.8) and selected landmarks moved.
    fn hand_with(overrides: &[(usize, Point)]) -> DetectedHand {
        let mut pts = [Point::with_depth(0.5, 0.8, 0.0); LANDMARK_COUNT];
        for &(i, p) in overrides {
            pts[i] = p;
        }
        DetectedHand::new(LandmarkSet::new(pts), Handedness::Right, 0.9)
    }

    #[test]
    fn fingertips_keeps_index_order_and_filters_low_tips() {
        let hand = hand_with(&[
            (index::THUMB_TIP,  Point::new(0.1, 0.6)),
            (index::INDEX_TIP,  Point::new(0.2, 0.3)),
            (index::MIDDLE_TIP, Point::new(0.3, 0.75)),
            (index::RING_TIP,   Point::new(0.4, 0.2)),
            (index::PINKY_TIP,  Point::new(0.5, 0.69)),
        ]);
        let sel = select(&[hand], SelectionPolicy::default(), false);
        let xs: Vec<f64> = sel.as_slice().iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.1, 0.2, 0.4, 0.5]);
    }

    #[test]
    fn fingertips_threshold_is_strict() {
        let hand = hand_with(&[(index::THUMB_TIP, Point::new(0.1, 0.7))]);
        let sel = select(&[hand], SelectionPolicy::default(), false);
        assert!(sel.is_empty());
    }

    #[test]
    fn fingertips_uses_only_first_hand() {
        let high = hand_with(&index::FINGERTIPS.map(|i| (i, Point::new(0.5, 0.1))));
        let low  = hand_with(&[]);
        let sel = select(&[low, high], SelectionPolicy::default(), false);
        assert!(sel.is_empty());
    }

    #[test]
    fn three_surviving_points_give_no_quad() {
        let hand = hand_with(&[
            (index::THUMB_TIP,  Point::new(0.1, 0.2)),
            (index::INDEX_TIP,  Point::new(0.2, 0.2)),
            (index::MIDDLE_TIP, Point::new(0.3, 0.2)),
        ]);
        let sel = select(&[hand], SelectionPolicy::default(), false);
        assert_eq!(sel.len(), 3);
        assert!(sel.quad().is_none());
    }

    #[test]
    fn five_points_quad_takes_first_four() {
        let hand = hand_with(&index::FINGERTIPS.map(|i| (i, Point::new(i as f64 / 20.0, 0.1))));
        let sel = select(&[hand], SelectionPolicy::default(), false);
        assert_eq!(sel.len(), 5);
        let quad = sel.quad().unwrap();
        assert_eq!(quad[3].x, index::RING_TIP as f64 / 20.0);
    }

    #[test]
    fn extended_fingers_compares_against_reference_joint() {
        let hand = hand_with(&[
            // thumb extended: tip above IP
            (index::THUMB_TIP,  Point::new(0.1, 0.30)),
            (index::THUMB_IP,   Point::new(0.1, 0.40)),
            // index curled: tip below PIP
            (index::INDEX_TIP,  Point::new(0.2, 0.50)),
            (index::INDEX_PIP,  Point::new(0.2, 0.45)),
            // middle extended
            (index::MIDDLE_TIP, Point::new(0.3, 0.20)),
            (index::MIDDLE_PIP, Point::new(0.3, 0.40)),
            // ring tied with joint: not extended
            (index::RING_TIP,   Point::new(0.4, 0.40)),
            (index::RING_PIP,   Point::new(0.4, 0.40)),
            // pinky extended
            (index::PINKY_TIP,  Point::new(0.5, 0.25)),
            (index::PINKY_PIP,  Point::new(0.5, 0.35)),
        ]);
        let sel = select(&[hand], SelectionPolicy::ExtendedFingers, false);
        let xs: Vec<f64> = sel.as_slice().iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.1, 0.3, 0.5]);
    }

    #[test]
    fn two_hand_pinch_concatenates_in_detection_order() {
        let a = hand_with(&[
            (index::THUMB_TIP, Point::new(0.1, 0.9)),
            (index::INDEX_TIP, Point::new(0.2, 0.9)),
        ]);
        let b = hand_with(&[
            (index::THUMB_TIP, Point::new(0.7, 0.95)),
            (index::INDEX_TIP, Point::new(0.8, 0.95)),
        ]);
        let c = hand_with(&[(index::THUMB_TIP, Point::new(0.99, 0.1))]);
        let sel = select(&[a, b, c], SelectionPolicy::TwoHandPinch, false);
        let xs: Vec<f64> = sel.as_slice().iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.1, 0.2, 0.7, 0.8]);
    }

    #[test]
    fn two_hand_pinch_one_hand_is_insufficient() {
        let sel = select(&[hand_with(&[])], SelectionPolicy::TwoHandPinch, false);
        assert_eq!(sel.len(), 2);
        assert!(sel.quad().is_none());
    }

    #[test]
    fn depth_gate_drops_points_not_in_front() {
        let a = hand_with(&[
            (index::THUMB_TIP, Point::with_depth(0.1, 0.5, -0.02)),
            (index::INDEX_TIP, Point::with_depth(0.2, 0.5, 0.01)),
        ]);
        let b = hand_with(&[
            (index::THUMB_TIP, Point::with_depth(0.7, 0.5, -0.05)),
            (index::INDEX_TIP, Point::new(0.8, 0.5)),
        ]);
        let hands = [a, b];
        assert_eq!(select(&hands, SelectionPolicy::TwoHandPinch, false).len(), 4);
        let gated = select(&hands, SelectionPolicy::TwoHandPinch, true);
        let xs: Vec<f64> = gated.as_slice().iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.1, 0.7]);
    }

    #[test]
    fn no_hands_selects_nothing() {
        for policy in [
            SelectionPolicy::default(),
            SelectionPolicy::ExtendedFingers,
            SelectionPolicy::TwoHandPinch,
        ] {
            assert!(select(&[], policy, false).is_empty(), "{}", policy.name());
        }
    }

    #[test]
    fn policy_parses_from_tagged_json() {
        let p: SelectionPolicy = serde_json::from_str(r#"{"policy":"fingertips"}"#).unwrap();
        assert_eq!(p, SelectionPolicy::Fingertips { max_y: 0.7 });
        let p: SelectionPolicy =
            serde_json::from_str(r#"{"policy":"fingertips","max_y":0.5}"#).unwrap();
        assert_eq!(p, SelectionPolicy::Fingertips { max_y: 0.5 });
        let p: SelectionPolicy = serde_json::from_str(r#"{"policy":"two-hand-pinch"}"#).unwrap();
        assert_eq!(p, SelectionPolicy::TwoHandPinch);
    }
}

//! Landmark sources — an external detector process, keyboard simulation, or
//! LeapMotion hardware.
//!
//! The public interface is [`SourceEvent`] delivered over a `mpsc` channel.
//! Consumers don't need to know where the landmarks came from.

use std::io::{BufRead, BufReader};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use hand_geometry::landmark::index;
use hand_geometry::{DetectedHand, GeometryError, Handedness, LandmarkSet, Point, LANDMARK_COUNT};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::DetectorConfig;
use crate::error::AppError;

// ════════════════════════════════════════════════════════════════════════════
// HandFrame / SourceEvent
// ════════════════════════════════════════════════════════════════════════════

/// All hands seen in one detector invocation, in detection order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HandFrame {
    pub hands: Vec<DetectedHand>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SourceEvent {
    Frame(HandFrame),
    /// The user asked to quit from inside the source (simulation keys).
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkSource trait — unified interface for detector, sim and hw
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`SourceEvent`]s over a channel.
pub trait LandmarkSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<SourceEvent>);
}

/// Spawn a landmark source on its own thread and return the receiving end.
pub fn spawn_landmark_source<S: LandmarkSource>(source: S) -> Receiver<SourceEvent> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// Detector wire format
// ════════════════════════════════════════════════════════════════════════════

/// One line of detector output, also the body of `POST /controls`.
///
/// Unknown fields (e.g. `world_landmarks`) are ignored.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct DetectionJson {
    #[serde(default)]
    pub hands: Vec<HandJson>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct HandJson {
    #[serde(default)]
    pub handedness: String,
    #[serde(default)]
    pub score:      f64,
    pub landmarks:  Vec<Point>,
}

#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("detector reported: {0}")]
    Detector(String),

    #[error(transparent)]
    Landmarks(#[from] GeometryError),
}

impl DetectionJson {
    pub fn into_frame(self) -> Result<HandFrame, DetectionError> {
        if let Some(msg) = self.error {
            return Err(DetectionError::Detector(msg));
        }
        let hands = self
            .hands
            .into_iter()
            .map(|h| {
                let landmarks = LandmarkSet::try_from(h.landmarks)?;
                Ok(DetectedHand::new(landmarks, Handedness::from_label(&h.handedness), h.score))
            })
            .collect::<Result<Vec<_>, GeometryError>>()?;
        Ok(HandFrame { hands })
    }
}

pub fn parse_detection_line(line: &str) -> Result<HandFrame, DetectionError> {
    serde_json::from_str::<DetectionJson>(line)?.into_frame()
}

// ════════════════════════════════════════════════════════════════════════════
// DetectorProcess — external hand detector writing JSON lines
// ════════════════════════════════════════════════════════════════════════════

/// Reads detector stdout on the source thread.
pub struct DetectorProcess {
    stdout:  BufReader<ChildStdout>,
    command: String,
}

/// Owns the child process; kills it when dropped.
pub struct DetectorHandle {
    child: Child,
}

impl DetectorProcess {
    /// Start `command args… <camera>` with stdout piped.
    pub fn spawn(cfg: &DetectorConfig, camera: u32) -> Result<(Self, DetectorHandle), AppError> {
        let mut child = Command::new(&cfg.command)
            .args(&cfg.args)
            .arg(camera.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| AppError::DetectorSpawn { command: cfg.command.clone(), source })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AppError::DetectorStdout(cfg.command.clone()))?;

        info!(command = %cfg.command, camera, pid = child.id(), "hand detector started");
        Ok((
            DetectorProcess { stdout: BufReader::new(stdout), command: cfg.command.clone() },
            DetectorHandle { child },
        ))
    }
}

impl LandmarkSource for DetectorProcess {
    fn run(self: Box<Self>, tx: Sender<SourceEvent>) {
        let DetectorProcess { stdout, command } = *self;
        for line in stdout.lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    warn!(%command, "detector read failed: {}", e);
                    break;
                }
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line == "READY" {
                info!(%command, "hand detector ready");
                continue;
            }
            match parse_detection_line(line) {
                Ok(frame) => {
                    if tx.send(SourceEvent::Frame(frame)).is_err() {
                        return;
                    }
                }
                Err(e) => warn!(%command, "skipping detector line: {}", e),
            }
        }
        info!(%command, "detector output closed");
    }
}

impl Drop for DetectorHandle {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LeapLandmarkSource — real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Landmark source backed by a LeapMotion controller.
///
/// Requires the `leap` feature flag and the LeapC shared library installed.
/// Millimetre positions are projected onto the unit square as seen from
/// above the device (x right, y toward the user).
#[cfg(feature = "leap")]
pub struct LeapLandmarkSource;

#[cfg(feature = "leap")]
impl LandmarkSource for LeapLandmarkSource {
    fn run(self: Box<Self>, tx: Sender<SourceEvent>) {
        use leaprs::*;
        use tracing::error;

        let mut connection = match Connection::create(ConnectionConfig::default()) {
            Ok(c)  => c,
            Err(e) => {
                error!("failed to create LeapC connection: {:?}", e);
                return;
            }
        };
        if let Err(e) = connection.open() {
            error!("failed to open LeapMotion device: {:?}", e);
            return;
        }
        info!("LeapMotion connection open");

        loop {
            let msg = match connection.poll(100) {
                Ok(m)  => m,
                Err(_) => continue,
            };

            if let Event::Tracking(frame) = msg.event() {
                let hands: Vec<DetectedHand> = frame.hands().map(|h| leap_hand(&h)).collect();
                if tx.send(SourceEvent::Frame(HandFrame { hands })).is_err() {
                    return;
                }
            }
        }
    }
}

#[cfg(feature = "leap")]
fn leap_hand(hand: &leaprs::Hand) -> DetectedHand {
    const HALF_WIDTH_MM: f32 = 200.0;
    const DEPTH_MM:      f32 = 200.0;
    const HEIGHT_MM:     f32 = 400.0;

    let project = |x: f32, y: f32, z: f32| {
        Point::with_depth(
            ((x + HALF_WIDTH_MM) / (2.0 * HALF_WIDTH_MM)) as f64,
            ((z + DEPTH_MM) / (2.0 * DEPTH_MM)) as f64,
            (-y / HEIGHT_MM) as f64,
        )
    };

    let palm = hand.palm().position();
    let mut pts = [project(palm.x, palm.y, palm.z); LANDMARK_COUNT];
    for (f, digit) in hand.digits().enumerate().take(5) {
        let joints = [
            digit.metacarpal().next_joint(),
            digit.proximal().next_joint(),
            digit.intermediate().next_joint(),
            digit.distal().next_joint(),
        ];
        for (j, v) in joints.iter().enumerate() {
            pts[1 + 4 * f + j] = project(v.x, v.y, v.z);
        }
    }

    let handedness = if hand.hand_type() == leaprs::HandType::Left {
        Handedness::Left
    } else {
        Handedness::Right
    };
    DetectedHand::new(LandmarkSet::new(pts), handedness, 1.0)
}

// ════════════════════════════════════════════════════════════════════════════
// SimLandmarkSource — keyboard simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Raw input event from the simulation window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimInput {
    KeyDown(SimKey),
}

/// Simulated key codes (mapped from minifb Key).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimKey {
    /// Right arrow
    Wider,
    /// Left arrow
    Narrower,
    /// Up arrow
    Taller,
    /// Down arrow
    Shorter,
    /// W
    MoveUp,
    /// S
    MoveDown,
    /// A
    MoveLeft,
    /// D
    MoveRight,
    /// 1–5, thumb to pinky
    ToggleFinger(usize),
    /// H
    ToggleSecondHand,
    /// Q / Esc
    Quit,
}

/// Geometry of the simulated hand(s), in normalized image coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimHands {
    /// Knuckle-line centre of the primary hand.
    pub cx:         f64,
    pub cy:         f64,
    /// Horizontal distance from thumb to pinky.
    pub spread:     f64,
    /// Knuckle-to-tip length of an extended finger.
    pub length:     f64,
    pub extended:   [bool; 5],
    pub two_hands:  bool,
}

impl Default for SimHands {
    fn default() -> Self {
        SimHands {
            cx:        0.35,
            cy:        0.55,
            spread:    0.2,
            length:    0.2,
            extended:  [true; 5],
            two_hands: false,
        }
    }
}

const SIM_STEP: f64 = 0.02;

impl SimHands {
    pub fn apply(&mut self, key: SimKey) {
        match key {
            SimKey::Wider     => self.spread = (self.spread + SIM_STEP).min(0.8),
            SimKey::Narrower  => self.spread = (self.spread - SIM_STEP).max(0.0),
            SimKey::Taller    => self.length = (self.length + SIM_STEP).min(0.5),
            SimKey::Shorter   => self.length = (self.length - SIM_STEP).max(0.02),
            SimKey::MoveUp    => self.cy = (self.cy - SIM_STEP).max(0.0),
            SimKey::MoveDown  => self.cy = (self.cy + SIM_STEP).min(1.0),
            SimKey::MoveLeft  => self.cx = (self.cx - SIM_STEP).max(0.0),
            SimKey::MoveRight => self.cx = (self.cx + SIM_STEP).min(1.0),
            SimKey::ToggleFinger(f) => {
                if let Some(e) = self.extended.get_mut(f) {
                    *e = !*e;
                }
            }
            SimKey::ToggleSecondHand => self.two_hands = !self.two_hands,
            SimKey::Quit => {}
        }
    }

    /// The primary (right) hand, plus a mirrored left hand when enabled.
    pub fn hands(&self) -> Vec<DetectedHand> {
        let mut hands = vec![self.hand(self.cx, Handedness::Right)];
        if self.two_hands {
            hands.push(self.hand(1.0 - self.cx, Handedness::Left));
        }
        hands
    }

    fn hand(&self, cx: f64, handedness: Handedness) -> DetectedHand {
        // Thumb sits lower and is shorter; middle finger is the longest.
        const BASE_DROP:   [f64; 5] = [0.10, 0.0, 0.0, 0.0, 0.02];
        const LENGTH_MULT: [f64; 5] = [0.60, 0.9, 1.0, 0.9, 0.75];

        let mirror = if handedness == Handedness::Left { -1.0 } else { 1.0 };
        let mut pts = [Point::with_depth(cx, self.cy + 0.25, 0.0); LANDMARK_COUNT];

        for (f, &extended) in self.extended.iter().enumerate() {
            let x = cx + mirror * (f as f64 - 2.0) * self.spread / 4.0;
            let base = self.cy + BASE_DROP[f];
            let len = self.length * LENGTH_MULT[f];
            // knuckle, middle joint, outer joint, tip
            let joints = if extended {
                [(base, -0.01), (base - len / 3.0, -0.02), (base - 2.0 * len / 3.0, -0.03), (base - len, -0.04)]
            } else {
                [(base, 0.0), (base - len / 4.0, 0.01), (base - len / 8.0, 0.02), (base + 0.02, 0.03)]
            };
            for (j, &(y, z)) in joints.iter().enumerate() {
                pts[index::THUMB_CMC + 4 * f + j] = Point::with_depth(x, y, z);
            }
        }
        DetectedHand::new(LandmarkSet::new(pts), handedness, 1.0)
    }
}

/// Landmark source driven by [`SimInput`] events (from the visualizer's window).
pub struct SimLandmarkSource {
    pub rx:    Receiver<SimInput>,
    pub hands: SimHands,
}

impl SimLandmarkSource {
    pub fn new(rx: Receiver<SimInput>) -> Self {
        SimLandmarkSource { rx, hands: SimHands::default() }
    }
}

impl LandmarkSource for SimLandmarkSource {
    fn run(self: Box<Self>, tx: Sender<SourceEvent>) {
        let SimLandmarkSource { rx, mut hands } = *self;
        let frame = |h: &SimHands| SourceEvent::Frame(HandFrame { hands: h.hands() });

        if tx.send(frame(&hands)).is_err() {
            return;
        }
        for SimInput::KeyDown(key) in rx {
            if key == SimKey::Quit {
                let _ = tx.send(SourceEvent::Quit);
                return;
            }
            hands.apply(key);
            if tx.send(frame(&hands)).is_err() {
                return;
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

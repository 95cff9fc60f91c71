//! Software-rendered visualizer using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌───────────────────────────────────────────────┬──────────────┐
//! │  camera-space view                            │  HANDS       │
//! │    hand skeletons, landmarks                  │  MODE        │
//! │    selected points, ordered quadrilateral     │              │
//! │    reference square guide                     │  PITCH  +3   │
//! │                                               │  SPEED 1.25X │
//! │                                               │  [bars]      │
//! ├───────────────────────────────────────────────┴──────────────┤
//! │  status bar / key legend                                     │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use std::sync::mpsc::Sender;
use std::time::Duration;

use hand_geometry::landmark::index::CONNECTIONS;
use hand_geometry::mapper::{
    MAX_PITCH_SEMITONES, MAX_PLAYBACK_RATE, MIN_PITCH_SEMITONES, MIN_PLAYBACK_RATE,
};
use hand_geometry::{
    ControlValues, DetectedHand, FrameOutcome, Handedness, MappingMode, Pipeline, Point,
};
use minifb::{Key, KeyRepeat, Window, WindowOptions};

use crate::error::AppError;
use crate::source::{SimInput, SimKey};

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:     usize = 960;
pub const WIN_H:     usize = 600;
pub const PANEL_W:   usize = 220;
pub const VIEW_W:    usize = WIN_W - PANEL_W;
pub const VIEW_H:    usize = WIN_H - STATUS_H;
const STATUS_H:      usize = 40;
const BG_COLOR:      u32   = 0xFF101820;
const PANEL_BG:      u32   = 0xFF16213E;
const TEXT_BG:       u32   = 0xFF0F3460;
const BONE_RIGHT:    u32   = 0xFF3FA7D6;
const BONE_LEFT:     u32   = 0xFFE07A5F;
const JOINT_COLOR:   u32   = 0xFFEEEEEE;
const SELECT_COLOR:  u32   = 0xFFFFD700;  // gold
const QUAD_COLOR:    u32   = 0xFF7CFC00;
const BBOX_COLOR:    u32   = 0xFF4A7A4A;
const GUIDE_COLOR:   u32   = 0xFF505A6A;

// ════════════════════════════════════════════════════════════════════════════
// Canvas — window-independent pixel buffer
// ════════════════════════════════════════════════════════════════════════════

pub struct Canvas {
    pub buf: Vec<u32>,
    pub w:   usize,
    pub h:   usize,
}

impl Canvas {
    pub fn new(w: usize, h: usize) -> Self {
        Canvas { buf: vec![BG_COLOR; w * h], w, h }
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        (x < self.w && y < self.h).then(|| self.buf[y * self.w + x])
    }

    pub fn clear(&mut self, color: u32) { self.buf.fill(color); }

    pub fn set_pixel(&mut self, x: isize, y: isize, color: u32) {
        if x >= 0 && y >= 0 && (x as usize) < self.w && (y as usize) < self.h {
            self.buf[y as usize * self.w + x as usize] = color;
        }
    }

    pub fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(self.h) {
            for col in x..(x + w).min(self.w) {
                self.buf[row * self.w + col] = color;
            }
        }
    }

    pub fn draw_border(&mut self, x: isize, y: isize, w: isize, h: isize, color: u32) {
        if w <= 0 || h <= 0 { return; }
        for col in x..x + w {
            self.set_pixel(col, y, color);
            self.set_pixel(col, y + h - 1, color);
        }
        for row in y..y + h {
            self.set_pixel(x, row, color);
            self.set_pixel(x + w - 1, row, color);
        }
    }

    /// Bresenham line, clipped per pixel.
    pub fn draw_line(&mut self, (x0, y0): (isize, isize), (x1, y1): (isize, isize), color: u32) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let (mut x, mut y, mut err) = (x0, y0, dx + dy);
        loop {
            self.set_pixel(x, y, color);
            if x == x1 && y == y1 { break; }
            let e2 = 2 * err;
            if e2 >= dy { err += dy; x += sx; }
            if e2 <= dx { err += dx; y += sy; }
        }
    }

    /// Filled square of side `2r + 1` centred on `(cx, cy)`.
    pub fn draw_dot(&mut self, (cx, cy): (isize, isize), r: isize, color: u32) {
        for y in cy - r..=cy + r {
            for x in cx - r..=cx + r {
                self.set_pixel(x, y, color);
            }
        }
    }

    /// 3×5 bitmap text, each glyph pixel drawn as a `scale`×`scale` block.
    pub fn draw_label(&mut self, text: &str, x: usize, y: usize, scale: usize, color: u32) {
        let scale = scale.max(1);
        let mut cx = x;
        for ch in text.chars() {
            let bits = glyph(ch);
            for row in 0..5 {
                for col in 0..3 {
                    if bits >> ((4 - row) * 3 + (2 - col)) & 1 != 0 {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale; // 3 wide + 1 gap
            if cx + 4 * scale > self.w { break; }
        }
    }

    /// Horizontal meter, `t` in 0–1.
    pub fn draw_meter(&mut self, x: usize, y: usize, w: usize, h: usize, t: f64, color: u32) {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        self.fill_rect(x, y, w, h, TEXT_BG);
        self.fill_rect(x, y, (w as f64 * t).round() as usize, h, color);
        self.draw_border(x as isize, y as isize, w as isize, h as isize, JOINT_COLOR);
    }
}

/// Map a normalized image point into the camera view.
///
/// Results stay within one view size of the visible area, so line drawing
/// between far-off points is bounded.
pub fn to_view(p: &Point) -> (isize, isize) {
    let axis = |v: f64, span: usize| {
        let span = span as f64;
        (v * span).round().clamp(-span, 2.0 * span) as isize
    };
    (axis(p.x, VIEW_W), axis(p.y, VIEW_H))
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer — window + scene drawing
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    canvas: Canvas,
    /// Present only when the simulated source is active.
    sim_tx: Option<Sender<SimInput>>,
}

impl Visualizer {
    pub fn new(sim_tx: Option<Sender<SimInput>>) -> Result<Self, AppError> {
        let mut window = Window::new(
            "Hand Audio — shape to pitch and speed",
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| AppError::Window(e.to_string()))?;

        window.limit_update_rate(Some(Duration::from_millis(16))); // ~60fps

        Ok(Visualizer { window, canvas: Canvas::new(WIN_W, WIN_H), sim_tx })
    }

    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Poll keyboard input.  Returns false when the user asked to quit.
    pub fn poll_input(&mut self) -> bool {
        if !self.window.is_open() { return false; }

        let one_shot = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);
        let held     = |k: Key| self.window.is_key_pressed(k, KeyRepeat::Yes);

        if one_shot(Key::Q) || one_shot(Key::Escape) {
            self.send(SimKey::Quit);
            return false;
        }
        if self.sim_tx.is_none() { return true; }

        let mut keys = Vec::new();
        for (k, sk) in [
            (Key::Right, SimKey::Wider),
            (Key::Left,  SimKey::Narrower),
            (Key::Up,    SimKey::Taller),
            (Key::Down,  SimKey::Shorter),
            (Key::W,     SimKey::MoveUp),
            (Key::S,     SimKey::MoveDown),
            (Key::A,     SimKey::MoveLeft),
            (Key::D,     SimKey::MoveRight),
        ] {
            if held(k) { keys.push(sk); }
        }
        for (f, k) in [Key::Key1, Key::Key2, Key::Key3, Key::Key4, Key::Key5].into_iter().enumerate() {
            if one_shot(k) { keys.push(SimKey::ToggleFinger(f)); }
        }
        if one_shot(Key::H) { keys.push(SimKey::ToggleSecondHand); }

        for k in keys {
            self.send(k);
        }
        true
    }

    fn send(&self, key: SimKey) {
        if let Some(tx) = &self.sim_tx {
            let _ = tx.send(SimInput::KeyDown(key));
        }
    }

    /// Render one frame.
    pub fn render(
        &mut self,
        hands:    &[DetectedHand],
        outcome:  &FrameOutcome,
        controls: ControlValues,
        pipeline: &Pipeline,
        status:   &str,
    ) {
        draw_scene(&mut self.canvas, hands, outcome, controls, pipeline, status, self.sim_tx.is_some());
        self.window.update_with_buffer(&self.canvas.buf, WIN_W, WIN_H).ok();
    }
}

/// Draw everything into `c`; separated from the window for testing.
pub fn draw_scene(
    c:        &mut Canvas,
    hands:    &[DetectedHand],
    outcome:  &FrameOutcome,
    controls: ControlValues,
    pipeline: &Pipeline,
    status:   &str,
    sim_keys: bool,
) {
    c.clear(BG_COLOR);

    // ── Reference square guide ────────────────────────────────────────────
    if let MappingMode::BoundingBox { reference_size } = pipeline.mapping {
        let reference_size = reference_size.clamp(0.0, 2.0);
        let side_w = (reference_size * VIEW_W as f64) as isize;
        let side_h = (reference_size * VIEW_H as f64) as isize;
        c.draw_border(
            (VIEW_W as isize - side_w) / 2,
            (VIEW_H as isize - side_h) / 2,
            side_w, side_h, GUIDE_COLOR,
        );
    }

    // ── Skeletons ─────────────────────────────────────────────────────────
    for hand in hands {
        let bone = if hand.handedness == Handedness::Left { BONE_LEFT } else { BONE_RIGHT };
        for &(a, b) in CONNECTIONS.iter() {
            c.draw_line(to_view(&hand.landmarks[a]), to_view(&hand.landmarks[b]), bone);
        }
        for p in hand.landmarks.iter() {
            c.draw_dot(to_view(p), 1, JOINT_COLOR);
        }
    }

    // ── Selected points + quadrilateral ───────────────────────────────────
    if let FrameOutcome::Updated { selected, shape, .. } = outcome {
        if matches!(pipeline.mapping, MappingMode::BoundingBox { .. }) {
            let bb = shape.bounding_box();
            let (x0, y0) = to_view(&Point::new(bb.min_x, bb.min_y));
            let (x1, y1) = to_view(&Point::new(bb.max_x, bb.max_y));
            c.draw_border(x0, y0, x1 - x0 + 1, y1 - y0 + 1, BBOX_COLOR);
        }
        for i in 0..shape.points.len() {
            let a = to_view(&shape.points[i]);
            let b = to_view(&shape.points[(i + 1) % shape.points.len()]);
            c.draw_line(a, b, QUAD_COLOR);
        }
        for p in selected.as_slice() {
            c.draw_dot(to_view(p), 3, SELECT_COLOR);
        }
    }

    // ── Info panel ────────────────────────────────────────────────────────
    c.fill_rect(VIEW_W, 0, PANEL_W, VIEW_H, PANEL_BG);
    let px = VIEW_W + 12;
    c.draw_label(&format!("HANDS {}", hands.len()), px, 12, 2, 0xFFAADDFF);
    for (i, hand) in hands.iter().take(4).enumerate() {
        c.draw_label(
            &format!("{} {:.2}", hand.handedness.label(), hand.score),
            px, 36 + i * 10, 1, JOINT_COLOR,
        );
    }
    c.draw_label(pipeline.selection.name(), px, 90, 1, 0xFF888888);
    c.draw_label(pipeline.mapping.name(), px, 100, 1, 0xFF888888);
    if pipeline.depth_gate {
        c.draw_label("depth gate", px, 110, 1, 0xFF888888);
    }

    c.draw_label("PITCH", px, 140, 2, SELECT_COLOR);
    c.draw_label(&format!("{:+}", controls.pitch_semitones), px, 156, 4, JOINT_COLOR);
    let pitch_t = (controls.pitch_semitones - MIN_PITCH_SEMITONES) as f64
        / (MAX_PITCH_SEMITONES - MIN_PITCH_SEMITONES) as f64;
    c.draw_meter(px, 184, PANEL_W - 24, 10, pitch_t, SELECT_COLOR);

    c.draw_label("SPEED", px, 214, 2, QUAD_COLOR);
    c.draw_label(&format!("{:.2}x", controls.playback_rate), px, 230, 4, JOINT_COLOR);
    let rate_t = (controls.playback_rate - MIN_PLAYBACK_RATE) / (MAX_PLAYBACK_RATE - MIN_PLAYBACK_RATE);
    c.draw_meter(px, 258, PANEL_W - 24, 10, rate_t, QUAD_COLOR);

    if let Some(shape) = outcome.shape() {
        c.draw_label(&format!("side {:.3}", shape.average_side()), px, 290, 1, 0xFF888888);
        c.draw_label(&format!("area {:.4}", shape.area), px, 300, 1, 0xFF888888);
    }

    // ── Status bar ────────────────────────────────────────────────────────
    c.fill_rect(0, VIEW_H, WIN_W, STATUS_H, TEXT_BG);
    c.draw_label(status, 10, VIEW_H + 8, 2, 0xFFEEEEEE);

    // ── Key legend ────────────────────────────────────────────────────────
    let legend = if sim_keys {
        "arrows=spread/length  WASD=move  1-5=fingers  H=second hand  Q/Esc=quit"
    } else {
        "Q/Esc=quit"
    };
    c.draw_label(legend, 10, WIN_H - 10, 1, 0xFF888888);
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font, five rows of three bits packed high to low
// ────────────────────────────────────────────────────────────────────────────

const FALLBACK_GLYPH: u16 = 0x0080; // centre dot

const GLYPHS: &[(char, u16)] = &[
    ('0', 0x7B6F), ('1', 0x2C97), ('2', 0x73E7), ('3', 0x73CF), ('4', 0x5BC9), ('5', 0x79CF),
    ('6', 0x79EF), ('7', 0x7249), ('8', 0x7BEF), ('9', 0x7BCF), ('A', 0x7BED), ('B', 0x6BAE),
    ('C', 0x7927), ('D', 0x6B6E), ('E', 0x79E7), ('F', 0x79E4), ('G', 0x796F), ('H', 0x5BED),
    ('I', 0x7497), ('J', 0x126F), ('K', 0x5BAD), ('L', 0x4927), ('M', 0x5F6D), ('N', 0x7B6D),
    ('O', 0x7B6F), ('P', 0x7BE4), ('Q', 0x7B79), ('R', 0x6BAD), ('S', 0x79CF), ('T', 0x7492),
    ('U', 0x5B6F), ('V', 0x5B52), ('W', 0x5B7D), ('X', 0x5AAD), ('Y', 0x5BD2), ('Z', 0x72A7),
    (' ', 0x0000), ('!', 0x2482), ('#', 0x5F7D), ('%', 0x52A5), ('\'', 0x2400), ('(', 0x2922),
    (')', 0x224A), ('+', 0x05D0), (',', 0x0014), ('-', 0x01C0), ('.', 0x0002), ('/', 0x12A4),
    (':', 0x0410), ('<', 0x1511), ('=', 0x0E38), ('>', 0x4454), ('?', 0x72C2), ('[', 0x6926),
    (']', 0x324B), ('_', 0x0007),];

fn glyph(c: char) -> u16 {
    let c = c.to_ascii_uppercase();
    GLYPHS
        .iter()
        .find(|&&(g, _)| g == c)
        .map(|&(_, bits)| bits)
        .unwrap_or(FALLBACK_GLYPH)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use hand_geometry::{LandmarkSet, LANDMARK_COUNT};

    #[test]
    fn glyphs_are_case_insensitive() {
        assert_eq!(glyph('a'), glyph('A'));
        assert_eq!(glyph('~'), FALLBACK_GLYPH);
        assert_eq!(glyph(' '), 0);
    }

    #[test]
    fn label_draws_the_one_glyph() {
        let mut c = Canvas::new(8, 8);
        c.draw_label("1", 0, 0, 1, 0xFFFFFFFF);
        // row 0 is 010, row 4 is 111
        assert_eq!(c.pixel(0, 0), Some(BG_COLOR));
        assert_eq!(c.pixel(1, 0), Some(0xFFFFFFFF));
        assert_eq!(c.pixel(0, 4), Some(0xFFFFFFFF));
        assert_eq!(c.pixel(2, 4), Some(0xFFFFFFFF));
    }

    #[test]
    fn line_hits_both_endpoints_and_clips() {
        let mut c = Canvas::new(10, 10);
        c.draw_line((1, 1), (8, 5), 7);
        assert_eq!(c.pixel(1, 1), Some(7));
        assert_eq!(c.pixel(8, 5), Some(7));
        c.draw_line((-5, -5), (20, 20), 9);
        assert_eq!(c.pixel(9, 9), Some(9));
    }

    #[test]
    fn fill_and_border_clip_to_canvas() {
        let mut c = Canvas::new(4, 4);
        c.fill_rect(2, 2, 10, 10, 1);
        assert_eq!(c.pixel(3, 3), Some(1));
        assert_eq!(c.pixel(1, 1), Some(BG_COLOR));
        c.draw_border(-1, -1, 3, 3, 2);
        assert_eq!(c.pixel(1, 1), Some(2));
        assert_eq!(c.pixel(0, 0), Some(BG_COLOR));
    }

    #[test]
    fn view_mapping_scales_to_the_camera_pane() {
        assert_eq!(to_view(&Point::new(0.0, 0.0)), (0, 0));
        assert_eq!(to_view(&Point::new(1.0, 1.0)), (VIEW_W as isize, VIEW_H as isize));
        assert_eq!(to_view(&Point::new(0.5, 0.5)), (VIEW_W as isize / 2, VIEW_H as isize / 2));
    }

    #[test]
    fn far_off_points_stay_near_the_view() {
        let (w, h) = (VIEW_W as isize, VIEW_H as isize);
        assert_eq!(to_view(&Point::new(1e12, -1e12)), (2 * w, -h));
        assert_eq!(to_view(&Point::new(f64::INFINITY, f64::NAN)), (2 * w, 0));
    }

    #[test]
    fn scene_with_far_off_landmarks_draws() {
        let mut pts = [Point::new(0.5, 0.9); LANDMARK_COUNT];
        pts[4]  = Point::new(0.40, 0.40);
        pts[8]  = Point::new(1e12, 0.40);
        pts[12] = Point::new(0.50, -1e12);
        pts[16] = Point::new(0.40, 0.50);
        let hands = vec![DetectedHand::new(LandmarkSet::new(pts), Handedness::Left, 0.9)];
        let pipeline = Pipeline::desktop();
        let outcome = pipeline.evaluate(&hands);

        let mut c = Canvas::new(WIN_W, WIN_H);
        draw_scene(&mut c, &hands, &outcome, ControlValues::NEUTRAL, &pipeline, "far", false);
        let (x, y) = to_view(&pts[4]);
        assert_eq!(c.pixel(x as usize, y as usize), Some(SELECT_COLOR));
    }

    #[test]
    fn scene_marks_selected_points() {
        let mut pts = [Point::new(0.5, 0.9); LANDMARK_COUNT];
        pts[4]  = Point::new(0.40, 0.40);
        pts[8]  = Point::new(0.50, 0.40);
        pts[12] = Point::new(0.50, 0.50);
        pts[16] = Point::new(0.40, 0.50);
        let hands = vec![DetectedHand::new(LandmarkSet::new(pts), Handedness::Right, 0.9)];
        let pipeline = Pipeline::desktop();
        let outcome = pipeline.evaluate(&hands);
        let controls = outcome.controls().unwrap();

        let mut c = Canvas::new(WIN_W, WIN_H);
        draw_scene(&mut c, &hands, &outcome, controls, &pipeline, "ok", true);

        let (x, y) = to_view(&pts[8]);
        assert_eq!(c.pixel(x as usize, y as usize), Some(SELECT_COLOR));
        assert_eq!(c.pixel(VIEW_W + 1, 1), Some(PANEL_BG));
    }
}

//! MIDI control output for driving an external sampler.
//!
//! Pitch goes out as pitch bend with the bend range set to ±12 semitones via
//! RPN 0; playback rate goes out on a single controller.  Messages are sent
//! only when the value changes.

use hand_geometry::mapper::{
    MAX_PITCH_SEMITONES, MAX_PLAYBACK_RATE, MIN_PITCH_SEMITONES, MIN_PLAYBACK_RATE,
};
use hand_geometry::{ControlSink, ControlValues};
use midir::{MidiOutput, MidiOutputConnection};
use tracing::{debug, info, warn};

use crate::backend::AudioBackend;
use crate::error::EngineError;

/// General-purpose controller 1.
pub const DEFAULT_RATE_CC: u8 = 16;
pub const BEND_CENTER: u16 = 8192;
const BEND_MAX: u16 = 16383;

// ── message encoding ──────────────────────────────────────────────────────

/// Map -12..=12 semitones onto the 14-bit bend range, 0 → centre.
pub fn pitch_bend_value(semitones: i32) -> u16 {
    let s = semitones.clamp(MIN_PITCH_SEMITONES, MAX_PITCH_SEMITONES);
    let span = (MAX_PITCH_SEMITONES - MIN_PITCH_SEMITONES) as f64;
    ((s - MIN_PITCH_SEMITONES) as f64 / span * BEND_MAX as f64).round() as u16
}

/// Map 0.5..=2.0 onto 0..=127.
pub fn rate_cc_value(rate: f64) -> u8 {
    let r = if rate.is_nan() { MIN_PLAYBACK_RATE } else { rate.clamp(MIN_PLAYBACK_RATE, MAX_PLAYBACK_RATE) };
    ((r - MIN_PLAYBACK_RATE) / (MAX_PLAYBACK_RATE - MIN_PLAYBACK_RATE) * 127.0).round() as u8
}

pub fn bend_message(channel: u8, value: u16) -> [u8; 3] {
    [0xE0 | (channel & 0x0F), (value & 0x7F) as u8, ((value >> 7) & 0x7F) as u8]
}

pub fn cc_message(channel: u8, controller: u8, value: u8) -> [u8; 3] {
    [0xB0 | (channel & 0x0F), controller & 0x7F, value & 0x7F]
}

/// RPN 0 (pitch bend sensitivity) = `semitones`, then RPN null.
pub fn bend_range_messages(channel: u8, semitones: u8) -> [[u8; 3]; 6] {
    [
        cc_message(channel, 101, 0),
        cc_message(channel, 100, 0),
        cc_message(channel, 6, semitones),
        cc_message(channel, 38, 0),
        cc_message(channel, 101, 127),
        cc_message(channel, 100, 127),
    ]
}

// ════════════════════════════════════════════════════════════════════════════
// MidiControlOut
// ════════════════════════════════════════════════════════════════════════════

pub struct MidiControlOut {
    conn:      Option<MidiOutputConnection>,
    port_hint: Option<String>,
    channel:   u8,
    rate_cc:   u8,
    current:   ControlValues,
    last_sent: Option<ControlValues>,
}

impl MidiControlOut {
    pub fn new(port_hint: Option<String>, channel: u8, rate_cc: u8) -> Self {
        MidiControlOut {
            conn: None,
            port_hint,
            channel: channel & 0x0F,
            rate_cc: rate_cc & 0x7F,
            current: ControlValues::NEUTRAL,
            last_sent: None,
        }
    }

    pub fn is_connected(&self) -> bool { self.conn.is_some() }

    fn send(&mut self, msg: &[u8]) {
        if let Some(conn) = self.conn.as_mut() {
            if let Err(e) = conn.send(msg) {
                warn!("MIDI send failed: {}", e);
            }
        }
    }

    fn flush(&mut self) {
        if self.conn.is_none() {
            return;
        }
        let c = self.current;
        let last = self.last_sent;
        if last.map(|l| l.pitch_semitones) != Some(c.pitch_semitones) {
            self.send(&bend_message(self.channel, pitch_bend_value(c.pitch_semitones)));
        }
        let cc = rate_cc_value(c.playback_rate);
        if last.map(|l| rate_cc_value(l.playback_rate)) != Some(cc) {
            self.send(&cc_message(self.channel, self.rate_cc, cc));
        }
        self.last_sent = Some(c);
    }
}

/// Pick a port: the first whose name contains `hint` (case-insensitive),
/// otherwise a visible soft sampler/synth, otherwise the first port.
fn choose_port(names: &[String], hint: Option<&str>) -> usize {
    let lower: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
    if let Some(h) = hint.map(str::to_lowercase) {
        if let Some(i) = lower.iter().position(|n| n.contains(&h)) {
            return i;
        }
    }
    lower
        .iter()
        .position(|n| {
            n.contains("sampler") || n.contains("fluid") || n.contains("timidity") ||
            n.contains("synth")
        })
        .unwrap_or(0)
}

impl ControlSink for MidiControlOut {
    fn write_controls(&mut self, controls: ControlValues) {
        self.current = controls;
        self.flush();
    }
}

impl AudioBackend for MidiControlOut {
    fn name(&self) -> &'static str { "midi" }

    fn start(&mut self) -> Result<(), EngineError> {
        if self.conn.is_some() {
            return Ok(());
        }
        let midi_out = MidiOutput::new("hand_audio_controls")?;
        let ports = midi_out.ports();
        if ports.is_empty() {
            return Err(EngineError::NoMidiPort);
        }

        let names: Vec<String> = ports
            .iter()
            .map(|p| midi_out.port_name(p).unwrap_or_else(|_| "Unknown".to_string()))
            .collect();
        let idx = choose_port(&names, self.port_hint.as_deref());
        info!("Opening MIDI port: {}", names[idx]);

        let conn = midi_out
            .connect(&ports[idx], "hand-audio")
            .map_err(|e| EngineError::MidiConnect(e.to_string()))?;
        self.conn = Some(conn);

        for msg in bend_range_messages(self.channel, MAX_PITCH_SEMITONES as u8) {
            self.send(&msg);
        }
        self.last_sent = None;
        self.flush();
        debug!(channel = self.channel, cc = self.rate_cc, "MIDI controls live");
        Ok(())
    }

    fn stop(&mut self) {
        self.send(&bend_message(self.channel, BEND_CENTER));
        if let Some(conn) = self.conn.take() {
            conn.close();
            info!("MIDI port closed");
        }
        self.last_sent = None;
    }

    fn current(&self) -> ControlValues { self.current }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bend_covers_the_full_range() {
        assert_eq!(pitch_bend_value(-12), 0);
        assert_eq!(pitch_bend_value(0), BEND_CENTER);
        assert_eq!(pitch_bend_value(12), BEND_MAX);
        assert_eq!(pitch_bend_value(40), BEND_MAX);
        assert!(pitch_bend_value(-1) < pitch_bend_value(1));
    }

    #[test]
    fn rate_cc_endpoints() {
        assert_eq!(rate_cc_value(0.5), 0);
        assert_eq!(rate_cc_value(2.0), 127);
        assert_eq!(rate_cc_value(1.0), 42);
        assert_eq!(rate_cc_value(f64::NAN), 0);
        assert_eq!(rate_cc_value(9.0), 127);
    }

    #[test]
    fn bend_message_splits_fourteen_bits() {
        assert_eq!(bend_message(0, BEND_CENTER), [0xE0, 0x00, 0x40]);
        assert_eq!(bend_message(3, BEND_MAX), [0xE3, 0x7F, 0x7F]);
        assert_eq!(bend_message(0x1F, 0)[0], 0xEF);
    }

    #[test]
    fn bend_range_sets_rpn_zero() {
        let msgs = bend_range_messages(1, 12);
        assert_eq!(msgs[0], [0xB1, 101, 0]);
        assert_eq!(msgs[2], [0xB1, 6, 12]);
        assert_eq!(msgs[5], [0xB1, 100, 127]);
    }

    #[test]
    fn port_choice_prefers_hint_then_synth() {
        let names = vec!["Midi Through".to_string(), "FLUID Synth".to_string(), "My Sampler".to_string()];
        assert_eq!(choose_port(&names, Some("my sam")), 2);
        assert_eq!(choose_port(&names, None), 1);
        assert_eq!(choose_port(&names, Some("absent")), 1);
        assert_eq!(choose_port(&["x".to_string()], None), 0);
    }

    #[test]
    fn disconnected_output_still_tracks_controls() {
        let mut m = MidiControlOut::new(None, 0, DEFAULT_RATE_CC);
        let c = ControlValues { pitch_semitones: 4, playback_rate: 1.2 };
        m.write_controls(c);
        assert!(!m.is_connected());
        assert_eq!(m.current(), c);
    }
}

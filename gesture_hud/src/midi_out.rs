//! MIDI mirror of the control levels.
//!
//! Every frame that fires a gesture rule sends the touched level as a MIDI
//! Control Change: CC 7 (channel volume) for volume and CC 74 (sound
//! brightness) for brightness, scaled to 0–127. Sending happens on its own
//! thread so a slow port never stalls frame processing.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use hand_gesture::{ControlChange, ControlState, FrameReport, GestureConfig};

/// Channel volume.
pub const CC_VOLUME: u8 = 7;
/// Sound controller 5, "brightness".
pub const CC_BRIGHTNESS: u8 = 74;

// ════════════════════════════════════════════════════════════════════════════
// MidiConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiConfig {
    pub enabled:   bool,
    /// MIDI channel 0–15.
    pub channel:   u8,
    /// Case-insensitive substring of the preferred output port name.
    pub port_hint: Option<String>,
}

impl Default for MidiConfig {
    fn default() -> Self {
        MidiConfig { enabled: true, channel: 0, port_hint: None }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ControlCommand: sent to the output thread
// ════════════════════════════════════════════════════════════════════════════

pub enum ControlCommand {
    /// Send every level, regardless of what changed.
    Sync(ControlState),
    /// Send the level(s) a rule touched.
    Update(ControlState, ControlChange),
    /// Terminate the thread.
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// MidiOut: abstraction over midir / null (for testing)
// ════════════════════════════════════════════════════════════════════════════

trait MidiOut: Send {
    fn control_change(&mut self, channel: u8, controller: u8, value: u8);
}

struct MidirOut {
    conn: midir::MidiOutputConnection,
}

impl MidiOut for MidirOut {
    fn control_change(&mut self, channel: u8, controller: u8, value: u8) {
        let msg = [0xB0 | (channel & 0x0F), controller & 0x7F, value & 0x7F];
        if let Err(e) = self.conn.send(&msg) {
            warn!(error = %e, "MIDI send failed");
        }
    }
}

struct NullOut;

impl MidiOut for NullOut {
    fn control_change(&mut self, _ch: u8, _cc: u8, _v: u8) {}
}

/// Open the hinted port, else the first available one; null output if none.
fn open_midi_output(port_hint: Option<&str>) -> Box<dyn MidiOut> {
    let midi_out = match midir::MidiOutput::new("gesture_hud") {
        Ok(m)  => m,
        Err(e) => {
            warn!(error = %e, "MIDI init failed, using null output");
            return Box::new(NullOut);
        }
    };

    let ports = midi_out.ports();
    if ports.is_empty() {
        warn!("no MIDI output ports found, using null output");
        return Box::new(NullOut);
    }

    let port_idx = port_hint
        .map(str::to_lowercase)
        .and_then(|hint| {
            ports.iter().position(|p| {
                midi_out
                    .port_name(p)
                    .map(|n| n.to_lowercase().contains(&hint))
                    .unwrap_or(false)
            })
        })
        .unwrap_or(0);

    let port = &ports[port_idx];
    let name = midi_out.port_name(port).unwrap_or_else(|_| "Unknown".to_string());
    info!(port = %name, "opening MIDI port");

    match midi_out.connect(port, "gesture-levels") {
        Ok(conn) => Box::new(MidirOut { conn }),
        Err(e) => {
            warn!(error = %e, "MIDI connect failed, using null output");
            Box::new(NullOut)
        }
    }
}

/// Map a level in `[min, max]` onto 0–127.
pub fn scale_to_midi(level: u8, min: u8, max: u8) -> u8 {
    if max <= min {
        return 0;
    }
    let clamped = level.clamp(min, max) - min;
    ((clamped as u32 * 127 + (max - min) as u32 / 2) / (max - min) as u32) as u8
}

// ════════════════════════════════════════════════════════════════════════════
// ControlSink: the output thread
// ════════════════════════════════════════════════════════════════════════════

/// Handle to the MIDI output thread.
pub struct ControlSink {
    cmd_tx: Option<Sender<ControlCommand>>,
    handle: Option<JoinHandle<()>>,
}

impl ControlSink {
    /// Spawn the output thread and push the initial levels.
    pub fn spawn(cfg: &MidiConfig, gesture: &GestureConfig, initial: ControlState) -> Self {
        if !cfg.enabled {
            return ControlSink::disabled();
        }
        let (cmd_tx, cmd_rx) = mpsc::channel::<ControlCommand>();
        let channel   = cfg.channel;
        let port_hint = cfg.port_hint.clone();
        let bounds    = (gesture.min_level, gesture.max_level);

        let handle = thread::spawn(move || {
            let out = open_midi_output(port_hint.as_deref());
            output_thread(out, channel, bounds, cmd_rx);
        });
        let _ = cmd_tx.send(ControlCommand::Sync(initial));

        ControlSink { cmd_tx: Some(cmd_tx), handle: Some(handle) }
    }

    /// A sink that drops everything.
    pub fn disabled() -> Self {
        ControlSink { cmd_tx: None, handle: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.cmd_tx.is_some()
    }

    /// Forward a frame's outcome when a rule fired.
    pub fn publish(&self, report: &FrameReport) {
        if report.change == ControlChange::None {
            return;
        }
        if let Some(tx) = &self.cmd_tx {
            let _ = tx.send(ControlCommand::Update(report.control, report.change));
        }
    }

    pub fn sync(&self, state: ControlState) {
        if let Some(tx) = &self.cmd_tx {
            let _ = tx.send(ControlCommand::Sync(state));
        }
    }
}

impl Drop for ControlSink {
    fn drop(&mut self) {
        if let Some(tx) = self.cmd_tx.take() {
            let _ = tx.send(ControlCommand::Quit);
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn output_thread(
    mut out:  Box<dyn MidiOut>,
    channel:  u8,
    bounds:   (u8, u8),
    cmd_rx:   Receiver<ControlCommand>,
) {
    for cmd in cmd_rx {
        if !apply_command(out.as_mut(), channel, bounds, cmd) {
            return;
        }
    }
}

/// Send the messages for one command; false once the thread should stop.
fn apply_command(out: &mut dyn MidiOut, channel: u8, (min, max): (u8, u8), cmd: ControlCommand) -> bool {
    let (state, volume, brightness) = match cmd {
        ControlCommand::Sync(s)           => (s, true, true),
        ControlCommand::Update(s, change) => (s, change.touches_volume(), change.touches_brightness()),
        ControlCommand::Quit              => return false,
    };
    if volume {
        out.control_change(channel, CC_VOLUME, scale_to_midi(state.volume, min, max));
    }
    if brightness {
        out.control_change(channel, CC_BRIGHTNESS, scale_to_midi(state.brightness, min, max));
    }
    true
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

//! Combine per-hand signals into control updates.
//!
//! | Signals this frame | Gesture | Effect |
//! |---|---|---|
//! | 0 | - | nothing |
//! | 1 | thumb up | volume + step |
//! | 1 | thumb down | volume − step |
//! | 2 | both thumbs up | brightness + step |
//! | 2 | both thumbs down | brightness − step |
//! | 2 | anything else | nothing |
//!
//! The step is applied once per processed frame, so the rate of change
//! follows the detector's frame rate rather than wall-clock time.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classifier::GestureSignal;
use crate::config::GestureConfig;
use crate::error::{GestureError, Result};

// ════════════════════════════════════════════════════════════════════════════
// ControlState
// ════════════════════════════════════════════════════════════════════════════

/// The two controlled levels. Always within the configured bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControlState {
    pub volume:     u8,
    pub brightness: u8,
}

impl ControlState {
    /// Initial levels from the config, clamped into its bounds.
    pub fn initial(cfg: &GestureConfig) -> Self {
        ControlState {
            volume:     cfg.clamp(cfg.initial_volume as i32),
            brightness: cfg.clamp(cfg.initial_brightness as i32),
        }
    }
}

impl Default for ControlState {
    fn default() -> Self {
        ControlState::initial(&GestureConfig::default())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ControlChange
// ════════════════════════════════════════════════════════════════════════════

/// Which rule fired this frame.
///
/// A rule that fires at a bound still reports itself even though the level
/// did not move.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlChange {
    #[default]
    None,
    VolumeUp,
    VolumeDown,
    BrightnessUp,
    BrightnessDown,
}

impl ControlChange {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlChange::None           => "none",
            ControlChange::VolumeUp       => "volume-up",
            ControlChange::VolumeDown     => "volume-down",
            ControlChange::BrightnessUp   => "brightness-up",
            ControlChange::BrightnessDown => "brightness-down",
        }
    }

    pub fn touches_volume(&self) -> bool {
        matches!(self, ControlChange::VolumeUp | ControlChange::VolumeDown)
    }

    pub fn touches_brightness(&self) -> bool {
        matches!(self, ControlChange::BrightnessUp | ControlChange::BrightnessDown)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Aggregation
// ════════════════════════════════════════════════════════════════════════════

/// Result of one aggregation step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Aggregate {
    pub control:            ControlState,
    pub change:             ControlChange,
    pub total_finger_count: usize,
}

/// Pick the rule for this frame's signals.
pub fn select_change(signals: &[GestureSignal]) -> ControlChange {
    match signals {
        [one] if one.thumb_up   => ControlChange::VolumeUp,
        [one] if one.thumb_down => ControlChange::VolumeDown,
        [a, b] if a.thumb_up && b.thumb_up     => ControlChange::BrightnessUp,
        [a, b] if a.thumb_down && b.thumb_down => ControlChange::BrightnessDown,
        _ => ControlChange::None,
    }
}

/// Apply a rule to a state, clamping the touched level.
pub fn apply_change(state: ControlState, change: ControlChange, cfg: &GestureConfig) -> ControlState {
    let step = cfg.step as i32;
    let mut next = state;
    match change {
        ControlChange::None           => {}
        ControlChange::VolumeUp       => next.volume     = cfg.clamp(state.volume as i32 + step),
        ControlChange::VolumeDown     => next.volume     = cfg.clamp(state.volume as i32 - step),
        ControlChange::BrightnessUp   => next.brightness = cfg.clamp(state.brightness as i32 + step),
        ControlChange::BrightnessDown => next.brightness = cfg.clamp(state.brightness as i32 - step),
    }
    next
}

/// Fold one frame into the control state.
///
/// `signals` holds the gesture of every hand that produced one, in detection
/// order; `finger_counts` holds the extended-finger count of every detected
/// hand, gated or not.
pub fn aggregate(
    state:         ControlState,
    signals:       &[GestureSignal],
    finger_counts: &[usize],
    cfg:           &GestureConfig,
) -> Result<Aggregate> {
    if signals.len() > cfg.max_hands {
        return Err(GestureError::TooManyHands { max: cfg.max_hands, got: signals.len() });
    }
    let change  = select_change(signals);
    let control = apply_change(state, change, cfg);
    if change != ControlChange::None {
        debug!(
            change = change.as_str(),
            volume = control.volume,
            brightness = control.brightness,
            "control updated"
        );
    }
    Ok(Aggregate {
        control,
        change,
        total_finger_count: finger_counts.iter().sum(),
    })
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

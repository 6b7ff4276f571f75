//! # gesture_hud
//!
//! Overlay shell around the `hand_gesture` core. Landmark detections come
//! from a keyboard simulator or a JSON-lines replay; each frame runs through
//! the [`hand_gesture::FramePipeline`] and the result is drawn as a hand
//! skeleton with finger counts, an FPS readout, and volume / brightness
//! bars. Level changes are mirrored to MIDI control changes.
//!
//! ## Gesture → Action mapping
//!
//! | Gesture | Hands | Action |
//! |---|---|---|
//! | Thumb up, other fingers closed | One | Volume +2 |
//! | Thumb down, other fingers closed | One | Volume −2 |
//! | Thumb up | Both | Brightness +2 |
//! | Thumb down | Both | Brightness −2 |
//!
//! ## Simulation keyboard shortcuts
//!
//! | Key | Pose |
//! |---|---|
//! | `U` / `J` | Right thumb up / down |
//! | `I` / `K` | Both thumbs up / down |
//! | `M` | Left up, right down (no change) |
//! | `F` / `O` | Fist / open palm |
//! | `1`–`5` | Show that many fingers |
//! | `N`, `0` | No hands |
//! | `R` | Reset levels |
//! | `Q`, `Escape` | Quit |
//!
//! ## Replay format
//!
//! One [`hand_gesture::DetectionFrame`] per line:
//!
//! ```json
//! {"timestamp_ms": 33, "hands": [{"handedness": "Right", "landmarks": [{"x": 0.5, "y": 0.8}, ...]}]}
//! ```

pub mod app;
pub mod logging;
pub mod midi_out;
pub mod source;
pub mod visualizer;

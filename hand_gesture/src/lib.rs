//! # hand_gesture
//!
//! Finger counting and thumb gestures over MediaPipe-style hand landmarks,
//! driving two clamped control levels.
//!
//! ## Gesture → Action mapping
//!
//! | Gesture | Hands | Action |
//! |---|---|---|
//! | Thumb up, other fingers curled | One | Volume + step |
//! | Thumb down, other fingers curled | One | Volume − step |
//! | Both thumbs up, other fingers curled | Two | Brightness + step |
//! | Both thumbs down, other fingers curled | Two | Brightness − step |
//! | Anything else | - | Nothing; fingers are still counted |
//!
//! ## Quick start
//!
//! ```rust
//! use hand_gesture::{poses, FramePipeline, GestureConfig, HandObservation, Handedness};
//!
//! let mut pipeline = FramePipeline::new(GestureConfig::default()).unwrap();
//! let hands: Vec<HandObservation> = vec![poses::thumb_up(Handedness::Right).into()];
//!
//! let report = pipeline.process(&hands).unwrap();
//! assert_eq!(report.total_finger_count, 1);
//! assert_eq!(report.control.volume, 52);
//! ```

pub mod aggregator;
pub mod classifier;
pub mod config;
pub mod error;
pub mod geometry;
pub mod landmark;
pub mod pipeline;
pub mod poses;

pub use aggregator::{aggregate, Aggregate, ControlChange, ControlState};
pub use classifier::{classify, GestureSignal};
pub use config::GestureConfig;
pub use error::{GestureError, Result};
pub use geometry::{finger_state, Finger, FingerState};
pub use landmark::{
    DetectionFrame, Hand, HandObservation, Handedness, Landmark, LandmarkId, HAND_CONNECTIONS,
    LANDMARK_COUNT,
};
pub use pipeline::{FramePipeline, FrameReport, HandReport};

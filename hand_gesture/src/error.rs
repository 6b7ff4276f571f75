//! Error types for the gesture core.

use thiserror::Error;

/// Input-contract violations detected while processing a frame.
///
/// None of these are retried: the detector either upholds its contract or
/// the frame is rejected whole, leaving the control state untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GestureError {
    /// A hand was reported with the wrong number of landmarks.
    #[error("hand has {got} landmarks, expected {expected}")]
    MissingLandmarks { expected: usize, got: usize },

    /// The detector's handedness label was neither "Left" nor "Right".
    #[error("unknown handedness label: {0:?}")]
    UnknownHandedness(String),

    /// More hands than the detector cap were supplied in one frame.
    #[error("frame has {got} hands, at most {max} allowed")]
    TooManyHands { max: usize, got: usize },

    /// Tunables that cannot produce a valid control state.
    #[error("invalid gesture config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, GestureError>;

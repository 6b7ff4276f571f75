//! Hand landmark data as delivered by the detector.
//!
//! A detected hand is 21 points in normalized image coordinates, numbered
//! the same way by every MediaPipe-style hand model:
//!
//! ```text
//!            8   12  16  20        tips
//!            7   11  15  19        DIP
//!        4   6   10  14  18        PIP   (4 = thumb tip)
//!        3   5   9   13  17        MCP   (3 = thumb IP)
//!        2                               (2 = thumb MCP)
//!        1                               (1 = thumb CMC)
//!                0                 wrist
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GestureError, Result};

/// Number of landmarks in one hand observation.
pub const LANDMARK_COUNT: usize = 21;

// ════════════════════════════════════════════════════════════════════════════
// Landmark
// ════════════════════════════════════════════════════════════════════════════

/// A single tracked point. `x`/`y` are 0–1 image-relative (y grows downward),
/// `z` is depth relative to the wrist.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Landmark { x, y, z }
    }

    /// Reflect across the vertical centre line of the image.
    pub fn mirrored(self) -> Self {
        Landmark { x: 1.0 - self.x, ..self }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkId: named roles for the 21 indices
// ════════════════════════════════════════════════════════════════════════════

/// Anatomical role of each landmark, discriminant = detector index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LandmarkId {
    Wrist     = 0,
    ThumbCmc  = 1,
    ThumbMcp  = 2,
    ThumbIp   = 3,
    ThumbTip  = 4,
    IndexMcp  = 5,
    IndexPip  = 6,
    IndexDip  = 7,
    IndexTip  = 8,
    MiddleMcp = 9,
    MiddlePip = 10,
    MiddleDip = 11,
    MiddleTip = 12,
    RingMcp   = 13,
    RingPip   = 14,
    RingDip   = 15,
    RingTip   = 16,
    PinkyMcp  = 17,
    PinkyPip  = 18,
    PinkyDip  = 19,
    PinkyTip  = 20,
}

impl LandmarkId {
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Bone segments of the hand skeleton, for drawing.
pub const HAND_CONNECTIONS: [(LandmarkId, LandmarkId); 21] = {
    use LandmarkId::*;
    [
        // thumb
        (Wrist, ThumbCmc), (ThumbCmc, ThumbMcp), (ThumbMcp, ThumbIp), (ThumbIp, ThumbTip),
        // index
        (Wrist, IndexMcp), (IndexMcp, IndexPip), (IndexPip, IndexDip), (IndexDip, IndexTip),
        // middle
        (MiddleMcp, MiddlePip), (MiddlePip, MiddleDip), (MiddleDip, MiddleTip),
        // ring
        (RingMcp, RingPip), (RingPip, RingDip), (RingDip, RingTip),
        // pinky
        (Wrist, PinkyMcp), (PinkyMcp, PinkyPip), (PinkyPip, PinkyDip), (PinkyDip, PinkyTip),
        // palm
        (IndexMcp, MiddleMcp), (MiddleMcp, RingMcp), (RingMcp, PinkyMcp),
    ]
};

// ════════════════════════════════════════════════════════════════════════════
// Handedness
// ════════════════════════════════════════════════════════════════════════════

/// Detector-assigned hand label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Handedness::Left  => "Left",
            Handedness::Right => "Right",
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Handedness::Left  => Handedness::Right,
            Handedness::Right => Handedness::Left,
        }
    }
}

impl fmt::Display for Handedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Handedness {
    type Err = GestureError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Left"  => Ok(Handedness::Left),
            "Right" => Ok(Handedness::Right),
            other   => Err(GestureError::UnknownHandedness(other.to_string())),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandObservation: raw, unvalidated detector output
// ════════════════════════════════════════════════════════════════════════════

/// One hand as reported by the detector for one frame.
///
/// The handedness stays a string here so that a bad label surfaces as a
/// [`GestureError`] at validation instead of a deserialization failure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HandObservation {
    pub handedness: String,
    pub landmarks:  Vec<Landmark>,
}

impl HandObservation {
    pub fn new(handedness: Handedness, landmarks: Vec<Landmark>) -> Self {
        HandObservation {
            handedness: handedness.as_str().to_string(),
            landmarks,
        }
    }

    /// Check the detector contract and produce a fixed-size [`Hand`].
    pub fn validate(&self) -> Result<Hand> {
        let handedness: Handedness = self.handedness.parse()?;
        let landmarks: [Landmark; LANDMARK_COUNT] = self
            .landmarks
            .as_slice()
            .try_into()
            .map_err(|_| GestureError::MissingLandmarks {
                expected: LANDMARK_COUNT,
                got:      self.landmarks.len(),
            })?;
        Ok(Hand { handedness, landmarks })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Hand: a validated observation
// ════════════════════════════════════════════════════════════════════════════

/// A hand known to carry exactly 21 landmarks and a valid label.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hand {
    pub handedness: Handedness,
    pub landmarks:  [Landmark; LANDMARK_COUNT],
}

impl Hand {
    pub fn new(handedness: Handedness, landmarks: [Landmark; LANDMARK_COUNT]) -> Self {
        Hand { handedness, landmarks }
    }

    pub fn point(&self, id: LandmarkId) -> Landmark {
        self.landmarks[id.index()]
    }

    /// Reflect every point horizontally and swap the handedness label.
    pub fn mirrored(&self) -> Self {
        Hand {
            handedness: self.handedness.opposite(),
            landmarks:  self.landmarks.map(Landmark::mirrored),
        }
    }
}

impl From<Hand> for HandObservation {
    fn from(hand: Hand) -> Self {
        HandObservation::new(hand.handedness, hand.landmarks.to_vec())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// DetectionFrame: everything the detector saw in one video frame
// ════════════════════════════════════════════════════════════════════════════

/// The detector's result for one frame, in detection order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionFrame {
    /// Capture time, when the source knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<u64>,
    #[serde(default)]
    pub hands:        Vec<HandObservation>,
}

impl DetectionFrame {
    pub fn new(hands: Vec<HandObservation>) -> Self {
        DetectionFrame { timestamp_ms: None, hands }
    }

    pub fn empty() -> Self {
        DetectionFrame::default()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(n: usize) -> Vec<Landmark> {
        (0..n).map(|i| Landmark::new(i as f32 / 40.0, 0.5, 0.0)).collect()
    }

    #[test]
    fn landmark_ids_match_detector_numbering() {
        assert_eq!(LandmarkId::Wrist.index(), 0);
        assert_eq!(LandmarkId::ThumbMcp.index(), 2);
        assert_eq!(LandmarkId::ThumbIp.index(), 3);
        assert_eq!(LandmarkId::ThumbTip.index(), 4);
        assert_eq!(LandmarkId::IndexPip.index(), 6);
        assert_eq!(LandmarkId::IndexTip.index(), 8);
        assert_eq!(LandmarkId::PinkyTip.index(), 20);
    }

    #[test]
    fn handedness_parses_detector_labels() {
        assert_eq!("Left".parse::<Handedness>().unwrap(), Handedness::Left);
        assert_eq!("Right".parse::<Handedness>().unwrap(), Handedness::Right);
        assert_eq!(
            "left".parse::<Handedness>(),
            Err(GestureError::UnknownHandedness("left".to_string()))
        );
    }

    #[test]
    fn validate_accepts_21_points() {
        let obs = HandObservation::new(Handedness::Right, flat(21));
        let hand = obs.validate().unwrap();
        assert_eq!(hand.handedness, Handedness::Right);
        assert_eq!(hand.point(LandmarkId::IndexTip), obs.landmarks[8]);
    }

    #[test]
    fn validate_rejects_short_hand() {
        let obs = HandObservation::new(Handedness::Left, flat(20));
        assert_eq!(
            obs.validate(),
            Err(GestureError::MissingLandmarks { expected: 21, got: 20 })
        );
    }

    #[test]
    fn validate_rejects_long_hand() {
        let obs = HandObservation::new(Handedness::Left, flat(22));
        assert!(matches!(
            obs.validate(),
            Err(GestureError::MissingLandmarks { got: 22, .. })
        ));
    }

    #[test]
    fn validate_rejects_unknown_label() {
        let obs = HandObservation { handedness: "Both".into(), landmarks: flat(21) };
        assert!(matches!(obs.validate(), Err(GestureError::UnknownHandedness(_))));
    }

    #[test]
    fn mirrored_hand_flips_x_and_label() {
        let hand = HandObservation::new(Handedness::Right, flat(21)).validate().unwrap();
        let m = hand.mirrored();
        assert_eq!(m.handedness, Handedness::Left);
        let tip = m.point(LandmarkId::ThumbTip);
        assert!((tip.x - (1.0 - hand.point(LandmarkId::ThumbTip).x)).abs() < 1e-6);
        assert_eq!(tip.y, hand.point(LandmarkId::ThumbTip).y);
    }

    #[test]
    fn detection_frame_parses_json_line() {
        let pts: Vec<String> = (0..21).map(|_| r#"{"x":0.1,"y":0.2,"z":0.0}"#.to_string()).collect();
        let line = format!(
            r#"{{"timestamp_ms":40,"hands":[{{"handedness":"Left","landmarks":[{}]}}]}}"#,
            pts.join(",")
        );
        let frame: DetectionFrame = serde_json::from_str(&line).unwrap();
        assert_eq!(frame.timestamp_ms, Some(40));
        assert_eq!(frame.hands.len(), 1);
        assert_eq!(frame.hands[0].validate().unwrap().handedness, Handedness::Left);
    }

    #[test]
    fn detection_frame_defaults_to_no_hands() {
        let frame: DetectionFrame = serde_json::from_str("{}").unwrap();
        assert!(frame.hands.is_empty());
        assert_eq!(frame.timestamp_ms, None);
    }
}

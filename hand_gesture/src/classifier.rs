//! Per-hand gesture classification.
//!
//! A hand only speaks when its four non-thumb fingers are all closed; the
//! thumb's vertical offset from its MCP joint then reads as up, down or
//! neutral.

use serde::{Deserialize, Serialize};

use crate::geometry::{finger_closed, Finger};
use crate::landmark::{Hand, LandmarkId};

/// Thumb direction of a hand whose other four fingers are closed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GestureSignal {
    pub thumb_up:   bool,
    pub thumb_down: bool,
}

impl GestureSignal {
    pub const UP: GestureSignal      = GestureSignal { thumb_up: true,  thumb_down: false };
    pub const DOWN: GestureSignal    = GestureSignal { thumb_up: false, thumb_down: true  };
    pub const NEUTRAL: GestureSignal = GestureSignal { thumb_up: false, thumb_down: false };

    pub fn is_neutral(&self) -> bool {
        !self.thumb_up && !self.thumb_down
    }
}

/// Index, middle, ring and pinky tips all strictly below their PIP joints.
pub fn others_closed(hand: &Hand) -> bool {
    Finger::NON_THUMB.iter().all(|&f| finger_closed(hand, f))
}

/// Classify one hand; `None` when any non-thumb finger is not closed.
pub fn classify(hand: &Hand, thumb_margin: f32) -> Option<GestureSignal> {
    if !others_closed(hand) {
        return None;
    }
    let tip = hand.point(LandmarkId::ThumbTip).y;
    let mcp = hand.point(LandmarkId::ThumbMcp).y;
    Some(GestureSignal {
        thumb_up:   tip < mcp - thumb_margin,
        thumb_down: tip > mcp + thumb_margin,
    })
}

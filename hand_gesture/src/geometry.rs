//! Landmark geometry: which fingers are extended.
//!
//! Pure functions of one hand's coordinates. Screen y grows downward, so a
//! fingertip "above" its PIP joint has the smaller y.

use serde::{Deserialize, Serialize};

use crate::landmark::{Hand, Handedness, LandmarkId};

// ════════════════════════════════════════════════════════════════════════════
// Finger
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb, Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky,
    ];

    /// The four fingers classified by vertical tip/PIP comparison.
    pub const NON_THUMB: [Finger; 4] = [
        Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky,
    ];

    pub fn tip(self) -> LandmarkId {
        match self {
            Finger::Thumb  => LandmarkId::ThumbTip,
            Finger::Index  => LandmarkId::IndexTip,
            Finger::Middle => LandmarkId::MiddleTip,
            Finger::Ring   => LandmarkId::RingTip,
            Finger::Pinky  => LandmarkId::PinkyTip,
        }
    }

    /// Joint the tip is compared against for extension.
    pub fn reference_joint(self) -> LandmarkId {
        match self {
            Finger::Thumb  => LandmarkId::ThumbIp,
            Finger::Index  => LandmarkId::IndexPip,
            Finger::Middle => LandmarkId::MiddlePip,
            Finger::Ring   => LandmarkId::RingPip,
            Finger::Pinky  => LandmarkId::PinkyPip,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Finger::Thumb  => "thumb",
            Finger::Index  => "index",
            Finger::Middle => "middle",
            Finger::Ring   => "ring",
            Finger::Pinky  => "pinky",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FingerState
// ════════════════════════════════════════════════════════════════════════════

/// Extended/closed flag per finger, ordered thumb → pinky.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerState(pub [bool; 5]);

impl FingerState {
    pub fn is_extended(&self, finger: Finger) -> bool {
        self.0[finger as usize]
    }

    pub fn count(&self) -> usize {
        self.0.iter().filter(|&&up| up).count()
    }

    pub fn extended(&self) -> impl Iterator<Item = Finger> + '_ {
        Finger::ALL.into_iter().filter(|&f| self.is_extended(f))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Classification
// ════════════════════════════════════════════════════════════════════════════

/// Thumb extension is sideways and depends on which hand it is: a right
/// thumb opens toward smaller x, a left thumb toward larger x.
pub fn thumb_extended(hand: &Hand) -> bool {
    let tip = hand.point(LandmarkId::ThumbTip).x;
    let ip  = hand.point(LandmarkId::ThumbIp).x;
    match hand.handedness {
        Handedness::Right => tip < ip,
        Handedness::Left  => tip > ip,
    }
}

/// Tip strictly above its PIP joint.
pub fn finger_extended(hand: &Hand, finger: Finger) -> bool {
    if finger == Finger::Thumb {
        return thumb_extended(hand);
    }
    hand.point(finger.tip()).y < hand.point(finger.reference_joint()).y
}

/// Tip strictly below its PIP joint. A tip level with the joint is neither
/// extended nor closed.
pub fn finger_closed(hand: &Hand, finger: Finger) -> bool {
    hand.point(finger.tip()).y > hand.point(finger.reference_joint()).y
}

pub fn finger_state(hand: &Hand) -> FingerState {
    FingerState(Finger::ALL.map(|f| finger_extended(hand, f)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poses;

    #[test]
    fn fist_has_no_extended_fingers() {
        let hand = poses::fist(Handedness::Right);
        assert_eq!(finger_state(&hand), FingerState([false; 5]));
        assert_eq!(finger_state(&hand).count(), 0);
    }

    #[test]
    fn open_palm_counts_five() {
        for side in [Handedness::Left, Handedness::Right] {
            let hand = poses::open_palm(side);
            assert_eq!(finger_state(&hand).count(), 5, "{side}");
        }
    }

    #[test]
    fn right_thumb_extends_toward_smaller_x() {
        let mut hand = poses::fist(Handedness::Right);
        hand.landmarks[LandmarkId::ThumbTip.index()].x = 0.30;
        hand.landmarks[LandmarkId::ThumbIp.index()].x  = 0.40;
        assert!(thumb_extended(&hand));

        hand.handedness = Handedness::Left;
        assert!(!thumb_extended(&hand));
    }

    #[test]
    fn left_thumb_extends_toward_larger_x() {
        let mut hand = poses::fist(Handedness::Left);
        hand.landmarks[LandmarkId::ThumbTip.index()].x = 0.70;
        hand.landmarks[LandmarkId::ThumbIp.index()].x  = 0.60;
        assert!(thumb_extended(&hand));
    }

    #[test]
    fn thumb_level_with_ip_is_closed() {
        let mut hand = poses::fist(Handedness::Right);
        let ip = hand.point(LandmarkId::ThumbIp).x;
        hand.landmarks[LandmarkId::ThumbTip.index()].x = ip;
        assert!(!thumb_extended(&hand));
    }

    #[test]
    fn each_finger_uses_its_own_pip() {
        let mut hand = poses::fist(Handedness::Right);
        // raise only the ring finger above its PIP
        let pip = hand.point(LandmarkId::RingPip).y;
        hand.landmarks[LandmarkId::RingTip.index()].y = pip - 0.1;
        let state = finger_state(&hand);
        assert!(state.is_extended(Finger::Ring));
        assert_eq!(state.extended().collect::<Vec<_>>(), vec![Finger::Ring]);
    }

    #[test]
    fn tip_level_with_pip_is_neither() {
        let mut hand = poses::fist(Handedness::Right);
        let pip = hand.point(LandmarkId::IndexPip).y;
        hand.landmarks[LandmarkId::IndexTip.index()].y = pip;
        assert!(!finger_extended(&hand, Finger::Index));
        assert!(!finger_closed(&hand, Finger::Index));
    }

    #[test]
    fn n_finger_poses_count_n() {
        for n in 0..=5 {
            let hand = poses::count(Handedness::Left, n);
            assert_eq!(finger_state(&hand).count(), n);
        }
    }

    #[test]
    fn mirrored_hand_keeps_thumb_classification() {
        for n in 0..=5 {
            let hand = poses::count(Handedness::Right, n);
            assert_eq!(thumb_extended(&hand), thumb_extended(&hand.mirrored()));
            assert_eq!(finger_state(&hand), finger_state(&hand.mirrored()));
        }
    }
}

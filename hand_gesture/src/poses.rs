//! Synthetic hand poses.
//!
//! Canonical 21-point hands for the keyboard simulator and for tests. Every
//! pose is laid out as a right hand centred on x = 0.5 with the thumb on the
//! small-x side; left hands are the horizontal mirror image.

use crate::landmark::{Hand, Handedness, Landmark, LandmarkId, LANDMARK_COUNT};

const WRIST: (f32, f32) = (0.50, 0.80);
const THUMB_CMC: (f32, f32) = (0.44, 0.74);
const THUMB_MCP: (f32, f32) = (0.40, 0.68);

/// Column x of index, middle, ring, pinky.
const FINGER_X: [f32; 4] = [0.45, 0.50, 0.55, 0.60];
const MCP_Y: f32 = 0.60;
const PIP_Y: f32 = 0.50;

/// (DIP y, tip y) for a straight and a curled finger.
const STRAIGHT: (f32, f32) = (0.45, 0.40);
const CURLED: (f32, f32) = (0.55, 0.58);

/// Thumb (IP, tip) positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Thumb {
    /// Folded across the palm, level with the MCP.
    Tucked,
    /// Opened sideways.
    Out,
    /// Pointing up, well above the MCP.
    Up,
    /// Pointing down, well below the MCP.
    Down,
}

impl Thumb {
    fn joints(self) -> ((f32, f32), (f32, f32)) {
        match self {
            Thumb::Tucked => ((0.43, 0.65), (0.47, 0.66)),
            Thumb::Out    => ((0.36, 0.64), (0.32, 0.62)),
            Thumb::Up     => ((0.39, 0.58), (0.38, 0.50)),
            Thumb::Down   => ((0.39, 0.78), (0.38, 0.86)),
        }
    }
}

fn build(side: Handedness, thumb: Thumb, straight: [bool; 4]) -> Hand {
    let mut pts = [Landmark::default(); LANDMARK_COUNT];
    let mut set = |id: LandmarkId, (x, y): (f32, f32)| {
        pts[id.index()] = Landmark::new(x, y, 0.0);
    };

    set(LandmarkId::Wrist, WRIST);
    set(LandmarkId::ThumbCmc, THUMB_CMC);
    set(LandmarkId::ThumbMcp, THUMB_MCP);
    let (ip, tip) = thumb.joints();
    set(LandmarkId::ThumbIp, ip);
    set(LandmarkId::ThumbTip, tip);

    use LandmarkId::*;
    let chains = [
        [IndexMcp, IndexPip, IndexDip, IndexTip],
        [MiddleMcp, MiddlePip, MiddleDip, MiddleTip],
        [RingMcp, RingPip, RingDip, RingTip],
        [PinkyMcp, PinkyPip, PinkyDip, PinkyTip],
    ];
    for (i, [mcp, pip, dip, tip]) in chains.into_iter().enumerate() {
        let x = FINGER_X[i];
        let (dip_y, tip_y) = if straight[i] { STRAIGHT } else { CURLED };
        set(mcp, (x, MCP_Y));
        set(pip, (x, PIP_Y));
        set(dip, (x, dip_y));
        set(tip, (x, tip_y));
    }

    let right = Hand::new(Handedness::Right, pts);
    match side {
        Handedness::Right => right,
        Handedness::Left  => right.mirrored(),
    }
}

/// All fingers curled, thumb tucked: zero fingers, no thumb direction.
pub fn fist(side: Handedness) -> Hand {
    build(side, Thumb::Tucked, [false; 4])
}

/// Fist with the thumb raised: one finger, thumb-up gesture.
pub fn thumb_up(side: Handedness) -> Hand {
    build(side, Thumb::Up, [false; 4])
}

/// Fist with the thumb lowered: one finger, thumb-down gesture.
pub fn thumb_down(side: Handedness) -> Hand {
    build(side, Thumb::Down, [false; 4])
}

/// All five fingers extended.
pub fn open_palm(side: Handedness) -> Hand {
    build(side, Thumb::Out, [true; 4])
}

/// Show `n` fingers: index first, then middle, ring, pinky, thumb last.
/// `n` above five is treated as five.
pub fn count(side: Handedness, n: usize) -> Hand {
    let n = n.min(5);
    let mut straight = [false; 4];
    for s in straight.iter_mut().take(n.min(4)) {
        *s = true;
    }
    let thumb = if n == 5 { Thumb::Out } else { Thumb::Tucked };
    build(side, thumb, straight)
}

/// Translate every landmark, e.g. to place two hands side by side.
pub fn shifted(hand: Hand, dx: f32, dy: f32) -> Hand {
    Hand {
        handedness: hand.handedness,
        landmarks:  hand.landmarks.map(|p| Landmark::new(p.x + dx, p.y + dy, p.z)),
    }
}

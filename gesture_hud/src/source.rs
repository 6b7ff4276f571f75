//! Detection sources: keyboard simulation and recorded replays.
//!
//! The public interface is [`DetectionFrame`]s delivered over an `mpsc`
//! channel, one per video frame, in capture order. Consumers don't need to
//! know whether frames were synthesized or read back from a file.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use hand_gesture::{poses, DetectionFrame, Hand, HandObservation, Handedness};

// ════════════════════════════════════════════════════════════════════════════
// DetectionSource trait: unified interface for sim and replay
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`DetectionFrame`]s over a channel.
pub trait DetectionSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<DetectionFrame>);
}

/// Spawn a detection source on its own thread and return the receiving end.
pub fn spawn_detection_source<S: DetectionSource>(source: S) -> Receiver<DetectionFrame> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// SimPose: what the simulated camera is looking at
// ════════════════════════════════════════════════════════════════════════════

/// Poses the keyboard simulator can hold in front of the "camera".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimPose {
    NoHands,
    Fist,
    ThumbUp,
    ThumbDown,
    BothUp,
    BothDown,
    /// Left thumb up, right thumb down.
    Mixed,
    OpenPalm,
    /// One right hand showing 0–5 fingers.
    Count(usize),
}

/// Horizontal offset that keeps two simulated hands apart on screen.
const PAIR_OFFSET: f32 = 0.22;

impl SimPose {
    /// The detector output for this pose, left hand first when there are two.
    pub fn hands(&self) -> Vec<HandObservation> {
        let one = |hand: Hand| vec![HandObservation::from(hand)];
        let pair = |left: Hand, right: Hand| {
            vec![
                HandObservation::from(poses::shifted(left, PAIR_OFFSET, 0.0)),
                HandObservation::from(poses::shifted(right, -PAIR_OFFSET, 0.0)),
            ]
        };
        use Handedness::{Left, Right};
        match *self {
            SimPose::NoHands   => Vec::new(),
            SimPose::Fist      => one(poses::fist(Right)),
            SimPose::ThumbUp   => one(poses::thumb_up(Right)),
            SimPose::ThumbDown => one(poses::thumb_down(Right)),
            SimPose::BothUp    => pair(poses::thumb_up(Left), poses::thumb_up(Right)),
            SimPose::BothDown  => pair(poses::thumb_down(Left), poses::thumb_down(Right)),
            SimPose::Mixed     => pair(poses::thumb_up(Left), poses::thumb_down(Right)),
            SimPose::OpenPalm  => one(poses::open_palm(Right)),
            SimPose::Count(n)  => one(poses::count(Right, n)),
        }
    }

    pub fn label(&self) -> String {
        match self {
            SimPose::NoHands   => "no hands".to_string(),
            SimPose::Fist      => "fist".to_string(),
            SimPose::ThumbUp   => "thumb up".to_string(),
            SimPose::ThumbDown => "thumb down".to_string(),
            SimPose::BothUp    => "both thumbs up".to_string(),
            SimPose::BothDown  => "both thumbs down".to_string(),
            SimPose::Mixed     => "mixed thumbs".to_string(),
            SimPose::OpenPalm  => "open palm".to_string(),
            SimPose::Count(n)  => format!("{} fingers", n),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimDetectionSource: keyboard simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Raw input event from the overlay window.
#[derive(Clone, Debug)]
pub enum SimInput {
    Pose(SimPose),
    Quit,
}

/// Emits the currently held [`SimPose`] at a fixed frame rate, standing in
/// for a camera plus landmark model.
///
/// The overlay window sends `SimInput` events here; this source turns them
/// into a steady stream of frames, so a held pose keeps stepping the
/// controls exactly as a held real gesture would.
pub struct SimDetectionSource {
    pub rx:       Receiver<SimInput>,
    pub interval: Duration,
}

impl SimDetectionSource {
    pub fn new(rx: Receiver<SimInput>, fps: u32) -> Self {
        SimDetectionSource {
            rx,
            interval: Duration::from_secs_f64(1.0 / fps.max(1) as f64),
        }
    }
}

impl DetectionSource for SimDetectionSource {
    fn run(self: Box<Self>, tx: Sender<DetectionFrame>) {
        let mut pose = SimPose::NoHands;
        let mut next_frame = Instant::now();

        loop {
            let wait = next_frame.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(wait) {
                Ok(SimInput::Pose(p)) => {
                    if p != pose {
                        debug!(pose = %p.label(), "simulated pose changed");
                    }
                    pose = p;
                }
                Ok(SimInput::Quit) | Err(RecvTimeoutError::Disconnected) => return,
                Err(RecvTimeoutError::Timeout) => {
                    next_frame += self.interval;
                    if tx.send(DetectionFrame::new(pose.hands())).is_err() {
                        return;
                    }
                }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ReplaySource: recorded detections, one JSON frame per line
// ════════════════════════════════════════════════════════════════════════════

/// Plays back a JSON-lines recording of detector output.
///
/// Blank lines are skipped; a line that fails to parse is logged and
/// skipped. With `realtime` set, frames carrying `timestamp_ms` are paced
/// by the gaps between their timestamps.
pub struct ReplaySource {
    reader:   Box<dyn BufRead + Send>,
    realtime: bool,
}

impl ReplaySource {
    pub fn open(path: &Path, realtime: bool) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open replay file {:?}", path))?;
        info!(path = %path.display(), realtime, "replaying detections");
        Ok(Self::from_reader(BufReader::new(file), realtime))
    }

    pub fn from_reader<R: BufRead + Send + 'static>(reader: R, realtime: bool) -> Self {
        ReplaySource { reader: Box::new(reader), realtime }
    }
}

impl DetectionSource for ReplaySource {
    fn run(self: Box<Self>, tx: Sender<DetectionFrame>) {
        let realtime = self.realtime;
        let mut prev_ts: Option<u64> = None;
        let mut sent = 0usize;

        for (n, line) in self.reader.lines().enumerate() {
            let line = match line {
                Ok(l)  => l,
                Err(e) => {
                    warn!(line = n + 1, error = %e, "replay read failed, stopping");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            let frame: DetectionFrame = match serde_json::from_str(&line) {
                Ok(f)  => f,
                Err(e) => {
                    warn!(line = n + 1, error = %e, "skipping malformed replay frame");
                    continue;
                }
            };

            if realtime {
                if let (Some(prev), Some(ts)) = (prev_ts, frame.timestamp_ms) {
                    thread::sleep(Duration::from_millis(ts.saturating_sub(prev)));
                }
            }
            prev_ts = frame.timestamp_ms.or(prev_ts);

            if tx.send(frame).is_err() {
                return;
            }
            sent += 1;
        }
        info!(frames = sent, "replay finished");
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use hand_gesture::{FramePipeline, GestureConfig, LANDMARK_COUNT};
    use std::io::Cursor;

    fn frame_line(ts: u64, hands: &[HandObservation]) -> String {
        let frame = DetectionFrame { timestamp_ms: Some(ts), hands: hands.to_vec() };
        serde_json::to_string(&frame).unwrap()
    }

    #[test]
    fn sim_poses_have_expected_hand_counts() {
        assert!(SimPose::NoHands.hands().is_empty());
        assert_eq!(SimPose::ThumbUp.hands().len(), 1);
        assert_eq!(SimPose::BothDown.hands().len(), 2);
        for obs in SimPose::Mixed.hands() {
            assert_eq!(obs.landmarks.len(), LANDMARK_COUNT);
        }
    }

    #[test]
    fn sim_pairs_are_left_then_right() {
        let hands = SimPose::BothUp.hands();
        assert_eq!(hands[0].handedness, "Left");
        assert_eq!(hands[1].handedness, "Right");
    }

    #[test]
    fn sim_pose_drives_pipeline() {
        let mut p = FramePipeline::new(GestureConfig::default()).unwrap();
        let r = p.process(&SimPose::BothUp.hands()).unwrap();
        assert_eq!(r.control.brightness, 52);
        let r = p.process(&SimPose::Mixed.hands()).unwrap();
        assert_eq!(r.control.brightness, 52);
        let r = p.process(&SimPose::Count(4).hands()).unwrap();
        assert_eq!(r.total_finger_count, 4);
    }

    #[test]
    fn sim_source_emits_frames_for_held_pose() {
        let (sim_tx, sim_rx) = mpsc::channel();
        let frames = spawn_detection_source(SimDetectionSource::new(sim_rx, 200));
        sim_tx.send(SimInput::Pose(SimPose::ThumbUp)).unwrap();

        let got = frames
            .iter()
            .take(50)
            .find(|f| f.hands.len() == 1)
            .expect("held pose never appeared");
        assert_eq!(got.hands[0].handedness, "Right");

        sim_tx.send(SimInput::Quit).unwrap();
    }

    #[test]
    fn replay_skips_blank_and_malformed_lines() {
        let hands = SimPose::ThumbDown.hands();
        let data = format!(
            "{}\n\nnot json\n{}\n",
            frame_line(0, &hands),
            frame_line(33, &[]),
        );
        let rx = spawn_detection_source(ReplaySource::from_reader(Cursor::new(data), false));
        let frames: Vec<DetectionFrame> = rx.iter().collect();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].timestamp_ms, Some(0));
        assert_eq!(frames[0].hands, hands);
        assert!(frames[1].hands.is_empty());
    }

    #[test]
    fn replay_keeps_bad_hands_for_the_pipeline_to_reject() {
        let line = r#"{"hands":[{"handedness":"Right","landmarks":[{"x":0.1,"y":0.2}]}]}"#;
        let rx = spawn_detection_source(ReplaySource::from_reader(Cursor::new(line.to_string()), false));
        let frames: Vec<DetectionFrame> = rx.iter().collect();
        assert_eq!(frames.len(), 1);

        let mut p = FramePipeline::new(GestureConfig::default()).unwrap();
        assert!(p.process_frame(&frames[0]).is_err());
    }

    #[test]
    fn open_missing_file_reports_path() {
        let err = ReplaySource::open(Path::new("/nonexistent/frames.jsonl"), false)
            .err()
            .unwrap();
        assert!(format!("{:#}", err).contains("frames.jsonl"));
    }
}

//! Per-frame orchestration.
//!
//! `FramePipeline` owns the running [`ControlState`] and threads it through
//! the pure geometry → classifier → aggregator chain once per detector frame.
//! Frames must be fed sequentially; the pipeline keeps no other cross-frame
//! state than the control levels and the previous frame time.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::aggregator::{aggregate, ControlChange, ControlState};
use crate::classifier::{classify, GestureSignal};
use crate::config::GestureConfig;
use crate::error::{GestureError, Result};
use crate::geometry::{finger_state, FingerState};
use crate::landmark::{DetectionFrame, Hand, HandObservation, Handedness, Landmark, LandmarkId};

// ════════════════════════════════════════════════════════════════════════════
// Reports
// ════════════════════════════════════════════════════════════════════════════

/// What the pipeline concluded about one hand.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HandReport {
    pub handedness:   Handedness,
    pub fingers:      FingerState,
    pub finger_count: usize,
    /// `None` when a non-thumb finger was extended.
    pub gesture:      Option<GestureSignal>,
    /// Anchor for the per-hand count label.
    pub wrist:        Landmark,
}

/// Everything the presentation layer needs for one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    pub frame_index:        u64,
    pub total_finger_count: usize,
    pub hands:              Vec<HandReport>,
    pub control:            ControlState,
    pub change:             ControlChange,
    /// Frames per second from the previous frame; 0 on the first frame.
    pub fps:                f64,
}

// ════════════════════════════════════════════════════════════════════════════
// FramePipeline
// ════════════════════════════════════════════════════════════════════════════

/// Which clock times [`DetectionFrame`]s.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FrameClock {
    /// The frames' own `timestamp_ms`.
    Detector,
    /// The pipeline's monotonic clock.
    Local,
}

pub struct FramePipeline {
    config:      GestureConfig,
    control:     ControlState,
    origin:      Instant,
    last_frame:  Option<Duration>,
    frame_index: u64,
    clock:       Option<FrameClock>,
}

impl FramePipeline {
    pub fn new(config: GestureConfig) -> Result<Self> {
        config.validate()?;
        let control = ControlState::initial(&config);
        Ok(FramePipeline {
            config,
            control,
            origin:      Instant::now(),
            last_frame:  None,
            frame_index: 0,
            clock:       None,
        })
    }

    pub fn config(&self) -> &GestureConfig { &self.config }
    pub fn control(&self) -> ControlState  { self.control }
    pub fn frames_processed(&self) -> u64  { self.frame_index }

    /// Restore the initial levels and forget frame timing.
    pub fn reset(&mut self) {
        self.control     = ControlState::initial(&self.config);
        self.last_frame  = None;
        self.frame_index = 0;
        self.clock       = None;
    }

    /// Process a frame stamped with the pipeline's monotonic clock.
    pub fn process(&mut self, hands: &[HandObservation]) -> Result<FrameReport> {
        let now = self.origin.elapsed();
        self.process_at(hands, now)
    }

    /// Process a detection frame.
    ///
    /// The first accepted frame picks the clock: its own `timestamp_ms` if it
    /// has one, the pipeline's clock otherwise. Later frames stay on that
    /// clock; an unstamped frame on the detector clock reports 0 fps, and a
    /// stamp on the local clock is ignored.
    pub fn process_frame(&mut self, frame: &DetectionFrame) -> Result<FrameReport> {
        let clock = self.clock.unwrap_or(match frame.timestamp_ms {
            Some(_) => FrameClock::Detector,
            None    => FrameClock::Local,
        });
        let timestamp = match (clock, frame.timestamp_ms) {
            (FrameClock::Detector, Some(ms)) => Duration::from_millis(ms),
            (FrameClock::Detector, None)     => self.last_frame.unwrap_or_default(),
            (FrameClock::Local, _)           => self.origin.elapsed(),
        };
        let report = self.process_at(&frame.hands, timestamp)?;
        self.clock = Some(clock);
        Ok(report)
    }

    /// Process a frame observed at `timestamp` (any monotonic origin).
    ///
    /// Every hand is validated before anything else happens, so a rejected
    /// frame leaves the control state and frame timing untouched.
    pub fn process_at(&mut self, hands: &[HandObservation], timestamp: Duration) -> Result<FrameReport> {
        if hands.len() > self.config.max_hands {
            return Err(GestureError::TooManyHands { max: self.config.max_hands, got: hands.len() });
        }
        let hands: Vec<Hand> = hands
            .iter()
            .map(HandObservation::validate)
            .collect::<Result<_>>()?;

        let mut reports = Vec::with_capacity(hands.len());
        let mut signals = Vec::with_capacity(hands.len());
        let mut counts  = Vec::with_capacity(hands.len());
        for hand in &hands {
            let fingers = finger_state(hand);
            let gesture = classify(hand, self.config.thumb_margin);
            counts.push(fingers.count());
            if let Some(sig) = gesture {
                signals.push(sig);
            }
            reports.push(HandReport {
                handedness:   hand.handedness,
                fingers,
                finger_count: fingers.count(),
                gesture,
                wrist:        hand.point(LandmarkId::Wrist),
            });
        }

        let agg = aggregate(self.control, &signals, &counts, &self.config)?;
        self.control = agg.control;

        let fps = match self.last_frame {
            Some(prev) if timestamp > prev => 1.0 / (timestamp - prev).as_secs_f64(),
            _ => 0.0,
        };
        self.last_frame   = Some(timestamp);
        self.frame_index += 1;

        trace!(
            frame = self.frame_index,
            hands = reports.len(),
            fingers = agg.total_finger_count,
            fps,
            "frame processed"
        );

        Ok(FrameReport {
            frame_index:        self.frame_index,
            total_finger_count: agg.total_finger_count,
            hands:              reports,
            control:            agg.control,
            change:             agg.change,
            fps,
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poses;
    use proptest::prelude::*;

    fn pipeline() -> FramePipeline {
        FramePipeline::new(GestureConfig::default()).unwrap()
    }

    fn obs(hand: Hand) -> HandObservation {
        hand.into()
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn zero_hands_leave_state_alone() {
        let mut p = pipeline();
        let r = p.process_at(&[], ms(0)).unwrap();
        assert_eq!(r.total_finger_count, 0);
        assert_eq!(r.control, ControlState { volume: 50, brightness: 50 });
        assert_eq!(r.change, ControlChange::None);
        assert!(r.hands.is_empty());
    }

    #[test]
    fn single_thumb_up_climbs_to_100() {
        let mut p = pipeline();
        let frame = [obs(poses::thumb_up(Handedness::Right))];
        let first = p.process_at(&frame, ms(0)).unwrap();
        assert_eq!(first.control.volume, 52);
        assert_eq!(first.total_finger_count, 1);
        for i in 1..40 {
            p.process_at(&frame, ms(i * 33)).unwrap();
        }
        assert_eq!(p.control().volume, 100);
        assert_eq!(p.control().brightness, 50);
    }

    #[test]
    fn two_thumbs_down_drain_brightness_to_zero() {
        let mut p = pipeline();
        let frame = [
            obs(poses::thumb_down(Handedness::Left)),
            obs(poses::thumb_down(Handedness::Right)),
        ];
        let r = p.process_at(&frame, ms(0)).unwrap();
        assert_eq!(r.control.brightness, 48);
        assert_eq!(r.change, ControlChange::BrightnessDown);
        for i in 1..30 {
            p.process_at(&frame, ms(i * 33)).unwrap();
        }
        assert_eq!(p.control().brightness, 0);
        assert_eq!(p.control().volume, 50);
    }

    #[test]
    fn mixed_hands_hold_brightness() {
        let mut p = pipeline();
        let frame = [
            obs(poses::thumb_up(Handedness::Left)),
            obs(poses::thumb_down(Handedness::Right)),
        ];
        let r = p.process_at(&frame, ms(0)).unwrap();
        assert_eq!(r.control, ControlState { volume: 50, brightness: 50 });
    }

    #[test]
    fn gated_hand_still_counts_fingers() {
        let mut p = pipeline();
        let frame = [
            obs(poses::open_palm(Handedness::Left)),
            obs(poses::thumb_up(Handedness::Right)),
        ];
        let r = p.process_at(&frame, ms(0)).unwrap();
        assert_eq!(r.total_finger_count, 6);
        assert_eq!(r.hands[0].gesture, None);
        assert_eq!(r.hands[1].gesture, Some(GestureSignal::UP));
        // only one hand signalled, so it is a volume gesture
        assert_eq!(r.change, ControlChange::VolumeUp);
        assert_eq!(r.control.volume, 52);
    }

    #[test]
    fn hand_reports_keep_detection_order() {
        let mut p = pipeline();
        let frame = [
            obs(poses::count(Handedness::Right, 3)),
            obs(poses::count(Handedness::Left, 2)),
        ];
        let r = p.process_at(&frame, ms(0)).unwrap();
        assert_eq!(r.hands[0].handedness, Handedness::Right);
        assert_eq!(r.hands[0].finger_count, 3);
        assert_eq!(r.hands[1].handedness, Handedness::Left);
        assert_eq!(r.hands[1].finger_count, 2);
        assert_eq!(r.hands[1].wrist, poses::count(Handedness::Left, 2).point(LandmarkId::Wrist));
    }

    #[test]
    fn fps_from_consecutive_timestamps() {
        let mut p = pipeline();
        assert_eq!(p.process_at(&[], ms(1000)).unwrap().fps, 0.0);
        let r = p.process_at(&[], ms(1040)).unwrap();
        assert!((r.fps - 25.0).abs() < 1e-9);
        // a non-advancing clock reports zero instead of dividing by zero
        assert_eq!(p.process_at(&[], ms(1040)).unwrap().fps, 0.0);
    }

    #[test]
    fn detection_frame_timestamp_drives_fps() {
        let mut p = pipeline();
        let mut frame = DetectionFrame::empty();
        frame.timestamp_ms = Some(0);
        p.process_frame(&frame).unwrap();
        frame.timestamp_ms = Some(50);
        let r = p.process_frame(&frame).unwrap();
        assert!((r.fps - 20.0).abs() < 1e-9);
        assert_eq!(r.frame_index, 2);
    }

    #[test]
    fn unstamped_frame_stays_on_detector_clock() {
        let mut p = pipeline();
        let stamped = |ms| DetectionFrame { timestamp_ms: Some(ms), hands: Vec::new() };
        p.process_frame(&stamped(5_000)).unwrap();
        assert_eq!(p.process_frame(&DetectionFrame::empty()).unwrap().fps, 0.0);
        let r = p.process_frame(&stamped(5_040)).unwrap();
        assert!((r.fps - 25.0).abs() < 1e-9);
    }

    #[test]
    fn stamps_ignored_once_on_local_clock() {
        let mut p = pipeline();
        p.process_frame(&DetectionFrame::empty()).unwrap();
        // the stamp is ignored, so fps comes from the local clock
        let r = p.process_frame(&DetectionFrame { timestamp_ms: Some(u64::MAX / 2), hands: Vec::new() }).unwrap();
        assert!(r.fps == 0.0 || r.fps > 1.0);

        p.reset();
        p.process_frame(&DetectionFrame { timestamp_ms: Some(0), hands: Vec::new() }).unwrap();
        let r = p.process_frame(&DetectionFrame { timestamp_ms: Some(100), hands: Vec::new() }).unwrap();
        assert!((r.fps - 10.0).abs() < 1e-9);
    }

    #[test]
    fn short_hand_fails_without_touching_state() {
        let mut p = pipeline();
        p.process_at(&[obs(poses::thumb_up(Handedness::Right))], ms(0)).unwrap();
        let before = p.control();

        let mut bad = obs(poses::thumb_up(Handedness::Left));
        bad.landmarks.truncate(20);
        let frame = [obs(poses::thumb_up(Handedness::Right)), bad];
        let err = p.process_at(&frame, ms(33)).unwrap_err();
        assert_eq!(err, GestureError::MissingLandmarks { expected: 21, got: 20 });
        assert_eq!(p.control(), before);
        assert_eq!(p.frames_processed(), 1);
    }

    #[test]
    fn third_hand_rejected() {
        let mut p = pipeline();
        let h = obs(poses::fist(Handedness::Left));
        let err = p.process_at(&[h.clone(), h.clone(), h], ms(0)).unwrap_err();
        assert_eq!(err, GestureError::TooManyHands { max: 2, got: 3 });
    }

    #[test]
    fn reset_restores_initial_levels() {
        let mut p = pipeline();
        let frame = [obs(poses::thumb_down(Handedness::Right))];
        for i in 0..5 {
            p.process_at(&frame, ms(i * 10)).unwrap();
        }
        assert_eq!(p.control().volume, 40);
        p.reset();
        assert_eq!(p.control(), ControlState { volume: 50, brightness: 50 });
        assert_eq!(p.frames_processed(), 0);
        assert_eq!(p.process_at(&[], ms(100)).unwrap().fps, 0.0);
    }

    #[test]
    fn invalid_config_refused() {
        let cfg = GestureConfig { min_level: 100, max_level: 0, ..Default::default() };
        assert!(FramePipeline::new(cfg).is_err());
    }

    #[test]
    fn report_serializes_to_json() {
        let mut p = pipeline();
        let r = p.process_at(&[obs(poses::thumb_up(Handedness::Left))], ms(0)).unwrap();
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"total_finger_count\":1"));
        assert!(json.contains("\"change\":\"VolumeUp\""));
        assert!(json.contains("\"volume\":52"));
    }

    fn any_pose() -> impl Strategy<Value = Hand> {
        let side = prop_oneof![Just(Handedness::Left), Just(Handedness::Right)];
        (side, 0usize..7).prop_map(|(side, kind)| match kind {
            0 => poses::fist(side),
            1 => poses::thumb_up(side),
            2 => poses::thumb_down(side),
            3 => poses::open_palm(side),
            n => poses::count(side, n - 3),
        })
    }

    proptest! {
        #[test]
        fn identical_runs_give_identical_reports(
            frames in prop::collection::vec(prop::collection::vec(any_pose(), 0..=2), 1..60),
        ) {
            let run = || {
                let mut p = pipeline();
                frames
                    .iter()
                    .enumerate()
                    .map(|(i, hands)| {
                        let obs: Vec<HandObservation> = hands.iter().copied().map(Into::into).collect();
                        p.process_at(&obs, ms(i as u64 * 33)).unwrap()
                    })
                    .collect::<Vec<_>>()
            };
            prop_assert_eq!(run(), run());
        }

        #[test]
        fn mirrored_hands_classify_the_same(hand in any_pose()) {
            let mut a = pipeline();
            let mut b = pipeline();
            let ra = a.process_at(&[obs(hand)], ms(0)).unwrap();
            let rb = b.process_at(&[obs(hand.mirrored())], ms(0)).unwrap();
            prop_assert_eq!(ra.hands[0].fingers, rb.hands[0].fingers);
            prop_assert_eq!(ra.hands[0].gesture, rb.hands[0].gesture);
            prop_assert_eq!(ra.control, rb.control);
        }
    }
}

//! Top-level application state and run loops.
//!
//! `AppState` owns the [`FramePipeline`] and the MIDI [`ControlSink`]. It
//! turns each detector frame into a [`FrameReport`], keeps the last one for
//! the overlay, and forwards control changes to MIDI. Frames are processed
//! strictly in arrival order on the calling thread.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use hand_gesture::{DetectionFrame, FramePipeline, FrameReport, GestureConfig, HandObservation};

use crate::midi_out::{ControlSink, MidiConfig};
use crate::source::{spawn_detection_source, ReplaySource, SimDetectionSource, SimInput};
use crate::visualizer::{InputOutcome, Overlay, Visualizer, WindowConfig};

// ════════════════════════════════════════════════════════════════════════════
// HudConfig
// ════════════════════════════════════════════════════════════════════════════

/// Configuration for the full application, loadable from TOML.
///
/// ```toml
/// log_level = "debug"
/// sim_fps = 30
///
/// [window]
/// width = 800
///
/// [midi]
/// enabled = true
/// port_hint = "fluid"
///
/// [gesture]
/// step = 1
/// thumb_margin = 0.04
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HudConfig {
    pub log_level: String,
    /// Frame rate of the simulated detector.
    pub sim_fps:   u32,
    pub window:    WindowConfig,
    pub midi:      MidiConfig,
    pub gesture:   GestureConfig,
}

impl Default for HudConfig {
    fn default() -> Self {
        HudConfig {
            log_level: "info".to_string(),
            sim_fps:   30,
            window:    WindowConfig::default(),
            midi:      MidiConfig::default(),
            gesture:   GestureConfig::default(),
        }
    }
}

impl HudConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {:?}", path))?;
        Self::from_toml(&text).with_context(|| format!("invalid config file {:?}", path))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let cfg: HudConfig = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        self.gesture.validate()?;
        if self.midi.channel > 15 {
            bail!("midi.channel must be 0-15, got {}", self.midi.channel);
        }
        if self.window.width == 0 || self.window.height == 0 {
            bail!("window size must be non-zero");
        }
        Ok(())
    }
}

/// Where detections come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceKind {
    /// Keyboard-driven synthetic hands.
    Simulated,
    /// A JSON-lines recording.
    Replay { path: PathBuf, realtime: bool },
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    pipeline:    FramePipeline,
    sink:        ControlSink,
    last_report: Option<FrameReport>,
    last_hands:  Vec<HandObservation>,
    rejected:    u64,
    pub status:  String,
}

impl AppState {
    pub fn new(cfg: &HudConfig) -> Result<Self> {
        let pipeline = FramePipeline::new(cfg.gesture.clone())?;
        let sink = ControlSink::spawn(&cfg.midi, &cfg.gesture, pipeline.control());
        Ok(Self::with_sink(pipeline, sink))
    }

    pub fn with_sink(pipeline: FramePipeline, sink: ControlSink) -> Self {
        AppState {
            pipeline,
            sink,
            last_report: None,
            last_hands:  Vec::new(),
            rejected:    0,
            status:      "Waiting for detections".to_string(),
        }
    }

    // ── process one DetectionFrame ───────────────────────────────────────

    /// Run one frame through the pipeline. A rejected frame is logged and
    /// counted; the previous report stays on screen.
    pub fn handle_frame(&mut self, frame: DetectionFrame) -> Option<&FrameReport> {
        match self.pipeline.process_frame(&frame) {
            Ok(report) => {
                self.sink.publish(&report);
                self.status = if report.hands.is_empty() {
                    "No hands".to_string()
                } else {
                    "Tracking Active".to_string()
                };
                self.last_hands  = frame.hands;
                self.last_report = Some(report);
                self.last_report.as_ref()
            }
            Err(e) => {
                warn!(error = %e, "rejected detection frame");
                self.rejected += 1;
                self.status = format!("Rejected frame: {}", e);
                None
            }
        }
    }

    pub fn reset(&mut self) {
        self.pipeline.reset();
        self.sink.sync(self.pipeline.control());
        self.last_report = None;
        self.last_hands.clear();
        self.status = "Reset".to_string();
        info!("control levels reset");
    }

    // ── Accessors for the render loop ─────────────────────────────────────

    pub fn last_report(&self) -> Option<&FrameReport> { self.last_report.as_ref() }
    pub fn last_hands(&self)  -> &[HandObservation]   { &self.last_hands }
    pub fn rejected(&self)    -> u64                  { self.rejected }
    pub fn pipeline(&self)    -> &FramePipeline       { &self.pipeline }
}

// ════════════════════════════════════════════════════════════════════════════
// run(): windowed main loop
// ════════════════════════════════════════════════════════════════════════════

/// Run with the overlay window until it is closed or `Q` is pressed.
pub fn run(cfg: &HudConfig, source: SourceKind) -> Result<()> {
    let (frames, sim_tx, simulated) = match &source {
        SourceKind::Simulated => {
            let (sim_tx, sim_rx) = mpsc::channel::<SimInput>();
            let rx = spawn_detection_source(SimDetectionSource::new(sim_rx, cfg.sim_fps));
            info!(fps = cfg.sim_fps, "simulated detector started");
            (rx, Some(sim_tx), true)
        }
        SourceKind::Replay { path, realtime } => {
            (spawn_detection_source(ReplaySource::open(path, *realtime)?), None, false)
        }
    };

    let mut vis = Visualizer::new(&cfg.window, sim_tx)
        .map_err(anyhow::Error::msg)
        .context("failed to open overlay window")?;
    let mut app = AppState::new(cfg)?;
    let mut source_done = false;

    while vis.is_open() {
        match vis.poll_input() {
            InputOutcome::Quit     => break,
            InputOutcome::Reset    => app.reset(),
            InputOutcome::Continue => {}
        }

        if !source_done {
            source_done = drain_frames(&frames, &mut app);
            if source_done {
                info!(rejected = app.rejected(), "detection source finished");
                app.status = "Replay finished".to_string();
            }
        }

        vis.render(&Overlay {
            report:    app.last_report(),
            hands:     app.last_hands(),
            status:    &app.status,
            level_range: (cfg.gesture.min_level, cfg.gesture.max_level),
            simulated,
        });
    }

    Ok(())
}

/// Process every frame already queued; true once the source has hung up.
fn drain_frames(frames: &Receiver<DetectionFrame>, app: &mut AppState) -> bool {
    loop {
        match frames.try_recv() {
            Ok(frame)                       => { app.handle_frame(frame); }
            Err(TryRecvError::Empty)        => return false,
            Err(TryRecvError::Disconnected) => return true,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run_headless(): JSON reports on stdout
// ════════════════════════════════════════════════════════════════════════════

/// Replay without a window, writing one JSON report per accepted frame.
pub fn run_headless(cfg: &HudConfig, source: SourceKind, out: &mut impl Write) -> Result<()> {
    let SourceKind::Replay { path, realtime } = source else {
        bail!("headless mode needs a replay file (--replay)");
    };
    let frames = spawn_detection_source(ReplaySource::open(&path, realtime)?);
    let mut app = AppState::new(cfg)?;
    let written = write_reports(&mut app, frames, out)?;
    info!(frames = written, rejected = app.rejected(), "headless replay done");
    Ok(())
}

/// Feed frames through `app`, writing each accepted report as a JSON line.
pub fn write_reports(
    app:    &mut AppState,
    frames: impl IntoIterator<Item = DetectionFrame>,
    out:    &mut impl Write,
) -> Result<usize> {
    let mut written = 0;
    for frame in frames {
        if let Some(report) = app.handle_frame(frame) {
            serde_json::to_writer(&mut *out, report)?;
            writeln!(out)?;
            written += 1;
        }
    }
    out.flush()?;
    Ok(written)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

//! Software-rendered overlay using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │ FPS: 30                        VOLUME     [██████░░░░] 62% │
//! │ Tracking Active                BRIGHTNESS [███░░░░░░░] 30% │
//! │                                                           │
//! │              3                      1                     │
//! │          (hand skeleton)      (hand skeleton)             │
//! │                                                           │
//! │  ██                                                       │
//! │  ██  total fingers                                        │
//! │ key legend                                                │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! All drawing goes through [`Canvas`], a plain ARGB buffer, so the overlay
//! can be rendered and inspected without opening a window.

use std::sync::mpsc::Sender;

use minifb::{Key, KeyRepeat, Window, WindowOptions};
use serde::{Deserialize, Serialize};

use hand_gesture::{FrameReport, HandObservation, HAND_CONNECTIONS};

use crate::source::{SimInput, SimPose};

// ════════════════════════════════════════════════════════════════════════════
// Colors
// ════════════════════════════════════════════════════════════════════════════

const BG_COLOR:        u32 = 0xFF101018;
const BONE_COLOR:      u32 = 0xFFFFFFFF;
const JOINT_COLOR:     u32 = 0xFF6366F1;
const HAND_COUNT:      u32 = 0xFF00FF00;
const TOTAL_COLOR:     u32 = 0xFFFF0000;
const FPS_COLOR:       u32 = 0xFFFF00FF;
const TEXT_COLOR:      u32 = 0xFFEEEEEE;
const LEGEND_COLOR:    u32 = 0xFF888888;
const BAR_BG:          u32 = 0xFF2A2A3A;
const VOLUME_COLOR:    u32 = 0xFF22C55E;
const BRIGHTNESS_COLOR: u32 = 0xFFFACC15;

/// How far outside the unit square a landmark may still be drawn.
const OFFSCREEN: f32 = 0.5;

const LEGEND: &str =
    "U/J=thumb up/down  I/K=both up/down  M=mixed  F=fist  O=palm  1-5=count  N=none  R=reset  Q=quit";

// ════════════════════════════════════════════════════════════════════════════
// WindowConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width:  usize,
    pub height: usize,
    /// Frame-rate cap for the render loop.
    pub max_fps: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig { width: 640, height: 480, max_fps: 60 }
    }
}

/// HUD text shown next to the overlay.
#[derive(Clone, Copy, Debug)]
pub struct Overlay<'a> {
    pub report: Option<&'a FrameReport>,
    pub hands:  &'a [HandObservation],
    pub status: &'a str,
    /// `(min_level, max_level)` the bars are scaled against.
    pub level_range: (u8, u8),
    /// Whether key shortcuts drive a simulated detector.
    pub simulated: bool,
}

// ════════════════════════════════════════════════════════════════════════════
// Canvas
// ════════════════════════════════════════════════════════════════════════════

pub struct Canvas {
    pub width:  usize,
    pub height: usize,
    pub buf:    Vec<u32>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Canvas { width, height, buf: vec![BG_COLOR; width * height] }
    }

    pub fn clear(&mut self) {
        self.buf.fill(BG_COLOR);
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        (x < self.width && y < self.height).then(|| self.buf[y * self.width + x])
    }

    pub fn set_pixel(&mut self, x: isize, y: isize, color: u32) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.buf[y as usize * self.width + x as usize] = color;
        }
    }

    pub fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(self.height) {
            for col in x..(x + w).min(self.width) {
                self.buf[row * self.width + col] = color;
            }
        }
    }

    /// Bresenham line, `thickness` pixels wide.
    pub fn line(&mut self, (x0, y0): (isize, isize), (x1, y1): (isize, isize), thickness: isize, color: u32) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let (mut x, mut y, mut err) = (x0, y0, dx + dy);
        let half = thickness / 2;
        loop {
            for oy in -half..=half {
                for ox in -half..=half {
                    self.set_pixel(x + ox, y + oy, color);
                }
            }
            if x == x1 && y == y1 { break; }
            let e2 = 2 * err;
            if e2 >= dy { err += dy; x += sx; }
            if e2 <= dx { err += dx; y += sy; }
        }
    }

    pub fn disc(&mut self, cx: isize, cy: isize, r: isize, color: u32) {
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy <= r * r {
                    self.set_pixel(cx + dx, cy + dy, color);
                }
            }
        }
    }

    /// Minimal bitmap font: 3×5 glyphs, each pixel drawn `scale`×`scale`.
    pub fn label(&mut self, text: &str, x: isize, y: isize, scale: isize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let g = glyph(ch);
            for row in 0..5 {
                let bits = glyph_row(g, row);
                for col in 0..3isize {
                    if bits & (1 << (2 - col)) != 0 {
                        for py in 0..scale {
                            for px in 0..scale {
                                self.set_pixel(
                                    cx + col * scale + px,
                                    y + row as isize * scale + py,
                                    color,
                                );
                            }
                        }
                    }
                }
            }
            cx += 4 * scale; // 3 wide + 1 gap
            if cx >= self.width as isize { break; }
        }
    }

    /// Map normalized landmark coordinates onto the canvas. Points outside
    /// `[-OFFSCREEN, 1 + OFFSCREEN]` are pinned to that band; non-finite
    /// points are dropped.
    fn to_px(&self, x: f32, y: f32) -> Option<(isize, isize)> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let scale = |v: f32, extent: usize| {
            (v.clamp(-OFFSCREEN, 1.0 + OFFSCREEN) * extent as f32) as isize
        };
        Some((scale(x, self.width), scale(y, self.height)))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Overlay drawing
// ════════════════════════════════════════════════════════════════════════════

/// Draw one full HUD frame onto `canvas`.
pub fn draw_overlay(canvas: &mut Canvas, overlay: &Overlay<'_>) {
    canvas.clear();

    for hand in overlay.hands {
        draw_skeleton(canvas, hand);
    }

    if let Some(report) = overlay.report {
        // per-hand count just above the wrist
        for hand in &report.hands {
            if let Some((wx, wy)) = canvas.to_px(hand.wrist.x, hand.wrist.y) {
                canvas.label(&hand.finger_count.to_string(), wx, wy.saturating_sub(30), 4, HAND_COUNT);
            }
        }

        let total_y = canvas.height as isize - 70;
        canvas.label(&report.total_finger_count.to_string(), 45, total_y - 40, 10, TOTAL_COLOR);
        canvas.label(&format!("FPS: {}", report.fps.round() as i64), 10, 10, 3, FPS_COLOR);

        let bar_x = canvas.width.saturating_sub(250);
        let range = overlay.level_range;
        draw_bar(canvas, "VOLUME", level_percent(report.control.volume, range), bar_x, 10, VOLUME_COLOR);
        draw_bar(canvas, "BRIGHTNESS", level_percent(report.control.brightness, range), bar_x, 40, BRIGHTNESS_COLOR);
    } else {
        canvas.label("FPS: 0", 10, 10, 3, FPS_COLOR);
    }

    canvas.label(overlay.status, 10, 34, 2, TEXT_COLOR);
    if overlay.simulated {
        canvas.label(LEGEND, 10, canvas.height as isize - 14, 1, LEGEND_COLOR);
    }
}

fn draw_skeleton(canvas: &mut Canvas, hand: &HandObservation) {
    let point = |i: usize| hand.landmarks.get(i).and_then(|p| canvas.to_px(p.x, p.y));
    let bones: Vec<_> = HAND_CONNECTIONS
        .iter()
        .filter_map(|&(a, b)| Some((point(a.index())?, point(b.index())?)))
        .collect();
    let joints: Vec<_> = (0..hand.landmarks.len()).filter_map(point).collect();

    for (a, b) in bones {
        canvas.line(a, b, 2, BONE_COLOR);
    }
    for (x, y) in joints {
        canvas.disc(x, y, 3, JOINT_COLOR);
    }
}

/// Position of `level` within `(min, max)` as 0–100, rounded like the MIDI
/// scaling.
pub fn level_percent(level: u8, (min, max): (u8, u8)) -> u8 {
    if max <= min {
        return 0;
    }
    let span = (max - min) as u32;
    let offset = (level.clamp(min, max) - min) as u32;
    ((offset * 100 + span / 2) / span) as u8
}

/// Labelled horizontal bar with a `NN%` readout for a 0–100 percentage.
fn draw_bar(canvas: &mut Canvas, name: &str, level: u8, x: usize, y: usize, color: u32) {
    const BAR_W: usize = 120;
    const BAR_H: usize = 12;
    let bar_x = x + 90;
    canvas.label(name, x as isize, y as isize + 2, 2, TEXT_COLOR);
    canvas.fill_rect(bar_x, y, BAR_W, BAR_H, BAR_BG);
    let filled = BAR_W * level.min(100) as usize / 100;
    canvas.fill_rect(bar_x, y, filled, BAR_H, color);
    canvas.label(&format!("{}%", level), (bar_x + BAR_W + 6) as isize, y as isize + 2, 2, TEXT_COLOR);
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer: the window
// ════════════════════════════════════════════════════════════════════════════

/// What the window asked the app to do this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputOutcome {
    Continue,
    Reset,
    Quit,
}

pub struct Visualizer {
    window: Window,
    canvas: Canvas,
    /// Present only when a simulated detector is listening.
    sim_tx: Option<Sender<SimInput>>,
}

impl Visualizer {
    pub fn new(cfg: &WindowConfig, sim_tx: Option<Sender<SimInput>>) -> Result<Self, String> {
        let mut window = Window::new(
            "Gesture HUD",
            cfg.width, cfg.height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| e.to_string())?;

        let frame_ms = 1000 / cfg.max_fps.max(1) as u64;
        window.limit_update_rate(Some(std::time::Duration::from_millis(frame_ms)));

        Ok(Visualizer {
            window,
            canvas: Canvas::new(cfg.width, cfg.height),
            sim_tx,
        })
    }

    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Poll keyboard input; pose keys go to the simulated detector.
    pub fn poll_input(&mut self) -> InputOutcome {
        if !self.window.is_open() { return InputOutcome::Quit; }

        let pressed = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);

        if pressed(Key::Q) || pressed(Key::Escape) {
            if let Some(tx) = &self.sim_tx {
                let _ = tx.send(SimInput::Quit);
            }
            return InputOutcome::Quit;
        }
        if pressed(Key::R) {
            return InputOutcome::Reset;
        }

        let pose = [
            (Key::U, SimPose::ThumbUp),
            (Key::J, SimPose::ThumbDown),
            (Key::I, SimPose::BothUp),
            (Key::K, SimPose::BothDown),
            (Key::M, SimPose::Mixed),
            (Key::F, SimPose::Fist),
            (Key::O, SimPose::OpenPalm),
            (Key::N, SimPose::NoHands),
            (Key::Key0, SimPose::NoHands),
            (Key::Key1, SimPose::Count(1)),
            (Key::Key2, SimPose::Count(2)),
            (Key::Key3, SimPose::Count(3)),
            (Key::Key4, SimPose::Count(4)),
            (Key::Key5, SimPose::Count(5)),
        ]
        .into_iter()
        .find(|&(k, _)| pressed(k))
        .map(|(_, p)| p);

        if let (Some(pose), Some(tx)) = (pose, &self.sim_tx) {
            let _ = tx.send(SimInput::Pose(pose));
        }
        InputOutcome::Continue
    }

    /// Render one frame.
    pub fn render(&mut self, overlay: &Overlay<'_>) {
        draw_overlay(&mut self.canvas, overlay);
        self.window
            .update_with_buffer(&self.canvas.buf, self.canvas.width, self.canvas.height)
            .ok();
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

/// 3×5 glyph packed one octal digit per row, top row first.
fn glyph(c: char) -> u16 {
    match c.to_ascii_uppercase() {
        '0' => 0o75557, '1' => 0o26227, '2' => 0o71747, '3' => 0o71717,
        '4' => 0o55711, '5' => 0o74717, '6' => 0o74757, '7' => 0o71111,
        '8' => 0o75757, '9' => 0o75717, 'A' => 0o75755, 'B' => 0o65656,
        'C' => 0o74447, 'D' => 0o65556, 'E' => 0o74747, 'F' => 0o74744,
        'G' => 0o74557, 'H' => 0o55755, 'I' => 0o72227, 'J' => 0o11157,
        'K' => 0o55655, 'L' => 0o44447, 'M' => 0o57555, 'N' => 0o75555,
        'O' => 0o75557, 'P' => 0o75744, 'Q' => 0o75571, 'R' => 0o65655,
        'S' => 0o74717, 'T' => 0o72222, 'U' => 0o55557, 'V' => 0o55522,
        'W' => 0o55575, 'X' => 0o55255, 'Y' => 0o55722, 'Z' => 0o71247,
        '%' => 0o51245, '/' => 0o11244, '-' => 0o00700, '.' => 0o00002,
        ',' => 0o00024, ':' => 0o02020, '=' => 0o07070, '+' => 0o02720,
        ' ' => 0,
        _   => 0o00200,
    }
}

/// Bits of glyph row `row` (0 = top), most significant bit leftmost.
fn glyph_row(glyph: u16, row: usize) -> u16 {
    (glyph >> (3 * (4 - row))) & 0o7
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

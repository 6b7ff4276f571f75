//! gesture_hud: command-line entry point.

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use gesture_hud::app::{self, HudConfig, SourceKind};
use gesture_hud::logging;

#[derive(Parser, Debug)]
#[command(name = "gesture_hud", version, about = "Hand-gesture volume and brightness HUD")]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Replay detections from a JSON-lines file instead of the simulator
    #[arg(short, long)]
    replay: Option<PathBuf>,

    /// Pace the replay by its frame timestamps
    #[arg(long, requires = "replay")]
    realtime: bool,

    /// No window; write one JSON report per frame to stdout
    #[arg(long, requires = "replay")]
    headless: bool,

    /// Don't open a MIDI output port
    #[arg(long)]
    no_midi: bool,

    /// Log level (trace, debug, info, warn, error); RUST_LOG wins
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => HudConfig::load(path)?,
        None       => HudConfig::default(),
    };
    if let Some(level) = args.log_level {
        cfg.log_level = level;
    }
    if args.no_midi {
        cfg.midi.enabled = false;
    }
    logging::init(&cfg.log_level)?;

    let source = match args.replay {
        Some(path) => SourceKind::Replay { path, realtime: args.realtime },
        None       => SourceKind::Simulated,
    };

    if args.headless {
        info!("running headless");
        return app::run_headless(&cfg, source, &mut io::stdout().lock());
    }

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║         Gesture HUD: thumbs for volume and brightness        ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    match &source {
        SourceKind::Simulated => println!("  Mode: keyboard simulation  (see the key legend in the window)"),
        SourceKind::Replay { path, .. } => println!("  Mode: replay of {}", path.display()),
    }
    println!("  MIDI: {}", if cfg.midi.enabled { "CC 7 volume, CC 74 brightness" } else { "off" });
    println!();

    app::run(&cfg, source)
}

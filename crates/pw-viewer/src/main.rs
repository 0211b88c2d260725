//! Desktop viewer for Planet Wars match logs.
//!
//! ```text
//! pw-viewer match.log --assets assets/ --ms-per-turn 300 --follow
//! ```
//!
//! Space pauses, arrow keys step (shift for five turns), Home/End jump,
//! drag pans, wheel zooms, Escape quits.

mod follow;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use pw_engine::core::{App, AppControl, FrameCtx};
use pw_engine::device::GpuInit;
use pw_engine::input::{InputEvent, Key, KeyState};
use pw_engine::logging::{init_logging, LoggingConfig};
use pw_engine::time::FpsCounter;
use pw_engine::window::{Runtime, RuntimeConfig};
use pw_visualizer::assets::GameAssets;
use pw_visualizer::{GameInstance, MatchLog, VisualizerConfig};
use winit::dpi::LogicalSize;

use crate::follow::LogFollower;

#[derive(Debug, Parser)]
#[command(name = "pw-viewer", about = "Replay a Planet Wars match log")]
struct Args {
    /// Match log: one JSON state per line.
    match_log: PathBuf,

    /// Directory with planets.png/json, ship.png and font files.
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Font file (.json msdf layout, .png grid font, or .ttf/.otf).
    #[arg(long)]
    font: Option<PathBuf>,

    #[arg(long, default_value_t = 500.0)]
    ms_per_turn: f64,

    /// Keep reading states appended to the log.
    #[arg(long)]
    follow: bool,

    #[arg(long, default_value_t = 1280.0)]
    width: f64,

    #[arg(long, default_value_t = 720.0)]
    height: f64,

    /// Log filter, e.g. "debug" or "pw_visualizer=trace"; overrides RUST_LOG.
    #[arg(long = "log")]
    log_filter: Option<String>,
}

struct Viewer {
    game: GameInstance,
    fps: FpsCounter,
    follower: Option<LogFollower>,
    el_size: (f32, f32),
    title: String,
}

impl Viewer {
    fn poll_log(&mut self, now: Instant) {
        let Some(follower) = &mut self.follower else { return };

        let lines = match follower.poll(now) {
            Ok(lines) => lines,
            Err(err) => {
                log::warn!("stopped following match log: {err}");
                self.follower = None;
                return;
            }
        };

        for line in lines {
            if let Err(err) = self.game.push_state(&line) {
                log::warn!("skipping appended state: {err}");
            }
        }
    }
}

impl App for Viewer {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        self.fps.frame(ctx.time.now);

        for ev in &ctx.input_frame.events {
            if let InputEvent::Key { key: Key::Escape, state: KeyState::Pressed, .. } = ev {
                return AppControl::Exit;
            }
            self.game.handle_input(ev);
        }

        let size = ctx.window.logical_size();
        if size != self.el_size && size.0 > 0.0 && size.1 > 0.0 {
            self.el_size = size;
            self.game.on_resize(size);
        }

        self.poll_log(ctx.time.now);
        self.game.record_frame_time(self.fps.delta().as_secs_f64() * 1000.0);
        self.game.tick(f64::from(ctx.time.dt) * 1000.0);

        let title = self.game.title();
        if title != self.title {
            ctx.window.set_title(&title);
            self.title = title;
        }

        let game = &self.game;
        let control = ctx.render(|rctx, target| game.render(rctx, target));
        self.fps.frame_end();
        control
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(LoggingConfig {
        env_filter: args.log_filter.clone(),
        ..LoggingConfig::default()
    });

    let text = std::fs::read_to_string(&args.match_log)
        .with_context(|| format!("failed to read match log {}", args.match_log.display()))?;
    // When following, a half-written last line is left for the follower.
    let loaded = if args.follow { follow::complete_len(&text) } else { text.len() };
    let state = MatchLog::parse(&text[..loaded]).with_context(|| format!("invalid match log {}", args.match_log.display()))?;

    let assets = GameAssets::load(args.assets.as_deref(), args.font.as_deref()).context("failed to load assets")?;

    let config = VisualizerConfig {
        ms_per_turn: args.ms_per_turn,
        ..VisualizerConfig::default()
    };
    let el_size = (args.width as f32, args.height as f32);
    let mut game = GameInstance::new(state, &assets, config, el_size).context("failed to set up visualizer")?;
    game.start();

    let follower = args.follow.then(|| LogFollower::new(&args.match_log, loaded as u64));
    let title = game.title();

    let viewer = Viewer {
        game,
        fps: FpsCounter::new(),
        follower,
        el_size,
        title: title.clone(),
    };

    let runtime = RuntimeConfig {
        title,
        initial_size: LogicalSize::new(args.width, args.height),
    };
    Runtime::run(runtime, GpuInit::default(), viewer)
}

//! quicktimer demo host.
//!
//! Runs a headless frame loop against the timer scheduler:
//! - **bevy_ecs** world and schedule stand in for the game loop or editor session
//! - a [`TimerManager`] lives in the world as a non-send resource
//! - an autosave timer and a three-step countdown log their activity
//!
//! # Main Loop
//!
//! 1. Load `quicktimer.ini` (or `--config`), then apply CLI overrides
//! 2. Build the manager, the world, and the lifecycle observer
//! 3. For each frame: report host pause/resume if requested, advance
//!    `WorldTime` by one (optionally jittered) frame, run the schedule
//! 4. Optionally dump the timer snapshot as JSON, then shut the host down
//!
//! # Running
//!
//! ```sh
//! RUST_LOG=debug cargo run -- --frames 300 --time-scale 0.5 --pause-at 60 --resume-at 120
//! ```

use bevy_ecs::observer::Observer;
use bevy_ecs::prelude::*;
use clap::{Parser, ValueEnum};
use log::info;
use std::path::PathBuf;

use quicktimer::autosave::AutoSave;
use quicktimer::events::host::{HostLifecycleEvent, HostTransition};
use quicktimer::events::timer::TimerEventKind;
use quicktimer::resources::timerconfig::SchedulerConfig;
use quicktimer::resources::timermanager::{HostKind, TimerManager, TimerOptions};
use quicktimer::resources::worldtime::WorldTime;
use quicktimer::systems::time::update_world_time;
use quicktimer::systems::timermanager::{host_lifecycle_observer, update_timer_manager};

/// Headless host loop for the quicktimer scheduler.
#[derive(Parser)]
#[command(version, about = "Drives a timer manager from a simulated frame loop.")]
struct Cli {
    /// INI configuration file (default: ./quicktimer.ini, optional).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Number of frames to simulate.
    #[arg(long)]
    frames: Option<u32>,

    /// Simulated frames per second.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    fps: Option<u32>,

    /// Host flavour the manager is built for.
    #[arg(long, value_enum)]
    host: Option<HostArg>,

    /// World time scale (0 freezes scaled timers).
    #[arg(long)]
    time_scale: Option<f32>,

    /// Random per-frame deviation of the delta, as a fraction (0..1).
    #[arg(long)]
    jitter: Option<f32>,

    /// Seconds between autosaves; 0 disables autosave.
    #[arg(long, value_name = "SECONDS")]
    autosave_interval: Option<f32>,

    /// Frame at which the host reports a pause (application pause or compilation start).
    #[arg(long, value_name = "FRAME")]
    pause_at: Option<u32>,

    /// Frame at which the host reports the matching resume.
    #[arg(long, value_name = "FRAME")]
    resume_at: Option<u32>,

    /// Print the timer snapshot as JSON before shutting down.
    #[arg(long)]
    dump_json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum HostArg {
    Runtime,
    Editor,
}

impl From<HostArg> for HostKind {
    fn from(arg: HostArg) -> Self {
        match arg {
            HostArg::Runtime => HostKind::Runtime,
            HostArg::Editor => HostKind::Editor,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SchedulerConfig::with_path(path.clone()),
        None => SchedulerConfig::new(),
    };
    if let Err(e) = config.load_from_file() {
        // An explicitly requested config must exist; the default one is optional.
        if cli.config.is_some() {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
        info!("{e}, using defaults");
    }
    apply_cli_overrides(&mut config, &cli);

    // --------------- Scheduler + ECS world ---------------
    let manager = TimerManager::new(config.host_kind);
    manager.initialize(0.0);

    let mut world = World::new();
    world.insert_resource(WorldTime::default().with_time_scale(config.time_scale));
    world.insert_non_send_resource(manager.clone());
    world.spawn(Observer::new(host_lifecycle_observer));
    // Ensure the observer is registered before any host event is triggered.
    world.flush();

    // --------------- Timer consumers ---------------
    let autosave = config.autosave_enabled.then(|| {
        AutoSave::install(&manager, config.autosave_interval, |n| {
            info!("autosave #{n} written");
            Ok(())
        })
    });

    let countdown = manager.create_timer(TimerOptions::new(1.0).with_repeat_count(3));
    countdown.add_event_listener(TimerEventKind::Timer, |e| {
        info!(
            "countdown {}/{}",
            e.timer.current_count(),
            e.timer.repeat_count()
        );
        Ok(())
    });
    countdown.add_event_listener(TimerEventKind::Complete, |e| {
        info!("{} countdown complete", e.timer.id());
        Ok(())
    });

    let mut update = Schedule::default();
    update.add_systems(update_timer_manager);

    let (pause, resume) = match config.host_kind {
        HostKind::Runtime => (
            HostTransition::ApplicationPaused,
            HostTransition::ApplicationResumed,
        ),
        HostKind::Editor => (
            HostTransition::CompilationStarted,
            HostTransition::CompilationFinished,
        ),
    };

    // --------------- Main loop ---------------
    info!(
        "running {} frames at {} fps on the {} host",
        config.frames, config.fps, config.host_kind
    );
    let mut rng = fastrand::Rng::new();
    let frame_delta = config.frame_delta();
    for frame in 0..config.frames {
        if cli.pause_at == Some(frame) {
            world.trigger(HostLifecycleEvent::new(pause));
        }
        if cli.resume_at == Some(frame) {
            world.trigger(HostLifecycleEvent::new(resume));
        }
        let dt = jittered(frame_delta, config.jitter, &mut rng);
        update_world_time(&mut world, dt);
        update.run(&mut world);
    }

    if cli.dump_json {
        match serde_json::to_string_pretty(&manager.snapshot()) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing timer snapshot: {e}");
                std::process::exit(1);
            }
        }
    }

    let elapsed = world.resource::<WorldTime>().real_elapsed;
    world.trigger(HostLifecycleEvent::new(HostTransition::Shutdown));
    info!(
        "simulated {:.2}s, {} autosave(s), countdown at {}/{}",
        elapsed,
        autosave.as_ref().map_or(0, AutoSave::saves),
        countdown.current_count(),
        countdown.repeat_count()
    );
}

fn apply_cli_overrides(config: &mut SchedulerConfig, cli: &Cli) {
    if let Some(frames) = cli.frames {
        config.frames = frames;
    }
    if let Some(fps) = cli.fps {
        config.fps = fps;
    }
    if let Some(host) = cli.host {
        config.host_kind = host.into();
    }
    if let Some(scale) = cli.time_scale {
        config.time_scale = scale.max(0.0);
    }
    if let Some(jitter) = cli.jitter {
        config.jitter = jitter.clamp(0.0, 1.0);
    }
    if let Some(interval) = cli.autosave_interval {
        config.autosave_enabled = interval > 0.0;
        config.autosave_interval = interval;
    }
}

/// Deviate `base` by up to `jitter` of itself in either direction.
fn jittered(base: f32, jitter: f32, rng: &mut fastrand::Rng) -> f32 {
    if jitter <= 0.0 {
        return base;
    }
    base * (1.0 + jitter * (rng.f32() * 2.0 - 1.0))
}

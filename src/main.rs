//! Headless firework show.
//!
//! ```text
//! ember [settings.json] [seconds]
//! ```
//!
//! Runs the cascade at a fixed 60 Hz step and logs emitter and particle
//! counts once per simulated second. Set `RUST_LOG=ember=debug` for emitter
//! lifecycle events.

use std::thread;
use std::time::Duration;

use ember::fireworks::{CurveTextures, ShowAssets};
use ember::startup::prerequisite;
use ember::{EngineError, FireworkShow, ShowSettings, TextureHandle, Time, Viewport};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_SECONDS: f32 = 20.0;
const STEP: f32 = 1.0 / 60.0;

fn main() -> Result<(), EngineError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ember=info")))
        .init();

    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => {
            info!(%path, "loading show settings");
            ShowSettings::load(path)?
        }
        None => ShowSettings::default(),
    };
    let seconds = args
        .next()
        .and_then(|s| s.parse::<f32>().ok())
        .unwrap_or(DEFAULT_SECONDS);

    // Stand-in loaders: textures arrive a little later on other threads
    let (star_tx, star_map) = prerequisite("star");
    let (smoke_tx, smoke_map) = prerequisite("smoke");
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        star_tx.resolve(TextureHandle(1));
    });
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(40));
        smoke_tx.resolve(TextureHandle(2));
    });

    let assets = ShowAssets {
        star_map,
        smoke_map,
        curves: CurveTextures::default(),
        load_timeout: Some(5.0),
    };
    let viewport = Viewport {
        width: 1280.0,
        height: 720.0,
        pixel_ratio: 1.0,
    };
    let mut show = FireworkShow::new(assets, viewport, settings)?;

    let mut time = Time::new();
    time.set_fixed_delta(Some(STEP));
    let mut next_report = 1.0;

    while time.elapsed() < seconds {
        let frame = time.tick();
        show.update(frame)?;

        if !show.is_running() {
            // Give the loaders a moment before the next poll
            thread::sleep(Duration::from_millis(5));
        }

        if frame.elapsed >= next_report {
            next_report += 1.0;
            info!(
                t = frame.elapsed,
                emitters = show.system().len(),
                particles = show.system().particle_count(),
                materials = show.materials().borrow().len(),
                "show"
            );
        }
    }

    info!(frames = time.frame(), "show finished");
    Ok(())
}

use std::path::PathBuf;

use clap::Parser;
use log::{info, warn};
use sdl2::keyboard::Keycode;

use pixelsmash::demo::DemoWorld;
use pixelsmash::display::{Display, InputEvent, RenderTarget};
use pixelsmash::timing::FpsCounter;
use pixelsmash::{FramePipeline, RenderConfig, TinyFont, CANVAS_HEIGHT, CANVAS_WIDTH};

/// Tile renderer demo with raytraced per-pixel lighting
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON render config; defaults are used for missing fields
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Integer magnification of the 256x144 canvas
    #[arg(short, long)]
    scale: Option<u32>,

    /// Disable VSync for uncapped framerate
    #[arg(long)]
    no_vsync: bool,

    /// Trace lighting on one thread
    #[arg(long)]
    serial_lighting: bool,
}

fn load_config(args: &Args) -> pixelsmash::Result<RenderConfig> {
    let mut config = match &args.config {
        Some(path) => RenderConfig::load(path)?,
        None => RenderConfig::default(),
    };
    if let Some(scale) = args.scale {
        config.scale = scale;
    }
    if args.no_vsync {
        config.vsync = false;
    }
    if args.serial_lighting {
        config.parallel_lighting = false;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> pixelsmash::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = load_config(&args)?;

    let mut pipeline = FramePipeline::new(&config)?;
    let width = CANVAS_WIDTH as u32 * pipeline.scale();
    let height = CANVAS_HEIGHT as u32 * pipeline.scale();
    let (mut display, texture_creator) = Display::with_options("pixelsmash", width, height, config.vsync)?;
    let mut target = RenderTarget::with_size(&texture_creator, width, height)?;

    let mut world = DemoWorld::new(&config)?;
    let mut fps_counter = FpsCounter::new(60);
    let mut show_hud = true;

    info!("pixelsmash {}x{} (x{})", width, height, config.scale);
    info!(
        "VSync {}, lighting {}",
        if config.vsync { "on" } else { "off" },
        if config.parallel_lighting { "parallel" } else { "serial" }
    );
    info!("Controls: F toggles the HUD, L toggles parallel lighting, Escape quits");

    'main: loop {
        let (dt, _current_fps, avg_fps) = fps_counter.tick();

        for event in display.poll_events() {
            match event {
                InputEvent::Quit | InputEvent::KeyDown(Keycode::Escape) => break 'main,
                InputEvent::KeyDown(Keycode::F) => show_hud = !show_hud,
                InputEvent::KeyDown(Keycode::L) => {
                    let parallel = !pipeline.parallel_lighting();
                    pipeline.set_parallel_lighting(parallel);
                    info!("lighting {}", if parallel { "parallel" } else { "serial" });
                },
                _ => {},
            }
        }

        // Clamp long stalls so the walkers do not jump
        world.update(dt.min(0.1));
        let scene = world.scene();
        let hud = if show_hud {
            world.hud(avg_fps, fps_counter.avg_frame_time_ms())
        } else {
            Vec::new()
        };
        let surface = pipeline.render(&scene, &hud, &TinyFont);

        if let Err(e) = display.present(&mut target, surface) {
            warn!("present failed: {}", e);
            break;
        }
    }

    let (min_fps, max_fps) = fps_counter.min_max_fps();
    info!(
        "Exiting after {} frames: {:.0} avg, {:.0} min, {:.0} max fps",
        pipeline.stats().frame,
        fps_counter.avg_fps(),
        min_fps,
        max_fps
    );
    let t = pipeline.timings();
    info!(
        "Last frame: lighting {:.2}ms of {:.2}ms",
        t.lighting.as_secs_f32() * 1000.0,
        t.total().as_secs_f32() * 1000.0
    );
    Ok(())
}

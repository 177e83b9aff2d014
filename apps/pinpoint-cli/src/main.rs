mod config;

use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use glam::{Vec2, Vec3};
use pinpoint_anchor::{
    AnchorOptions, AnchorSource, OverlayElement, ScreenAnchor, world_to_screen,
};
use pinpoint_input::{CameraControl, DeviceKind, Direction, InputMode, ScreenOrientation};
use pinpoint_scene::KeyboardEvent;
use tracing_subscriber::EnvFilter;

use crate::config::SceneConfig;

#[derive(Parser)]
#[command(name = "pinpoint-cli", about = "Headless driver for camera input and screen anchors")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene config (YAML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and the loaded scene
    Info,
    /// Project a world point through the active camera
    Project {
        x: f32,
        y: f32,
        z: f32,
    },
    /// Drive the camera for a number of frames and report anchor placement
    Simulate {
        /// Movement keys held for the whole run
        #[arg(long, value_delimiter = ',')]
        hold: Vec<Move>,
        /// Joystick vector as `x,y`; switches to joystick mode
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        joystick: Option<Vec<f32>>,
        /// Pick the input mode from a user agent string
        #[arg(long)]
        user_agent: Option<String>,
        /// Number of frames to run
        #[arg(short, long, default_value = "60")]
        frames: u32,
        /// Frame time in milliseconds
        #[arg(long, default_value = "16")]
        frame_ms: u64,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Move {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

impl From<Move> for Direction {
    fn from(m: Move) -> Self {
        match m {
            Move::Forward => Direction::Forward,
            Move::Backward => Direction::Backward,
            Move::Left => Direction::Left,
            Move::Right => Direction::Right,
            Move::Up => Direction::Ascend,
            Move::Down => Direction::Descend,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match &cli.config {
        Some(path) => SceneConfig::load(path)?,
        None => SceneConfig::default(),
    };
    let loaded = config.build()?;
    let scene = &loaded.scene;

    match cli.command {
        Commands::Info => {
            println!("pinpoint-cli v{}", env!("CARGO_PKG_VERSION"));
            let viewport = scene.viewport();
            println!(
                "scene: handedness={:?}, viewport={}x{} ({:?})",
                scene.handedness(),
                viewport.width,
                viewport.height,
                ScreenOrientation::from_size(viewport.width, viewport.height)
            );
            if let Some(camera) = scene.active_camera() {
                let rig = camera.rig();
                println!(
                    "camera: position={}, forward={}, speed={}, fov={:.1}deg, clip={}..{}",
                    rig.position,
                    camera.forward(),
                    rig.speed,
                    rig.fov.to_degrees(),
                    rig.near,
                    rig.far
                );
            }
            println!("entities: {}", loaded.entities.len());
            for (name, id) in &loaded.entities {
                println!("  {name} {:?}", scene.entity_position(*id));
            }
            println!("anchors: {}", config.anchors.len());
        }
        Commands::Project { x, y, z } => {
            let point = Vec3::new(x, y, z);
            let p = world_to_screen(scene, point);
            if p.is_off_screen() {
                println!("{point} -> off-screen");
            } else {
                println!("{point} -> ({:.1}, {:.1})", p.x, p.y);
            }
        }
        Commands::Simulate {
            hold,
            joystick,
            user_agent,
            frames,
            frame_ms,
        } => {
            let mut input = config.input.clone();
            if let Some(ua) = &user_agent {
                let device = DeviceKind::detect(ua, Some(scene.viewport().width));
                input.mode = device.preferred_mode();
                println!("device: {device:?} -> {:?}", input.mode);
            }
            let joystick = match joystick.as_deref() {
                Some([x, y]) => Some(Vec2::new(*x, *y)),
                Some(other) => anyhow::bail!("joystick expects `x,y`, got {other:?}"),
                None => None,
            };
            if joystick.is_some() {
                input.mode = InputMode::Joystick;
            }

            let mut control = CameraControl::new(Rc::clone(scene), input.clone());
            control.enable_keyboard_controls()?;

            let mut anchors = Vec::new();
            for anchor in &config.anchors {
                let element = Rc::new(OverlayElement::new(anchor.label.clone()));
                let source = loaded.anchor_source(&anchor.target)?;
                let handle = ScreenAnchor::create(scene, element.clone(), source, anchor.options)?;
                anchors.push((handle, element));
            }
            if anchors.is_empty() {
                let element = Rc::new(OverlayElement::new("ahead"));
                let source = AnchorSource::Point(Vec3::new(0.0, 0.0, 10.0));
                let handle =
                    ScreenAnchor::create(scene, element.clone(), source, AnchorOptions::default())?;
                anchors.push((handle, element));
            }

            for m in &hold {
                let direction = Direction::from(*m);
                match input.bindings.codes(direction).first() {
                    Some(code) => {
                        scene.dispatch_key(&KeyboardEvent::down(*code));
                    }
                    None => tracing::warn!(?direction, "no key bound, skipping"),
                }
            }
            if let (Some(controller), Some(vector)) = (control.input(), joystick) {
                controller.on_joystick_start();
                controller.on_joystick_move(vector);
            }

            let dt = Duration::from_millis(frame_ms);
            let mut travelled = Vec3::ZERO;
            for _ in 0..frames {
                scene.begin_frame(dt);
                travelled += control.poll();
                scene.render();
            }

            if let Some(camera) = scene.active_camera() {
                println!(
                    "after {frames} frames: camera at {}, moved {:.3}",
                    camera.position(),
                    travelled.length()
                );
            }
            for (anchor, element) in &anchors {
                println!("{element} refreshes={}", anchor.refresh_count());
            }
            control.disable_keyboard_controls();
            drop(anchors);
            tracing::debug!(listeners = scene.listener_count(), "simulation finished");
        }
    }

    Ok(())
}

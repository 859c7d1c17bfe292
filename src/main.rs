//! Cage engine demo runner.
//!
//! A small 2D engine runtime built on:
//! - **raylib** for windowing, input and drawing
//! - **bevy_ecs** for entities, systems and observers
//!
//! # Main Loop
//!
//! 1. Load `config.ini` (or defaults) and open the window
//! 2. Paint and upload the artwork, set up the chosen scene
//! 3. Each frame: poll input, advance the clock, run the schedule, draw the
//!    world through a camera that maps the logical resolution onto the window
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --scene wizard
//! ```

// Do not create console on Windows
#![cfg_attr(target_os = "windows", windows_subsystem = "windows")]

use std::path::PathBuf;

use bevy_ecs::prelude::*;
use clap::Parser;
use raylib::prelude::*;

use cagerust::game::{self, Scene};
use cagerust::resources::gameconfig::{DEFAULT_CONFIG_PATH, GameConfig};
use cagerust::resources::input::InputState;
use cagerust::resources::pixelmask::PixelMaskStore;
use cagerust::resources::texturestore::TextureStore;
use cagerust::resources::worldtime::WorldTime;
use cagerust::systems::input::update_input_state;
use cagerust::systems::render::{RaylibCanvas, render_pass};
use cagerust::systems::time::update_world_time;

/// Cage engine demos
#[derive(Parser)]
#[command(version, about = "Sprite animation, timelines and pixel collisions on raylib.")]
struct Cli {
    /// Configuration file.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Demo scene to run.
    #[arg(long, value_enum, default_value_t = Scene::Stars)]
    scene: Scene,
}

fn camera_for(config: &GameConfig) -> Camera2D {
    let zoom = config.zoom();
    Camera2D {
        offset: Vector2::new(
            (config.window_width as f32 - config.logical_width as f32 * zoom) * 0.5,
            (config.window_height as f32 - config.logical_height as f32 * zoom) * 0.5,
        ),
        target: Vector2::zero(),
        rotation: 0.0,
        zoom,
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = GameConfig::with_path(cli.config.clone());
    if let Err(e) = config.load_from_file() {
        log::info!("{}; using defaults", e);
    }

    let (mut rl, thread) = raylib::init()
        .size(config.window_width as i32, config.window_height as i32)
        .title("Cage")
        .build();
    rl.set_target_fps(config.target_fps);
    // ESC goes through InputState
    rl.set_exit_key(None);

    // --------------- Artwork ---------------
    let mut textures = TextureStore::new();
    let mut masks = PixelMaskStore::new();
    if let Err(e) = game::load_assets(&mut rl, &thread, &mut textures, &mut masks) {
        log::error!("{}", e);
        std::process::exit(1);
    }

    // --------------- ECS world + resources ---------------
    let camera = camera_for(&config);
    let zoom = config.zoom();
    let mut world = World::new();
    world.insert_resource(WorldTime::default().with_time_scale(1.0));
    world.insert_resource(InputState::default());
    world.insert_resource(masks);
    world.insert_resource(config);

    if let Err(e) = game::setup(&mut world, cli.scene) {
        log::error!("Failed to set up scene {:?}: {}", cli.scene, e);
        std::process::exit(1);
    }
    game::add_observers(&mut world, cli.scene);
    world.flush();

    let mut update = Schedule::default();
    game::add_systems(&mut update, cli.scene);
    if let Err(e) = update.initialize(&mut world) {
        log::error!("Failed to initialize schedule: {}", e);
        std::process::exit(1);
    }
    log::info!("Running scene {:?}", cli.scene);

    // --------------- Main loop ---------------
    while !rl.window_should_close() && !game::should_quit(&mut world) {
        update_input_state(&mut world, &rl);
        update_world_time(&mut world, rl.get_frame_time() * 1000.0);

        update.run(&mut world);
        world.clear_trackers();

        let background = game::background(&mut world, cli.scene);
        let mut d = rl.begin_drawing(&thread);
        d.clear_background(background);
        {
            let mut d2 = d.begin_mode2D(camera);
            let mut canvas = RaylibCanvas::new(&mut d2, &textures);
            render_pass(&mut world, &mut canvas);
        }
        game::draw_overlay(&mut d, &mut world, cli.scene, zoom);
    }
}

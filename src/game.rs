//! Demo scenes.
//!
//! Three small scenes exercise the engine pieces end to end:
//!
//! - [`Scene::Stars`]: twelve stars bounce around the screen; the two-phase
//!   pixel collision detector swaps the velocities of touching stars.
//! - [`Scene::Wizard`]: a wizard walks while the right arrow is held and casts
//!   a spell with space. Walking has a wind-up and a wind-down frame, and each
//!   frame publishes the wizard's speed as a signal.
//! - [`Scene::Intro`]: a timeline fades the screen in, shows two captions and
//!   quits.
//!
//! All artwork is painted at startup with the raylib image API, so the
//! binary needs no asset files.

use std::sync::Arc;

use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use raylib::prelude::*;
use thiserror::Error;

use crate::components::animation::{FrameSignal, SpriteAnimation};
use crate::components::boxcollider::{BBox, BoxCollider};
use crate::components::mapposition::MapPosition;
use crate::components::pixelmask::PixelMask;
use crate::components::rigidbody::RigidBody;
use crate::components::signals::Signals;
use crate::components::sprite::{Sprite, SpriteError};
use crate::components::timeline::{Timeline, TimelineError, TimelineTrack};
use crate::components::zindex::ZIndex;
use crate::events::collision::PixelCollisionEvent;
use crate::events::timeline::TimelineFiredEvent;
use crate::resources::animationstore::{
    Animation, AnimationError, AnimationStore, Frame, PlaybackMode,
};
use crate::resources::gameconfig::GameConfig;
use crate::resources::input::InputState;
use crate::resources::pixelmask::{PixelBuffer, PixelMaskStore};
use crate::resources::texturestore::TextureStore;
use crate::systems::animation::animation;
use crate::systems::collision::pixel_collision_detector;
use crate::systems::movement::movement;
use crate::systems::timeline::update_timelines;

pub const STAR_COUNT: usize = 12;
pub const STAR_SIZE: i32 = 16;
/// Star speed along each axis, in world units per second.
pub const STAR_SPEED: f32 = 60.0;

pub const WIZARD_SIZE: i32 = 32;
pub const WIZARD_BASE_Y: f32 = 57.0;
const WIZARD_SHEET_COLUMNS: i32 = 4;
const WIZARD_SHEET_ROWS: i32 = 2;

/// Walking speeds published by the wizard's animation frames, in world units
/// per second.
pub const NO_SPEED: f32 = 0.0;
pub const PREP_SPEED: f32 = 15.0;
pub const STOP_SPEED: f32 = 6.0;
pub const NORMAL_SPEED: f32 = 30.0;

const TILE_SIZE: i32 = 16;

/// Signal keys shared by scenes and the overlay.
pub const SPEED_SIGNAL: &str = "speed";
pub const FADE_SIGNAL: &str = "fade";
pub const CAPTION_SIGNAL: &str = "caption";
pub const QUIT_SIGNAL: &str = "quit";

const CAPTIONS: [&str; 2] = ["Once upon a time,", "in a land far, far away..."];

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Scene {
    Stars,
    Wizard,
    Intro,
}

#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Animation(#[from] AnimationError),
    #[error(transparent)]
    Sprite(#[from] SpriteError),
    #[error(transparent)]
    Timeline(#[from] TimelineError),
    #[error("failed to upload texture '{key}': {reason}")]
    Texture { key: String, reason: String },
}

/// Marker for the bouncing stars.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Star;

/// The wizard and the animations it switches between.
#[derive(Component, Debug, Clone)]
pub struct Wizard {
    pub walk: Arc<Animation<FrameSignal>>,
    pub stand: Arc<Animation<FrameSignal>>,
    pub spell: Arc<Animation<FrameSignal>>,
}

// ---------------------------------------------------------------- artwork

fn upload(
    rl: &mut RaylibHandle,
    thread: &RaylibThread,
    textures: &mut TextureStore,
    key: &str,
    image: &Image,
) -> Result<(), SetupError> {
    let texture = rl
        .load_texture_from_image(thread, image)
        .map_err(|e| SetupError::Texture {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
    textures.insert(key, texture);
    Ok(())
}

fn paint_star() -> Image {
    let mut image = Image::gen_image_color(STAR_SIZE, STAR_SIZE, Color::BLANK);
    image.draw_circle(STAR_SIZE / 2, STAR_SIZE / 2, STAR_SIZE / 2 - 1, Color::GOLD);
    image.draw_circle(STAR_SIZE / 2, STAR_SIZE / 2, STAR_SIZE / 4, Color::YELLOW);
    image
}

/// Eight 32x32 poses: 0-3 walking, 4 mid-step, 5 standing, 6 staff raised,
/// 7 casting.
fn paint_wizard_sheet() -> Image {
    let mut image = Image::gen_image_color(
        WIZARD_SIZE * WIZARD_SHEET_COLUMNS,
        WIZARD_SIZE * WIZARD_SHEET_ROWS,
        Color::BLANK,
    );
    let strides = [-4, -2, 2, 4, 0, 0, 0, 0];
    for (frame, stride) in strides.iter().enumerate() {
        let frame = frame as i32;
        let x = (frame % WIZARD_SHEET_COLUMNS) * WIZARD_SIZE;
        let y = (frame / WIZARD_SHEET_COLUMNS) * WIZARD_SIZE;

        // legs
        image.draw_rectangle(x + 12 + stride, y + 26, 3, 6, Color::DARKBROWN);
        image.draw_rectangle(x + 17 - stride, y + 26, 3, 6, Color::DARKBROWN);
        // robe, head and hat
        image.draw_rectangle(x + 10, y + 12, 12, 15, Color::DARKBLUE);
        image.draw_circle(x + 16, y + 9, 4, Color::BEIGE);
        image.draw_rectangle(x + 11, y + 2, 10, 3, Color::DARKPURPLE);
        image.draw_rectangle(x + 14, y, 4, 2, Color::DARKPURPLE);

        let staff_top = if frame >= 6 { 0 } else { 8 };
        image.draw_rectangle(x + 24, y + staff_top, 2, 32 - staff_top, Color::BROWN);
        if frame == 7 {
            image.draw_circle(x + 25, y + 2, 3, Color::SKYBLUE);
        }
    }
    image
}

fn paint_tile(top: Color, body: Color) -> Image {
    let mut image = Image::gen_image_color(TILE_SIZE, TILE_SIZE, body);
    image.draw_rectangle(0, 0, TILE_SIZE, 4, top);
    image
}

/// Paint every texture the scenes use, upload it, and keep CPU copies of the
/// collision masks.
pub fn load_assets(
    rl: &mut RaylibHandle,
    thread: &RaylibThread,
    textures: &mut TextureStore,
    masks: &mut PixelMaskStore,
) -> Result<(), SetupError> {
    let star = paint_star();
    upload(rl, thread, textures, "star", &star)?;
    masks.insert("star", PixelBuffer::from_image(&star));

    upload(rl, thread, textures, "wizard", &paint_wizard_sheet())?;
    upload(rl, thread, textures, "grass", &paint_tile(Color::LIME, Color::BROWN))?;
    upload(rl, thread, textures, "earth", &paint_tile(Color::BROWN, Color::DARKBROWN))?;
    log::info!("Loaded {} textures", textures.map.len());
    Ok(())
}

// ---------------------------------------------------------------- setup

/// Populate the world for `scene`.
pub fn setup(world: &mut World, scene: Scene) -> Result<(), SetupError> {
    match scene {
        Scene::Stars => spawn_stars(world),
        Scene::Wizard => spawn_wizard(world),
        Scene::Intro => spawn_intro(world),
    }
}

/// Register the systems `scene` needs, in frame order.
pub fn add_systems(schedule: &mut Schedule, scene: Scene) {
    match scene {
        Scene::Stars => {
            schedule.add_systems((movement, bounce_stars, pixel_collision_detector).chain());
        }
        Scene::Wizard => {
            schedule.add_systems((control_wizard, animation, walk_wizard, movement).chain());
        }
        Scene::Intro => {
            schedule.add_systems(update_timelines);
        }
    }
}

/// Register the observers `scene` reacts with.
pub fn add_observers(world: &mut World, scene: Scene) {
    match scene {
        Scene::Stars => {
            world.add_observer(swap_star_velocities);
        }
        Scene::Intro => {
            world.add_observer(log_timeline_dispatch);
        }
        Scene::Wizard => {}
    }
}

pub fn spawn_stars(world: &mut World) -> Result<(), SetupError> {
    let sprite = Sprite::new("star", STAR_SIZE, STAR_SIZE, STAR_SIZE, STAR_SIZE)?;
    for i in 0..STAR_COUNT {
        let offset = (i as i32 * STAR_SIZE) as f32;
        // -1, 0 or +1 along each axis
        let vx = (1 - fastrand::i32(0..3)) as f32 * STAR_SPEED;
        let vy = (1 - fastrand::i32(0..3)) as f32 * STAR_SPEED;
        world.spawn((
            Star,
            MapPosition::new(offset, offset),
            RigidBody::new(vx, vy),
            BoxCollider::new(STAR_SIZE as f32, STAR_SIZE as f32),
            PixelMask::new("star"),
            sprite.clone(),
            ZIndex(1),
        ));
    }
    Ok(())
}

/// Walk cycle: a wind-up frame, a four-frame loop and a wind-down frame.
pub fn wizard_walk() -> Result<Animation<FrameSignal>, AnimationError> {
    let mut walk = Animation::new();
    walk.add_frame(4, 200, Some(FrameSignal::scalar(SPEED_SIGNAL, PREP_SPEED)))?;
    for sheet_index in 0..4 {
        walk.add_frame(
            sheet_index,
            200,
            Some(FrameSignal::scalar(SPEED_SIGNAL, NORMAL_SPEED)),
        )?;
    }
    walk.add_frame(4, 200, Some(FrameSignal::scalar(SPEED_SIGNAL, STOP_SPEED)))?;
    walk.set_loop(1, 4)?;
    Ok(walk)
}

pub fn wizard_stand() -> Result<Animation<FrameSignal>, AnimationError> {
    let mut stand = Animation::new().with_mode(PlaybackMode::FreezeLastFrame);
    stand.add_frame(5, 100, Some(FrameSignal::scalar(SPEED_SIGNAL, NO_SPEED)))?;
    Ok(stand)
}

/// Raise the staff, hold the casting pose, lower the staff.
pub fn wizard_spell() -> Result<Animation<FrameSignal>, AnimationError> {
    let mut spell = Animation::new();
    spell.add_frames([(5, 200), (6, 200), (7, 100), (6, 200)].map(|(sheet_index, duration_ms)| {
        Frame {
            sheet_index,
            duration_ms,
            payload: Some(FrameSignal::scalar(SPEED_SIGNAL, NO_SPEED)),
        }
    }))?;
    spell.set_loop(2, 2)?;
    Ok(spell)
}

pub fn spawn_wizard(world: &mut World) -> Result<(), SetupError> {
    let (walk, stand, spell) = {
        let mut store = world.get_resource_or_insert_with(AnimationStore::new);
        (
            store.insert("wizard_walk", wizard_walk()?)?,
            store.insert("wizard_stand", wizard_stand()?)?,
            store.insert("wizard_spell", wizard_spell()?)?,
        )
    };

    let columns = (world
        .get_resource::<GameConfig>()
        .map_or(192, |c| c.logical_width) as i32
        + TILE_SIZE
        - 1)
        / TILE_SIZE;
    let grass = Sprite::new("grass", TILE_SIZE, TILE_SIZE, TILE_SIZE, TILE_SIZE)?;
    let earth = Sprite::new("earth", TILE_SIZE, TILE_SIZE, TILE_SIZE, TILE_SIZE)?;
    for col in 0..columns {
        let x = (col * TILE_SIZE) as f32;
        world.spawn((grass.clone(), MapPosition::new(x, 5.0 * TILE_SIZE as f32), ZIndex(-1)));
        world.spawn((earth.clone(), MapPosition::new(x, 6.0 * TILE_SIZE as f32), ZIndex(-1)));
    }

    let player = SpriteAnimation::playing(Arc::clone(&stand))?;
    world.spawn((
        Wizard { walk, stand, spell },
        Sprite::new(
            "wizard",
            WIZARD_SIZE * WIZARD_SHEET_COLUMNS,
            WIZARD_SIZE * WIZARD_SHEET_ROWS,
            WIZARD_SIZE,
            WIZARD_SIZE,
        )?,
        player,
        MapPosition::new(0.0, WIZARD_BASE_Y),
        RigidBody::default(),
        Signals::default(),
        ZIndex(1),
    ));
    Ok(())
}

/// Fade in, two captions, quit.
pub fn intro_timeline() -> Result<Timeline<Signals>, TimelineError> {
    let mut timeline = Timeline::new();
    timeline.append_event(0, 1000, |s: &mut Signals, _, progress| {
        s.set_scalar(FADE_SIGNAL, progress)
    })?;
    timeline.append_event(0, 1000, |s: &mut Signals, _, _| {
        s.set_integer(CAPTION_SIGNAL, 1)
    })?;
    timeline.append_event(0, 1000, |s: &mut Signals, _, _| {
        s.set_integer(CAPTION_SIGNAL, 2)
    })?;
    timeline.append_event(0, 1000, |s: &mut Signals, _, _| {
        s.clear_integer(CAPTION_SIGNAL);
        s.set_flag(QUIT_SIGNAL)
    })?;
    Ok(timeline)
}

pub fn spawn_intro(world: &mut World) -> Result<(), SetupError> {
    world.spawn((TimelineTrack::new(intro_timeline()?), Signals::default()));
    Ok(())
}

// ---------------------------------------------------------------- systems

/// Turn stars around when they leave the logical screen.
pub fn bounce_stars(
    mut query: Query<(&MapPosition, &BoxCollider, &mut RigidBody), With<Star>>,
    config: Res<GameConfig>,
) {
    let screen = BBox::from_pos_size(
        Vector2::zero(),
        config.logical_width as f32,
        config.logical_height as f32,
    );
    for (position, collider, mut body) in query.iter_mut() {
        let bbox = collider.bbox(position.pos);
        if bbox.inside(&screen) {
            continue;
        }
        if bbox.p1.x < screen.p1.x {
            body.velocity.x = STAR_SPEED;
        }
        if bbox.p1.y < screen.p1.y {
            body.velocity.y = STAR_SPEED;
        }
        if bbox.p2.x > screen.p2.x {
            body.velocity.x = -STAR_SPEED;
        }
        if bbox.p2.y > screen.p2.y {
            body.velocity.y = -STAR_SPEED;
        }
    }
}

/// Touching stars trade velocities.
pub fn swap_star_velocities(
    trigger: On<PixelCollisionEvent>,
    mut bodies: Query<&mut RigidBody, With<Star>>,
) {
    let event = trigger.event();
    if let Ok([mut a, mut b]) = bodies.get_many_mut([event.a, event.b]) {
        let velocity = a.velocity;
        a.velocity = b.velocity;
        b.velocity = velocity;
    }
}

/// Pick the wizard's animation from the keyboard. Switches are deferred by
/// the player, so the wizard always finishes its current move first.
pub fn control_wizard(input: Res<InputState>, mut query: Query<(&Wizard, &mut SpriteAnimation)>) {
    for (wizard, mut player) in query.iter_mut() {
        let wanted = if input.action.active {
            &wizard.spell
        } else if input.right.active {
            &wizard.walk
        } else {
            &wizard.stand
        };
        if let Err(err) = player.play(Arc::clone(wanted)) {
            log::warn!("wizard cannot play animation: {}", err);
        }
    }
}

/// Move the wizard at the speed published by its current frame, wrapping
/// around the right edge of the screen.
pub fn walk_wizard(
    mut query: Query<(&Signals, &mut RigidBody, &mut MapPosition), With<Wizard>>,
    config: Res<GameConfig>,
) {
    for (signals, mut body, mut position) in query.iter_mut() {
        body.velocity.x = signals.get_scalar(SPEED_SIGNAL).unwrap_or(NO_SPEED);
        if position.pos.x > config.logical_width as f32 {
            position.pos.x = -(WIZARD_SIZE as f32);
        }
    }
}

pub fn log_timeline_dispatch(trigger: On<TimelineFiredEvent>) {
    let event = trigger.event();
    if event.progress >= 1.0 {
        log::debug!("{:?}: timeline event {} complete", event.entity, event.index);
    }
}

// ---------------------------------------------------------------- frame helpers

/// Whether any entity raised the quit signal or the player pressed back.
pub fn should_quit(world: &mut World) -> bool {
    if world
        .get_resource::<InputState>()
        .is_some_and(|input| input.back.active)
    {
        return true;
    }
    let mut query = world.query::<&Signals>();
    query.iter(world).any(|s| s.has_flag(QUIT_SIGNAL))
}

/// Clear color for the current frame.
pub fn background(world: &mut World, scene: Scene) -> Color {
    match scene {
        Scene::Stars => Color::new(10, 20, 50, 255),
        Scene::Wizard => Color::SKYBLUE,
        Scene::Intro => {
            let mut query = world.query::<&Signals>();
            let fade = query
                .iter(world)
                .find_map(|s| s.get_scalar(FADE_SIGNAL))
                .unwrap_or(0.0)
                .clamp(0.0, 1.0);
            let level = (255.0 * fade) as u8;
            Color::new(level, level, level, 255)
        }
    }
}

/// Text drawn in screen space on top of the scene.
pub fn draw_overlay<D: RaylibDraw>(d: &mut D, world: &mut World, scene: Scene, zoom: f32) {
    let font_size = (8.0 * zoom) as i32;
    let margin = (4.0 * zoom) as i32;
    match scene {
        Scene::Intro => {
            let mut query = world.query::<&Signals>();
            let caption = query
                .iter(world)
                .find_map(|s| s.get_integer(CAPTION_SIGNAL))
                .and_then(|n| usize::try_from(n - 1).ok())
                .and_then(|i| CAPTIONS.get(i));
            if let Some(text) = caption {
                d.draw_text(text, margin, margin, font_size, Color::BLACK);
            }
        }
        Scene::Wizard => {
            d.draw_text(
                "RIGHT: walk  SPACE: spell",
                margin,
                margin,
                font_size,
                Color::DARKBLUE,
            );
        }
        Scene::Stars => {}
    }
}

//! Cage engine library.
//!
//! A small 2D game runtime: sprite sheet animation, a timeline event
//! scheduler and pixel-accurate collision detection, exposed as `bevy_ecs`
//! components, resources, systems and events.
//!
//! The core types ([`Animation`](resources::animationstore::Animation),
//! [`AnimationPlayer`](components::animation::AnimationPlayer),
//! [`Timeline`](components::timeline::Timeline) and
//! [`pixels_collide`](systems::collision::pixels_collide)) work without a
//! world or a window and can be used on their own.

pub mod components;
pub mod events;
pub mod game;
pub mod resources;
pub mod systems;

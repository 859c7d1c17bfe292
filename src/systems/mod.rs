//! Engine systems.
//!
//! Submodules overview
//! - [`animation`] – advance sprite animations, publish frame signals
//! - [`collision`] – pixel collision test and the two-phase detector
//! - [`input`] – read the keyboard into [`crate::resources::input::InputState`]
//! - [`movement`] – integrate rigid body velocities
//! - [`render`] – drawing context trait and the sprite render pass
//! - [`time`] – advance the frame clock
//! - [`timeline`] – advance entity timelines

pub mod animation;
pub mod collision;
pub mod input;
pub mod movement;
pub mod render;
pub mod time;
pub mod timeline;

//! ECS components for entities.
//!
//! Submodules overview:
//! - [`animation`] – frame payloads and the sprite animation player
//! - [`boxcollider`] – axis-aligned boxes for the broad collision phase
//! - [`mapposition`] – world-space position of an entity
//! - [`pixelmask`] – opt-in to pixel-accurate collision tests
//! - [`rigidbody`] – velocity integrated by the movement system
//! - [`signals`] – per-entity key/value blackboard
//! - [`sprite`] – sprite sheet geometry and drawing
//! - [`timeline`] – sequential time-windowed callbacks
//! - [`zindex`] – draw order

pub mod animation;
pub mod boxcollider;
pub mod mapposition;
pub mod pixelmask;
pub mod rigidbody;
pub mod signals;
pub mod sprite;
pub mod timeline;
pub mod zindex;

//! ECS resources made available to systems.
//!
//! Overview
//! - `animationstore` – animation definitions shared across entities
//! - `gameconfig` – window and render settings from `config.ini`
//! - `input` – per-frame keyboard state
//! - `pixelmask` – CPU pixel buffers for collision tests
//! - `texturestore` – loaded textures keyed by string IDs
//! - `worldtime` – frame clock in milliseconds
pub mod animationstore;
pub mod gameconfig;
pub mod input;
pub mod pixelmask;
pub mod texturestore;
pub mod worldtime;

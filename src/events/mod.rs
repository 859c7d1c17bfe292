//! Event types triggered by engine systems.
//!
//! Submodules:
//! - [`collision`] – pixel-level collision between two entities
//! - [`timeline`] – a timeline dispatched one of its events
pub mod collision;
pub mod timeline;

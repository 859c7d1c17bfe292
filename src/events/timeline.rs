//! Timeline dispatch notifications.
//!
//! [`update_timelines`](crate::systems::timeline::update_timelines) triggers a
//! [`TimelineFiredEvent`] every time an entity's timeline invokes one of its
//! callbacks. The callback itself only sees the entity's
//! [`Signals`](crate::components::signals::Signals); observers get the entity
//! and can touch anything else.
//!
//! ```ignore
//! world.add_observer(|trigger: On<TimelineFiredEvent>| {
//!     let ev = trigger.event();
//!     log::info!("event {} of {:?} at {:.2}", ev.index, ev.entity, ev.progress);
//! });
//! ```

use bevy_ecs::prelude::*;

#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct TimelineFiredEvent {
    pub entity: Entity,
    /// Index of the dispatched timeline event, in append order.
    pub index: usize,
    /// Progress passed to the callback, in `[0, 1]`.
    pub progress: f32,
}

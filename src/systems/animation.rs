//! Animation system.
//!
//! [`animation`] advances every [`SpriteAnimation`] by the frame delta. When a
//! frame that carries a [`FrameSignal`](crate::components::animation::FrameSignal)
//! becomes current, the signal is written into the entity's [`Signals`] so
//! other systems (movement, game logic) can react to it.
//!
//! # Related
//!
//! - [`crate::components::animation::AnimationPlayer`] – playback state machine
//! - [`crate::resources::animationstore::AnimationStore`] – shared definitions

use bevy_ecs::prelude::*;

use crate::components::animation::SpriteAnimation;
use crate::components::signals::Signals;
use crate::resources::worldtime::WorldTime;

/// Advance all sprite animations by [`WorldTime::delta_ms`].
pub fn animation(
    mut query: Query<(&mut SpriteAnimation, Option<&mut Signals>)>,
    time: Res<WorldTime>,
) {
    for (mut player, mut maybe_signals) in query.iter_mut() {
        if !player.is_playing() {
            continue;
        }
        let Some(signal) = player.animate(time.delta_ms) else {
            continue;
        };
        if let Some(signals) = maybe_signals.as_mut() {
            signal.apply(signals);
        }
    }
}

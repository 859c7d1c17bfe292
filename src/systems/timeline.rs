//! Timeline system.
//!
//! Each frame, [`update_timelines`] advances every [`TimelineTrack`] with the
//! entity's [`Signals`] as callback data, then triggers a
//! [`TimelineFiredEvent`] for the dispatch, if any. Entities without a
//! `Signals` component advance against a fresh one, which is inserted on the
//! next command flush with whatever the callbacks wrote into it.

use bevy_ecs::prelude::*;

use crate::components::signals::Signals;
use crate::components::timeline::TimelineTrack;
use crate::events::timeline::TimelineFiredEvent;
use crate::resources::worldtime::WorldTime;

pub fn update_timelines(
    mut query: Query<(Entity, &mut TimelineTrack, Option<&mut Signals>)>,
    time: Res<WorldTime>,
    mut commands: Commands,
) {
    for (entity, mut track, signals) in query.iter_mut() {
        let dispatch = match signals {
            Some(mut signals) => track.timeline.advance(&mut signals, time.delta_ms),
            None => {
                let mut fresh = Signals::default();
                let dispatch = track.timeline.advance(&mut fresh, time.delta_ms);
                commands.entity(entity).insert(fresh);
                dispatch
            }
        };
        if let Some(dispatch) = dispatch {
            log::debug!(
                "timeline of {:?} dispatched event {} (progress {:.3})",
                entity,
                dispatch.index,
                dispatch.progress
            );
            commands.trigger(TimelineFiredEvent {
                entity,
                index: dispatch.index,
                progress: dispatch.progress,
            });
        }
    }
}

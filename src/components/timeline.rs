//! Timeline of sequential, time-windowed callbacks.
//!
//! A [`Timeline`] holds events that run one after the other. Each event waits
//! `wait_ms` after the previous event's window closed, then stays active for
//! `duration_ms`. While an event is active, every [`Timeline::advance`] call
//! invokes its callback with a progress value in `[0, 1]`. Events with a zero
//! duration are instantaneous and fire exactly once with progress `1.0`.
//!
//! Events never overlap. Use several timelines (tracks) when things must
//! happen at the same time.
//!
//! ```ignore
//! let mut intro: Timeline<Signals> = Timeline::new();
//! intro.append_event(0, 1000, |s: &mut Signals, _, p| s.set_scalar("fade", p))?;
//! intro.append_event(0, 1000, |s: &mut Signals, _, _| s.set_integer("caption", 1))?;
//! intro.append_event(0, 0, |s: &mut Signals, _, _| s.set_flag("quit"))?;
//! ```

use std::fmt;

use bevy_ecs::prelude::Component;
use thiserror::Error;

use crate::components::signals::Signals;

/// Maximum number of events a timeline may hold.
pub const MAX_TIMELINE_EVENTS: usize = 100;

/// Callback invoked with the timeline data, the frame's elapsed milliseconds
/// and the event progress.
pub type TimelineCallback<D, R> = Box<dyn FnMut(&mut D, f32, f32) -> R + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimelineError {
    #[error("timeline already started; reset it before appending events")]
    AlreadyRunning,
    #[error("timeline is full ({capacity} events)")]
    CapacityExceeded { capacity: usize },
}

pub struct TimelineEvent<D, R = ()> {
    pub wait_ms: u32,
    pub duration_ms: u32,
    callback: TimelineCallback<D, R>,
}

impl<D, R> TimelineEvent<D, R> {
    pub fn new(
        wait_ms: u32,
        duration_ms: u32,
        callback: impl FnMut(&mut D, f32, f32) -> R + Send + Sync + 'static,
    ) -> Self {
        Self {
            wait_ms,
            duration_ms,
            callback: Box::new(callback),
        }
    }
}

impl<D, R> fmt::Debug for TimelineEvent<D, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimelineEvent")
            .field("wait_ms", &self.wait_ms)
            .field("duration_ms", &self.duration_ms)
            .finish_non_exhaustive()
    }
}

/// Outcome of an [`Timeline::advance`] call that invoked a callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dispatch<R> {
    /// Index of the event, in append order.
    pub index: usize,
    pub progress: f32,
    /// Whatever the callback returned.
    pub output: R,
}

pub struct Timeline<D, R = ()> {
    events: Vec<TimelineEvent<D, R>>,
    /// Running time since the last reset.
    timer: f32,
    /// Time covered by the windows of all events already swept past.
    acc_timer: f32,
    next_event: usize,
    paused: bool,
    /// Whether `next_event` has been dispatched at least once.
    fired_current: bool,
}

impl<D, R> Default for Timeline<D, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D, R> fmt::Debug for Timeline<D, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timeline")
            .field("events", &self.events)
            .field("timer", &self.timer)
            .field("acc_timer", &self.acc_timer)
            .field("next_event", &self.next_event)
            .field("paused", &self.paused)
            .finish()
    }
}

impl<D, R> Timeline<D, R> {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            timer: 0.0,
            acc_timer: 0.0,
            next_event: 0,
            paused: false,
            fired_current: false,
        }
    }

    /// Append an event after the last one. Returns its index.
    ///
    /// Fails once the timeline has started advancing, or when it is full. A
    /// rejected append leaves the timeline untouched.
    pub fn append_event(
        &mut self,
        wait_ms: u32,
        duration_ms: u32,
        callback: impl FnMut(&mut D, f32, f32) -> R + Send + Sync + 'static,
    ) -> Result<usize, TimelineError> {
        self.push(TimelineEvent::new(wait_ms, duration_ms, callback))
    }

    /// Append a batch of events. Either all of them are appended or none.
    /// Returns the index of the first appended event.
    pub fn append_events(
        &mut self,
        events: impl IntoIterator<Item = TimelineEvent<D, R>>,
    ) -> Result<usize, TimelineError> {
        self.ensure_not_running()?;
        let events: Vec<_> = events.into_iter().collect();
        if self.events.len() + events.len() > MAX_TIMELINE_EVENTS {
            return Err(TimelineError::CapacityExceeded {
                capacity: MAX_TIMELINE_EVENTS,
            });
        }
        let first = self.events.len();
        self.events.extend(events);
        Ok(first)
    }

    pub fn push(&mut self, event: TimelineEvent<D, R>) -> Result<usize, TimelineError> {
        self.ensure_not_running()?;
        if self.events.len() >= MAX_TIMELINE_EVENTS {
            return Err(TimelineError::CapacityExceeded {
                capacity: MAX_TIMELINE_EVENTS,
            });
        }
        self.events.push(event);
        Ok(self.events.len() - 1)
    }

    /// Advance the timeline by `elapsed_ms` and dispatch at most one event.
    ///
    /// The sweep walks past every event whose window is already over, then
    /// invokes the callback of the event whose window the timer is in. An
    /// event shorter than the frame step that has not fired yet is still
    /// dispatched once (with its progress clamped to `1.0`) instead of being
    /// skipped.
    pub fn advance(&mut self, data: &mut D, elapsed_ms: f32) -> Option<Dispatch<R>> {
        if self.paused || self.is_exhausted() {
            return None;
        }
        self.timer += elapsed_ms;

        while self.next_event < self.events.len() {
            let index = self.next_event;
            let event = &mut self.events[index];
            let window_start = self.acc_timer + event.wait_ms as f32;
            if self.timer <= window_start {
                break;
            }

            let since_start = self.timer - window_start;
            let duration = event.duration_ms as f32;
            let overshot = !self.fired_current && duration < elapsed_ms;
            if since_start <= duration || overshot {
                let progress = if event.duration_ms == 0 {
                    1.0
                } else {
                    (since_start / duration).min(1.0)
                };
                self.fired_current = true;
                let output = (event.callback)(data, elapsed_ms, progress);
                return Some(Dispatch {
                    index,
                    progress,
                    output,
                });
            }

            self.acc_timer += event.wait_ms as f32 + duration;
            self.next_event += 1;
            self.fired_current = false;
            log::trace!("timeline event {index} finished at {}ms", self.timer);
        }
        None
    }

    /// Stop accumulating time until [`Timeline::resume`] or [`Timeline::reset`].
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Rewind to the initial state, keeping the registered events.
    pub fn reset(&mut self) {
        self.timer = 0.0;
        self.acc_timer = 0.0;
        self.next_event = 0;
        self.paused = false;
        self.fired_current = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// True once every event's window has been swept past.
    pub fn is_exhausted(&self) -> bool {
        self.next_event >= self.events.len()
    }

    pub fn is_running(&self) -> bool {
        self.timer > 0.0 || self.acc_timer > 0.0
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn timer_ms(&self) -> f32 {
        self.timer
    }

    /// Index of the event currently eligible to fire.
    pub fn next_event(&self) -> usize {
        self.next_event
    }

    fn ensure_not_running(&self) -> Result<(), TimelineError> {
        if self.is_running() {
            Err(TimelineError::AlreadyRunning)
        } else {
            Ok(())
        }
    }
}

/// Timeline attached to an entity. Its callbacks receive the entity's
/// [`Signals`].
#[derive(Component, Debug, Default)]
pub struct TimelineTrack {
    pub timeline: Timeline<Signals>,
}

impl TimelineTrack {
    pub fn new(timeline: Timeline<Signals>) -> Self {
        Self { timeline }
    }
}

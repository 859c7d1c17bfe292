//! Sprite animation playback.
//!
//! [`AnimationPlayer`] is the per-entity state machine that walks through a
//! shared [`Animation`] as time passes. It owns nothing but a reference to the
//! active (and possibly a queued) animation, the current frame index and the
//! time already spent on that frame.
//!
//! # Deferred switches
//!
//! Calling [`AnimationPlayer::play`] while an animation is running does not
//! interrupt it. The request is queued and the running animation first plays
//! out its remaining frames: if it has frames after its loop window (a
//! "wind-down" pose), playback jumps straight to them; otherwise it steps
//! forward to its last frame. Only when that last frame ends does the queued
//! animation take over from frame 0.
//!
//! # Catch-up
//!
//! [`AnimationPlayer::animate`] consumes as many frame boundaries as the
//! elapsed time covers, so a long stall never freezes an animation. Whole
//! repetitions of a cycle are dropped arithmetically, so the work per call is
//! bounded by the animation length however large the delta. Frames with a
//! zero duration hold until a different animation is played.

use std::sync::Arc;

use bevy_ecs::prelude::Component;
use serde::{Deserialize, Serialize};

use crate::components::signals::Signals;
use crate::resources::animationstore::{Animation, AnimationError, PlaybackMode};

/// Per-frame payload used by the engine: a value written into the entity's
/// [`Signals`] when its frame becomes current.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FrameSignal {
    Flag(String),
    Scalar(String, f32),
    Integer(String, i32),
}

impl FrameSignal {
    pub fn flag(key: impl Into<String>) -> Self {
        FrameSignal::Flag(key.into())
    }

    pub fn scalar(key: impl Into<String>, value: f32) -> Self {
        FrameSignal::Scalar(key.into(), value)
    }

    pub fn integer(key: impl Into<String>, value: i32) -> Self {
        FrameSignal::Integer(key.into(), value)
    }

    pub fn apply(&self, signals: &mut Signals) {
        match self {
            FrameSignal::Flag(key) => signals.set_flag(key.as_str()),
            FrameSignal::Scalar(key, value) => signals.set_scalar(key.as_str(), *value),
            FrameSignal::Integer(key, value) => signals.set_integer(key.as_str(), *value),
        }
    }
}

/// Playback state of one sprite.
#[derive(Debug, Component)]
pub struct AnimationPlayer<P> {
    active: Option<Arc<Animation<P>>>,
    next: Option<Arc<Animation<P>>>,
    current_frame: usize,
    elapsed_frame_ms: f64,
    // PingPong direction
    forward: bool,
}

/// The player attached to engine entities.
pub type SpriteAnimation = AnimationPlayer<FrameSignal>;

impl<P> Default for AnimationPlayer<P> {
    fn default() -> Self {
        Self {
            active: None,
            next: None,
            current_frame: 0,
            elapsed_frame_ms: 0.0,
            forward: true,
        }
    }
}

impl<P> Clone for AnimationPlayer<P> {
    fn clone(&self) -> Self {
        Self {
            active: self.active.clone(),
            next: self.next.clone(),
            current_frame: self.current_frame,
            elapsed_frame_ms: self.elapsed_frame_ms,
            forward: self.forward,
        }
    }
}

impl<P> AnimationPlayer<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Player that starts with `animation` already active.
    pub fn playing(animation: Arc<Animation<P>>) -> Result<Self, AnimationError> {
        let mut player = Self::new();
        player.play(animation)?;
        Ok(player)
    }

    /// Request `animation`.
    ///
    /// Requesting the active or already queued animation does nothing. When
    /// idle the animation starts immediately at frame 0; otherwise it replaces
    /// any previously queued request and starts once the active animation has
    /// played out. Invalid animations are rejected and leave the player as it
    /// was.
    pub fn play(&mut self, animation: Arc<Animation<P>>) -> Result<(), AnimationError> {
        if self.is_active(&animation) || self.is_queued(&animation) {
            return Ok(());
        }
        animation.validate()?;
        if self.active.is_some() {
            log::trace!("animation queued behind frame {}", self.current_frame);
            self.next = Some(animation);
        } else {
            self.start(animation);
        }
        Ok(())
    }

    /// Drop the active and queued animations and rewind.
    pub fn stop(&mut self) {
        self.active = None;
        self.next = None;
        self.current_frame = 0;
        self.elapsed_frame_ms = 0.0;
        self.forward = true;
    }

    /// Advance playback by `elapsed_ms`.
    ///
    /// Returns the payload of the frame that became current, or `None` when
    /// no frame boundary was crossed, nothing is playing, or the new frame has
    /// no payload. Non-finite deltas are ignored.
    pub fn animate(&mut self, elapsed_ms: f32) -> Option<&P> {
        let mut animation = self.active.clone()?;
        if !elapsed_ms.is_finite() {
            log::warn!("ignoring non-finite animation delta {}", elapsed_ms);
            return None;
        }
        self.elapsed_frame_ms += f64::from(elapsed_ms);

        let mut crossed = false;
        loop {
            let duration = f64::from(animation.frames()[self.current_frame].duration_ms);
            if duration == 0.0 || self.elapsed_frame_ms < duration {
                break;
            }
            if self.next.is_none()
                && let Some(cycle) = self.cycle_ms(&animation)
                && self.elapsed_frame_ms >= cycle
            {
                self.elapsed_frame_ms %= cycle;
                crossed = true;
                continue;
            }
            self.elapsed_frame_ms -= duration;
            crossed = true;

            match self.next.take() {
                None => self.step(&animation),
                Some(next) => {
                    let len = animation.len();
                    if self.current_frame + 1 < len {
                        let loop_to = animation.loop_to();
                        self.current_frame = if self.current_frame <= loop_to && loop_to + 1 < len
                        {
                            loop_to + 1
                        } else {
                            self.current_frame + 1
                        };
                        self.next = Some(next);
                    } else {
                        log::debug!("switching to queued animation");
                        animation = Arc::clone(&next);
                        self.start(next);
                    }
                }
            }
        }

        if !crossed {
            return None;
        }
        self.active
            .as_deref()
            .and_then(|a| a.frames()[self.current_frame].payload.as_ref())
    }

    pub fn active(&self) -> Option<&Arc<Animation<P>>> {
        self.active.as_ref()
    }

    pub fn queued(&self) -> Option<&Arc<Animation<P>>> {
        self.next.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.active.is_some()
    }

    pub fn is_active(&self, animation: &Arc<Animation<P>>) -> bool {
        self.active
            .as_ref()
            .is_some_and(|a| Arc::ptr_eq(a, animation))
    }

    pub fn is_queued(&self, animation: &Arc<Animation<P>>) -> bool {
        self.next.as_ref().is_some_and(|a| Arc::ptr_eq(a, animation))
    }

    /// Index into the active animation's frames (0 when idle).
    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn elapsed_frame_ms(&self) -> f32 {
        self.elapsed_frame_ms as f32
    }

    /// Sprite sheet cell of the current frame (0 when idle).
    pub fn sheet_index(&self) -> u32 {
        self.active
            .as_deref()
            .and_then(|a| a.frame(self.current_frame))
            .map_or(0, |f| f.sheet_index)
    }

    fn start(&mut self, animation: Arc<Animation<P>>) {
        self.active = Some(animation);
        self.next = None;
        self.current_frame = 0;
        self.elapsed_frame_ms = 0.0;
        self.forward = true;
    }

    /// Length of the cycle the player is currently repeating, provided every
    /// frame in it advances on its own. Playing a whole cycle returns to the
    /// same frame with the same time left over.
    fn cycle_ms(&self, animation: &Animation<P>) -> Option<f64> {
        let frames = animation.frames();
        let current = self.current_frame;
        let cycle = match animation.mode() {
            PlaybackMode::Loop => {
                let (from, to) = (animation.loop_from(), animation.loop_to());
                if current < from || current > to {
                    return None;
                }
                &frames[from..=to]
            }
            PlaybackMode::FreezeLastFrame => {
                if current + 1 < frames.len() {
                    return None;
                }
                &frames[current..]
            }
            PlaybackMode::PingPong => frames,
        };
        if cycle.iter().any(|f| f.duration_ms == 0) {
            return None;
        }
        let sum: u64 = cycle.iter().map(|f| u64::from(f.duration_ms)).sum();
        let total = match (animation.mode(), cycle) {
            // the end frames are shown once per bounce
            (PlaybackMode::PingPong, [first, .., last]) => {
                2 * sum - u64::from(first.duration_ms) - u64::from(last.duration_ms)
            }
            _ => sum,
        };
        Some(total as f64)
    }

    fn step(&mut self, animation: &Animation<P>) {
        let len = animation.len();
        let current = self.current_frame;
        self.current_frame = match animation.mode() {
            PlaybackMode::Loop => {
                if current == animation.loop_to() || current + 1 >= len {
                    animation.loop_from()
                } else {
                    current + 1
                }
            }
            PlaybackMode::FreezeLastFrame => (current + 1).min(len - 1),
            PlaybackMode::PingPong => {
                if len < 2 {
                    current
                } else if self.forward {
                    if current + 1 < len {
                        current + 1
                    } else {
                        self.forward = false;
                        current - 1
                    }
                } else if current > 0 {
                    current - 1
                } else {
                    self.forward = true;
                    current + 1
                }
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(n: u32, duration_ms: u32) -> Arc<Animation<u32>> {
        let mut anim = Animation::new();
        for i in 0..n {
            anim.add_frame(i, duration_ms, Some(i)).unwrap();
        }
        Arc::new(anim)
    }

    fn with_mode(n: u32, mode: PlaybackMode) -> Arc<Animation<u32>> {
        let mut anim = Animation::new().with_mode(mode);
        for i in 0..n {
            anim.add_frame(i, 100, Some(i)).unwrap();
        }
        Arc::new(anim)
    }

    #[test]
    fn idle_player_returns_none() {
        let mut player: AnimationPlayer<u32> = AnimationPlayer::new();
        assert!(player.animate(1000.0).is_none());
        assert_eq!(player.current_frame(), 0);
        assert_eq!(player.sheet_index(), 0);
    }

    #[test]
    fn loop_cycles_through_window() {
        let anim = uniform(4, 100);
        let mut player = AnimationPlayer::playing(anim).unwrap();
        for _ in 0..10 {
            player.animate(100.0);
        }
        assert_eq!(player.current_frame(), 2);
    }

    #[test]
    fn loop_stays_inside_custom_window() {
        let mut anim = Animation::new();
        for i in 0..6 {
            anim.add_frame(i, 100, None::<()>).unwrap();
        }
        anim.set_loop(1, 3).unwrap();
        let mut player = AnimationPlayer::playing(Arc::new(anim)).unwrap();
        let mut seen = Vec::new();
        for _ in 0..8 {
            player.animate(100.0);
            seen.push(player.current_frame());
        }
        assert_eq!(seen, vec![1, 2, 3, 1, 2, 3, 1, 2]);
    }

    #[test]
    fn large_delta_catches_up() {
        let mut player = AnimationPlayer::playing(uniform(4, 100)).unwrap();
        let payload = player.animate(1000.0).copied();
        assert_eq!(player.current_frame(), 2);
        assert_eq!(payload, Some(2));
        assert_eq!(player.elapsed_frame_ms(), 0.0);
    }

    #[test]
    fn remainder_is_kept_within_frame() {
        let mut player = AnimationPlayer::playing(uniform(4, 100)).unwrap();
        assert!(player.animate(60.0).is_none());
        assert_eq!(player.animate(60.0).copied(), Some(1));
        assert_eq!(player.elapsed_frame_ms(), 20.0);
    }

    #[test]
    fn zero_duration_frame_holds_forever() {
        let mut anim = Animation::new();
        anim.add_frame(0, 100, Some(0u32)).unwrap();
        anim.add_frame(1, 0, Some(1u32)).unwrap();
        anim.add_frame(2, 100, Some(2u32)).unwrap();
        let mut player = AnimationPlayer::playing(Arc::new(anim)).unwrap();
        assert_eq!(player.animate(100.0).copied(), Some(1));
        for _ in 0..5 {
            assert!(player.animate(1_000_000.0).is_none());
        }
        assert_eq!(player.current_frame(), 1);
    }

    #[test]
    fn freeze_last_frame_stops_advancing() {
        let mut player =
            AnimationPlayer::playing(with_mode(3, PlaybackMode::FreezeLastFrame)).unwrap();
        player.animate(1000.0);
        assert_eq!(player.current_frame(), 2);
        player.animate(100.0);
        assert_eq!(player.current_frame(), 2);
    }

    #[test]
    fn ping_pong_bounces_between_ends() {
        let mut player = AnimationPlayer::playing(with_mode(4, PlaybackMode::PingPong)).unwrap();
        let mut seen = vec![player.current_frame()];
        for _ in 0..8 {
            player.animate(100.0);
            seen.push(player.current_frame());
        }
        assert_eq!(seen, vec![0, 1, 2, 3, 2, 1, 0, 1, 2]);
    }

    #[test]
    fn ping_pong_single_frame_holds() {
        let mut player = AnimationPlayer::playing(with_mode(1, PlaybackMode::PingPong)).unwrap();
        player.animate(500.0);
        assert_eq!(player.current_frame(), 0);
    }

    #[test]
    fn play_same_animation_is_noop() {
        let anim = uniform(4, 100);
        let mut player = AnimationPlayer::playing(Arc::clone(&anim)).unwrap();
        player.animate(150.0);
        player.play(Arc::clone(&anim)).unwrap();
        assert_eq!(player.current_frame(), 1);
        assert!(player.queued().is_none());
    }

    #[test]
    fn deferred_switch_waits_for_end_of_sequence() {
        let a = uniform(4, 100);
        let b = uniform(2, 100);
        let mut player = AnimationPlayer::playing(Arc::clone(&a)).unwrap();
        player.animate(100.0);
        assert_eq!(player.current_frame(), 1);

        player.play(Arc::clone(&b)).unwrap();
        assert!(player.is_active(&a));
        assert!(player.is_queued(&b));
        // requesting the queued animation again changes nothing
        player.play(Arc::clone(&b)).unwrap();

        player.animate(100.0);
        assert!(player.is_active(&a));
        assert_eq!(player.current_frame(), 2);

        player.animate(100.0);
        assert!(player.is_active(&a));
        assert_eq!(player.current_frame(), 3);

        player.animate(100.0);
        assert!(player.is_active(&b));
        assert!(player.queued().is_none());
        assert_eq!(player.current_frame(), 0);
        assert_eq!(player.elapsed_frame_ms(), 0.0);
    }

    #[test]
    fn deferred_switch_jumps_to_wind_down_frames() {
        // 0 is a wind-up, 1..=3 loop, 4 is a wind-down pose
        let mut walk = Animation::new();
        for i in 0..5 {
            walk.add_frame(i, 100, Some(i)).unwrap();
        }
        walk.set_loop(1, 3).unwrap();
        let walk = Arc::new(walk);
        let stand = uniform(1, 100);

        let mut player = AnimationPlayer::playing(Arc::clone(&walk)).unwrap();
        player.animate(200.0);
        assert_eq!(player.current_frame(), 2);

        player.play(Arc::clone(&stand)).unwrap();
        assert_eq!(player.animate(100.0).copied(), Some(4));
        assert!(player.is_active(&walk));

        player.animate(100.0);
        assert!(player.is_active(&stand));
    }

    #[test]
    fn switch_discards_leftover_time() {
        let a = uniform(2, 100);
        let b = uniform(3, 100);
        let mut player = AnimationPlayer::playing(Arc::clone(&a)).unwrap();
        player.play(Arc::clone(&b)).unwrap();
        player.animate(250.0);
        assert!(player.is_active(&b));
        assert_eq!(player.current_frame(), 0);
        assert_eq!(player.elapsed_frame_ms(), 0.0);
    }

    #[test]
    fn deferred_switch_from_ping_pong_moving_backward() {
        let bounce = with_mode(4, PlaybackMode::PingPong);
        let next = uniform(2, 100);
        let mut player = AnimationPlayer::playing(Arc::clone(&bounce)).unwrap();
        // 0 1 2 3 2
        player.animate(400.0);
        assert_eq!(player.current_frame(), 2);

        player.play(Arc::clone(&next)).unwrap();
        assert_eq!(player.animate(100.0).copied(), Some(3));
        assert!(player.is_active(&bounce));

        player.animate(100.0);
        assert!(player.is_active(&next));
        assert_eq!(player.current_frame(), 0);
    }

    #[test]
    fn deferred_switch_from_freeze_last_frame() {
        let once = with_mode(3, PlaybackMode::FreezeLastFrame);
        let next = uniform(2, 100);
        let mut player = AnimationPlayer::playing(Arc::clone(&once)).unwrap();
        player.play(Arc::clone(&next)).unwrap();

        assert_eq!(player.animate(100.0).copied(), Some(1));
        assert_eq!(player.animate(100.0).copied(), Some(2));
        assert!(player.is_active(&once));

        player.animate(100.0);
        assert!(player.is_active(&next));
    }

    #[test]
    fn deferred_switch_from_frozen_last_frame_is_immediate() {
        let once = with_mode(3, PlaybackMode::FreezeLastFrame);
        let next = uniform(2, 100);
        let mut player = AnimationPlayer::playing(Arc::clone(&once)).unwrap();
        player.animate(5000.0);
        assert_eq!(player.current_frame(), 2);

        player.play(Arc::clone(&next)).unwrap();
        player.animate(100.0);
        assert!(player.is_active(&next));
        assert_eq!(player.current_frame(), 0);
    }

    #[test]
    fn huge_delta_terminates() {
        let mut player = AnimationPlayer::playing(uniform(3, 1)).unwrap();
        player.animate(40_000_000.0);
        // 13_333_333 cycles of 3 ms, then 1 ms
        assert_eq!(player.current_frame(), 1);
        assert_eq!(player.elapsed_frame_ms(), 0.0);

        player.animate(f32::MAX);
        assert!(player.current_frame() < 3);
        assert!(player.elapsed_frame_ms() < 1.0);

        let mut frozen =
            AnimationPlayer::playing(with_mode(3, PlaybackMode::FreezeLastFrame)).unwrap();
        frozen.animate(1.0e30);
        assert_eq!(frozen.current_frame(), 2);

        let mut bounce = AnimationPlayer::playing(with_mode(4, PlaybackMode::PingPong)).unwrap();
        // one bounce is 0 1 2 3 2 1 = 600 ms
        bounce.animate(6_000_200.0);
        assert_eq!(bounce.current_frame(), 2);
    }

    #[test]
    fn wind_up_frames_are_played_before_cycles_are_skipped() {
        let mut walk = Animation::new();
        for i in 0..5 {
            walk.add_frame(i, 100, Some(i)).unwrap();
        }
        walk.set_loop(2, 4).unwrap();
        let mut player = AnimationPlayer::playing(Arc::new(walk)).unwrap();
        // 200 ms of wind-up, then 3_000 cycles of 300 ms, then 100 ms more
        player.animate(200.0 + 900_000.0 + 100.0);
        assert_eq!(player.current_frame(), 3);
    }

    #[test]
    fn non_finite_delta_is_ignored() {
        let mut player = AnimationPlayer::playing(uniform(4, 100)).unwrap();
        player.animate(50.0);
        assert!(player.animate(f32::NAN).is_none());
        assert!(player.animate(f32::INFINITY).is_none());
        assert_eq!(player.current_frame(), 0);
        assert_eq!(player.elapsed_frame_ms(), 50.0);
    }

    #[test]
    fn stop_clears_everything() {
        let mut player = AnimationPlayer::playing(uniform(4, 100)).unwrap();
        player.play(uniform(2, 100)).unwrap();
        player.animate(150.0);
        player.stop();
        assert!(!player.is_playing());
        assert!(player.queued().is_none());
        assert_eq!(player.current_frame(), 0);
        assert_eq!(player.elapsed_frame_ms(), 0.0);
    }

    #[test]
    fn play_rejects_invalid_animation() {
        let mut player: AnimationPlayer<u32> = AnimationPlayer::new();
        assert_eq!(
            player.play(Arc::new(Animation::new())),
            Err(AnimationError::Empty)
        );
        assert!(!player.is_playing());
    }

    #[test]
    fn frame_signal_writes_into_signals() {
        let mut signals = Signals::default();
        FrameSignal::scalar("speed", 0.5).apply(&mut signals);
        FrameSignal::integer("step", 3).apply(&mut signals);
        FrameSignal::flag("footstep").apply(&mut signals);
        assert_eq!(signals.get_scalar("speed"), Some(0.5));
        assert_eq!(signals.get_integer("step"), Some(3));
        assert!(signals.has_flag("footstep"));
    }
}

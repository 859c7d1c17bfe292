//! Animation definitions and the shared animation registry.
//!
//! An [`Animation`] is an append-only list of [`Frame`]s plus a
//! [`PlaybackMode`]. Once built it is shared (behind an [`Arc`]) by any number
//! of [`AnimationPlayer`](crate::components::animation::AnimationPlayer)s,
//! which keep their own playback state.
//!
//! ```ignore
//! let mut walk = Animation::new();
//! walk.add_frame(4, 200, Some(FrameSignal::scalar("speed", 0.25)))?;
//! walk.add_frame(0, 200, Some(FrameSignal::scalar("speed", 0.5)))?;
//! walk.add_frame(1, 200, Some(FrameSignal::scalar("speed", 0.5)))?;
//! walk.add_frame(2, 200, Some(FrameSignal::scalar("speed", 0.1)))?;
//! walk.set_loop(1, 2)?;
//! store.insert("walk", walk)?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use bevy_ecs::prelude::Resource;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::animation::FrameSignal;

/// Maximum number of frames a single animation may hold.
pub const MAX_FRAMES_PER_ANIMATION: usize = 256;

/// How a player moves through an animation once it reaches the end of its
/// frame sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackMode {
    /// Jump back to `loop_from` after showing `loop_to`.
    #[default]
    Loop,
    /// Walk forward to the last frame, then backward to the first, endlessly.
    /// Endpoints are shown once per bounce: `0 1 2 3 2 1 0 1 ...`.
    PingPong,
    /// Stop on the last frame.
    FreezeLastFrame,
}

/// A single entry of an animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame<P> {
    /// Cell index in the sprite sheet (top-left cell is 0, row-major).
    pub sheet_index: u32,
    /// How long the frame stays on screen. Zero holds the frame forever.
    pub duration_ms: u32,
    /// User data reported when the frame becomes current.
    pub payload: Option<P>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnimationError {
    #[error("animation is full ({capacity} frames)")]
    CapacityExceeded { capacity: usize },
    #[error("animation has no frames")]
    Empty,
    #[error("invalid loop window {from}..={to} for {len} frames")]
    InvalidLoopWindow { from: usize, to: usize, len: usize },
}

#[derive(Debug, Error)]
pub enum AnimationLoadError {
    #[error("invalid animation data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("animation '{name}': {source}")]
    Invalid {
        name: String,
        #[source]
        source: AnimationError,
    },
}

/// Data form of an animation, as found in animation files.
///
/// ```json
/// {
///   "spell": {
///     "mode": "Loop",
///     "loop_from": 2,
///     "loop_to": 2,
///     "frames": [
///       { "sheet_index": 5, "duration_ms": 200, "payload": { "Scalar": ["speed", 0.0] } },
///       { "sheet_index": 6, "duration_ms": 200, "payload": null }
///     ]
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationDef<P> {
    #[serde(default)]
    pub mode: PlaybackMode,
    #[serde(default)]
    pub loop_from: Option<usize>,
    #[serde(default)]
    pub loop_to: Option<usize>,
    pub frames: Vec<Frame<P>>,
}

impl<P> AnimationDef<P> {
    /// Build the animation. A missing loop end defaults to the first or the
    /// last frame.
    pub fn build(self) -> Result<Animation<P>, AnimationError> {
        let mut animation = Animation::new().with_mode(self.mode);
        animation.add_frames(self.frames)?;
        if animation.is_empty() {
            return Err(AnimationError::Empty);
        }
        if self.loop_from.is_some() || self.loop_to.is_some() {
            let last = animation.len() - 1;
            animation.set_loop(self.loop_from.unwrap_or(0), self.loop_to.unwrap_or(last))?;
        }
        animation.validate()?;
        Ok(animation)
    }
}

/// Immutable-after-construction frame sequence with a playback policy.
#[derive(Debug, Clone, PartialEq)]
pub struct Animation<P> {
    frames: Vec<Frame<P>>,
    mode: PlaybackMode,
    loop_from: Option<usize>,
    loop_to: Option<usize>,
}

impl<P> Default for Animation<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Animation<P> {
    /// Empty animation in [`PlaybackMode::Loop`] with an unset loop window.
    pub fn new() -> Self {
        Self {
            frames: Vec::new(),
            mode: PlaybackMode::Loop,
            loop_from: None,
            loop_to: None,
        }
    }

    pub fn with_mode(mut self, mode: PlaybackMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn set_mode(&mut self, mode: PlaybackMode) {
        self.mode = mode;
    }

    /// Append a frame.
    ///
    /// In Loop mode the loop window follows the appended frames: `loop_from`
    /// defaults to 0 and `loop_to` keeps pointing at the last frame unless it
    /// was explicitly moved elsewhere with [`Animation::set_loop`].
    pub fn add_frame(
        &mut self,
        sheet_index: u32,
        duration_ms: u32,
        payload: Option<P>,
    ) -> Result<(), AnimationError> {
        if self.frames.len() >= MAX_FRAMES_PER_ANIMATION {
            return Err(AnimationError::CapacityExceeded {
                capacity: MAX_FRAMES_PER_ANIMATION,
            });
        }
        let previous_last = self.frames.len().checked_sub(1);
        self.frames.push(Frame {
            sheet_index,
            duration_ms,
            payload,
        });
        if self.mode == PlaybackMode::Loop {
            if self.loop_from.is_none() {
                self.loop_from = Some(0);
            }
            if self.loop_to.is_none() || self.loop_to == previous_last {
                self.loop_to = Some(self.frames.len() - 1);
            }
        }
        Ok(())
    }

    /// Append frames in order, stopping at the first rejected one.
    pub fn add_frames(
        &mut self,
        frames: impl IntoIterator<Item = Frame<P>>,
    ) -> Result<(), AnimationError> {
        for frame in frames {
            self.add_frame(frame.sheet_index, frame.duration_ms, frame.payload)?;
        }
        Ok(())
    }

    /// Override the loop window. Both ends are inclusive.
    pub fn set_loop(&mut self, from: usize, to: usize) -> Result<(), AnimationError> {
        let len = self.frames.len();
        if from > to || to >= len {
            return Err(AnimationError::InvalidLoopWindow { from, to, len });
        }
        self.loop_from = Some(from);
        self.loop_to = Some(to);
        Ok(())
    }

    /// Check the invariants the frame-advance loop relies on.
    pub fn validate(&self) -> Result<(), AnimationError> {
        let len = self.frames.len();
        if len == 0 {
            return Err(AnimationError::Empty);
        }
        if self.mode == PlaybackMode::Loop {
            let (from, to) = (self.loop_from(), self.loop_to());
            if from > to || to >= len {
                return Err(AnimationError::InvalidLoopWindow { from, to, len });
            }
        }
        Ok(())
    }

    pub fn frames(&self) -> &[Frame<P>] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> Option<&Frame<P>> {
        self.frames.get(index)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    /// First frame of the loop window (0 when unset).
    pub fn loop_from(&self) -> usize {
        self.loop_from.unwrap_or(0)
    }

    /// Last frame of the loop window. Outside Loop mode, or when unset, this
    /// is the last frame of the animation.
    pub fn loop_to(&self) -> usize {
        let last = self.frames.len().saturating_sub(1);
        match self.mode {
            PlaybackMode::Loop => self.loop_to.unwrap_or(last),
            PlaybackMode::PingPong | PlaybackMode::FreezeLastFrame => last,
        }
    }

    /// Sum of all frame durations.
    pub fn total_duration_ms(&self) -> u64 {
        self.frames.iter().map(|f| u64::from(f.duration_ms)).sum()
    }
}

/// Central registry of reusable animation definitions keyed by name.
#[derive(Resource, Default)]
pub struct AnimationStore {
    pub animations: FxHashMap<String, Arc<Animation<FrameSignal>>>,
}

impl AnimationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register an animation, replacing any previous one with
    /// the same key. Players still holding the old definition keep it.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        animation: Animation<FrameSignal>,
    ) -> Result<Arc<Animation<FrameSignal>>, AnimationError> {
        animation.validate()?;
        let animation = Arc::new(animation);
        self.animations.insert(key.into(), Arc::clone(&animation));
        Ok(animation)
    }

    pub fn get(&self, key: &str) -> Option<Arc<Animation<FrameSignal>>> {
        self.animations.get(key).cloned()
    }

    /// Register every animation of a JSON object mapping names to
    /// [`AnimationDef`]s. Nothing is registered if any entry is invalid.
    /// Returns the number of animations loaded.
    pub fn load_json(&mut self, text: &str) -> Result<usize, AnimationLoadError> {
        let defs: BTreeMap<String, AnimationDef<FrameSignal>> = serde_json::from_str(text)?;
        let mut built = Vec::with_capacity(defs.len());
        for (name, def) in defs {
            match def.build() {
                Ok(animation) => built.push((name, animation)),
                Err(source) => return Err(AnimationLoadError::Invalid { name, source }),
            }
        }
        let count = built.len();
        for (name, animation) in built {
            log::debug!("loaded animation '{}' ({} frames)", name, animation.len());
            self.animations.insert(name, Arc::new(animation));
        }
        Ok(count)
    }
}

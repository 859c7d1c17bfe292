use bevy_ecs::prelude::Component;

/// Opts an entity into pixel-accurate collision tests.
///
/// `key` names a [`PixelBuffer`](crate::resources::pixelmask::PixelBuffer) in
/// the [`PixelMaskStore`](crate::resources::pixelmask::PixelMaskStore). The
/// mask's upper-left pixel sits at the entity's
/// [`MapPosition`](super::mapposition::MapPosition).
#[derive(Component, Clone, Debug, PartialEq, Eq)]
pub struct PixelMask {
    pub key: String,
}

impl PixelMask {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

use bevy_ecs::prelude::Component;

/// Draw order. Higher values are drawn later, on top of lower ones.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ZIndex(pub i32);

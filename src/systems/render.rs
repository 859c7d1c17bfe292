//! Sprite rendering.
//!
//! Sprites never talk to raylib directly: they resolve a source rectangle and
//! hand it to a [`DrawTarget`], the explicit drawing context passed down by
//! the caller. [`RaylibCanvas`] is the target used by the game binary; tests
//! use recording targets.

use bevy_ecs::prelude::*;
use raylib::prelude::*;

use crate::components::animation::SpriteAnimation;
use crate::components::mapposition::MapPosition;
use crate::components::sprite::Sprite;
use crate::components::zindex::ZIndex;
use crate::resources::pixelmask::PixelRect;
use crate::resources::texturestore::TextureStore;

/// Drawing context for images.
pub trait DrawTarget {
    /// Draw the `src` region of texture `tex_key` with its top-left corner at
    /// (`x`, `y`), rotated by `rotation` degrees.
    fn draw_image(&mut self, tex_key: &str, x: f32, y: f32, src: PixelRect, rotation: f32);
}

/// [`DrawTarget`] backed by a raylib draw handle and the loaded textures.
pub struct RaylibCanvas<'a, D: RaylibDraw> {
    pub d: &'a mut D,
    pub textures: &'a TextureStore,
}

impl<'a, D: RaylibDraw> RaylibCanvas<'a, D> {
    pub fn new(d: &'a mut D, textures: &'a TextureStore) -> Self {
        Self { d, textures }
    }
}

impl<D: RaylibDraw> DrawTarget for RaylibCanvas<'_, D> {
    fn draw_image(&mut self, tex_key: &str, x: f32, y: f32, src: PixelRect, rotation: f32) {
        let Some(texture) = self.textures.get(tex_key) else {
            log::warn!("texture '{}' not loaded", tex_key);
            return;
        };
        let source = Rectangle::new(src.x as f32, src.y as f32, src.w as f32, src.h as f32);
        let dest = Rectangle::new(x, y, src.w as f32, src.h as f32);
        self.d
            .draw_texture_pro(texture, source, dest, Vector2::zero(), rotation, Color::WHITE);
    }
}

/// Draw every sprite in the world, lowest [`ZIndex`] first.
///
/// Entities without a `ZIndex` are drawn at depth 0; entities without a
/// [`SpriteAnimation`] show their first sheet cell.
pub fn render_pass(world: &mut World, target: &mut dyn DrawTarget) {
    let mut query = world.query::<(
        &Sprite,
        &MapPosition,
        Option<&ZIndex>,
        Option<&SpriteAnimation>,
    )>();
    let mut to_draw: Vec<_> = query
        .iter(world)
        .map(|(sprite, pos, z, player)| (z.copied().unwrap_or(ZIndex(0)), sprite, pos, player))
        .collect();
    to_draw.sort_by_key(|(z, ..)| *z);

    for (_, sprite, pos, player) in to_draw {
        sprite.draw(target, pos.pos.x, pos.pos.y, player);
    }
}

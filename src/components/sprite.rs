use bevy_ecs::prelude::Component;
use thiserror::Error;

use crate::components::animation::AnimationPlayer;
use crate::resources::pixelmask::PixelRect;
use crate::systems::render::DrawTarget;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpriteError {
    #[error("sprite has no image")]
    MissingImage,
    #[error("frame {frame_width}x{frame_height} does not fit sheet {sheet_width}x{sheet_height}")]
    InvalidDimensions {
        frame_width: i32,
        frame_height: i32,
        sheet_width: i32,
        sheet_height: i32,
    },
}

/// A sprite sheet cut into equally sized frames.
///
/// Frames are numbered row-major from the top-left cell. The texture itself
/// is looked up by `tex_key` in whatever [`DrawTarget`] renders the sprite.
#[derive(Component, Clone, Debug, PartialEq)]
pub struct Sprite {
    pub tex_key: String,
    pub sheet_width: i32,
    pub sheet_height: i32,
    pub frame_width: i32,
    pub frame_height: i32,
}

impl Sprite {
    pub fn new(
        tex_key: impl Into<String>,
        sheet_width: i32,
        sheet_height: i32,
        frame_width: i32,
        frame_height: i32,
    ) -> Result<Self, SpriteError> {
        let tex_key = tex_key.into();
        if tex_key.is_empty() {
            return Err(SpriteError::MissingImage);
        }
        if frame_width <= 0
            || frame_height <= 0
            || frame_width > sheet_width
            || frame_height > sheet_height
        {
            return Err(SpriteError::InvalidDimensions {
                frame_width,
                frame_height,
                sheet_width,
                sheet_height,
            });
        }
        Ok(Self {
            tex_key,
            sheet_width,
            sheet_height,
            frame_width,
            frame_height,
        })
    }

    /// Number of frame columns in the sheet.
    pub fn columns(&self) -> i32 {
        self.sheet_width / self.frame_width
    }

    /// Source rectangle of sheet cell `index`. Cells past the end of the sheet
    /// map below it, saturating at `i32::MAX`.
    pub fn source_rect(&self, index: u32) -> PixelRect {
        let index = i64::from(index);
        let cols = i64::from(self.columns().max(1));
        let x = (index % cols).saturating_mul(i64::from(self.frame_width));
        let y = (index / cols).saturating_mul(i64::from(self.frame_height));
        PixelRect::new(
            i32::try_from(x).unwrap_or(i32::MAX),
            i32::try_from(y).unwrap_or(i32::MAX),
            self.frame_width,
            self.frame_height,
        )
    }

    /// Draw the player's current frame (the first cell when idle).
    pub fn draw<P>(
        &self,
        target: &mut dyn DrawTarget,
        x: f32,
        y: f32,
        player: Option<&AnimationPlayer<P>>,
    ) {
        let index = player.map_or(0, |p| p.sheet_index());
        self.draw_frame(target, x, y, index);
    }

    /// Draw an explicit sheet cell.
    pub fn draw_frame(&self, target: &mut dyn DrawTarget, x: f32, y: f32, index: u32) {
        target.draw_image(&self.tex_key, x, y, self.source_rect(index), 0.0);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::resources::animationstore::Animation;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<(String, f32, f32, PixelRect)>,
    }

    impl DrawTarget for Recorder {
        fn draw_image(&mut self, tex_key: &str, x: f32, y: f32, src: PixelRect, _rotation: f32) {
            self.calls.push((tex_key.to_string(), x, y, src));
        }
    }

    #[test]
    fn rejects_frames_larger_than_sheet() {
        assert!(matches!(
            Sprite::new("wizard", 64, 32, 65, 32),
            Err(SpriteError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            Sprite::new("wizard", 64, 32, 32, 33),
            Err(SpriteError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            Sprite::new("wizard", 64, 32, 0, 32),
            Err(SpriteError::InvalidDimensions { .. })
        ));
        assert_eq!(Sprite::new("", 64, 32, 32, 32), Err(SpriteError::MissingImage));
    }

    #[test]
    fn source_rect_walks_rows() {
        let sprite = Sprite::new("sheet", 96, 64, 32, 32).unwrap();
        assert_eq!(sprite.source_rect(0), PixelRect::new(0, 0, 32, 32));
        assert_eq!(sprite.source_rect(2), PixelRect::new(64, 0, 32, 32));
        assert_eq!(sprite.source_rect(4), PixelRect::new(32, 32, 32, 32));
    }

    #[test]
    fn source_rect_of_huge_index_saturates() {
        let sprite = Sprite::new("sheet", 96, 64, 32, 32).unwrap();
        let rect = sprite.source_rect(u32::MAX);
        // u32::MAX = 3 * 1_431_655_765
        assert_eq!(rect.x, 0);
        assert_eq!(rect.y, i32::MAX);
        assert_eq!((rect.w, rect.h), (32, 32));

        let tall = Sprite::new("sheet", 32, 64, 32, 32).unwrap();
        assert_eq!(tall.source_rect(70_000_000).y, i32::MAX);
        assert_eq!(tall.source_rect(1).y, 32);
    }

    #[test]
    fn draw_uses_current_frame_or_first_cell() {
        let sprite = Sprite::new("sheet", 64, 64, 32, 32).unwrap();
        let mut recorder = Recorder::default();

        sprite.draw::<()>(&mut recorder, 5.0, 6.0, None);

        let mut anim = Animation::new();
        anim.add_frame(3, 100, None::<()>).unwrap();
        anim.add_frame(1, 100, None).unwrap();
        let mut player = AnimationPlayer::playing(Arc::new(anim)).unwrap();
        sprite.draw(&mut recorder, 0.0, 0.0, Some(&player));
        player.animate(100.0);
        sprite.draw(&mut recorder, 0.0, 0.0, Some(&player));

        let rects: Vec<_> = recorder.calls.iter().map(|c| c.3).collect();
        assert_eq!(
            rects,
            vec![
                PixelRect::new(0, 0, 32, 32),
                PixelRect::new(32, 32, 32, 32),
                PixelRect::new(32, 0, 32, 32),
            ]
        );
        assert_eq!(recorder.calls[0].0, "sheet");
        assert_eq!((recorder.calls[0].1, recorder.calls[0].2), (5.0, 6.0));
    }
}

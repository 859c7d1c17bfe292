//! Two-phase collision detection.
//!
//! The broad phase intersects [`BoxCollider`] boxes; only overlapping pairs
//! reach the narrow phase, [`pixels_collide`], which compares the alpha
//! channel of both masks inside the shared region.

use bevy_ecs::prelude::*;
use thiserror::Error;

use crate::components::boxcollider::{BBox, BoxCollider};
use crate::components::mapposition::MapPosition;
use crate::components::pixelmask::PixelMask;
use crate::events::collision::PixelCollisionEvent;
use crate::resources::pixelmask::{PixelLock, PixelLockError, PixelMaskStore, PixelRect, PixelSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CollisionError {
    #[error("regions differ in size: {0:?} vs {1:?}")]
    SizeMismatch(PixelRect, PixelRect),
    #[error("region {0:?} is outside its image")]
    OutOfBounds(PixelRect),
    #[error(transparent)]
    Lock(#[from] PixelLockError),
}

/// Test whether any pixel of `r1` in `a` and the aligned pixel of `r2` in `b`
/// are both non-transparent.
///
/// Both rectangles must have the same size; callers clip them to the overlap
/// of two bounding boxes first. Passing the same source twice is allowed and
/// locks it once. Locks are released before returning, on every path.
pub fn pixels_collide(
    a: &dyn PixelSource,
    r1: PixelRect,
    b: &dyn PixelSource,
    r2: PixelRect,
) -> Result<bool, CollisionError> {
    if !r1.same_size(&r2) {
        return Err(CollisionError::SizeMismatch(r1, r2));
    }
    if r1.is_empty() {
        return Ok(false);
    }

    let lock_a = a.lock()?;
    let lock_b;
    let lock_b_ref = if std::ptr::addr_eq(a, b) {
        &lock_a
    } else {
        lock_b = b.lock()?;
        &lock_b
    };

    if !r1.fits_in(a.width(), a.height()) {
        return Err(CollisionError::OutOfBounds(r1));
    }
    if !r2.fits_in(b.width(), b.height()) {
        return Err(CollisionError::OutOfBounds(r2));
    }

    Ok(scan(&lock_a, r1, lock_b_ref, r2))
}

fn scan(a: &PixelLock<'_>, r1: PixelRect, b: &PixelLock<'_>, r2: PixelRect) -> bool {
    for row in 0..r1.h {
        let y1 = (r1.y + row) as usize;
        let y2 = (r2.y + row) as usize;
        for col in 0..r1.w {
            if a.alpha_at((r1.x + col) as usize, y1) != 0
                && b.alpha_at((r2.x + col) as usize, y2) != 0
            {
                return true;
            }
        }
    }
    false
}

/// Sweep every pair of masked entities and trigger [`PixelCollisionEvent`]
/// for each pair whose opaque pixels overlap.
///
/// Pairs whose masks are missing from the store or cannot be locked are
/// skipped for this frame.
pub fn pixel_collision_detector(
    query: Query<(Entity, &MapPosition, &BoxCollider, &PixelMask)>,
    masks: Res<PixelMaskStore>,
    mut commands: Commands,
) {
    for [(entity_a, pos_a, collider_a, mask_a), (entity_b, pos_b, collider_b, mask_b)] in
        query.iter_combinations()
    {
        let Some(overlap) = collider_a
            .bbox(pos_a.pos)
            .intersect(&collider_b.bbox(pos_b.pos))
        else {
            continue;
        };

        let (Some(pixels_a), Some(pixels_b)) = (masks.get(&mask_a.key), masks.get(&mask_b.key))
        else {
            log::warn!(
                "missing pixel mask for {:?} ('{}') or {:?} ('{}')",
                entity_a,
                mask_a.key,
                entity_b,
                mask_b.key
            );
            continue;
        };

        let box_a = BBox::from_pos_size(pos_a.pos, pixels_a.width() as f32, pixels_a.height() as f32);
        let box_b = BBox::from_pos_size(pos_b.pos, pixels_b.width() as f32, pixels_b.height() as f32);
        let Some(region) = overlap
            .intersect(&box_a)
            .and_then(|r| r.intersect(&box_b))
        else {
            continue;
        };

        match pixels_collide(
            &**pixels_a,
            box_a.sub_rect(&region),
            &**pixels_b,
            box_b.sub_rect(&region),
        ) {
            Ok(true) => commands.trigger(PixelCollisionEvent {
                a: entity_a,
                b: entity_b,
            }),
            Ok(false) => {}
            Err(err) => log::warn!(
                "skipping collision test {:?}/{:?}: {}",
                entity_a,
                entity_b,
                err
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::pixelmask::PixelBuffer;

    const OPAQUE: u32 = 0xFFFF_FFFF;
    const CLEAR: u32 = 0xFFFF_FF00;

    #[test]
    fn opaque_single_pixels_collide() {
        let a = PixelBuffer::filled(1, 1, OPAQUE);
        let b = PixelBuffer::filled(1, 1, 0x0000_0001);
        let r = PixelRect::new(0, 0, 1, 1);
        assert_eq!(pixels_collide(&a, r, &b, r), Ok(true));
    }

    #[test]
    fn transparent_region_never_collides() {
        let a = PixelBuffer::filled(8, 8, CLEAR);
        let b = PixelBuffer::filled(8, 8, OPAQUE);
        let r = PixelRect::new(2, 2, 4, 4);
        assert_eq!(pixels_collide(&a, r, &b, r), Ok(false));
        assert_eq!(pixels_collide(&b, r, &a, r), Ok(false));
    }

    #[test]
    fn result_is_symmetric() {
        // Opaque diagonal in `a`, a single opaque pixel in `b`.
        let a = PixelBuffer::from_fn(6, 6, |x, y| if x == y { OPAQUE } else { CLEAR });
        let mut b = PixelBuffer::filled(6, 6, CLEAR);
        b.set_pixel(1, 3, OPAQUE);

        let r1 = PixelRect::new(2, 0, 4, 4);
        let r2 = PixelRect::new(0, 0, 4, 4);
        // a(3,3) lines up with b(1,3).
        assert_eq!(pixels_collide(&a, r1, &b, r2), Ok(true));
        assert_eq!(pixels_collide(&b, r2, &a, r1), Ok(true));

        let r1 = PixelRect::new(2, 0, 3, 3);
        let r2 = PixelRect::new(0, 0, 3, 3);
        assert_eq!(pixels_collide(&a, r1, &b, r2), Ok(false));
        assert_eq!(pixels_collide(&b, r2, &a, r1), Ok(false));
    }

    #[test]
    fn empty_region_is_no_collision() {
        let a = PixelBuffer::filled(4, 4, OPAQUE);
        let r = PixelRect::new(0, 0, 0, 4);
        assert_eq!(pixels_collide(&a, r, &a, r), Ok(false));
    }

    #[test]
    fn rejects_mismatched_and_out_of_bounds_regions() {
        let a = PixelBuffer::filled(4, 4, OPAQUE);
        let b = PixelBuffer::filled(4, 4, OPAQUE);
        let r1 = PixelRect::new(0, 0, 2, 2);
        let r2 = PixelRect::new(0, 0, 2, 3);
        assert_eq!(
            pixels_collide(&a, r1, &b, r2),
            Err(CollisionError::SizeMismatch(r1, r2))
        );

        let outside = PixelRect::new(3, 3, 2, 2);
        assert_eq!(
            pixels_collide(&a, r1, &b, outside),
            Err(CollisionError::OutOfBounds(outside))
        );
        assert!(!a.is_locked());
        assert!(!b.is_locked());
    }

    #[test]
    fn lock_failures_are_reported_and_released() {
        let a = PixelBuffer::filled(4, 4, OPAQUE);
        let b = PixelBuffer::filled(4, 4, OPAQUE);
        let r = PixelRect::new(0, 0, 4, 4);

        let held = b.lock().unwrap();
        assert_eq!(
            pixels_collide(&a, r, &b, r),
            Err(CollisionError::Lock(PixelLockError::AlreadyLocked))
        );
        drop(held);
        assert!(!a.is_locked());

        let empty = PixelBuffer::default();
        assert_eq!(
            pixels_collide(&a, r, &empty, r),
            Err(CollisionError::Lock(PixelLockError::NoBackingBuffer))
        );
        assert!(!a.is_locked());
    }

    #[test]
    fn same_source_on_both_sides_locks_once() {
        let a = PixelBuffer::from_fn(4, 4, |x, _| if x == 0 { OPAQUE } else { CLEAR });
        assert_eq!(
            pixels_collide(&a, PixelRect::new(0, 0, 1, 4), &a, PixelRect::new(0, 0, 1, 4)),
            Ok(true)
        );
        assert_eq!(
            pixels_collide(&a, PixelRect::new(0, 0, 1, 4), &a, PixelRect::new(1, 0, 1, 4)),
            Ok(false)
        );
        assert!(!a.is_locked());
    }
}

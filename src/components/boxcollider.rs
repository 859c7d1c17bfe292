//! Axis-aligned boxes used by the broad collision phase.
//!
//! [`BBox`] is a plain world-space rectangle (`p1` upper-left, `p2`
//! lower-right). [`BoxCollider`] attaches one to an entity, relative to its
//! [`MapPosition`](super::mapposition::MapPosition).
//!
//! The two-phase collision pattern: intersect two boxes, turn the overlap into
//! a sub-rectangle of each box with [`BBox::sub_rect`], and hand those to
//! [`pixels_collide`](crate::systems::collision::pixels_collide).

use bevy_ecs::prelude::Component;
use raylib::prelude::Vector2;

use crate::resources::pixelmask::PixelRect;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub p1: Vector2,
    pub p2: Vector2,
}

impl BBox {
    pub fn new(p1: Vector2, p2: Vector2) -> Self {
        Self { p1, p2 }
    }

    pub fn from_pos_size(pos: Vector2, width: f32, height: f32) -> Self {
        Self {
            p1: pos,
            p2: Vector2::new(pos.x + width, pos.y + height),
        }
    }

    pub fn width(&self) -> f32 {
        self.p2.x - self.p1.x
    }

    pub fn height(&self) -> f32 {
        self.p2.y - self.p1.y
    }

    /// Point containment, edges included.
    pub fn contains_point(&self, p: Vector2) -> bool {
        p.x >= self.p1.x && p.x <= self.p2.x && p.y >= self.p1.y && p.y <= self.p2.y
    }

    /// Whether `self` lies entirely inside `outer`.
    pub fn inside(&self, outer: &BBox) -> bool {
        outer.contains_point(self.p1) && outer.contains_point(self.p2)
    }

    /// Overlapping region of two boxes, if it has a non-zero area.
    pub fn intersect(&self, other: &BBox) -> Option<BBox> {
        let r = BBox {
            p1: Vector2::new(self.p1.x.max(other.p1.x), self.p1.y.max(other.p1.y)),
            p2: Vector2::new(self.p2.x.min(other.p2.x), self.p2.y.min(other.p2.y)),
        };
        (r.p2.x > r.p1.x && r.p2.y > r.p1.y).then_some(r)
    }

    /// Same box moved so that its upper-left corner is at `pos`.
    pub fn translate_to(&self, pos: Vector2) -> BBox {
        BBox::from_pos_size(pos, self.width(), self.height())
    }

    /// Rectangle of `inner`, relative to this box's upper-left corner.
    pub fn sub_rect(&self, inner: &BBox) -> PixelRect {
        PixelRect::new(
            (inner.p1.x - self.p1.x) as i32,
            (inner.p1.y - self.p1.y) as i32,
            inner.width() as i32,
            inner.height() as i32,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Component)]
pub struct BoxCollider {
    pub size: Vector2,
    pub offset: Vector2,
}

impl BoxCollider {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Vector2::new(width, height),
            offset: Vector2::zero(),
        }
    }

    pub fn with_offset(mut self, offset: Vector2) -> Self {
        self.offset = offset;
        self
    }

    /// World-space box for an entity at `position`. Negative sizes are
    /// normalized.
    pub fn bbox(&self, position: Vector2) -> BBox {
        let a = position + self.offset;
        let b = a + self.size;
        BBox {
            p1: Vector2::new(a.x.min(b.x), a.y.min(b.y)),
            p2: Vector2::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    pub fn overlaps(&self, position: Vector2, other: &Self, other_position: Vector2) -> bool {
        self.bbox(position)
            .intersect(&other.bbox(other_position))
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(x: f32, y: f32, w: f32, h: f32) -> BBox {
        BBox::from_pos_size(Vector2::new(x, y), w, h)
    }

    #[test]
    fn intersect_returns_overlap() {
        let a = bbox(0.0, 0.0, 16.0, 16.0);
        let b = bbox(10.0, 4.0, 16.0, 16.0);
        let r = a.intersect(&b).unwrap();
        assert_eq!(r, bbox(10.0, 4.0, 6.0, 12.0));
        assert_eq!(b.intersect(&a), Some(r));
    }

    #[test]
    fn touching_edges_do_not_intersect() {
        let a = bbox(0.0, 0.0, 16.0, 16.0);
        let b = bbox(16.0, 0.0, 16.0, 16.0);
        assert!(a.intersect(&b).is_none());
        assert!(!BoxCollider::new(16.0, 16.0).overlaps(
            Vector2::zero(),
            &BoxCollider::new(16.0, 16.0),
            Vector2::new(16.0, 0.0)
        ));
    }

    #[test]
    fn sub_rects_have_matching_sizes() {
        let a = bbox(0.0, 0.0, 16.0, 16.0);
        let b = bbox(10.0, 4.0, 16.0, 16.0);
        let overlap = a.intersect(&b).unwrap();
        assert_eq!(a.sub_rect(&overlap), PixelRect::new(10, 4, 6, 12));
        assert_eq!(b.sub_rect(&overlap), PixelRect::new(0, 0, 6, 12));
    }

    #[test]
    fn containment_helpers() {
        let screen = bbox(0.0, 0.0, 192.0, 108.0);
        assert!(bbox(10.0, 10.0, 16.0, 16.0).inside(&screen));
        assert!(!bbox(180.0, 10.0, 16.0, 16.0).inside(&screen));
        assert!(screen.contains_point(Vector2::new(192.0, 108.0)));
        let moved = bbox(0.0, 0.0, 16.0, 8.0).translate_to(Vector2::new(5.0, 6.0));
        assert_eq!(moved, bbox(5.0, 6.0, 16.0, 8.0));
    }

    #[test]
    fn collider_offset_and_negative_size() {
        let c = BoxCollider::new(-4.0, 4.0).with_offset(Vector2::new(1.0, 1.0));
        let b = c.bbox(Vector2::new(10.0, 10.0));
        assert_eq!(b, bbox(7.0, 11.0, 4.0, 4.0));
    }
}

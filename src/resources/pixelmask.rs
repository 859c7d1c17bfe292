//! CPU-side pixel access for pixel-accurate collision tests.
//!
//! Textures live on the GPU, so collision masks are kept as [`PixelBuffer`]s:
//! packed RGBA8888 pixels (`0xRRGGBBAA`, alpha in the low byte) with a row
//! pitch in bytes. Readers go through [`PixelSource::lock`], which hands out a
//! [`PixelLock`] guard; the buffer is unlocked when the guard is dropped, on
//! every return path.
//!
//! The [`PixelMaskStore`] resource maps texture keys to their masks so the
//! collision system can find the pixels behind a sprite.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bevy_ecs::prelude::Resource;
use raylib::prelude::Image;
use rustc_hash::FxHashMap;
use thiserror::Error;

const BYTES_PER_PIXEL: usize = 4;

/// Integer rectangle in pixel space (source rectangles, collision regions).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl PixelRect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    pub fn same_size(&self, other: &PixelRect) -> bool {
        self.w == other.w && self.h == other.h
    }

    /// Whether the rectangle lies inside a `width` x `height` area.
    pub fn fits_in(&self, width: u32, height: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && i64::from(self.x) + i64::from(self.w) <= i64::from(width)
            && i64::from(self.y) + i64::from(self.h) <= i64::from(height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PixelLockError {
    #[error("image has no pixel buffer")]
    NoBackingBuffer,
    #[error("image is already locked")]
    AlreadyLocked,
}

/// Anything that can grant temporary read access to its pixels.
pub trait PixelSource {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn lock(&self) -> Result<PixelLock<'_>, PixelLockError>;
}

/// Read access to a locked pixel buffer. Unlocks on drop.
pub struct PixelLock<'a> {
    pixels: &'a [u32],
    pitch: usize,
    locked: &'a AtomicBool,
}

impl<'a> PixelLock<'a> {
    /// Acquire `locked` and wrap `pixels`. `pitch` is the row length in bytes.
    pub fn acquire(
        pixels: &'a [u32],
        pitch: usize,
        locked: &'a AtomicBool,
    ) -> Result<Self, PixelLockError> {
        if pixels.is_empty() {
            return Err(PixelLockError::NoBackingBuffer);
        }
        locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map_err(|_| PixelLockError::AlreadyLocked)?;
        Ok(Self {
            pixels,
            pitch,
            locked,
        })
    }

    pub fn pixels(&self) -> &[u32] {
        self.pixels
    }

    /// Row length in bytes.
    pub fn pitch(&self) -> usize {
        self.pitch
    }

    #[inline]
    pub fn pixel_at(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * (self.pitch / BYTES_PER_PIXEL) + x]
    }

    #[inline]
    pub fn alpha_at(&self, x: usize, y: usize) -> u8 {
        (self.pixel_at(x, y) & 0xFF) as u8
    }
}

impl Drop for PixelLock<'_> {
    fn drop(&mut self) {
        self.locked.store(false, Ordering::Release);
    }
}

/// Owned RGBA8888 pixel buffer.
#[derive(Debug, Default)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pitch: usize,
    pixels: Vec<u32>,
    locked: AtomicBool,
}

#[inline]
fn pack_rgba(r: u8, g: u8, b: u8, a: u8) -> u32 {
    u32::from_be_bytes([r, g, b, a])
}

impl PixelBuffer {
    /// Buffer where every pixel is `rgba`.
    pub fn filled(width: u32, height: u32, rgba: u32) -> Self {
        Self::from_fn(width, height, |_, _| rgba)
    }

    /// Buffer built pixel by pixel from packed RGBA values.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> u32) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            pitch: width as usize * BYTES_PER_PIXEL,
            pixels,
            locked: AtomicBool::new(false),
        }
    }

    /// Buffer from tightly packed `R, G, B, A` bytes. Returns `None` when the
    /// byte count does not match the dimensions.
    pub fn from_rgba8(width: u32, height: u32, bytes: &[u8]) -> Option<Self> {
        if bytes.len() != width as usize * height as usize * BYTES_PER_PIXEL {
            return None;
        }
        let pixels = bytes
            .chunks_exact(BYTES_PER_PIXEL)
            .map(|c| pack_rgba(c[0], c[1], c[2], c[3]))
            .collect();
        Some(Self {
            width,
            height,
            pitch: width as usize * BYTES_PER_PIXEL,
            pixels,
            locked: AtomicBool::new(false),
        })
    }

    /// Copy the pixels of a CPU-side raylib image.
    pub fn from_image(image: &Image) -> Self {
        let width = image.width().max(0) as u32;
        let height = image.height().max(0) as u32;
        let colors = image.get_image_data();
        let pixels = colors
            .iter()
            .map(|c| pack_rgba(c.r, c.g, c.b, c.a))
            .collect();
        Self {
            width,
            height,
            pitch: width as usize * BYTES_PER_PIXEL,
            pixels,
            locked: AtomicBool::new(false),
        }
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: u32) {
        if x < self.width && y < self.height {
            let stride = self.pitch / BYTES_PER_PIXEL;
            self.pixels[y as usize * stride + x as usize] = rgba;
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }
}

impl PixelSource for PixelBuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn lock(&self) -> Result<PixelLock<'_>, PixelLockError> {
        PixelLock::acquire(&self.pixels, self.pitch, &self.locked)
    }
}

/// Collision masks keyed by texture key.
#[derive(Resource, Default)]
pub struct PixelMaskStore {
    pub masks: FxHashMap<String, Arc<PixelBuffer>>,
}

impl PixelMaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, mask: PixelBuffer) -> Arc<PixelBuffer> {
        let mask = Arc::new(mask);
        self.masks.insert(key.into(), Arc::clone(&mask));
        mask
    }

    pub fn get(&self, key: &str) -> Option<&Arc<PixelBuffer>> {
        self.masks.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba8_bytes_pack_alpha_into_low_byte() {
        let buffer = PixelBuffer::from_rgba8(2, 1, &[1, 2, 3, 0, 9, 9, 9, 255]).unwrap();
        let lock = buffer.lock().unwrap();
        assert_eq!(lock.pixel_at(0, 0), 0x0102_0300);
        assert_eq!(lock.alpha_at(0, 0), 0);
        assert_eq!(lock.alpha_at(1, 0), 255);
        assert_eq!(lock.pitch(), 8);
    }

    #[test]
    fn rgba8_rejects_wrong_length() {
        assert!(PixelBuffer::from_rgba8(2, 2, &[0; 8]).is_none());
    }

    #[test]
    fn lock_is_exclusive_and_released_on_drop() {
        let buffer = PixelBuffer::filled(4, 4, 0xFFFF_FFFF);
        {
            let _lock = buffer.lock().unwrap();
            assert!(buffer.is_locked());
            assert_eq!(buffer.lock().err(), Some(PixelLockError::AlreadyLocked));
        }
        assert!(!buffer.is_locked());
        assert!(buffer.lock().is_ok());
    }

    #[test]
    fn empty_buffer_cannot_be_locked() {
        let buffer = PixelBuffer::default();
        assert_eq!(buffer.lock().err(), Some(PixelLockError::NoBackingBuffer));
        assert!(!buffer.is_locked());
    }

    #[test]
    fn set_pixel_ignores_out_of_range() {
        let mut buffer = PixelBuffer::filled(2, 2, 0);
        buffer.set_pixel(1, 1, 0x0000_00FF);
        buffer.set_pixel(5, 5, 0x0000_00FF);
        let lock = buffer.lock().unwrap();
        assert_eq!(lock.alpha_at(1, 1), 0xFF);
        assert_eq!(lock.pixels().iter().filter(|&&p| p != 0).count(), 1);
    }

    #[test]
    fn rect_bounds() {
        assert!(PixelRect::new(0, 0, 16, 16).fits_in(16, 16));
        assert!(!PixelRect::new(1, 0, 16, 16).fits_in(16, 16));
        assert!(!PixelRect::new(-1, 0, 2, 2).fits_in(16, 16));
        assert!(PixelRect::new(3, 3, 0, 5).is_empty());
    }
}

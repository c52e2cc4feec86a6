//! In-memory source image
//!
//! The demo generates its picture procedurally, so there is no asset
//! loading. Pixels are stored row-major, top row first.

use rayon::prelude::*;

use crate::color::RGBA;

/// A width x height grid of RGBA pixels
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<RGBA>,
}

impl Image {
    /// Create an image filled with a single colour
    pub fn solid(width: u32, height: u32, color: RGBA) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; (width * height) as usize],
        }
    }

    /// Build an image from a per-pixel function of (x, y)
    pub fn from_fn<F>(width: u32, height: u32, f: F) -> Self
    where
        F: Fn(u32, u32) -> RGBA + Sync,
    {
        let mut pixels = vec![RGBA::black(); (width * height) as usize];
        if width > 0 {
            pixels
                .par_chunks_mut(width as usize)
                .enumerate()
                .for_each(|(y, row)| {
                    for (x, pixel) in row.iter_mut().enumerate() {
                        *pixel = f(x as u32, y as u32);
                    }
                });
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Procedural stand-in for a photograph: a colour gradient with a
    /// checkerboard and concentric rings, giving both hard edges and smooth
    /// areas to blur.
    pub fn test_pattern(width: u32, height: u32) -> Self {
        let w = width.max(1) as f32;
        let h = height.max(1) as f32;
        let cell = (width.min(height) / 8).max(1);

        Self::from_fn(width, height, |x, y| {
            let u = x as f32 / w;
            let v = y as f32 / h;
            let base = RGBA::new(0.2 + 0.8 * u, 0.3 + 0.5 * v, 0.9 - 0.7 * u, 1.0);

            let dx = u - 0.5;
            let dy = v - 0.5;
            let dist = (dx * dx + dy * dy).sqrt();
            let ring = ((dist * 40.0).floor() as i32) % 2 == 0;

            let checker = ((x / cell) + (y / cell)) % 2 == 0;

            match (checker, ring && dist < 0.35) {
                (_, true) => base.lerp(RGBA::new(1.0, 1.0, 1.0, 1.0), 0.6),
                (true, false) => base,
                (false, false) => base * 0.35 + RGBA::new(0.0, 0.0, 0.0, 0.65),
            }
        })
    }

    /// Decode tightly packed RGBA8 data
    #[cfg(test)]
    pub fn from_rgba8(width: u32, height: u32, data: &[u8]) -> Self {
        assert_eq!(
            data.len(),
            (width * height * 4) as usize,
            "RGBA8 data does not match {}x{}",
            width,
            height
        );
        let pixels = data
            .chunks_exact(4)
            .map(|p| RGBA::from_rgba8([p[0], p[1], p[2], p[3]]))
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Encode as tightly packed RGBA8 for texture upload
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| p.to_rgba8()).collect()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &[RGBA] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [RGBA] {
        &mut self.pixels
    }

    pub fn get(&self, x: u32, y: u32) -> RGBA {
        self.pixels[(y * self.width + x) as usize]
    }

    #[cfg(test)]
    pub fn set(&mut self, x: u32, y: u32, color: RGBA) {
        self.pixels[(y * self.width + x) as usize] = color;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_and_access() {
        let mut image = Image::solid(3, 2, RGBA::black());
        assert_eq!(image.size(), (3, 2));
        assert_eq!(image.pixels().len(), 6);

        let red = RGBA::new(1.0, 0.0, 0.0, 1.0);
        image.set(2, 1, red);
        assert_eq!(image.get(2, 1), red);
        assert_eq!(image.pixels()[5], red);
        assert_eq!(image.get(0, 0), RGBA::black());
    }

    #[test]
    fn test_from_fn_is_row_major() {
        let image = Image::from_fn(4, 3, |x, y| RGBA::new(x as f32, y as f32, 0.0, 1.0));
        assert_eq!(image.pixels()[4 * 2 + 1], RGBA::new(1.0, 2.0, 0.0, 1.0));
    }

    #[test]
    fn test_rgba8_round_trip_layout() {
        let image = Image::from_fn(2, 2, |x, y| {
            RGBA::from_rgba8([(x * 100) as u8, (y * 100) as u8, 7, 255])
        });
        let bytes = image.to_rgba8();
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[12..16], &[100, 100, 7, 255]);
        assert_eq!(Image::from_rgba8(2, 2, &bytes), image);
    }

    #[test]
    fn test_pattern_has_detail() {
        let image = Image::test_pattern(64, 64);
        let first = image.get(0, 0);
        assert!(image.pixels().iter().any(|p| p.max_difference(first) > 0.2));
        assert!(image.pixels().iter().all(|p| (p.a - 1.0).abs() < 1e-6));
    }
}

//! Floating point pixel colour used by the CPU-side image code

use std::ops::{Add, AddAssign, Mul};

/// RGBA color with floating point components in 0.0-1.0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RGBA {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl RGBA {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        RGBA { r, g, b, a }
    }

    pub const fn black() -> Self {
        RGBA { r: 0.0, g: 0.0, b: 0.0, a: 1.0 }
    }

    /// All channels zero, including alpha (accumulator start value)
    pub const fn zero() -> Self {
        RGBA { r: 0.0, g: 0.0, b: 0.0, a: 0.0 }
    }

    pub fn from_rgba8(bytes: [u8; 4]) -> Self {
        RGBA {
            r: bytes[0] as f32 / 255.0,
            g: bytes[1] as f32 / 255.0,
            b: bytes[2] as f32 / 255.0,
            a: bytes[3] as f32 / 255.0,
        }
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        [to_byte(self.r), to_byte(self.g), to_byte(self.b), to_byte(self.a)]
    }

    /// Linear interpolation, `t` = 0 gives `self`
    pub fn lerp(self, other: RGBA, t: f32) -> RGBA {
        self * (1.0 - t) + other * t
    }

    /// Largest per-channel absolute difference
    #[cfg(test)]
    pub fn max_difference(self, other: RGBA) -> f32 {
        (self.r - other.r)
            .abs()
            .max((self.g - other.g).abs())
            .max((self.b - other.b).abs())
            .max((self.a - other.a).abs())
    }
}

impl Add for RGBA {
    type Output = RGBA;

    fn add(self, rhs: RGBA) -> RGBA {
        RGBA::new(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b, self.a + rhs.a)
    }
}

impl AddAssign for RGBA {
    fn add_assign(&mut self, rhs: RGBA) {
        *self = *self + rhs;
    }
}

impl Mul<f32> for RGBA {
    type Output = RGBA;

    fn mul(self, s: f32) -> RGBA {
        RGBA::new(self.r * s, self.g * s, self.b * s, self.a * s)
    }
}

/// Convert a float value (0.0-1.0) to a byte (0-255), rounding to nearest
#[inline]
pub fn to_byte(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

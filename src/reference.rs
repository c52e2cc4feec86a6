//! CPU reference for the two-pass blur
//!
//! Follows the same sampling rules as `shaders/gaussian_blur.wgsl`:
//! - each destination texel samples at its centre, `((x + 0.5) / w, (y + 0.5) / h)`
//! - input textures are read with bilinear filtering and clamp-to-edge addressing
//! - the weighted taps are summed in kernel order
//! - values are weighted as stored (sRGB-encoded), with no linear conversion
//!
//! so its output is what the GPU path should produce, without needing a GPU.

use rayon::prelude::*;

use crate::color::RGBA;
use crate::image::Image;
use crate::kernel::{Axis, Kernel, KernelOffsets};

/// Sample `image` at texture coordinate (u, v) with bilinear filtering and
/// clamp-to-edge addressing
pub fn sample_bilinear(image: &Image, u: f32, v: f32) -> RGBA {
    let (w, h) = image.size();
    let px = u * w as f32 - 0.5;
    let py = v * h as f32 - 0.5;

    let x0 = px.floor();
    let y0 = py.floor();
    let fx = px - x0;
    let fy = py - y0;

    let clamp_x = |x: f32| (x.max(0.0) as u32).min(w - 1);
    let clamp_y = |y: f32| (y.max(0.0) as u32).min(h - 1);
    let (xa, xb) = (clamp_x(x0), clamp_x(x0 + 1.0));
    let (ya, yb) = (clamp_y(y0), clamp_y(y0 + 1.0));

    let top = image.get(xa, ya).lerp(image.get(xb, ya), fx);
    let bottom = image.get(xa, yb).lerp(image.get(xb, yb), fx);
    top.lerp(bottom, fy)
}

/// One 1-D pass: every texel of a `target_size` output accumulates
/// `weight[i] * input(uv + offset[i])`.
pub fn blur_pass(
    input: &Image,
    target_size: (u32, u32),
    weights: &[f32],
    offsets: &[[f32; 2]],
) -> Image {
    assert_eq!(weights.len(), offsets.len(), "one offset per weight");

    let (tw, th) = target_size;
    let mut output = Image::solid(tw, th, RGBA::zero());
    if tw == 0 || th == 0 {
        return output;
    }

    output
        .pixels_mut()
        .par_chunks_mut(tw as usize)
        .enumerate()
        .for_each(|(y, row)| {
            let v = (y as f32 + 0.5) / th as f32;
            for (x, texel) in row.iter_mut().enumerate() {
                let u = (x as f32 + 0.5) / tw as f32;
                let mut sum = RGBA::zero();
                for (weight, offset) in weights.iter().zip(offsets) {
                    sum += sample_bilinear(input, u + offset[0], v + offset[1]) * *weight;
                }
                *texel = sum;
            }
        });

    output
}

/// Horizontal pass (source -> A) followed by vertical pass (A -> B).
///
/// `offsets` must have been computed for `target_size`.
pub fn apply(
    source: &Image,
    target_size: (u32, u32),
    kernel: &Kernel,
    offsets: &KernelOffsets,
) -> Image {
    debug_assert_eq!(
        offsets.target_size, target_size,
        "kernel offsets computed for a different render target size"
    );

    let horizontal = blur_pass(
        source,
        target_size,
        kernel.weights(),
        offsets.for_axis(Axis::Horizontal),
    );
    blur_pass(
        &horizontal,
        target_size,
        kernel.weights(),
        offsets.for_axis(Axis::Vertical),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::compute_kernel;

    #[test]
    fn test_sample_at_texel_centres_is_exact() {
        let image = Image::from_fn(4, 4, |x, y| {
            RGBA::new(x as f32 / 4.0, y as f32 / 4.0, 0.5, 1.0)
        });
        for y in 0..4 {
            for x in 0..4 {
                let u = (x as f32 + 0.5) / 4.0;
                let v = (y as f32 + 0.5) / 4.0;
                assert_eq!(sample_bilinear(&image, u, v), image.get(x, y));
            }
        }
    }

    #[test]
    fn test_sample_clamps_to_edge() {
        let image = Image::from_fn(2, 1, |x, _| {
            if x == 0 { RGBA::black() } else { RGBA::new(1.0, 1.0, 1.0, 1.0) }
        });
        assert_eq!(sample_bilinear(&image, -3.0, 0.5), RGBA::black());
        assert_eq!(sample_bilinear(&image, 5.0, 0.5), RGBA::new(1.0, 1.0, 1.0, 1.0));

        // Halfway between the two texel centres
        let mid = sample_bilinear(&image, 0.5, 0.5);
        assert!((mid.r - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_horizontal_pass_keeps_columns_uniform() {
        // Vertical stripes: a horizontal blur mixes columns but never rows
        let image = Image::from_fn(8, 8, |x, _| {
            if x % 2 == 0 { RGBA::black() } else { RGBA::new(1.0, 1.0, 1.0, 1.0) }
        });
        let kernel = compute_kernel(3, 1.5);
        let offsets = kernel.compute_offsets(8, 8);
        let out = blur_pass(&image, (8, 8), kernel.weights(), &offsets.horizontal);

        for x in 0..8 {
            let top = out.get(x, 0);
            for y in 1..8 {
                assert_eq!(out.get(x, y), top);
            }
            assert!(top.r > 0.05 && top.r < 0.95, "column {} not blurred", x);
        }
    }

    #[test]
    fn test_vertical_pass_keeps_rows_uniform() {
        let image = Image::from_fn(8, 8, |_, y| {
            if y < 4 { RGBA::black() } else { RGBA::new(1.0, 1.0, 1.0, 1.0) }
        });
        let kernel = compute_kernel(3, 1.5);
        let offsets = kernel.compute_offsets(8, 8);
        let out = blur_pass(&image, (8, 8), kernel.weights(), &offsets.vertical);

        for y in 0..8 {
            let left = out.get(0, y);
            for x in 1..8 {
                assert_eq!(out.get(x, y), left);
            }
        }
        // The edge is softened on both sides
        assert!(out.get(0, 3).r > 0.0);
        assert!(out.get(0, 4).r < 1.0);
    }

    #[test]
    fn test_downscaled_output_size() {
        let image = Image::test_pattern(16, 12);
        let kernel = compute_kernel(2, 2.0);
        let offsets = kernel.compute_offsets(8, 6);
        let out = apply(&image, (8, 6), &kernel, &offsets);
        assert_eq!(out.size(), (8, 6));
    }

    #[test]
    fn test_taps_weight_encoded_values() {
        // Black and white texels; halfway between them is byte 128, not the
        // 188 a linear-space blend re-encoded to sRGB would give
        let image = Image::from_rgba8(2, 1, &[0, 0, 0, 255, 255, 255, 255, 255]);
        let mid = sample_bilinear(&image, 0.5, 0.5);
        assert_eq!(mid.to_rgba8(), [128, 128, 128, 255]);

        let out = blur_pass(&image, (1, 1), &[1.0], &[[0.0, 0.0]]);
        assert_eq!(out.get(0, 0).to_rgba8(), [128, 128, 128, 255]);
    }

    #[test]
    #[should_panic(expected = "kernel offsets computed for a different render target size")]
    fn test_mismatched_offsets_panic() {
        let image = Image::test_pattern(16, 16);
        let kernel = compute_kernel(3, 2.0);
        let offsets = kernel.compute_offsets(16, 16);
        apply(&image, (8, 8), &kernel, &offsets);
    }
}

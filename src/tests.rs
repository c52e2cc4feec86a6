//! Tests for the blur as a whole: kernel construction feeding the two-pass
//! reference blur

use crate::color::RGBA;
use crate::image::Image;
use crate::kernel::{BlurConfig, BlurKernel, compute_kernel};
use crate::reference;

/// Run both passes with offsets computed for `target_size`
fn blur(source: &Image, radius: u32, amount: f32, target_size: (u32, u32)) -> Image {
    let kernel = compute_kernel(radius, amount);
    let offsets = kernel.compute_offsets(target_size.0, target_size.1);
    reference::apply(source, target_size, &kernel, &offsets)
}

fn checkerboard(size: u32) -> Image {
    Image::from_fn(size, size, |x, y| {
        if (x + y) % 2 == 0 {
            RGBA::new(1.0, 1.0, 1.0, 1.0)
        } else {
            RGBA::new(0.0, 0.0, 0.0, 1.0)
        }
    })
}

#[test]
fn test_solid_image_stays_solid() {
    let color = RGBA::from_rgba8([200, 100, 50, 255]);
    let source = Image::solid(4, 4, color);

    for (radius, amount) in [(1, 1.0), (3, 1.5), (7, 2.0), (12, 3.0)] {
        for target_size in [(2, 2), (4, 4)] {
            let blurred = blur(&source, radius, amount, target_size);
            assert_eq!(blurred.size(), target_size);
            for pixel in blurred.pixels() {
                assert_eq!(
                    pixel.to_rgba8(),
                    [200, 100, 50, 255],
                    "radius {} amount {} target {:?}",
                    radius,
                    amount,
                    target_size
                );
            }
        }
    }
}

#[test]
fn test_zero_radius_is_identity() {
    for size in [4, 8] {
        let source = Image::test_pattern(size, size);
        let blurred = blur(&source, 0, 2.0, (size, size));
        assert_eq!(blurred, source);
    }
}

#[test]
fn test_blur_stays_within_input_range() {
    let source = Image::test_pattern(64, 64);
    let blurred = blur(&source, 7, 2.0, (32, 32));

    let channel_range = |image: &Image, channel: fn(&RGBA) -> f32| {
        image
            .pixels()
            .iter()
            .map(channel)
            .fold((f32::MAX, f32::MIN), |(lo, hi), c| (lo.min(c), hi.max(c)))
    };

    let channels: [fn(&RGBA) -> f32; 3] = [|p: &RGBA| p.r, |p: &RGBA| p.g, |p: &RGBA| p.b];
    for channel in channels {
        let (lo, hi) = channel_range(&source, channel);
        let (blo, bhi) = channel_range(&blurred, channel);
        assert!(blo >= lo - 1e-5 && bhi <= hi + 1e-5);
    }
}

#[test]
fn test_blur_flattens_checkerboard() {
    let size = 32;
    let source = checkerboard(size);
    let blurred = blur(&source, 7, 2.0, (size, size));

    let mut max_interior = 0.0f32;
    let mut max_any = 0.0f32;
    for y in 0..size {
        for x in 0..size {
            let deviation = (blurred.get(x, y).r - 0.5).abs();
            max_any = max_any.max(deviation);
            if (7..size - 7).contains(&x) && (7..size - 7).contains(&y) {
                max_interior = max_interior.max(deviation);
            }
        }
    }

    // Away from the edges the pattern is almost gone; clamping at the edges
    // repeats the border texel so some contrast survives there
    assert!(max_interior < 0.01, "interior deviation {}", max_interior);
    assert!(max_any < 0.2, "edge deviation {}", max_any);
}

#[test]
fn test_wider_kernel_spreads_impulse() {
    let size = 32;
    let source = Image::from_fn(size, size, |x, y| {
        if x == size / 2 && y == size / 2 {
            RGBA::new(1.0, 1.0, 1.0, 1.0)
        } else {
            RGBA::black()
        }
    });

    let peak = |amount: f32| {
        let blurred = blur(&source, 7, amount, (size, size));
        blurred.get(size / 2, size / 2).r
    };

    // Smaller amount means larger sigma, so less energy stays in the centre
    let wide = peak(1.0);
    let narrow = peak(3.0);
    assert!(wide < narrow, "wide {} narrow {}", wide, narrow);

    // The peak of a separable blur is the square of the centre weight
    let centre = compute_kernel(7, 3.0).weights()[7];
    assert!((narrow - centre * centre).abs() < 1e-5);
}

#[test]
fn test_blur_kernel_tracks_target_size() {
    let mut blur_kernel = BlurKernel::new(BlurConfig::default()).unwrap();
    let source = Image::test_pattern(64, 48);
    let target_size = (32, 24);

    let offsets = blur_kernel.offsets_for(target_size.0, target_size.1).clone();
    let blurred = reference::apply(&source, target_size, blur_kernel.kernel(), &offsets);

    let expected = blur(&source, 7, 2.0, target_size);
    assert_eq!(blurred, expected);
}

//! Gaussian kernel construction
//!
//! Builds the normalized 1-D weight table used by both blur passes and the
//! per-axis texture-coordinate offsets for a given render target size.
//! Nothing in here touches the GPU.

use std::ops::RangeInclusive;

use thiserror::Error;

/// Default blur radius in texels
pub const BLUR_RADIUS: u32 = 7;

/// Default blur amount (sigma = radius / amount)
pub const BLUR_AMOUNT: f32 = 2.0;

/// Largest radius accepted by [`BlurConfig`]
pub const MAX_BLUR_RADIUS: u32 = 32;

/// Invalid blur parameters
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KernelError {
    #[error("blur radius {radius} exceeds the maximum of {max}")]
    RadiusTooLarge { radius: u32, max: u32 },
    #[error("blur amount must be a positive finite number giving a usable sigma, got {0}")]
    InvalidAmount(f32),
}

/// Blur parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlurConfig {
    /// Kernel half-width in texels
    pub radius: u32,
    /// Spread control; larger values give a tighter kernel
    pub amount: f32,
}

impl Default for BlurConfig {
    fn default() -> Self {
        Self {
            radius: BLUR_RADIUS,
            amount: BLUR_AMOUNT,
        }
    }
}

impl BlurConfig {
    /// Create a validated config
    pub fn new(radius: u32, amount: f32) -> Result<Self, KernelError> {
        let config = Self { radius, amount };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), KernelError> {
        if self.radius > MAX_BLUR_RADIUS {
            return Err(KernelError::RadiusTooLarge {
                radius: self.radius,
                max: MAX_BLUR_RADIUS,
            });
        }
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(KernelError::InvalidAmount(self.amount));
        }
        // 2 sigma^2 has to be a normal f32 or the weights divide by zero or
        // infinity
        let sigma = self.sigma();
        if self.radius > 0 && !(2.0 * sigma * sigma).is_normal() {
            return Err(KernelError::InvalidAmount(self.amount));
        }
        Ok(())
    }

    /// Effective standard deviation in texels
    pub fn sigma(&self) -> f32 {
        self.radius as f32 / self.amount
    }
}

/// Normalized discrete Gaussian weights, centre at index `radius`
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    radius: u32,
    sigma: f32,
    weights: Vec<f32>,
}

impl Kernel {
    pub fn radius(&self) -> u32 {
        self.radius
    }

    pub fn sigma(&self) -> f32 {
        self.sigma
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Signed texel distance for each entry, -R..=R
    pub fn distances(&self) -> RangeInclusive<i32> {
        let r = self.radius as i32;
        -r..=r
    }

    /// Texture-coordinate offsets for a render target of the given size.
    ///
    /// Panics if either dimension is zero.
    pub fn compute_offsets(&self, width: u32, height: u32) -> KernelOffsets {
        assert!(width > 0 && height > 0, "render target must be non-empty");

        let horizontal = self
            .distances()
            .map(|i| [i as f32 / width as f32, 0.0])
            .collect();
        let vertical = self
            .distances()
            .map(|i| [0.0, i as f32 / height as f32])
            .collect();

        KernelOffsets {
            target_size: (width, height),
            horizontal,
            vertical,
        }
    }
}

/// Compute the kernel for a radius and amount (sigma = radius / amount).
///
/// A zero radius yields the identity kernel.
pub fn compute_kernel(radius: u32, amount: f32) -> Kernel {
    if radius == 0 {
        return gaussian_weights(0, 0.0);
    }
    gaussian_weights(radius, radius as f32 / amount)
}

/// Normalized weights of exp(-i^2 / 2 sigma^2) for i in -radius..=radius
pub fn gaussian_weights(radius: u32, sigma: f32) -> Kernel {
    if radius == 0 {
        return Kernel {
            radius: 0,
            sigma,
            weights: vec![1.0],
        };
    }

    let two_sigma_sq = 2.0 * sigma * sigma;
    let r = radius as i32;

    // A spread too small to represent keeps everything on the centre tap
    if two_sigma_sq.is_nan() || two_sigma_sq < f32::MIN_POSITIVE {
        return Kernel {
            radius,
            sigma,
            weights: (-r..=r).map(|i| if i == 0 { 1.0 } else { 0.0 }).collect(),
        };
    }

    let mut weights: Vec<f32> = (-r..=r)
        .map(|i| (-((i * i) as f32) / two_sigma_sq).exp())
        .collect();

    let total: f32 = weights.iter().sum();
    for w in &mut weights {
        *w /= total;
    }

    Kernel {
        radius,
        sigma,
        weights,
    }
}

/// Per-axis sampling offsets in texture coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct KernelOffsets {
    /// Render target size the offsets were divided by
    pub target_size: (u32, u32),
    /// `(i / width, 0)` for each tap
    pub horizontal: Vec<[f32; 2]>,
    /// `(0, i / height)` for each tap
    pub vertical: Vec<[f32; 2]>,
}

/// Blur direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl KernelOffsets {
    pub fn for_axis(&self, axis: Axis) -> &[[f32; 2]] {
        match axis {
            Axis::Horizontal => &self.horizontal,
            Axis::Vertical => &self.vertical,
        }
    }
}

/// Current blur parameters together with the kernel and offsets derived
/// from them. Recomputes only when its inputs change.
#[derive(Debug, Clone)]
pub struct BlurKernel {
    config: BlurConfig,
    kernel: Kernel,
    offsets: Option<KernelOffsets>,
}

impl BlurKernel {
    pub fn new(config: BlurConfig) -> Result<Self, KernelError> {
        config.validate()?;
        let kernel = compute_kernel(config.radius, config.amount);
        log::debug!(
            "Computed kernel: radius {}, sigma {:.2}",
            kernel.radius(),
            kernel.sigma()
        );
        Ok(Self {
            config,
            kernel,
            offsets: None,
        })
    }

    pub fn config(&self) -> BlurConfig {
        self.config
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    pub fn offsets(&self) -> Option<&KernelOffsets> {
        self.offsets.as_ref()
    }

    /// Replace the config. Returns `Ok(true)` if the kernel was recomputed.
    ///
    /// Offsets are recomputed for the current target size, if any.
    pub fn set_config(&mut self, config: BlurConfig) -> Result<bool, KernelError> {
        config.validate()?;
        if config == self.config {
            return Ok(false);
        }

        self.config = config;
        self.kernel = compute_kernel(config.radius, config.amount);
        if let Some((w, h)) = self.offsets.as_ref().map(|o| o.target_size) {
            self.offsets = Some(self.kernel.compute_offsets(w, h));
        }
        log::debug!(
            "Recomputed kernel: radius {}, sigma {:.2}",
            self.kernel.radius(),
            self.kernel.sigma()
        );
        Ok(true)
    }

    /// Make the offsets match a render target size. Returns `true` if they
    /// were recomputed.
    pub fn update_target_size(&mut self, width: u32, height: u32) -> bool {
        if self
            .offsets
            .as_ref()
            .is_some_and(|o| o.target_size == (width, height))
        {
            return false;
        }
        self.offsets = Some(self.kernel.compute_offsets(width, height));
        log::debug!("Recomputed kernel offsets for {}x{}", width, height);
        true
    }

    /// Offsets for a render target size, recomputing them if needed
    pub fn offsets_for(&mut self, width: u32, height: u32) -> &KernelOffsets {
        self.update_target_size(width, height);
        let kernel = &self.kernel;
        self.offsets
            .get_or_insert_with(|| kernel.compute_offsets(width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_weights_sum_to_one() {
        for radius in 0..=MAX_BLUR_RADIUS {
            for amount in [0.5, 1.0, 2.0, 3.0, 7.5] {
                let kernel = compute_kernel(radius, amount);
                let sum: f32 = kernel.weights().iter().sum();
                assert!(
                    (sum - 1.0).abs() < EPSILON,
                    "radius {} amount {} sums to {}",
                    radius,
                    amount,
                    sum
                );
                assert_eq!(kernel.weights().len(), 2 * radius as usize + 1);
            }
        }
    }

    #[test]
    fn test_weights_symmetric() {
        let kernel = compute_kernel(BLUR_RADIUS, BLUR_AMOUNT);
        let w = kernel.weights();
        let last = w.len() - 1;
        for i in 0..w.len() {
            assert_eq!(w[i], w[last - i], "asymmetry at {}", i);
        }
    }

    #[test]
    fn test_center_is_maximum_and_decreasing() {
        let kernel = compute_kernel(10, 1.5);
        let w = kernel.weights();
        let center = kernel.radius() as usize;

        for i in center..w.len() - 1 {
            assert!(w[i] > w[i + 1], "not decreasing at {}", i);
        }
        for i in 1..=center {
            assert!(w[i] > w[i - 1], "not increasing at {}", i);
        }
        let max = w.iter().cloned().fold(f32::MIN, f32::max);
        assert_eq!(w[center], max);
    }

    #[test]
    fn test_default_sigma() {
        let kernel = compute_kernel(BLUR_RADIUS, BLUR_AMOUNT);
        assert!((kernel.sigma() - 3.5).abs() < EPSILON);
        assert!((BlurConfig::default().sigma() - 3.5).abs() < EPSILON);
    }

    #[test]
    fn test_zero_radius_is_identity() {
        let kernel = compute_kernel(0, BLUR_AMOUNT);
        assert_eq!(kernel.weights(), &[1.0]);

        let offsets = kernel.compute_offsets(64, 32);
        assert_eq!(offsets.horizontal, vec![[0.0, 0.0]]);
        assert_eq!(offsets.vertical, vec![[0.0, 0.0]]);
    }

    #[test]
    fn test_offsets_are_texel_multiples() {
        let kernel = compute_kernel(7, BLUR_AMOUNT);
        let offsets = kernel.compute_offsets(256, 256);

        assert_eq!(offsets.horizontal.len(), 15);
        assert_eq!(offsets.horizontal[0], [-7.0 / 256.0, 0.0]);
        assert_eq!(offsets.horizontal[14], [7.0 / 256.0, 0.0]);
        assert_eq!(offsets.horizontal[7], [0.0, 0.0]);

        for (i, (h, v)) in kernel
            .distances()
            .zip(offsets.horizontal.iter().zip(&offsets.vertical))
        {
            assert_eq!(h[0] * 256.0, i as f32);
            assert_eq!(h[1], 0.0);
            assert_eq!(v[0], 0.0);
            assert_eq!(v[1] * 256.0, i as f32);
        }
    }

    #[test]
    fn test_offsets_use_their_own_axis() {
        let kernel = compute_kernel(2, 1.0);
        let offsets = kernel.compute_offsets(100, 50);
        assert_eq!(offsets.for_axis(Axis::Horizontal)[4], [0.02, 0.0]);
        assert_eq!(offsets.for_axis(Axis::Vertical)[4], [0.0, 0.04]);
    }

    #[test]
    fn test_larger_sigma_spreads_weights() {
        let ratio = |sigma: f32| {
            let kernel = gaussian_weights(7, sigma);
            let w = kernel.weights();
            w[7] / w[0]
        };

        let sigmas = [1.0, 2.0, 3.5, 6.0, 12.0];
        for pair in sigmas.windows(2) {
            assert!(
                ratio(pair[1]) < ratio(pair[0]),
                "sigma {} should spread more than {}",
                pair[1],
                pair[0]
            );
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(BlurConfig::new(MAX_BLUR_RADIUS, 1.0).is_ok());
        assert_eq!(
            BlurConfig::new(MAX_BLUR_RADIUS + 1, 1.0),
            Err(KernelError::RadiusTooLarge {
                radius: MAX_BLUR_RADIUS + 1,
                max: MAX_BLUR_RADIUS
            })
        );
        assert!(matches!(
            BlurConfig::new(7, 0.0),
            Err(KernelError::InvalidAmount(_))
        ));
        assert!(matches!(
            BlurConfig::new(7, -1.0),
            Err(KernelError::InvalidAmount(_))
        ));
        assert!(matches!(
            BlurConfig::new(7, f32::NAN),
            Err(KernelError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_blur_kernel_recomputes_only_on_change() {
        let mut blur = BlurKernel::new(BlurConfig::default()).unwrap();
        assert!(blur.offsets().is_none());

        assert!(blur.update_target_size(256, 128));
        assert!(!blur.update_target_size(256, 128));
        assert_eq!(blur.offsets().unwrap().target_size, (256, 128));

        assert!(!blur.set_config(BlurConfig::default()).unwrap());

        let wider = BlurConfig::new(4, 1.0).unwrap();
        assert!(blur.set_config(wider).unwrap());
        assert_eq!(blur.kernel().weights().len(), 9);
        let offsets = blur.offsets().unwrap();
        assert_eq!(offsets.target_size, (256, 128));
        assert_eq!(offsets.horizontal.len(), 9);

        assert!(blur.update_target_size(128, 64));
        assert_eq!(blur.offsets().unwrap().vertical[8], [0.0, 4.0 / 64.0]);
    }

    #[test]
    fn test_offsets_for_follows_target_size() {
        let mut blur = BlurKernel::new(BlurConfig::default()).unwrap();
        assert_eq!(blur.offsets_for(64, 32).target_size, (64, 32));
        assert_eq!(blur.offsets_for(64, 32).horizontal[14], [7.0 / 64.0, 0.0]);
        assert_eq!(blur.offsets_for(10, 20).vertical[0], [0.0, -7.0 / 20.0]);
    }

    #[test]
    fn test_blur_kernel_rejects_invalid_config() {
        assert!(BlurKernel::new(BlurConfig { radius: 100, amount: 2.0 }).is_err());

        let mut blur = BlurKernel::new(BlurConfig::default()).unwrap();
        let bad = BlurConfig { radius: 7, amount: 0.0 };
        assert!(blur.set_config(bad).is_err());
        assert_eq!(blur.config(), BlurConfig::default());
    }

    #[test]
    #[should_panic(expected = "render target must be non-empty")]
    fn test_offsets_for_empty_target_panics() {
        compute_kernel(7, 2.0).compute_offsets(0, 64);
    }

    #[test]
    fn test_huge_amount_rejected() {
        // sigma = 7 / 1e30 squares to zero in f32
        assert_eq!(
            BlurConfig::new(7, 1.0e30),
            Err(KernelError::InvalidAmount(1.0e30))
        );
        assert!(BlurKernel::new(BlurConfig { radius: 7, amount: 1.0e30 }).is_err());

        // Radius 0 never uses sigma
        assert!(BlurConfig::new(0, 1.0e30).is_ok());
        // Tiny amounts overflow sigma instead
        assert!(BlurConfig::new(7, 1.0e-30).is_err());
    }

    #[test]
    fn test_underflowing_sigma_keeps_centre_tap() {
        let kernel = compute_kernel(7, 1.0e30);
        let weights = kernel.weights();
        assert_eq!(weights.len(), 15);
        assert!(weights.iter().all(|w| w.is_finite()));
        assert_eq!(weights[7], 1.0);
        let sum: f32 = weights.iter().sum();
        assert_eq!(sum, 1.0);

        assert_eq!(gaussian_weights(3, 0.0).weights(), &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]);
    }
}

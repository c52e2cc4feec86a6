mod color;
mod error;
mod gpu;
mod image;
mod interactive;
mod kernel;
mod overlay;
mod reference;

#[cfg(test)]
mod tests;

use crate::image::Image;
use crate::interactive::{DemoConfig, run_blur_demo};
use crate::kernel::{BlurConfig, compute_kernel};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && args[1] == "--benchmark" {
        run_benchmark();
    } else if let Err(e) = run_blur_demo(DemoConfig::default()) {
        log::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Time the CPU reference blur at a few image sizes
fn run_benchmark() {
    use std::time::Instant;

    println!("=== Reference Blur Benchmark ===\n");

    let config = BlurConfig::default();
    let kernel = compute_kernel(config.radius, config.amount);
    let sizes = [(256, 256), (512, 512), (1024, 1024)];
    let iterations = 10;

    println!("Radius: {}, sigma: {:.2}\n", kernel.radius(), kernel.sigma());

    for (width, height) in sizes {
        let source = Image::test_pattern(width, height);
        let half = (width / 2, height / 2);
        let half_offsets = kernel.compute_offsets(half.0, half.1);
        let full_offsets = kernel.compute_offsets(width, height);

        println!("Image size: {}x{}", width, height);
        println!("-----------------------");

        let start = Instant::now();
        for _ in 0..iterations {
            let _ = reference::apply(&source, half, &kernel, &half_offsets);
        }
        let avg_half_ms = start.elapsed().as_secs_f64() * 1000.0 / iterations as f64;

        let start = Instant::now();
        for _ in 0..iterations {
            let _ = reference::apply(&source, (width, height), &kernel, &full_offsets);
        }
        let avg_full_ms = start.elapsed().as_secs_f64() * 1000.0 / iterations as f64;

        println!("  Half-size targets: {:.3} ms/iter", avg_half_ms);
        println!("  Full-size targets: {:.3} ms/iter", avg_full_ms);
        println!("  Speedup: {:.2}x", avg_full_ms / avg_half_ms);
        println!();
    }
}

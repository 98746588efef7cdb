#![allow(dead_code)]

use pgm_filter::GrayImage;

/// Deterministic pseudo-random image; same seed, same pixels.
pub fn noise_image(width: usize, height: usize, seed: u64) -> GrayImage {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    GrayImage::from_fn(width, height, |_, _| {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 56) as u8
    })
}

pub fn uniform_image(width: usize, height: usize, value: u8) -> GrayImage {
    GrayImage::from_fn(width, height, |_, _| value)
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

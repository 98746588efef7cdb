//! src/kernel.rs
//!
//! Box filter over a truncated window.
//!
//! For output pixel `(row, col)` the window spans `filter_size / 2` pixels in
//! every direction. Positions outside the image are dropped from both the sum
//! and the divisor, so edge and corner pixels average fewer samples than
//! interior ones. The mean is truncated by integer division.
//!
//! Even filter sizes round the half-width down, so size 2 behaves like size 3.

use std::ops::Range;

use crate::image::GrayImage;

/// Index range covered by a window of half-width `radius` around `center`,
/// clipped to `[0, len)`.
#[inline]
fn clipped(center: usize, radius: usize, len: usize) -> Range<usize> {
    center.saturating_sub(radius)..(center + radius + 1).min(len)
}

/// Number of pixels averaged at `(row, col)` for the given filter size.
pub fn sample_count(
    width: usize,
    height: usize,
    row: usize,
    col: usize,
    filter_size: usize,
) -> usize {
    let radius = filter_size / 2;
    clipped(row, radius, height).len() * clipped(col, radius, width).len()
}

/// Computes one filtered row.
pub fn filter_row(image: &GrayImage, row: usize, filter_size: usize) -> Vec<u8> {
    let mut output = vec![0; image.width()];
    filter_row_into(image, row, filter_size, &mut output);
    output
}

/// Computes one filtered row into `output`, which must be `width` long.
///
/// Column sums over the vertical window are built first, then a prefix sum
/// gives each horizontal window in constant time.
pub fn filter_row_into(image: &GrayImage, row: usize, filter_size: usize, output: &mut [u8]) {
    let width = image.width();
    assert_eq!(output.len(), width, "output row must be {width} pixels");
    assert!(row < image.height(), "row {row} out of range");

    let radius = filter_size / 2;
    let rows = clipped(row, radius, image.height());
    let window_rows = rows.len() as u64;

    // prefix[x] = sum of column sums for columns [0, x)
    let mut prefix = vec![0u64; width + 1];
    for y in rows {
        for (x, &px) in image.row(y).iter().enumerate() {
            prefix[x + 1] += u64::from(px);
        }
    }
    for x in 0..width {
        prefix[x + 1] += prefix[x];
    }

    for (col, out) in output.iter_mut().enumerate() {
        let cols = clipped(col, radius, width);
        let count = window_rows * cols.len() as u64;
        let sum = prefix[cols.end] - prefix[cols.start];
        *out = (sum / count) as u8;
    }
}

/// Filters every row in order on the calling thread.
pub fn filter_image(image: &GrayImage, filter_size: usize) -> GrayImage {
    let mut output = GrayImage::blank(image.header().clone());
    for row in 0..image.height() {
        filter_row_into(image, row, filter_size, output.row_mut(row));
    }
    output
}

#[cfg(test)]
mod kernel_test {
    use super::*;
    use crate::image::ImageHeader;

    /// Straightforward per-neighbour evaluation of the truncated window.
    fn brute_force(image: &GrayImage, row: usize, filter_size: usize) -> Vec<u8> {
        let s = (filter_size / 2) as i64;
        let (w, h) = (image.width() as i64, image.height() as i64);
        (0..w)
            .map(|j| {
                let (mut sum, mut count) = (0u64, 0u64);
                for dy in -s..=s {
                    for dx in -s..=s {
                        let (y, x) = (row as i64 + dy, j + dx);
                        if (0..h).contains(&y) && (0..w).contains(&x) {
                            sum += u64::from(image.get(x as usize, y as usize));
                            count += 1;
                        }
                    }
                }
                (sum / count) as u8
            })
            .collect()
    }

    #[test]
    fn test_matches_brute_force_window() {
        let image = GrayImage::from_fn(7, 5, |x, y| ((x * 37 + y * 91) % 256) as u8);
        for filter_size in 1..=8 {
            for row in 0..image.height() {
                assert_eq!(
                    filter_row(&image, row, filter_size),
                    brute_force(&image, row, filter_size),
                    "filter_size {filter_size}, row {row}"
                );
            }
        }
    }

    #[test]
    fn test_corner_averages_four_samples() {
        assert_eq!(sample_count(5, 5, 0, 0, 3), 4);
        assert_eq!(sample_count(5, 5, 0, 2, 3), 6);
        assert_eq!(sample_count(5, 5, 2, 2, 3), 9);
        assert_eq!(sample_count(5, 5, 2, 2, 1), 1);
        assert_eq!(sample_count(2, 2, 1, 1, 101), 4);
    }

    #[test]
    fn test_window_larger_than_image() {
        let header = ImageHeader::new("P5", 2, 2, 255);
        let image = GrayImage::new(header, vec![0, 10, 20, 31]).unwrap();
        // Every window covers the whole image: 61 / 4 = 15
        assert_eq!(filter_image(&image, 9).as_bytes(), &[15, 15, 15, 15]);
    }

    #[test]
    fn test_zero_width_row() {
        let image = GrayImage::blank(ImageHeader::new("P5", 0, 2, 255));
        assert!(filter_row(&image, 1, 3).is_empty());
    }
}

//! src/image.rs
//!
//! In-memory grayscale raster.
//!
//! Pixels live in a single row-major buffer (`row * width + col`) and are
//! handed out as one slice per row. The header fields travel separately as
//! `ImageHeader` so they can be replicated before the pixel rows.

use anyhow::{anyhow, ensure, Result};
use std::slice::ChunksExact;

/// Header metadata of a PGM raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHeader {
    /// Magic tag as read from the file (e.g. `P5`). Kept verbatim.
    pub format_tag: String,
    pub width: usize,
    pub height: usize,
    pub max_gray: u32,
}

impl ImageHeader {
    pub fn new(format_tag: impl Into<String>, width: usize, height: usize, max_gray: u32) -> Self {
        Self {
            format_tag: format_tag.into(),
            width,
            height,
            max_gray,
        }
    }

    /// Number of pixels described by the header.
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }
}

/// Owned 8-bit grayscale image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayImage {
    header: ImageHeader,
    data: Vec<u8>,
}

impl GrayImage {
    /// Wraps a row-major pixel buffer. Fails if the buffer does not hold
    /// exactly `width * height` bytes.
    pub fn new(header: ImageHeader, data: Vec<u8>) -> Result<Self> {
        ensure!(
            data.len() == header.pixel_count(),
            "pixel buffer holds {} bytes, header declares {}x{}",
            data.len(),
            header.width,
            header.height
        );
        Ok(Self { header, data })
    }

    /// All-black image with the given header.
    pub fn blank(header: ImageHeader) -> Self {
        let data = vec![0; header.pixel_count()];
        Self { header, data }
    }

    /// Builds a `P5` image from a per-pixel function of `(x, y)`.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> u8) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            header: ImageHeader::new("P5", width, height, 255),
            data,
        }
    }

    pub fn header(&self) -> &ImageHeader {
        &self.header
    }

    pub fn format_tag(&self) -> &str {
        &self.header.format_tag
    }

    pub fn width(&self) -> usize {
        self.header.width
    }

    pub fn height(&self) -> usize {
        self.header.height
    }

    pub fn max_gray(&self) -> u32 {
        self.header.max_gray
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.header.width + x]
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.header.width;
        &self.data[start..start + self.header.width]
    }

    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let start = y * self.header.width;
        &mut self.data[start..start + self.header.width]
    }

    /// Iterates rows top to bottom. Zero-width images yield no rows.
    pub fn rows(&self) -> Rows<'_> {
        Rows {
            inner: self.data.chunks_exact(self.header.width.max(1)),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_parts(self) -> (ImageHeader, Vec<u8>) {
        (self.header, self.data)
    }
}

pub struct Rows<'a> {
    inner: ChunksExact<'a, u8>,
}

impl<'a> Iterator for Rows<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// Output image that is filled one row at a time, in any order.
///
/// Each row may be written exactly once; `finish` refuses to hand out the
/// image until every row has arrived.
#[derive(Debug)]
pub struct RowAssembler {
    image: GrayImage,
    filled: Vec<bool>,
    remaining: usize,
}

impl RowAssembler {
    pub fn new(header: ImageHeader) -> Self {
        let height = header.height;
        Self {
            image: GrayImage::blank(header),
            filled: vec![false; height],
            remaining: height,
        }
    }

    pub fn is_filled(&self, line: usize) -> bool {
        self.filled.get(line).copied().unwrap_or(false)
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn store(&mut self, line: usize, pixels: &[u8]) -> Result<()> {
        let height = self.image.height();
        let width = self.image.width();
        ensure!(line < height, "row {line} is outside an image of height {height}");
        ensure!(!self.filled[line], "row {line} was already stored");
        ensure!(
            pixels.len() == width,
            "row {line} carries {} pixels, expected {width}",
            pixels.len()
        );

        self.image.row_mut(line).copy_from_slice(pixels);
        self.filled[line] = true;
        self.remaining -= 1;
        Ok(())
    }

    pub fn finish(self) -> Result<GrayImage> {
        if self.remaining > 0 {
            let missing = self.filled.iter().position(|done| !done).unwrap_or(0);
            return Err(anyhow!(
                "{} rows never arrived (first missing: {missing})",
                self.remaining
            ));
        }
        Ok(self.image)
    }
}

//! src/codec.rs
//!
//! PGM reader and writer.
//!
//! The header is textual: a format tag, `width height` and the maximum gray
//! value, separated by whitespace, with `#` comments allowed between tokens.
//! Exactly one whitespace byte follows the maximum gray value, then
//! `width * height` raw gray bytes.
//!
//! The format tag is not interpreted; pixel data is always read as raw bytes.
//! A file that ends early is not an error: the missing pixels are zero.

use log::{debug, warn};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use crate::error::FilterError;
use crate::image::{GrayImage, ImageHeader};

/// Reads a PGM file into memory.
pub fn decode_image(path: impl AsRef<Path>) -> Result<GrayImage, FilterError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| FilterError::file(path, e))?;
    decode_bytes(&bytes).map_err(|e| FilterError::file(path, e))
}

/// Writes `image` as PGM, replacing any existing file.
pub fn encode_image(image: &GrayImage, path: impl AsRef<Path>) -> Result<(), FilterError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| FilterError::file(path, e))?;
    let mut writer = BufWriter::new(file);
    write_image(image, &mut writer)
        .and_then(|_| writer.flush())
        .map_err(|e| FilterError::file(path, e))
}

/// Writes the header and raw pixel bytes to any writer.
pub fn write_image<W: Write>(image: &GrayImage, writer: &mut W) -> io::Result<()> {
    write!(
        writer,
        "{}\n{} {}\n{}\n",
        image.format_tag(),
        image.width(),
        image.height(),
        image.max_gray()
    )?;
    writer.write_all(image.as_bytes())
}

/// Parses an in-memory PGM file.
pub fn decode_bytes(bytes: &[u8]) -> io::Result<GrayImage> {
    let mut cursor = HeaderCursor { bytes, pos: 0 };

    let format_tag = cursor.token("format tag")?;
    let width: usize = cursor.number("width")?;
    let height: usize = cursor.number("height")?;
    let max_gray: u32 = cursor.number("max gray value")?;
    cursor.skip_single_whitespace();

    let expected = width
        .checked_mul(height)
        .ok_or_else(|| invalid_data(format!("PGM dimensions {width}x{height} overflow")))?;
    let header = ImageHeader::new(format_tag, width, height, max_gray);
    debug!(
        "decoded PGM header {} {}x{} max {}",
        header.format_tag, header.width, header.height, header.max_gray
    );

    let available = &bytes[cursor.pos..];
    let mut data = available[..available.len().min(expected)].to_vec();
    if data.len() < expected {
        data.try_reserve_exact(expected - data.len()).map_err(|e| {
            invalid_data(format!("PGM dimensions {width}x{height} too large: {e}"))
        })?;
        warn!(
            "pixel data ends after {} of {} bytes; remaining pixels are zero",
            data.len(),
            expected
        );
        data.resize(expected, 0);
    }

    GrayImage::new(header, data).map_err(|e| invalid_data(e.to_string()))
}

struct HeaderCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> HeaderCursor<'a> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    /// Skips whitespace and comment lines until the next token.
    fn skip_ignorable(&mut self) {
        loop {
            while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
                self.pos += 1;
            }
            if self.peek() != Some(b'#') {
                return;
            }
            while let Some(b) = self.peek() {
                self.pos += 1;
                if b == b'\n' {
                    break;
                }
            }
        }
    }

    fn skip_single_whitespace(&mut self) {
        if self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn token(&mut self, what: &str) -> io::Result<String> {
        self.skip_ignorable();
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|b| !b.is_ascii_whitespace() && b != b'#')
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(invalid_data(format!("missing {what} in PGM header")));
        }
        Ok(String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned())
    }

    fn number<T: FromStr>(&mut self, what: &str) -> io::Result<T> {
        let token = self.token(what)?;
        token
            .parse()
            .map_err(|_| invalid_data(format!("{what} in PGM header is not a number: {token:?}")))
    }
}

fn invalid_data(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

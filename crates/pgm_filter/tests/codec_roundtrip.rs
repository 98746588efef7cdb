//! Reading and writing PGM files on disk.

mod common;
use common::noise_image;

use anyhow::Result;
use pgm_filter::{decode_image, encode_image, FilterError, GrayImage, ImageHeader};
use std::fs;

#[test]
fn test_encode_then_decode_reproduces_image() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("noise.pgm");

    let (mut header, data) = noise_image(17, 5, 8).into_parts();
    header.max_gray = 200;
    let image = GrayImage::new(header, data)?;

    encode_image(&image, &path)?;
    assert_eq!(decode_image(&path)?, image);
    Ok(())
}

#[test]
fn test_encode_overwrites_existing_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("out.pgm");
    fs::write(&path, vec![b'x'; 1000])?;

    let image = GrayImage::new(ImageHeader::new("P5", 2, 2, 255), vec![1, 2, 3, 4])?;
    encode_image(&image, &path)?;

    assert_eq!(fs::read(&path)?, b"P5\n2 2\n255\n\x01\x02\x03\x04");
    Ok(())
}

#[test]
fn test_decode_missing_file_is_file_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.pgm");

    match decode_image(&path) {
        Err(FilterError::File { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected a file error, got {other:?}"),
    }
}

#[test]
fn test_decode_commented_header_from_disk() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("commented.pgm");
    let mut bytes = b"P5\n# created by hand\n# second comment\n2 2\n255\n".to_vec();
    bytes.extend_from_slice(&[10, 20, 30, 40]);
    fs::write(&path, bytes)?;

    let image = decode_image(&path)?;
    assert_eq!(image.header(), &ImageHeader::new("P5", 2, 2, 255));
    assert_eq!(image.as_bytes(), &[10, 20, 30, 40]);
    Ok(())
}

//! Exit behaviour of the `pgm_filter` binary.

mod common;
use common::noise_image;

use anyhow::Result;
use pgm_filter::kernel::filter_image;
use pgm_filter::{decode_image, encode_image};
use std::process::Command;

fn binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_pgm_filter"))
}

#[test]
fn test_filters_into_fixed_output_path() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("input.pgm");
    let image = noise_image(20, 15, 4);
    encode_image(&image, &input)?;

    let output = binary()
        .current_dir(dir.path())
        .arg(&input)
        .arg("3")
        .args(["--workers", "3"])
        .output()?;

    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Width of img    : 20 px"));
    assert!(stdout.contains("The image file has been filtered"));

    let filtered = decode_image(dir.path().join("filtered.pgm"))?;
    assert_eq!(filtered, filter_image(&image, 3));
    Ok(())
}

#[test]
fn test_wrong_argument_count_is_usage_error() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let output = binary().current_dir(dir.path()).arg("only-one").output()?;

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
    assert!(!dir.path().join("filtered.pgm").exists());
    Ok(())
}

#[test]
fn test_missing_input_is_file_error() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let output = binary()
        .current_dir(dir.path())
        .args(["does-not-exist.pgm", "3"])
        .output()?;

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("does-not-exist.pgm").count(), 1, "{stderr}");
    assert!(!dir.path().join("filtered.pgm").exists());
    Ok(())
}

#[test]
fn test_invalid_filter_size_is_rejected() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("input.pgm");
    encode_image(&noise_image(4, 4, 1), &input)?;

    for size in ["0", "-2", "abc"] {
        let output = binary()
            .current_dir(dir.path())
            .arg(&input)
            .arg(size)
            .output()?;

        assert_eq!(output.status.code(), Some(1), "size {size}");
        assert!(String::from_utf8_lossy(&output.stderr).contains("Wrong size for the filter window"));
        assert!(!dir.path().join("filtered.pgm").exists());
    }
    Ok(())
}

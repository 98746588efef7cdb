use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{ArgAction, Parser};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

use pgm_filter::{decode_image, encode_image, FarmConfig, FilterError, FilterFarm, GrayImage};

/// Output is always written here, replacing any existing file.
const OUTPUT_PATH: &str = "filtered.pgm";

/// Apply a box filter to a PGM image using a pool of worker threads.
#[derive(Parser, Debug)]
#[command(name = "pgm_filter", version)]
struct Cli {
    /// Input PGM image
    input: PathBuf,

    /// Side length of the square averaging window (>= 1)
    #[arg(allow_negative_numbers = true)]
    filter_size: String,

    /// Number of worker threads (defaults to available parallelism)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => return report(&FilterError::usage(e.render().to_string()).into()),
    };

    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e),
    }
}

fn run(cli: &Cli) -> Result<()> {
    let image = decode_image(&cli.input)?;
    print_image_details(&cli.input, &image);

    let num_workers = cli.workers.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1)
    });
    let config = FarmConfig::builder()
        .filter_size(parse_filter_size(&cli.filter_size))
        .num_workers(num_workers)
        .build();

    let farm = FilterFarm::new(config)?;
    let output = farm.run(&image)?;

    encode_image(&output.image, OUTPUT_PATH)?;
    println!("The image file has been filtered");
    Ok(())
}

/// Reads the leading integer of `text`, the way C `atoi` does. Text without
/// leading digits reads as 0, which `FilterFarm::new` rejects as a wrong size.
fn parse_filter_size(text: &str) -> i64 {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let magnitude = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, d| {
            acc.saturating_mul(10).saturating_add(i64::from(d - b'0'))
        });
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

fn print_image_details(path: &Path, image: &GrayImage) {
    match path.extension() {
        Some(ext) => println!("File format     : {}", ext.to_string_lossy()),
        None => println!("No extension found in file {}", path.display()),
    }
    println!("PGM File type   : {}", image.format_tag());
    println!("Width of img    : {} px", image.width());
    println!("Height of img   : {} px", image.height());
    println!("Max Gray value  : {}", image.max_gray());
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let _ = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}

/// Prints a fatal error and picks the exit code. Every failure stops the
/// whole run, so they all map to 1.
fn report(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<FilterError>() {
        Some(FilterError::Usage { usage }) => eprint!("{usage}"),
        Some(FilterError::File { .. }) => eprintln!("File error: {err:#}"),
        Some(FilterError::Parameter { .. }) => eprintln!("{err}"),
        None => eprintln!("Error: {err:#}"),
    }
    ExitCode::FAILURE
}

#[cfg(test)]
mod main_test {
    use super::*;

    #[test]
    fn test_filter_size_reads_leading_integer() {
        assert_eq!(parse_filter_size("5"), 5);
        assert_eq!(parse_filter_size("  +7"), 7);
        assert_eq!(parse_filter_size("-2"), -2);
        assert_eq!(parse_filter_size("3x"), 3);
        assert_eq!(parse_filter_size("abc"), 0);
        assert_eq!(parse_filter_size(""), 0);
        assert_eq!(parse_filter_size("99999999999999999999"), i64::MAX);
    }
}

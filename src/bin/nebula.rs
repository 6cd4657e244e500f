extern crate clap;
extern crate env_logger;
extern crate failure;
#[macro_use]
extern crate log;
extern crate nebulabrot;
extern crate num;

use clap::{App, Arg, ArgMatches};
use failure::{err_msg, Error};
use nebulabrot::config::{DEFAULT_GRID_SIZE, DEFAULT_ITERATIONS, DEFAULT_SAMPLES, MAX_CHANNELS};
use nebulabrot::{Bounds, Colormap, Config};
use num::Complex;
use std::str::FromStr;

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn parse_complex(s: &str) -> Option<Complex<f64>> {
    match parse_pair(s, ',') {
        Some((re, im)) => Some(Complex { re, im }),
        None => None,
    }
}

fn parse_list<T: FromStr>(s: &str) -> Option<Vec<T>> {
    s.split(',').map(|v| T::from_str(v.trim()).ok()).collect()
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

fn validate_iterations(s: &str) -> Result<(), String> {
    match parse_list::<usize>(s) {
        Some(ref ceilings) if ceilings.len() <= MAX_CHANNELS => Ok(()),
        Some(_) => Err(format!("At most {} iteration ceilings are allowed", MAX_CHANNELS)),
        None => Err("Could not parse iteration ceilings".to_string()),
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const LEFTLOWER: &str = "leftlower";
const RIGHTUPPER: &str = "rightupper";
const SAMPLES: &str = "samples";
const ITERATIONS: &str = "iterations";
const THREADS: &str = "threads";
const SEED: &str = "seed";
const COLORMAP: &str = "colormap";
const CONCURRENT: &str = "concurrent-channels";

const MAX_THREADS: usize = 1024;

fn args<'a>(size: &'a str, samples: &'a str, iterations: &'a str) -> ArgMatches<'a> {
    App::new("nebula")
        .version("0.1.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Monte Carlo Buddhabrot and Nebulabrot renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output file; the format follows the extension"),
        )
        .arg(
            Arg::with_name(SIZE)
                .required(false)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value(size)
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        65_535,
                        "Could not parse output image size",
                        "Image size must be between 1 and 65535",
                    )
                })
                .help("Width and height of the square output image"),
        )
        .arg(
            Arg::with_name(LEFTLOWER)
                .required(false)
                .long(LEFTLOWER)
                .short("l")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-2.0,-2.0")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse left lower corner"))
                .help("Left lower corner of the complex plane"),
        )
        .arg(
            Arg::with_name(RIGHTUPPER)
                .required(false)
                .long(RIGHTUPPER)
                .short("r")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("2.0,2.0")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse right upper corner"))
                .help("Right upper corner of the complex plane"),
        )
        .arg(
            Arg::with_name(SAMPLES)
                .required(false)
                .long(SAMPLES)
                .short("n")
                .takes_value(true)
                .default_value(samples)
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        u64::max_value(),
                        "Could not parse sample count",
                        "Sample count must be positive",
                    )
                })
                .help("Random seed points drawn per channel"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .required(false)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value(iterations)
                .validator(|s| validate_iterations(&s))
                .help("Iteration ceiling, or three comma-separated ceilings for an RGB image"),
        )
        .arg(
            Arg::with_name(THREADS)
                .required(false)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        MAX_THREADS,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", MAX_THREADS),
                    )
                })
                .help("Number of threads per channel (default: one per core)"),
        )
        .arg(
            Arg::with_name(SEED)
                .required(false)
                .long(SEED)
                .takes_value(true)
                .validator(|s| {
                    u64::from_str(&s)
                        .map(|_| ())
                        .map_err(|_| "Could not parse seed".to_string())
                })
                .help("Seed for a reproducible render"),
        )
        .arg(
            Arg::with_name(COLORMAP)
                .required(false)
                .long(COLORMAP)
                .short("c")
                .takes_value(true)
                .possible_values(&["gray", "hot"])
                .default_value("gray")
                .help("Colormap for a single-channel image"),
        )
        .arg(
            Arg::with_name(CONCURRENT)
                .long(CONCURRENT)
                .help("Render all channels at the same time"),
        )
        .get_matches()
}

fn value<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str, Error> {
    matches
        .value_of(name)
        .ok_or_else(|| err_msg(format!("missing value for --{}", name)))
}

fn configure(matches: &ArgMatches) -> Result<(Config, Colormap), Error> {
    let grid_size = usize::from_str(value(matches, SIZE)?)?;
    let leftlower = parse_complex(value(matches, LEFTLOWER)?)
        .ok_or_else(|| err_msg("Error parsing left lower point"))?;
    let rightupper = parse_complex(value(matches, RIGHTUPPER)?)
        .ok_or_else(|| err_msg("Error parsing right upper point"))?;
    let samples = u64::from_str(value(matches, SAMPLES)?)?;
    let iterations = parse_list(value(matches, ITERATIONS)?)
        .ok_or_else(|| err_msg("Error parsing iteration ceilings"))?;
    let colormap = Colormap::from_str(value(matches, COLORMAP)?).map_err(err_msg)?;

    let bounds = Bounds::from_corners(leftlower, rightupper)?;
    let mut config = Config::new(grid_size, bounds, samples, iterations);
    if let Some(threads) = matches.value_of(THREADS) {
        config.workers = usize::from_str(threads)?;
    }
    if let Some(seed) = matches.value_of(SEED) {
        config.seed = Some(u64::from_str(seed)?);
    }
    config.concurrent_channels = matches.is_present(CONCURRENT);
    config.validate()?;

    if config.iterations.len() > 1 && colormap != Colormap::Gray {
        warn!("colormap is ignored for a multi-channel image");
    }
    Ok((config, colormap))
}

fn run() -> Result<(), Error> {
    let (size, samples, iterations) = (
        DEFAULT_GRID_SIZE.to_string(),
        DEFAULT_SAMPLES.to_string(),
        DEFAULT_ITERATIONS.to_string(),
    );
    let matches = args(&size, &samples, &iterations);
    let (config, colormap) = configure(&matches)?;
    let image = nebulabrot::render(&config)?;
    nebulabrot::write_image(value(&matches, OUTPUT)?, &image, colormap)?;
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Turns a finished CompositeImage into an 8-bit image on disk.  This
//! is presentation only: the planes arrive already normalized, and
//! nothing here feeds back into the computation.

use image::{self, ColorType};
use num::clamp;
use std::path::Path;
use std::str::FromStr;

use errors::{Error, Result};
use nebula::CompositeImage;

/// How a single-plane image is colored.  Composites ignore this and
/// map their planes straight onto red, green, and blue.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Colormap {
    /// Intensity as a gray level.
    Gray,
    /// Black through red and yellow to white.
    Hot,
}

impl FromStr for Colormap {
    type Err = String;

    fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
        match s {
            "gray" | "grey" => Ok(Colormap::Gray),
            "hot" => Ok(Colormap::Hot),
            _ => Err(format!("unknown colormap '{}'; expected gray or hot", s)),
        }
    }
}

/// Scales a [0, 1] intensity to a byte, clamping anything outside.
pub fn quantize(v: f64) -> u8 {
    (clamp(v, 0.0, 1.0) * 255.0).round() as u8
}

// Breakpoints of the hot ramp: red rises first, then green, then blue.
const HOT_RED: (f64, f64) = (0.0, 0.365_079);
const HOT_GREEN: (f64, f64) = (0.365_079, 0.746_032);
const HOT_BLUE: (f64, f64) = (0.746_032, 1.0);
const HOT_RED_FLOOR: f64 = 0.0416;

fn ramp(v: f64, (from, to): (f64, f64)) -> f64 {
    clamp((v - from) / (to - from), 0.0, 1.0)
}

/// The hot colormap.
pub fn hot(v: f64) -> [u8; 3] {
    let red = HOT_RED_FLOOR + (1.0 - HOT_RED_FLOOR) * ramp(v, HOT_RED);
    [
        quantize(red),
        quantize(ramp(v, HOT_GREEN)),
        quantize(ramp(v, HOT_BLUE)),
    ]
}

/// Renders the image into a byte buffer, top row first.  The grid's
/// first row is at `y_min`, so rows are written in reverse to put
/// `y_max` at the top.  Returns the buffer and its color layout.
pub fn to_pixels(picture: &CompositeImage, colormap: Colormap) -> (Vec<u8>, ColorType) {
    let size = picture.size();
    let planes = picture.planes();
    let rows = (0..size).rev();

    if picture.is_grayscale() {
        let values = planes[0].values();
        return match colormap {
            Colormap::Gray => (
                rows.flat_map(move |top| values[top * size..(top + 1) * size].iter())
                    .map(|&v| quantize(v))
                    .collect(),
                ColorType::Gray(8),
            ),
            Colormap::Hot => (
                rows.flat_map(move |top| values[top * size..(top + 1) * size].iter())
                    .flat_map(|&v| hot(v).to_vec())
                    .collect(),
                ColorType::RGB(8),
            ),
        };
    }

    let mut pixels = Vec::with_capacity(size * size * 3);
    for top in rows {
        for left in 0..size {
            let offset = top * size + left;
            for channel in 0..3 {
                pixels.push(match planes.get(channel) {
                    Some(plane) => quantize(plane.values()[offset]),
                    None => 0,
                });
            }
        }
    }
    (pixels, ColorType::RGB(8))
}

/// Writes the image to `path`; the format follows the extension.
pub fn write_image<P: AsRef<Path>>(
    path: P,
    picture: &CompositeImage,
    colormap: Colormap,
) -> Result<()> {
    let (pixels, color) = to_pixels(picture, colormap);
    let size = picture.size() as u32;
    image::save_buffer(path.as_ref(), &pixels, size, size, color).map_err(Error::from)?;
    info!("wrote {}", path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use histogram::Histogram;
    use image::GenericImageView;
    use nebula::{composite, Channel};
    use num::Complex;
    use planes::Bounds;
    use tempfile;

    // A 2x2 image lit only in the lower-left cell.
    fn lower_left(depth: usize) -> CompositeImage {
        let channels: Vec<Channel> = (0..depth)
            .map(|i| {
                let mut histogram = Histogram::new(Bounds::default(), 2).unwrap();
                histogram.commit(&[Complex::new(-1.0, -1.0)], true);
                Channel {
                    max_iter: 10 * (i + 1),
                    histogram,
                }
            })
            .collect();
        composite(&channels).unwrap()
    }

    #[test]
    fn colormap_names() {
        assert_eq!("gray".parse::<Colormap>(), Ok(Colormap::Gray));
        assert_eq!("hot".parse::<Colormap>(), Ok(Colormap::Hot));
        assert!("viridis".parse::<Colormap>().is_err());
    }

    #[test]
    fn quantize_clamps() {
        assert_eq!(quantize(0.0), 0);
        assert_eq!(quantize(1.0), 255);
        assert_eq!(quantize(0.5), 128);
        assert_eq!(quantize(-3.0), 0);
        assert_eq!(quantize(7.0), 255);
    }

    #[test]
    fn hot_runs_from_black_to_white() {
        assert_eq!(hot(0.0), [11, 0, 0]);
        assert_eq!(hot(0.365_079), [255, 0, 0]);
        assert_eq!(hot(0.746_032), [255, 255, 0]);
        assert_eq!(hot(1.0), [255, 255, 255]);
    }

    #[test]
    fn grayscale_rows_are_flipped() {
        let (pixels, color) = to_pixels(&lower_left(1), Colormap::Gray);
        assert_eq!(color, ColorType::Gray(8));
        assert_eq!(pixels, vec![0, 0, 255, 0]);
    }

    #[test]
    fn hot_grayscale_is_rgb() {
        let (pixels, color) = to_pixels(&lower_left(1), Colormap::Hot);
        assert_eq!(color, ColorType::RGB(8));
        assert_eq!(pixels.len(), 12);
        assert_eq!(&pixels[6..9], &[255, 255, 255]);
    }

    #[test]
    fn two_channels_leave_blue_empty() {
        let (pixels, color) = to_pixels(&lower_left(2), Colormap::Hot);
        assert_eq!(color, ColorType::RGB(8));
        assert_eq!(&pixels[6..9], &[255, 255, 0]);
    }

    #[test]
    fn writes_a_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nebula.png");
        write_image(&path, &lower_left(3), Colormap::Gray).unwrap();
        let written = image::open(&path).unwrap();
        assert_eq!(written.dimensions(), (2, 2));
    }

    #[test]
    fn unwritable_path_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("nebula.png");
        match write_image(&path, &lower_left(1), Colormap::Gray) {
            Err(Error::Io(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }
}

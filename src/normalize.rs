// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Log-scale normalization.  Visit counts span many orders of
//! magnitude, so each is compressed with log(1 + count) before the
//! whole grid is stretched onto [0, 1].

use errors::{Error, Result};
use histogram::Histogram;

/// A square grid of floating-point intensities in [0, 1], row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct Plane {
    size: usize,
    values: Vec<f64>,
}

impl Plane {
    /// Wraps intensities computed elsewhere.  There must be exactly
    /// `size * size` of them.
    pub fn new(size: usize, values: Vec<f64>) -> Result<Plane> {
        if size.checked_mul(size) != Some(values.len()) {
            return Err(Error::Mismatch(format!(
                "{} values cannot fill a {}x{} plane",
                values.len(),
                size,
                size
            )));
        }
        Ok(Plane { size, values })
    }

    /// Number of cells along each side.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The intensities, row-major.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Intensity at a column and row.
    pub fn get(&self, left: usize, top: usize) -> Option<f64> {
        if left >= self.size || top >= self.size {
            return None;
        }
        Some(self.values[top * self.size + left])
    }
}

/// Maps a histogram onto [0, 1].  A grid whose compressed values are
/// all equal, including an empty one, comes back as all zeros.
pub fn normalize(histogram: &Histogram) -> Plane {
    let logs: Vec<f64> = histogram
        .counts()
        .iter()
        .map(|&count| f64::from(count).ln_1p())
        .collect();

    let (low, high) = logs
        .iter()
        .fold((::std::f64::INFINITY, ::std::f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = high - low;

    let values = if range > 0.0 {
        logs.into_iter().map(|v| (v - low) / range).collect()
    } else {
        vec![0.0; logs.len()]
    };

    Plane {
        size: histogram.size(),
        values,
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The orbit evaluator.  Starting from zero, a seed point `c` is
//! pushed through z <- z*z + c until either the squared magnitude
//! exceeds four (the orbit escapes) or the iteration ceiling is
//! reached (the orbit is treated as bounded).  Every visited point is
//! recorded, because the Buddhabrot plots the whole path and not just
//! the escape velocity.
//!
//! The trajectory lives in a buffer that belongs to the caller and is
//! reused from one seed to the next; a worker evaluating millions of
//! seeds with ceilings in the hundreds of thousands allocates it once,
//! up front, and learns there whether the ceiling fits in memory.

use num::Complex;

use errors::{Error, Result};

/// The squared bailout radius.  |z| > 2 guarantees divergence.
pub const ESCAPE_NORM_SQR: f64 = 4.0;

const D4: f64 = 1.0 / 4.0;
const D16: f64 = D4 / 4.0;

/// The two halves of the `and` expression are false when the point is
/// guaranteed to be inside the main cardioid or the period-2 bulb of
/// the Mandelbrot set.  It does *not* guarantee that a point will be
/// outside; there are plenty of interior points for which this still
/// returns true, and those have to be iterated.
pub fn maybe_outside(c: Complex<f64>) -> bool {
    let y = c.im * c.im;
    let q = y + (c.re - D4) * (c.re - D4);
    q * (q + c.re - D4) > (y * D4) && (c.re + 1.0) * (c.re + 1.0) + y > D16
}

/// A reusable trajectory buffer together with the iteration ceiling it
/// was sized for.
#[derive(Clone, Debug)]
pub struct Orbit {
    max_iter: usize,
    skip_interior: bool,
    escaped: bool,
    trajectory: Vec<Complex<f64>>,
}

impl Orbit {
    /// Creates an evaluator for the given ceiling and reserves room for
    /// a full trajectory.  A ceiling whose buffer cannot be allocated is
    /// reported as `Error::ResourceExhausted`.
    pub fn new(max_iter: usize) -> Result<Self> {
        let mut trajectory: Vec<Complex<f64>> = Vec::new();
        trajectory
            .try_reserve_exact(max_iter)
            .map_err(|_| Error::ResourceExhausted(max_iter))?;
        Ok(Orbit {
            max_iter,
            skip_interior: false,
            escaped: false,
            trajectory,
        })
    }

    /// When set, seeds inside the main cardioid or the period-2 bulb
    /// are reported bounded without iterating.
    pub fn skip_interior(mut self, skip: bool) -> Self {
        self.skip_interior = skip;
        self
    }

    /// The iteration ceiling.
    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    /// Runs the recurrence for `c`, replacing whatever the buffer held
    /// before.  Returns whether the orbit escaped.  The trajectory
    /// ends at the escaping point, inclusive; for a bounded orbit it
    /// holds `max_iter` points that the caller must ignore.
    pub fn evaluate(&mut self, c: Complex<f64>) -> bool {
        self.trajectory.clear();
        self.escaped = false;
        if self.skip_interior && !maybe_outside(c) {
            return false;
        }

        let mut z = Complex::new(0.0_f64, 0.0_f64);
        for _ in 0..self.max_iter {
            z = z * z + c;
            self.trajectory.push(z);
            if z.norm_sqr() > ESCAPE_NORM_SQR {
                self.escaped = true;
                break;
            }
        }
        self.escaped
    }

    /// Whether the last evaluation escaped.
    pub fn escaped(&self) -> bool {
        self.escaped
    }

    /// The points visited by the last evaluation, z_1 onwards.
    pub fn trajectory(&self) -> &[Complex<f64>] {
        &self.trajectory
    }
}

/// One-shot form of the evaluator: returns the escape classification
/// and a freshly allocated trajectory.
pub fn evaluate(c: Complex<f64>, max_iter: usize) -> Result<(bool, Vec<Complex<f64>>)> {
    let mut orbit = Orbit::new(max_iter)?;
    let escaped = orbit.evaluate(c);
    Ok((escaped, orbit.trajectory))
}

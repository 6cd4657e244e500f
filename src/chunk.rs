// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A chunk is one worker's slice of the sample budget.  The worker
//! owns a private histogram and a private random stream, draws its
//! seeds, evaluates their orbits into a single reusable buffer, and
//! commits the escaping ones.  It touches nothing outside itself.

use num::Complex;
use rand::distributions::{Distribution, Uniform};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use errors::{Error, Result};
use histogram::Histogram;
use orbit::Orbit;
use planes::Bounds;

/// Draws seed points uniformly from a region of the complex plane.
/// The stream is keyed by the run's seed and separated by the chunk
/// index, so every chunk sees its own sequence no matter which thread
/// or in what order the chunks run.
pub struct SamplePoint {
    re: Uniform<f64>,
    im: Uniform<f64>,
    rng: ChaCha8Rng,
}

impl SamplePoint {
    /// Opens stream number `stream` under `seed`.
    pub fn new(bounds: &Bounds, seed: u64, stream: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(stream);
        SamplePoint {
            re: Uniform::new(bounds.x_min, bounds.x_max),
            im: Uniform::new(bounds.y_min, bounds.y_max),
            rng,
        }
    }

    /// The next seed point.
    pub fn get(&mut self) -> Complex<f64> {
        let re = self.re.sample(&mut self.rng);
        let im = self.im.sample(&mut self.rng);
        Complex::new(re, im)
    }
}

/// Everything a worker needs to know about its slice of the run.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ChunkJob {
    /// Iteration ceiling for every orbit.
    pub max_iter: usize,
    /// Number of seeds this chunk draws.
    pub samples: u64,
    /// Region both sampled and rendered.
    pub bounds: Bounds,
    /// Resolution of the histogram.
    pub grid_size: usize,
    /// Seed shared by every chunk of the channel.
    pub seed: u64,
    /// Position of this chunk; selects its random stream.
    pub index: usize,
    /// Whether to skip seeds known to lie inside the set.
    pub skip_interior: bool,
}

/// Runs one chunk to completion.  `stop` is consulted between samples,
/// never in the middle of an orbit; once it answers true the chunk
/// gives up and its histogram is thrown away.
pub fn run_chunk<F>(job: &ChunkJob, stop: F) -> Result<Histogram>
where
    F: Fn() -> bool,
{
    let mut histogram = Histogram::new(job.bounds, job.grid_size)?;
    let mut orbit = Orbit::new(job.max_iter)?.skip_interior(job.skip_interior);
    let mut seeds = SamplePoint::new(&job.bounds, job.seed, job.index as u64);

    let mut escaped = 0u64;
    let mut visits = 0u64;
    for _ in 0..job.samples {
        if stop() {
            debug!("chunk {} stopped early", job.index);
            return Err(Error::Cancelled);
        }
        if orbit.evaluate(seeds.get()) {
            escaped += 1;
            visits += histogram.record(&orbit) as u64;
        }
    }

    debug!(
        "chunk {} finished: {} samples, {} escaped, {} visits recorded",
        job.index, job.samples, escaped, visits
    );
    Ok(histogram)
}

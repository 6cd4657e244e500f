// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Run configuration.  Everything is checked up front by `validate`,
//! so that a bad value stops the run before a single sample is drawn.

use num_cpus;

use errors::{Error, Result};
use planes::Bounds;
use scheduler::ChannelJob;

/// Default resolution of the square output grid.
pub const DEFAULT_GRID_SIZE: usize = 4000;
/// Default number of seeds drawn per channel.
pub const DEFAULT_SAMPLES: u64 = 10_000_000;
/// Default iteration ceiling for a grayscale render.
pub const DEFAULT_ITERATIONS: usize = 1000;
/// A composite has at most one channel per color plane.
pub const MAX_CHANNELS: usize = 3;

/// Parameters of a complete render.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Resolution S of the S x S grid.
    pub grid_size: usize,
    /// Region of the complex plane sampled and rendered.
    pub bounds: Bounds,
    /// Seeds drawn for each channel.
    pub samples: u64,
    /// One iteration ceiling per channel, in output plane order.
    pub iterations: Vec<usize>,
    /// Chunks run concurrently within a channel.
    pub workers: usize,
    /// Seed for reproducible runs; drawn at random when absent.
    pub seed: Option<u64>,
    /// Skip seeds known to lie in the main cardioid or period-2 bulb.
    pub skip_interior: bool,
    /// Run the channels at the same time instead of one after another.
    pub concurrent_channels: bool,
}

impl Config {
    /// A configuration using every available core, a random seed, and
    /// the interior shortcut.
    pub fn new(grid_size: usize, bounds: Bounds, samples: u64, iterations: Vec<usize>) -> Self {
        Config {
            grid_size,
            bounds,
            samples,
            iterations,
            workers: num_cpus::get(),
            seed: None,
            skip_interior: true,
            concurrent_channels: false,
        }
    }

    /// Reports the first check that fails.
    pub fn validate(&self) -> Result<()> {
        if self.grid_size == 0 {
            return Err(Error::ZeroGridSize);
        }
        self.bounds.validate()?;
        if self.samples == 0 {
            return Err(Error::ZeroSamples);
        }
        if self.iterations.is_empty() {
            return Err(Error::NoChannels);
        }
        if self.iterations.len() > MAX_CHANNELS {
            return Err(Error::TooManyChannels(self.iterations.len()));
        }
        if let Some(channel) = self.iterations.iter().position(|&i| i == 0) {
            return Err(Error::ZeroIterations(channel));
        }
        if self.workers == 0 {
            return Err(Error::ZeroWorkers);
        }
        Ok(())
    }

    /// The job for channel `index` of a run seeded with `seed`.  Each
    /// channel samples independently, from its own seed.
    pub fn channel_job(&self, index: usize, seed: u64) -> ChannelJob {
        ChannelJob {
            max_iter: self.iterations[index],
            samples: self.samples,
            bounds: self.bounds,
            grid_size: self.grid_size,
            workers: self.workers,
            seed: seed.wrapping_add(index as u64),
            skip_interior: self.skip_interior,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new(
            DEFAULT_GRID_SIZE,
            Bounds::default(),
            DEFAULT_SAMPLES,
            vec![DEFAULT_ITERATIONS],
        )
    }
}

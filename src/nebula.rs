// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The Nebulabrot: several Buddhabrots of the same region, each run
//! with a different iteration ceiling, normalized separately and
//! stacked as the planes of one image.  Low ceilings pick out the
//! broad wisps, high ceilings the fine filaments.  With a single
//! channel this is just a grayscale Buddhabrot.

use crossbeam::thread::ScopedJoinHandle;
use rand::{thread_rng, Rng};
use std::time::Instant;

use config::{Config, MAX_CHANNELS};
use errors::{Error, Result};
use histogram::Histogram;
use normalize::{normalize, Plane};
use planes::Bounds;
use scheduler::{run_channel_cancellable, settle, CancelToken, TripOnPanic};

/// One complete accumulation run at a given iteration ceiling.
#[derive(Clone, Debug, PartialEq)]
pub struct Channel {
    /// The ceiling the histogram was accumulated with.
    pub max_iter: usize,
    /// The combined histogram of every chunk.
    pub histogram: Histogram,
}

/// One to three normalized planes of equal size, in channel order,
/// along with the region they depict so the presentation layer can
/// label its axes.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositeImage {
    bounds: Bounds,
    planes: Vec<Plane>,
}

impl CompositeImage {
    /// The region of the complex plane the image covers.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// The planes, one per channel.
    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    /// Width and height, in cells.
    pub fn size(&self) -> usize {
        self.planes[0].size()
    }

    /// Number of planes.
    pub fn depth(&self) -> usize {
        self.planes.len()
    }

    /// A single-plane image, meant for a colormap.
    pub fn is_grayscale(&self) -> bool {
        self.planes.len() == 1
    }

    /// The planes interleaved into a row-major W x H x C array.
    pub fn interleaved(&self) -> Vec<f64> {
        let depth = self.depth();
        let cells = self.size() * self.size();
        let mut out = Vec::with_capacity(cells * depth);
        for cell in 0..cells {
            for plane in &self.planes {
                out.push(plane.values()[cell]);
            }
        }
        out
    }
}

/// Normalizes each channel on its own and stacks the results.  The
/// channels must agree on region and resolution.
pub fn composite(channels: &[Channel]) -> Result<CompositeImage> {
    let first = match channels.first() {
        Some(first) => first,
        None => return Err(Error::NoChannels),
    };
    if channels.len() > MAX_CHANNELS {
        return Err(Error::TooManyChannels(channels.len()));
    }
    if let Some(odd) = channels
        .iter()
        .find(|c| c.histogram.plane() != first.histogram.plane())
    {
        return Err(Error::Mismatch(format!(
            "channel max_iter={} does not cover the same grid as max_iter={}",
            odd.max_iter, first.max_iter
        )));
    }

    Ok(CompositeImage {
        bounds: first.histogram.bounds(),
        planes: channels.iter().map(|c| normalize(&c.histogram)).collect(),
    })
}

/// Accumulates every channel the configuration asks for, either one
/// after another or all at once.  `seed` keys every random stream.
pub fn run_channels(config: &Config, seed: u64, cancel: &CancelToken) -> Result<Vec<Channel>> {
    config.validate()?;
    let jobs: Vec<_> = (0..config.iterations.len())
        .map(|index| config.channel_job(index, seed))
        .collect();

    if !config.concurrent_channels {
        return jobs
            .iter()
            .map(|job| {
                run_channel_cancellable(job, cancel).map(|histogram| Channel {
                    max_iter: job.max_iter,
                    histogram,
                })
            })
            .collect();
    }

    // A failed channel stops its siblings; the caller's token still
    // reaches all of them through the child.
    let abort = cancel.child();
    let outcomes: Vec<Result<Histogram>> = crossbeam::scope(|spawner| {
        let handles: Vec<ScopedJoinHandle<Result<Histogram>>> = jobs
            .iter()
            .map(|job| {
                let abort = &abort;
                spawner.spawn(move |_| {
                    let _guard = TripOnPanic(abort);
                    let outcome = run_channel_cancellable(job, abort);
                    if outcome.is_err() {
                        abort.cancel();
                    }
                    outcome
                })
            })
            .collect();
        handles
            .into_iter()
            .enumerate()
            .map(|(index, handle)| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(Error::WorkerFailed(index)))
            })
            .collect()
    })
    .map_err(|_| Error::WorkerFailed(0))?;

    Ok(jobs
        .iter()
        .zip(settle(outcomes)?)
        .map(|(job, histogram)| Channel {
            max_iter: job.max_iter,
            histogram,
        })
        .collect())
}

/// Runs the whole configuration to completion.
pub fn render(config: &Config) -> Result<CompositeImage> {
    render_cancellable(config, &CancelToken::new())
}

/// Runs the whole configuration, giving up as soon as `cancel` is
/// tripped.  A run without a configured seed draws one and logs it so
/// the image can be reproduced.
pub fn render_cancellable(config: &Config, cancel: &CancelToken) -> Result<CompositeImage> {
    config.validate()?;
    let seed = match config.seed {
        Some(seed) => seed,
        None => thread_rng().gen(),
    };
    info!(
        "rendering {0}x{0} over {1:?}: {2} samples per channel, ceilings {3:?}, {4} workers, seed {5}",
        config.grid_size, config.bounds, config.samples, config.iterations, config.workers, seed
    );

    let started = Instant::now();
    let channels = run_channels(config, seed, cancel)?;
    let image = composite(&channels)?;
    info!(
        "rendered {} channel(s) in {:.2?}",
        image.depth(),
        started.elapsed()
    );
    Ok(image)
}

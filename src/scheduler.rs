// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Fans a channel's sample budget out across worker threads and sums
//! what comes back.  Each worker builds its own histogram; the only
//! synchronization is the join at the end of the scope, and nothing is
//! reduced until every worker has returned.

use crossbeam::thread::ScopedJoinHandle;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use chunk::{run_chunk, ChunkJob};
use errors::{Error, Result};
use histogram::Histogram;
use planes::Bounds;

/// A cooperative stop signal.  Clones share the same flag, so one can
/// be handed to another thread and tripped from there; workers check
/// it between samples.  A child token also reports its parent's flag,
/// but tripping the child leaves the parent alone.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    parent: Option<Box<CancelToken>>,
}

impl CancelToken {
    /// A token that has not been tripped.
    pub fn new() -> Self {
        CancelToken::default()
    }

    /// A fresh token that is also tripped whenever this one is.
    pub fn child(&self) -> Self {
        CancelToken {
            flag: Arc::new(AtomicBool::new(false)),
            parent: Some(Box::new(self.clone())),
        }
    }

    /// Asks every worker watching this token to stop.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether `cancel` has been called on this token, a clone, or
    /// any of its parents.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
            || self.parent.as_ref().map_or(false, |p| p.is_cancelled())
    }
}

/// Trips a token if the thread holding it unwinds, so siblings stop
/// as soon as a worker panics instead of when it is joined.
pub(crate) struct TripOnPanic<'a>(pub(crate) &'a CancelToken);

impl<'a> Drop for TripOnPanic<'a> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.cancel();
        }
    }
}

/// Collects the outcomes of sibling units of work.  The first failure
/// other than a cancellation wins, in unit order, since siblings that
/// were told to stop report `Cancelled` after the real failure.
pub(crate) fn settle<T>(outcomes: Vec<Result<T>>) -> Result<Vec<T>> {
    let mut done = Vec::with_capacity(outcomes.len());
    let mut cancelled = false;
    for outcome in outcomes {
        match outcome {
            Ok(value) => done.push(value),
            Err(Error::Cancelled) => cancelled = true,
            Err(err) => return Err(err),
        }
    }
    if cancelled {
        return Err(Error::Cancelled);
    }
    Ok(done)
}

/// One accumulation run at a single iteration ceiling.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ChannelJob {
    /// Iteration ceiling.
    pub max_iter: usize,
    /// Total seeds drawn across all workers.
    pub samples: u64,
    /// Region both sampled and rendered.
    pub bounds: Bounds,
    /// Resolution of the histogram.
    pub grid_size: usize,
    /// Number of chunks run concurrently.
    pub workers: usize,
    /// Seed from which every chunk's stream is derived.
    pub seed: u64,
    /// Whether to skip seeds known to lie inside the set.
    pub skip_interior: bool,
}

/// Splits `total` into `parts` sizes differing by at most one, the
/// larger ones first.
pub fn partition(total: u64, parts: usize) -> Vec<u64> {
    if parts == 0 {
        return vec![];
    }
    let base = total / parts as u64;
    let remainder = total % parts as u64;
    (0..parts as u64)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect()
}

/// Runs a channel without any outside means of stopping it.
pub fn run_channel(job: &ChannelJob) -> Result<Histogram> {
    run_channel_cancellable(job, &CancelToken::new())
}

/// Runs every chunk of the channel concurrently and reduces their
/// histograms.  If any chunk fails, the others are told to stop, every
/// partial histogram is dropped, and the first failure, in chunk
/// order, is returned.  Tripping `cancel` yields `Error::Cancelled`.
pub fn run_channel_cancellable(job: &ChannelJob, cancel: &CancelToken) -> Result<Histogram> {
    run_chunks(job, cancel, |chunk, stop| run_chunk(chunk, stop))
}

fn run_chunks<W>(job: &ChannelJob, cancel: &CancelToken, work: W) -> Result<Histogram>
where
    W: Fn(&ChunkJob, &dyn Fn() -> bool) -> Result<Histogram> + Sync,
{
    if job.workers == 0 {
        return Err(Error::ZeroWorkers);
    }
    if job.samples == 0 {
        return Err(Error::ZeroSamples);
    }
    if job.max_iter == 0 {
        return Err(Error::ZeroCeiling);
    }
    job.bounds.validate()?;
    if job.grid_size == 0 {
        return Err(Error::ZeroGridSize);
    }

    // Never start more chunks than there are samples to draw.
    let workers = if (job.workers as u64) > job.samples {
        job.samples as usize
    } else {
        job.workers
    };
    let chunks: Vec<ChunkJob> = partition(job.samples, workers)
        .into_iter()
        .enumerate()
        .map(|(index, samples)| ChunkJob {
            max_iter: job.max_iter,
            samples,
            bounds: job.bounds,
            grid_size: job.grid_size,
            seed: job.seed,
            index,
            skip_interior: job.skip_interior,
        })
        .collect();
    debug!(
        "channel max_iter={}: {} samples across {} chunks",
        job.max_iter, job.samples, workers
    );

    let started = Instant::now();
    let abort = cancel.child();
    let work = &work;
    let outcomes: Vec<Result<Histogram>> = crossbeam::scope(|spawner| {
        let handles: Vec<ScopedJoinHandle<Result<Histogram>>> = chunks
            .iter()
            .map(|chunk| {
                let abort = &abort;
                spawner.spawn(move |_| {
                    let _guard = TripOnPanic(abort);
                    let outcome = work(chunk, &|| abort.is_cancelled());
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

    let histograms = match settle(outcomes) {
        Ok(histograms) => histograms,
        Err(Error::Cancelled) => {
            warn!("channel max_iter={} cancelled", job.max_iter);
            return Err(Error::Cancelled);
        }
        Err(err) => {
            warn!("channel max_iter={} failed: {}", job.max_iter, err);
            return Err(err);
        }
    };

    let combined = Histogram::reduce(histograms)?;
    info!(
        "channel max_iter={} finished in {:.2?}: {} visits recorded",
        job.max_iter,
        started.elapsed(),
        combined.total()
    );
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn job() -> ChannelJob {
        ChannelJob {
            max_iter: 50,
            samples: 10_000,
            bounds: Bounds::default(),
            grid_size: 100,
            workers: 4,
            seed: 1234,
            skip_interior: true,
        }
    }

    #[test]
    fn partition_spreads_the_remainder() {
        assert_eq!(partition(10, 3), vec![4, 3, 3]);
        assert_eq!(partition(9, 3), vec![3, 3, 3]);
        assert_eq!(partition(2, 4), vec![1, 1, 0, 0]);
        assert_eq!(partition(7, 0), Vec::<u64>::new());
        assert_eq!(partition(1_000_003, 7).iter().sum::<u64>(), 1_000_003);
    }

    #[test]
    fn channel_is_reproducible() {
        let a = run_channel(&job()).unwrap();
        let b = run_channel(&job()).unwrap();
        assert_eq!(a, b);
        assert!(a.total() > 0);
        assert!(a.total() < 10_000 * 50);
    }

    #[test]
    fn channel_equals_the_sum_of_its_chunks() {
        let job = job();
        let chunks: Vec<Histogram> = partition(job.samples, job.workers)
            .into_iter()
            .enumerate()
            .map(|(index, samples)| {
                run_chunk(
                    &ChunkJob {
                        max_iter: job.max_iter,
                        samples,
                        bounds: job.bounds,
                        grid_size: job.grid_size,
                        seed: job.seed,
                        index,
                        skip_interior: job.skip_interior,
                    },
                    || false,
                )
                .unwrap()
            })
            .collect();
        let sequential = Histogram::reduce(chunks.into_iter().rev()).unwrap();
        assert_eq!(run_channel(&job).unwrap(), sequential);
    }

    #[test]
    fn more_workers_than_samples() {
        let h = run_channel(&ChannelJob {
            samples: 3,
            workers: 16,
            ..job()
        })
        .unwrap();
        assert_eq!(h.size(), 100);
    }

    #[test]
    fn different_seeds_differ() {
        let a = run_channel(&job()).unwrap();
        let b = run_channel(&ChannelJob { seed: 4321, ..job() }).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn configuration_errors_are_reported_before_running() {
        match run_channel(&ChannelJob { workers: 0, ..job() }) {
            Err(Error::ZeroWorkers) => {}
            other => panic!("unexpected {:?}", other),
        }
        match run_channel(&ChannelJob { samples: 0, ..job() }) {
            Err(Error::ZeroSamples) => {}
            other => panic!("unexpected {:?}", other),
        }
        match run_channel(&ChannelJob { grid_size: 0, ..job() }) {
            Err(Error::ZeroGridSize) => {}
            other => panic!("unexpected {:?}", other),
        }
        match run_channel(&ChannelJob { max_iter: 0, ..job() }) {
            Err(Error::ZeroCeiling) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn child_token_follows_its_parent() {
        let parent = CancelToken::new();
        let child = parent.child();
        child.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());

        let other = parent.child();
        assert!(!other.is_cancelled());
        parent.cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn real_failures_outrank_cancellations() {
        let outcomes: Vec<Result<u32>> = vec![
            Err(Error::Cancelled),
            Err(Error::ResourceExhausted(9)),
            Ok(1),
        ];
        match settle(outcomes) {
            Err(Error::ResourceExhausted(9)) => {}
            other => panic!("unexpected {:?}", other),
        }
        match settle(vec![Ok(1), Err(Error::Cancelled)]) {
            Err(Error::Cancelled) => {}
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(settle(vec![Ok(1), Ok(2)]).unwrap(), vec![1, 2]);
    }

    #[test]
    fn panicking_chunk_stops_its_siblings() {
        // Chunk 0 spins until told to stop; chunk 1 panics.  Were the
        // abort only tripped at join time, chunk 0 would never return.
        let job = ChannelJob { workers: 2, ..job() };
        let outcome = run_chunks(&job, &CancelToken::new(), |chunk, stop| {
            if chunk.index == 1 {
                panic!("chunk {} gave up", chunk.index);
            }
            let started = Instant::now();
            while !stop() {
                if started.elapsed() > Duration::from_secs(10) {
                    return Err(Error::Mismatch("never told to stop".to_string()));
                }
                thread::yield_now();
            }
            Err(Error::Cancelled)
        });
        match outcome {
            Err(Error::WorkerFailed(1)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unallocatable_ceiling_is_an_error_not_an_abort() {
        let outcome = run_channel(&ChannelJob {
            max_iter: 1 << 42,
            samples: 4,
            bounds: Bounds::new(1.0, 2.0, 1.0, 2.0).unwrap(),
            grid_size: 8,
            workers: 1,
            ..job()
        });
        match outcome {
            Err(Error::ResourceExhausted(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn cancelled_before_start() {
        let cancel = CancelToken::new();
        cancel.cancel();
        match run_channel_cancellable(&job(), &cancel) {
            Err(Error::Cancelled) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn cancelled_from_another_thread() {
        let cancel = CancelToken::new();
        let remote = cancel.clone();
        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            remote.cancel();
        });
        let outcome = run_channel_cancellable(
            &ChannelJob {
                max_iter: 100_000,
                samples: 1_000_000_000,
                skip_interior: false,
                ..job()
            },
            &cancel,
        );
        stopper.join().unwrap();
        match outcome {
            Err(Error::Cancelled) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn oversized_grid_is_reported_not_aborted() {
        match run_channel(&ChannelJob {
            grid_size: usize::max_value() / 2,
            workers: 2,
            ..job()
        }) {
            Err(Error::ResourceExhausted(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }
}

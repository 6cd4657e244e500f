extern crate nebulabrot;
extern crate num;

use nebulabrot::{
    evaluate, normalize, render, run_channel, run_chunk, Bounds, ChannelJob, ChunkJob, Config,
    Histogram,
};
use num::Complex;

fn reference_job() -> ChannelJob {
    ChannelJob {
        max_iter: 50,
        samples: 10_000,
        bounds: Bounds::default(),
        grid_size: 100,
        workers: 4,
        seed: 2019,
        skip_interior: false,
    }
}

#[test]
fn reference_channel_is_reproducible_and_plausible() {
    let first = run_channel(&reference_job()).unwrap();
    let second = run_channel(&reference_job()).unwrap();
    assert_eq!(first.counts(), second.counts());
    assert_eq!(first.total(), second.total());
    assert!(first.total() > 0);
    assert!(first.total() < 10_000 * 50);
}

#[test]
fn worker_count_is_part_of_the_reproducible_configuration() {
    let three = run_channel(&ChannelJob {
        workers: 3,
        ..reference_job()
    })
    .unwrap();
    let again = run_channel(&ChannelJob {
        workers: 3,
        ..reference_job()
    })
    .unwrap();
    assert_eq!(three, again);
}

#[test]
fn counters_never_decrease_as_chunks_accumulate() {
    let job = reference_job();
    let mut running = Histogram::new(job.bounds, job.grid_size).unwrap();
    for index in 0..4 {
        let chunk = run_chunk(
            &ChunkJob {
                max_iter: job.max_iter,
                samples: 500,
                bounds: job.bounds,
                grid_size: job.grid_size,
                seed: job.seed,
                index,
                skip_interior: false,
            },
            || false,
        )
        .unwrap();
        let before = running.clone();
        running.merge(&chunk).unwrap();
        assert!(before
            .counts()
            .iter()
            .zip(running.counts())
            .all(|(old, new)| new >= old));
    }
}

#[test]
fn bounded_and_escaping_seeds() {
    let mut histogram = Histogram::new(Bounds::default(), 100).unwrap();
    let (escaped, trajectory) = evaluate(Complex::new(0.0, 0.0), 1000).unwrap();
    histogram.commit(&trajectory, escaped);
    assert_eq!(histogram.total(), 0);

    let mut wide = Histogram::new(Bounds::new(-4.0, 4.0, -4.0, 4.0).unwrap(), 100).unwrap();
    let (escaped, trajectory) = evaluate(Complex::new(3.0, 0.0), 1000).unwrap();
    wide.commit(&trajectory, escaped);
    assert_eq!(wide.total(), 1);
    assert_eq!(wide.counts().iter().filter(|&&c| c > 0).count(), 1);
}

#[test]
fn empty_histogram_normalizes_cleanly() {
    let plane = normalize(&Histogram::new(Bounds::default(), 50).unwrap());
    assert!(plane.values().iter().all(|&v| v == 0.0 && !v.is_nan()));
}

#[test]
fn nebulabrot_planes_share_dimensions() {
    let config = Config {
        workers: 2,
        seed: Some(8),
        ..Config::new(40, Bounds::default(), 3_000, vec![20, 100, 400])
    };
    let image = render(&config).unwrap();
    assert_eq!(image.depth(), 3);
    assert!(image.planes().iter().all(|p| p.size() == 40));
    assert_eq!(image.interleaved().len(), 40 * 40 * 3);
}

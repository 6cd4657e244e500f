// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The visit-count grid.  Each worker owns one of these outright for
//! the whole of its chunk, so the counters are plain integers rather
//! than atomics; the scheduler sums the finished grids afterwards.

use itertools::Itertools;
use num::Complex;

use errors::{Error, Result};
use orbit::Orbit;
use planes::{Bounds, Cell, PlaneMapper};

/// A square grid of visit counters over a region of the complex
/// plane.  Counters saturate at `u32::MAX` rather than wrap.
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram {
    plane: PlaneMapper,
    counts: Vec<u32>,
}

impl Histogram {
    /// A zero-filled `size` x `size` grid over `bounds`.
    pub fn new(bounds: Bounds, size: usize) -> Result<Histogram> {
        Histogram::with_plane(PlaneMapper::new(bounds, size)?)
    }

    /// A zero-filled grid for an existing mapping.  The allocation is
    /// fallible so that a grid too large for memory is reported
    /// instead of aborting the process.
    pub fn with_plane(plane: PlaneMapper) -> Result<Histogram> {
        let cells = plane
            .cells()
            .ok_or(Error::ResourceExhausted(usize::max_value()))?;
        let mut counts: Vec<u32> = Vec::new();
        counts
            .try_reserve_exact(cells)
            .map_err(|_| Error::ResourceExhausted(cells))?;
        counts.resize(cells, 0);
        Ok(Histogram { plane, counts })
    }

    /// The mapping between the grid and the complex plane.
    pub fn plane(&self) -> &PlaneMapper {
        &self.plane
    }

    /// The region the grid covers.
    pub fn bounds(&self) -> Bounds {
        self.plane.bounds
    }

    /// Number of cells along each side.
    pub fn size(&self) -> usize {
        self.plane.size
    }

    /// The counters, row-major, rows running along the imaginary axis.
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// The counter for a single cell.
    pub fn get(&self, cell: Cell) -> Option<u32> {
        let Cell(left, top) = cell;
        if left >= self.plane.size || top >= self.plane.size {
            return None;
        }
        Some(self.counts[top * self.plane.size + left])
    }

    /// Sum of every counter.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| u64::from(c)).sum()
    }

    /// Applies a speculatively computed trajectory.  Bounded orbits are
    /// discarded whole, including any points that happened to land on
    /// the grid; escaping orbits add one visit per point, with points
    /// off the grid skipped individually.  Returns the number of
    /// visits recorded.
    pub fn commit(&mut self, trajectory: &[Complex<f64>], escaped: bool) -> usize {
        if !escaped {
            return 0;
        }
        let mut recorded = 0;
        for point in trajectory {
            if let Some(offset) = self.plane.point_to_offset(point) {
                let count = &mut self.counts[offset];
                *count = count.saturating_add(1);
                recorded += 1;
            }
        }
        recorded
    }

    /// Commits the last evaluation of an orbit.
    pub fn record(&mut self, orbit: &Orbit) -> usize {
        self.commit(orbit.trajectory(), orbit.escaped())
    }

    /// Adds another grid into this one, cell by cell.  Both grids must
    /// cover the same region at the same resolution.
    pub fn merge(&mut self, other: &Histogram) -> Result<()> {
        if self.plane != other.plane {
            return Err(Error::Mismatch(format!(
                "cannot merge a {0}x{0} grid over {1:?} into a {2}x{2} grid over {3:?}",
                other.plane.size, other.plane.bounds, self.plane.size, self.plane.bounds
            )));
        }
        for (mine, theirs) in self.counts.iter_mut().zip_eq(other.counts.iter()) {
            *mine = mine.saturating_add(*theirs);
        }
        Ok(())
    }

    /// Sums a collection of grids into one.  Because the sum is
    /// associative and commutative, the order of the collection does
    /// not matter.
    pub fn reduce<I>(histograms: I) -> Result<Histogram>
    where
        I: IntoIterator<Item = Histogram>,
    {
        let mut histograms = histograms.into_iter();
        let mut combined = histograms
            .next()
            .ok_or_else(|| Error::Mismatch("no histograms to reduce".to_string()))?;
        for histogram in histograms {
            combined.merge(&histogram)?;
        }
        Ok(combined)
    }
}

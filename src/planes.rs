// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the Bounds and PlaneMapper structs, which describe a
//! relationship between a square grid of cells with an origin at 0,0
//! and a rectangle on the complex plane defined by its minimum and
//! maximum real and imaginary extents.
use num::Complex;

use errors::{Error, Result};

/// The region of the complex plane being sampled and rendered,
/// treating the real part as the x-component and the imaginary part
/// as the y-component.  Fixed for the lifetime of a run.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds {
    /// Smallest real part.
    pub x_min: f64,
    /// Largest real part.
    pub x_max: f64,
    /// Smallest imaginary part.
    pub y_min: f64,
    /// Largest imaginary part.
    pub y_max: f64,
}

impl Bounds {
    /// Constructor.  Refuses regions that are inverted, empty, or
    /// reach into infinity.
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Result<Bounds> {
        let bounds = Bounds {
            x_min,
            x_max,
            y_min,
            y_max,
        };
        bounds.validate()?;
        Ok(bounds)
    }

    /// Builds the bounds out of the left-lower and right-upper
    /// corners, the way the command line describes them.
    pub fn from_corners(leftlower: Complex<f64>, rightupper: Complex<f64>) -> Result<Bounds> {
        Bounds::new(leftlower.re, rightupper.re, leftlower.im, rightupper.im)
    }

    /// Checks the ordering and finiteness of both axes.
    pub fn validate(&self) -> Result<()> {
        let all = [self.x_min, self.x_max, self.y_min, self.y_max];
        if all.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidBounds(
                "all four extents must be finite numbers".to_string(),
            ));
        }
        if !(self.x_min < self.x_max) {
            return Err(Error::InvalidBounds(format!(
                "x_min ({}) must be less than x_max ({})",
                self.x_min, self.x_max
            )));
        }
        if !(self.y_min < self.y_max) {
            return Err(Error::InvalidBounds(format!(
                "y_min ({}) must be less than y_max ({})",
                self.y_min, self.y_max
            )));
        }
        Ok(())
    }

    /// Extent along the real axis.
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    /// Extent along the imaginary axis.
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Bounds {
            x_min: -2.0,
            x_max: 2.0,
            y_min: -2.0,
            y_max: 2.0,
        }
    }
}

/// Describes the column and row of a cell in the grid.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Cell(pub usize, pub usize);

/// Maps points between the complex rectangle and a `size` x `size`
/// grid of cells.  The cell size is derived once, per axis, as
/// (max - min) / size.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlaneMapper {
    /// The region of the complex plane.
    pub bounds: Bounds,
    /// Number of cells along each side of the grid.
    pub size: usize,
    cell_size: (f64, f64),
}

impl PlaneMapper {
    /// Constructor.  Takes the region and the resolution of the grid.
    pub fn new(bounds: Bounds, size: usize) -> Result<PlaneMapper> {
        bounds.validate()?;
        if size == 0 {
            return Err(Error::ZeroGridSize);
        }
        Ok(PlaneMapper {
            bounds,
            size,
            cell_size: (
                bounds.width() / (size as f64),
                bounds.height() / (size as f64),
            ),
        })
    }

    /// The total number of cells in the grid, or None if it does not
    /// fit in a `usize`.  Used to calculate memory needs.
    pub fn cells(&self) -> Option<usize> {
        self.size.checked_mul(self.size)
    }

    /// The width and height of a single cell on the complex plane.
    pub fn cell_size(&self) -> (f64, f64) {
        self.cell_size
    }

    /// Given a complex number, return the cell it falls in, or None if
    /// it falls outside the grid.  NaN coordinates fall outside.
    pub fn cell_of(&self, point: &Complex<f64>) -> Option<Cell> {
        let left = ((point.re - self.bounds.x_min) / self.cell_size.0).floor();
        let top = ((point.im - self.bounds.y_min) / self.cell_size.1).floor();
        let size = self.size as f64;
        if !(left >= 0.0 && left < size && top >= 0.0 && top < size) {
            return None;
        }
        Some(Cell(left as usize, top as usize))
    }

    /// Given a cell, return the complex number at its center.
    pub fn cell_center(&self, cell: &Cell) -> Complex<f64> {
        Complex::new(
            self.bounds.x_min + ((cell.0 as f64) + 0.5) * self.cell_size.0,
            self.bounds.y_min + ((cell.1 as f64) + 0.5) * self.cell_size.1,
        )
    }

    /// Since the histogram is a single linear buffer, the orbit's
    /// points are mapped first to a cell and then to the offset of
    /// that cell from the root of the buffer.  Rows run along the
    /// imaginary axis.
    pub fn point_to_offset(&self, point: &Complex<f64>) -> Option<usize> {
        self.cell_of(point).map(|Cell(left, top)| top * self.size + left)
    }
}

#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Buddhabrot and Nebulabrot renderer
//!
//! The Buddhabrot (and the Nebulabrot) are variants of the Mandelbrot
//! set that explore "what's in the black heart" of the Mandelbrot.
//! The Mandelbrot takes a point on the complex plane and repeatedly
//! squares it and adds the original point back, measuring how quickly
//! the result goes to infinity.
//!
//! Each iteration creates a new complex number that itself may be
//! used as a coordinate on the complex plane.  By mapping that
//! coordinate to the nearest cell of a grid and incrementing that
//! cell by one, we can plot the "orbit" of a point.  The Buddhabrot
//! draws random seed points, keeps only the orbits that eventually
//! escape, and plots every point those orbits pass through.
//!
//! The Nebulabrot does this several times with different iteration
//! ceilings and stacks the results as the red, green, and blue
//! planes of a single image.
//!
//! The work is split into chunks, each with its own histogram and
//! its own seeded random stream, run on as many threads as asked
//! for, and summed at the end; the same seed and worker count always
//! produce the same image.

extern crate crossbeam;
#[macro_use]
extern crate failure;
extern crate image;
extern crate itertools;
#[macro_use]
extern crate log;
extern crate num;
extern crate num_cpus;
extern crate rand;
extern crate rand_chacha;

#[cfg(test)]
extern crate tempfile;

pub mod chunk;
pub mod config;
pub mod errors;
pub mod export;
pub mod histogram;
pub mod nebula;
pub mod normalize;
pub mod orbit;
pub mod planes;
pub mod scheduler;

pub use chunk::{run_chunk, ChunkJob};
pub use config::Config;
pub use errors::{Error, Result};
pub use export::{write_image, Colormap};
pub use histogram::Histogram;
pub use nebula::{composite, render, render_cancellable, Channel, CompositeImage};
pub use normalize::{normalize, Plane};
pub use orbit::{evaluate, Orbit};
pub use planes::{Bounds, Cell, PlaneMapper};
pub use scheduler::{run_channel, run_channel_cancellable, CancelToken, ChannelJob};

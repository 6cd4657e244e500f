// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Everything that can stop a render.  Configuration errors are caught
//! before any sampling starts; the rest surface from the middle of a
//! run, and in every case no partial histogram is handed back.

use std::io;
use std::result;

/// The failure taxonomy of the renderer.
#[derive(Debug, Fail)]
pub enum Error {
    /// The grid resolution was zero.
    #[fail(display = "grid size must be a positive integer")]
    ZeroGridSize,

    /// The per-channel sample budget was zero.
    #[fail(display = "sample count must be a positive integer")]
    ZeroSamples,

    /// One of the channel iteration ceilings was zero.
    #[fail(display = "iteration ceiling for channel {} must be a positive integer", _0)]
    ZeroIterations(usize),

    /// A single channel was asked to run with a zero iteration ceiling.
    #[fail(display = "iteration ceiling must be a positive integer")]
    ZeroCeiling,

    /// The worker count was zero.
    #[fail(display = "worker count must be a positive integer")]
    ZeroWorkers,

    /// No iteration ceilings were supplied.
    #[fail(display = "at least one iteration ceiling is required")]
    NoChannels,

    /// More channels than an image has color planes.
    #[fail(display = "at most 3 channels are supported, got {}", _0)]
    TooManyChannels(usize),

    /// The region of the complex plane is inverted, empty, or not finite.
    #[fail(display = "invalid bounds: {}", _0)]
    InvalidBounds(String),

    /// A histogram or trajectory buffer could not be allocated.
    #[fail(display = "could not allocate a buffer of {} elements", _0)]
    ResourceExhausted(usize),

    /// A worker thread died before finishing its chunk.
    #[fail(display = "worker for chunk {} failed to complete", _0)]
    WorkerFailed(usize),

    /// The run was interrupted before every sample was drawn.
    #[fail(display = "render cancelled before completion")]
    Cancelled,

    /// Two grids that should line up do not.
    #[fail(display = "grid mismatch: {}", _0)]
    Mismatch(String),

    /// The image collaborator could not write its output.
    #[fail(display = "could not write image: {}", _0)]
    Io(#[cause] io::Error),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

/// Shorthand used throughout the crate.
pub type Result<T> = result::Result<T, Error>;

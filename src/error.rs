//! This module defines the error types used throughout the crate.
//!
//! Only recoverable conditions live here. A broken internal invariant inside the solver (a twist
//! sequence that does not do what it was built to do, a rotation that cannot be found) is a panic,
//! and the [`solve`](crate::Puzzle::solve) wrapper is the only place that ever catches one.

use thiserror::Error;

/// Convenience alias used by every fallible operation in the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong when talking to the solver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The string doesn't describe any n^d puzzle, or it does but the stickers can't all be
    /// assigned a unique home.
    #[error("insane puzzle: {0}")]
    InsanePuzzle(String),
    /// The puzzle is a valid configuration that can't be reached from solved.
    #[error("puzzle is not solvable")]
    Unsolvable,
    /// The solver only knows how to do 1^d, 2^d and 3^d puzzles, and scrambling needs d >= 3.
    #[error("unsupported puzzle size {n}^{d}")]
    UnsupportedSize {
        /// Side length
        n: usize,
        /// Number of dimensions
        d: usize,
    },
    /// A puzzle of the requested size would be absurdly large (or empty).
    #[error("can't make a {n}^{d} puzzle")]
    TooBig {
        /// Side length
        n: usize,
        /// Number of dimensions
        d: usize,
    },
    /// A move token couldn't be understood.
    #[error("bad move {0:?}")]
    BadMove(String),
    /// Even sized puzzles keep their first cubie fixed, so a twist moving it has no name.
    #[error("twist {0} moves the first cubie of an even puzzle")]
    MovesFirstCubie(String),
    /// Scramble lengths must satisfy `0 <= min <= max`.
    #[error("bad scramble range {min}..={max}")]
    BadScrambleRange {
        /// Minimum number of twists
        min: i64,
        /// Maximum number of twists
        max: i64,
    },
    /// Orientation was requested for a cubie type that isn't being positioned.
    #[error("orient mask {orient:#b} is not a subset of position mask {position:#b}")]
    BadMask {
        /// Cubie types to position
        position: u32,
        /// Cubie types to orient
        orient: u32,
    },
    /// A string handed to [`reformat`](crate::reformat) doesn't have as many stickers as the
    /// template.
    #[error("expected {expected} stickers to match the template, found {found}")]
    TemplateMismatch {
        /// Number of stickers in the template
        expected: usize,
        /// Number of stickers in the string
        found: usize,
    },
    /// Reading a puzzle from a stream failed.
    #[error("reading puzzle: {0}")]
    Io(String),
    /// The solvability check said yes but the solver fell over. This is a bug.
    #[error("solver failed on a puzzle it predicted solvable: {0}")]
    SolverFailedOnSolvable(String),
    /// The solvability check said no but the solver solved it anyway. This is a bug.
    #[error("solver solved a puzzle it predicted unsolvable")]
    SolvedUnsolvable,
}

//! A solver for `n^d` Rubik's cubes with `n <= 3` and any number of dimensions `d`.
//!
//! Puzzles are written as strings with one character per sticker, and solutions as strings of
//! twists named by sticker colors. For example the 3^3 puzzle
//!
//! ```text
//! AAaAAaAAabBBcCcCcCBbbBBBCcCcCcbbbbBBCcCcCcBbbAaaAaaAaa
//! ```
//!
//! is solved by `aBC aBC ABC ABC cBA cBA ABC ABC cBA cBA aCB aCB`. The solver isn't after short
//! solutions. It puts each type of cubie in place with 3-cycles and then turns them the right way
//! round in pairs, which works the same way in any number of dimensions.
//!
//! ```
//! use ndsolve::{apply, is_solved, new_puzzle, solve};
//!
//! let solved = new_puzzle(3, 4)?;
//! let twisted = apply("ACB BDa:3", &solved)?;
//! let moves = solve(&twisted)?;
//! assert!(is_solved(&apply(&moves, &twisted)?)?);
//! # Ok::<(), ndsolve::Error>(())
//! ```

#![deny(missing_docs)]

pub mod coord;
pub mod error;
pub mod grid;
pub mod io;
pub mod moves;
mod puzzle;
pub mod rotation;
mod solver;
pub mod target;

pub use error::{Error, Result};
pub use io::{puzzle_d, puzzle_n, reformat};
pub use puzzle::{
    apply, is_sane, is_solvable, is_solved, new_puzzle, scramble, solve, Puzzle, SolveOptions,
};
pub use solver::Progress;

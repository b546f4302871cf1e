//! Colored puzzles and the operations on them.

use std::any::Any;
use std::fmt;
use std::io::BufRead;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;

use log::{debug, info, warn};
use rand::Rng;
use rustc_hash::FxHashMap;

#[cfg(test)]
use proptest_derive::Arbitrary;

use crate::coord::Shape;
use crate::error::{Error, Result};
use crate::io;
use crate::moves::{keep_first_cubie_fixed, random_twist, Twist, TwistCache};
use crate::solver::{self, Progress};
use crate::target::{self, Stickers, TargetMap};

/// Which parts of the puzzle to solve, and what to do about puzzles that look unsolvable.
///
/// Bit `k` of each mask stands for the cubies with `k` stickers. Orienting a cubie type only makes
/// sense once it's positioned, so `orient_mask` has to be a subset of `position_mask`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(test, derive(Arbitrary))]
pub struct SolveOptions {
    /// Cubie types to put in place
    #[cfg_attr(test, proptest(strategy = "0u32..16"))]
    pub position_mask: u32,
    /// Cubie types to turn the right way round once they're in place
    #[cfg_attr(test, proptest(strategy = "0u32..16"))]
    pub orient_mask: u32,
    /// Try solving even when the puzzle doesn't look solvable
    pub attempt_unsolvable: bool,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            position_mask: !0,
            orient_mask: !0,
            attempt_unsolvable: false,
        }
    }
}

impl SolveOptions {
    /// Position only the given cubie types.
    pub fn with_position_mask(self, position_mask: u32) -> Self {
        Self {
            position_mask,
            ..self
        }
    }

    /// Orient only the given cubie types.
    pub fn with_orient_mask(self, orient_mask: u32) -> Self {
        Self {
            orient_mask,
            ..self
        }
    }

    /// Whether to try solving puzzles that look unsolvable.
    pub fn with_attempt_unsolvable(self, attempt_unsolvable: bool) -> Self {
        Self {
            attempt_unsolvable,
            ..self
        }
    }

    fn check(&self) -> Result<()> {
        if self.orient_mask & !self.position_mask != 0 {
            return Err(Error::BadMask {
                position: self.position_mask,
                orient: self.orient_mask,
            });
        }
        Ok(())
    }
}

/// An `n^d` puzzle with a color on every sticker.
///
/// Any assignment of colors with the right counts is a `Puzzle`, including ones that couldn't
/// come from taking a real puzzle apart. [`is_sane`](Self::is_sane) and
/// [`is_solvable`](Self::is_solvable) tell those apart.
#[derive(Clone, PartialEq, Eq)]
pub struct Puzzle {
    shape: Shape,
    stickers: Stickers,
}

impl Puzzle {
    /// The solved `n^d` puzzle.
    pub fn solved(n: usize, d: usize) -> Result<Self> {
        let shape = io::checked_shape(n, d)?;
        Ok(Self {
            shape,
            stickers: io::solved_stickers(shape),
        })
    }

    /// Parse a puzzle string. See [`io::parse`].
    pub fn parse(s: &str) -> Result<Self> {
        let (shape, stickers) = io::parse(s)?;
        Ok(Self { shape, stickers })
    }

    /// Read lines from `reader` until they make a whole puzzle. See [`io::read_puzzle`].
    pub fn read(reader: impl BufRead) -> Result<Self> {
        let (shape, stickers) = io::read_puzzle(reader)?;
        Ok(Self { shape, stickers })
    }

    /// The size of the puzzle.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// The color of every cell.
    pub fn stickers(&self) -> &Stickers {
        &self.stickers
    }

    fn check_solvable_size(&self) -> Result<()> {
        let Shape { n, d } = self.shape;
        if n > 3 {
            return Err(Error::UnsupportedSize { n, d });
        }
        Ok(())
    }

    /// Where every sticker wants to go. Only puzzles with `n <= 3` have a single answer.
    pub fn target_map(&self) -> Result<TargetMap> {
        self.check_solvable_size()?;
        target::target_map(self.shape, &self.stickers)
    }

    /// Whether every sticker has a place to go with no two wanting the same one. Bigger puzzles
    /// than `3^d` only get their color counts checked, which parsing already did.
    pub fn is_sane(&self) -> bool {
        match self.target_map() {
            Ok(_) => true,
            Err(Error::UnsupportedSize { .. }) => true,
            Err(e) => {
                debug!("{e}");
                false
            }
        }
    }

    /// Whether every face is a single color.
    pub fn is_solved(&self) -> bool {
        let last = self.shape.ni() + 1;
        let mut face_colors: FxHashMap<(usize, bool), char> = FxHashMap::default();
        self.stickers
            .cells()
            .iter()
            .enumerate()
            .filter_map(|(flat, c)| c.map(|c| (self.shape.unflat(flat), c)))
            .all(|(index, c)| {
                let Some(axis) = index.iter().position(|&x| x == 0 || x == last) else {
                    return false;
                };
                *face_colors.entry((axis, index[axis] == 0)).or_insert(c) == c
            })
    }

    /// Whether the selected cubie types can all be positioned and oriented, writing what gets
    /// checked to `progress`.
    pub fn is_solvable(&self, options: &SolveOptions, progress: &mut Progress<'_>) -> Result<bool> {
        options.check()?;
        self.check_solvable_size()?;
        progress.print(format_args!(
            "    Figuring out where cubies want to be... "
        ));
        let targets = self.target_map()?;
        progress.print(format_args!("done.\n"));
        Ok(solver::is_solvable(
            self.shape,
            &targets,
            options.position_mask,
            options.orient_mask,
            progress,
        ))
    }

    /// Twists that solve the puzzle, writing a running commentary to `progress`.
    ///
    /// The solvability check runs first. A puzzle that fails it is refused with
    /// [`Error::Unsolvable`] unless the options ask for an attempt anyway, in which case the
    /// solver runs and the outcome is checked against the prediction. The solver treats anything
    /// unexpected as a bug and panics. Those panics are caught here, but the panic hook still
    /// reports them as usual.
    ///
    /// For even `n` the twists never move the first cubie.
    pub fn solve(&self, options: &SolveOptions, progress: &mut Progress<'_>) -> Result<Vec<Twist>> {
        options.check()?;
        self.check_solvable_size()?;
        let shape = self.shape;
        let Shape { n, d } = shape;
        let targets = self.target_map()?;
        if n == 1 {
            return Ok(Vec::new());
        }

        let predicted = solver::is_solvable(
            shape,
            &targets,
            options.position_mask,
            options.orient_mask,
            &mut Progress::silent(),
        );
        if !predicted {
            if !options.attempt_unsolvable {
                return Err(Error::Unsolvable);
            }
            progress.print(format_args!(
                "UH OH... I don't think it's solvable, but trying anyway...\n"
            ));
        }

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let twists = solver::solve(
                shape,
                targets,
                options.position_mask,
                options.orient_mask,
                progress,
            );
            if n % 2 == 0 {
                keep_first_cubie_fixed(n, d, &twists)
            } else {
                twists
            }
        }));

        match (predicted, outcome) {
            (true, Ok(twists)) => {
                info!("solved {n}^{d} in {} twists", twists.len());
                Ok(twists)
            }
            (false, Err(_)) => {
                progress.print(format_args!("    nope, couldn't do it. Told ya so.\n"));
                Err(Error::Unsolvable)
            }
            (true, Err(payload)) => {
                let msg = panic_message(payload.as_ref());
                warn!("failed to solve a {n}^{d} puzzle that looked solvable: {msg}\n{self}");
                Err(Error::SolverFailedOnSolvable(msg))
            }
            (false, Ok(_)) => {
                warn!("solved a {n}^{d} puzzle that looked unsolvable\n{self}");
                Err(Error::SolvedUnsolvable)
            }
        }
    }

    /// The puzzle after the given twists.
    pub fn apply(&self, twists: &[Twist]) -> Self {
        let mut stickers = self.stickers.clone();
        TwistCache::new(self.shape).apply(&mut stickers, twists);
        Self {
            shape: self.shape,
            stickers,
        }
    }

    /// The puzzle after the twists of a move string.
    pub fn apply_moves(&self, moves: &str) -> Result<Self> {
        Ok(self.apply(&self.parse_moves(moves)?))
    }

    /// Between `min` and `max` random twists, none moving the first cubie if `n` is even.
    ///
    /// Consecutive twists can cancel out.
    pub fn scramble(&self, min: i64, max: i64, rng: &mut impl Rng) -> Result<Vec<Twist>> {
        if !(0 <= min && min <= max) {
            return Err(Error::BadScrambleRange { min, max });
        }
        let Shape { n, d } = self.shape;
        if d < 3 {
            return Err(Error::UnsupportedSize { n, d });
        }
        let count = rng.gen_range(min..=max);
        let twists = (0..count)
            .map(|_| random_twist(self.shape, rng))
            .collect::<Result<Vec<_>>>()?;
        debug!("scrambling with {count} twists");
        Ok(if n % 2 == 0 {
            keep_first_cubie_fixed(n, d, &twists)
        } else {
            twists
        })
    }

    /// Name twists by the colors of this puzzle. See [`io::moves_to_string`].
    pub fn format_moves(&self, twists: &[Twist]) -> Result<String> {
        io::moves_to_string(self.shape, &self.stickers, twists)
    }

    /// Read a move string in the frame of this puzzle. See [`io::moves_from_string`].
    pub fn parse_moves(&self, moves: &str) -> Result<Vec<Twist>> {
        io::moves_from_string(self.shape, &self.stickers, moves)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl FromStr for Puzzle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Puzzle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&io::format(self.shape, &self.stickers))
    }
}

impl fmt::Debug for Puzzle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Shape { n, d } = self.shape;
        write!(f, "Puzzle {n}^{d}:\n{self}")
    }
}

/// The solved `n^d` puzzle string.
pub fn new_puzzle(n: usize, d: usize) -> Result<String> {
    Puzzle::solved(n, d).map(|p| p.to_string())
}

/// Whether a string is a puzzle whose stickers all have somewhere to go.
pub fn is_sane(s: &str) -> bool {
    Puzzle::parse(s).is_ok_and(|p| p.is_sane())
}

/// Whether a puzzle string can be solved.
pub fn is_solvable(s: &str) -> Result<bool> {
    Puzzle::parse(s)?.is_solvable(&SolveOptions::default(), &mut Progress::silent())
}

/// Whether a puzzle string is solved.
pub fn is_solved(s: &str) -> Result<bool> {
    Ok(Puzzle::parse(s)?.is_solved())
}

/// A move string solving a puzzle string.
pub fn solve(s: &str) -> Result<String> {
    let puzzle = Puzzle::parse(s)?;
    let twists = puzzle.solve(&SolveOptions::default(), &mut Progress::silent())?;
    puzzle.format_moves(&twists)
}

/// Apply a move string to a puzzle string, keeping its layout.
pub fn apply(moves: &str, s: &str) -> Result<String> {
    let twisted = Puzzle::parse(s)?.apply_moves(moves)?;
    io::reformat(&twisted.to_string(), s)
}

/// A move string of between `min` and `max` random twists of a puzzle string.
pub fn scramble(s: &str, min: i64, max: i64, rng: &mut impl Rng) -> Result<String> {
    if !(0 <= min && min <= max) {
        return Err(Error::BadScrambleRange { min, max });
    }
    let puzzle = Puzzle::parse(s)?;
    let twists = puzzle.scramble(min, max, rng)?;
    puzzle.format_moves(&twists)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::Move;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// The example from the crate documentation.
    const EXAMPLE_333: &str = "AAaAAaAAabBBcCcCcCBbbBBBCcCcCcbbbbBBCcCcCcBbbAaaAaaAaa";

    fn twists_solve(puzzle: &Puzzle, twists: &[Twist]) -> bool {
        puzzle.apply(twists).is_solved()
    }

    #[test]
    fn new_puzzle_333() {
        let s = new_puzzle(3, 3).unwrap();
        assert_eq!(s.lines().count(), 5);
        assert!(is_sane(&s));
        assert_eq!(is_solved(&s), Ok(true));
        assert_eq!(is_solvable(&s), Ok(true));
        assert_eq!(solve(&s), Ok(String::new()));
        assert_eq!(s.parse::<Puzzle>().unwrap(), Puzzle::solved(3, 3).unwrap());
    }

    #[test]
    fn new_puzzle_limits() {
        assert_eq!(new_puzzle(0, 3), Err(Error::TooBig { n: 0, d: 3 }));
        assert_eq!(new_puzzle(2, 0), Err(Error::TooBig { n: 2, d: 0 }));
        assert_eq!(new_puzzle(1, 19), Err(Error::TooBig { n: 1, d: 19 }));
    }

    #[test]
    fn documented_example() {
        assert!(is_sane(EXAMPLE_333));
        assert_eq!(is_solved(EXAMPLE_333), Ok(false));
        assert_eq!(is_solvable(EXAMPLE_333), Ok(true));
        let moves = solve(EXAMPLE_333).unwrap();
        assert_eq!(moves, "aBC aBC ABC ABC cBA cBA ABC ABC cBA cBA aCB aCB");
        assert_eq!(
            is_solved(&apply(&moves, EXAMPLE_333).unwrap()),
            Ok(true)
        );
    }

    #[test]
    fn twist_and_untwist() {
        let s = new_puzzle(3, 3).unwrap();
        let twisted = apply("ACB", &s).unwrap();
        assert_ne!(twisted, s);
        assert_eq!(is_solved(&twisted), Ok(false));
        assert_eq!(apply("ABC", &twisted).unwrap(), s);
        assert_eq!(apply("ACB ABC", &s).unwrap(), s);
        // the layout of the input is kept
        let compact: String = s.split_whitespace().collect();
        assert_eq!(apply("", &compact).unwrap(), compact);
    }

    #[test]
    fn one_cubie_puzzles_need_no_twists() {
        let s = new_puzzle(1, 3).unwrap();
        assert_eq!(solve(&s), Ok(String::new()));
    }

    #[test]
    fn big_puzzles() {
        let s = new_puzzle(4, 3).unwrap();
        assert!(is_sane(&s));
        assert_eq!(is_solved(&s), Ok(true));
        assert_eq!(is_solvable(&s), Err(Error::UnsupportedSize { n: 4, d: 3 }));
        assert_eq!(solve(&s), Err(Error::UnsupportedSize { n: 4, d: 3 }));
        let mut rng = StdRng::seed_from_u64(4);
        let moves = scramble(&s, 5, 5, &mut rng).unwrap();
        assert_eq!(moves.split_whitespace().count(), 5);
        let twisted = apply(&moves, &s).unwrap();
        assert_eq!(twisted.lines().count(), s.lines().count());
    }

    #[test]
    fn scramble_arguments() {
        let s = new_puzzle(3, 3).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            scramble(&s, 3, 2, &mut rng),
            Err(Error::BadScrambleRange { min: 3, max: 2 })
        );
        assert_eq!(
            scramble(&s, -1, 2, &mut rng),
            Err(Error::BadScrambleRange { min: -1, max: 2 })
        );
        let flat = new_puzzle(3, 2).unwrap();
        assert_eq!(
            scramble(&flat, 0, 2, &mut rng),
            Err(Error::UnsupportedSize { n: 3, d: 2 })
        );
        assert_eq!(scramble(&s, 0, 0, &mut rng), Ok(String::new()));
    }

    #[test]
    fn bad_masks() {
        let puzzle = Puzzle::solved(3, 3).unwrap();
        let options = SolveOptions::default().with_position_mask(0b1011);
        assert_eq!(
            puzzle.solve(&options, &mut Progress::silent()),
            Err(Error::BadMask {
                position: 0b1011,
                orient: !0
            })
        );
        let options = options.with_orient_mask(0b1000);
        assert_eq!(puzzle.solve(&options, &mut Progress::silent()), Ok(vec![]));
    }

    fn flipped_edge() -> Puzzle {
        let mut puzzle = Puzzle::solved(3, 3).unwrap();
        let a = puzzle.stickers.flat(&[0, 1, 2]);
        let b = puzzle.stickers.flat(&[1, 0, 2]);
        puzzle.stickers.cells_mut().swap(a, b);
        puzzle
    }

    #[test_log::test]
    fn unsolvable_is_refused() {
        let puzzle = flipped_edge();
        assert!(puzzle.is_sane());
        let mut out = Vec::new();
        let solvable = puzzle
            .is_solvable(&SolveOptions::default(), &mut Progress::new(Some(&mut out)))
            .unwrap();
        assert!(!solvable);
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("    Figuring out where cubies want to be... done.\n"));
        assert!(out.ends_with("    Puzzle is NOT solvable.\n\n"));

        assert_eq!(
            puzzle.solve(&SolveOptions::default(), &mut Progress::silent()),
            Err(Error::Unsolvable)
        );
        assert_eq!(solve(&puzzle.to_string()), Err(Error::Unsolvable));
    }

    #[test_log::test]
    fn forced_attempt_fails_as_predicted() {
        let puzzle = flipped_edge();
        let options = SolveOptions::default().with_attempt_unsolvable(true);
        let mut out = Vec::new();
        let result = puzzle.solve(&options, &mut Progress::new(Some(&mut out)));
        assert_eq!(result, Err(Error::Unsolvable));
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("UH OH... I don't think it's solvable, but trying anyway...\n"));
        assert!(out.ends_with("    nope, couldn't do it. Told ya so.\n"));
    }

    #[test]
    fn flipped_edge_can_be_positioned() {
        let puzzle = flipped_edge();
        let options = SolveOptions::default().with_orient_mask(!(1 << 2));
        assert_eq!(puzzle.is_solvable(&options, &mut Progress::silent()), Ok(true));
        assert_eq!(puzzle.solve(&options, &mut Progress::silent()), Ok(vec![]));
    }

    fn check_scramble_and_solve(n: usize, d: usize, seed: u64, len: i64) {
        let s = new_puzzle(n, d).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        let scrambled = apply(&scramble(&s, len, len, &mut rng).unwrap(), &s).unwrap();
        let moves = solve(&scrambled).unwrap();
        assert_eq!(
            is_solved(&apply(&moves, &scrambled).unwrap()),
            Ok(true),
            "{n}^{d} seed {seed}"
        );
    }

    #[test_log::test]
    fn scramble_and_solve_cubes() {
        for seed in 0..5 {
            check_scramble_and_solve(3, 3, seed, 30);
            check_scramble_and_solve(2, 3, seed, 30);
        }
    }

    #[test_log::test]
    fn scramble_and_solve_tesseracts() {
        check_scramble_and_solve(3, 4, 7, 40);
        for seed in 0..3 {
            check_scramble_and_solve(2, 4, seed, 40);
        }
    }

    #[test]
    fn even_solutions_keep_the_first_cubie() {
        let puzzle = Puzzle::solved(2, 4).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let scrambled = puzzle.apply(&puzzle.scramble(25, 25, &mut rng).unwrap());
        let twists = scrambled
            .solve(&SolveOptions::default(), &mut Progress::silent())
            .unwrap();
        let first = vec![-1; 4];
        for t in &twists {
            assert_eq!(t.twist_coords(2, &first), first);
        }
        assert!(twists_solve(&scrambled, &twists));
    }

    #[test]
    fn solve_reports_progress() {
        let puzzle = Puzzle::solved(3, 3).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let scrambled = puzzle.apply(&puzzle.scramble(20, 20, &mut rng).unwrap());
        let mut out = Vec::new();
        let twists = scrambled
            .solve(&SolveOptions::default(), &mut Progress::new(Some(&mut out)))
            .unwrap();
        let out = String::from_utf8(out).unwrap();
        for phase in [
            "Positioning 2-sticker cubies",
            "Orienting 2-sticker cubies",
            "Positioning 3-sticker cubies",
            "Orienting 3-sticker cubies",
        ] {
            assert!(out.contains(phase), "{out}");
        }
        assert!(twists_solve(&scrambled, &twists));
    }

    #[test]
    fn read_then_print() {
        let puzzle = Puzzle::solved(2, 3).unwrap();
        let text = format!("{puzzle}\n");
        assert_eq!(Puzzle::read(text.as_bytes()).unwrap(), puzzle);
    }

    #[test]
    fn inverse_undoes() {
        let puzzle = Puzzle::solved(3, 4).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let twists = puzzle.scramble(10, 10, &mut rng).unwrap();
        let undo: Vec<Twist> = twists.iter().rev().map(|t| t.inverse()).collect();
        assert_eq!(puzzle.apply(&twists).apply(&undo), puzzle);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn any_options_on_a_scrambled_cube(options in any::<SolveOptions>(), seed in any::<u64>()) {
            let puzzle = Puzzle::solved(3, 3).unwrap();
            let mut rng = StdRng::seed_from_u64(seed);
            let scrambled = puzzle.apply(&puzzle.scramble(0, 20, &mut rng).unwrap());
            let result = scrambled.solve(&options, &mut Progress::silent());
            if options.orient_mask & !options.position_mask != 0 {
                let refused = matches!(result, Err(Error::BadMask { .. }));
                prop_assert!(refused, "expected BadMask, got {:?}", result);
            } else {
                let twists = result.unwrap();
                let all = 0b1100;
                if options.orient_mask & all == all {
                    prop_assert!(twists_solve(&scrambled, &twists));
                }
            }
        }
    }
}

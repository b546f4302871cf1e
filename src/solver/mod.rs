//! Solving a puzzle from its target map.
//!
//! Cubies are dealt with in order of how many stickers they have, starting from the 2-sticker
//! edges (1-sticker face centers never move). For each type the cubies are first permuted into
//! place with 3-cycles and then oriented in pairs. Both kinds of move sequence are built so that
//! they never disturb a cubie with fewer stickers, which is why the order matters.
//!
//! Everything in here treats an inconsistency as a bug and panics. Callers that want to solve
//! puzzles of unknown solvability should check [`is_solvable`] first.

mod orient;
mod parity;
mod position;

use std::fmt;
use std::io::Write;
use std::time::Instant;

use log::{debug, info, warn};

use crate::coord::Shape;
use crate::moves::{Twist, TwistCache};
use crate::target::TargetMap;

pub(crate) use parity::is_solvable;

/// The twist applied up front when the puzzle is an odd permutation away from solved.
pub(crate) const PARITY_TWIST: Twist = Twist {
    face_axis: 0,
    face_sign: 1,
    from_axis: 1,
    to_axis: 2,
    slices: 1,
};

/// Best-effort sink for the human readable status lines of a long solve.
///
/// The first write error is logged and the sink is dropped after that.
pub struct Progress<'a> {
    sink: Option<&'a mut dyn Write>,
}

impl<'a> Progress<'a> {
    /// Report to `sink`, if there is one.
    pub fn new(sink: Option<&'a mut dyn Write>) -> Self {
        Self { sink }
    }

    /// Don't report anything.
    pub fn silent() -> Self {
        Self { sink: None }
    }

    pub(crate) fn print(&mut self, args: fmt::Arguments<'_>) {
        if let Some(sink) = self.sink.as_mut() {
            if let Err(e) = sink.write_fmt(args).and_then(|()| sink.flush()) {
                warn!("dropping progress output after error: {e}");
                self.sink = None;
            }
        }
    }
}

impl fmt::Debug for Progress<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Progress")
            .field("active", &self.sink.is_some())
            .finish()
    }
}

/// Whether bit `k` of a cubie type mask is set.
pub(crate) fn selected(mask: u32, k: usize) -> bool {
    u32::try_from(k)
        .ok()
        .and_then(|k| mask.checked_shr(k))
        .is_some_and(|m| m & 1 == 1)
}

/// Decompose the target map, restricted to the cells picked out by `pick`, into cycles of flat
/// offsets, following each cell to the cell its occupant wants. Each cycle starts at its lowest
/// offset and cycles come out in order of that offset. Fixed points are included.
///
/// The picked cells have to be closed under the target map.
pub(crate) fn cycles_of(
    shape: Shape,
    targets: &TargetMap,
    visited: &mut [bool],
    mut pick: impl FnMut(&[i32]) -> bool,
) -> Vec<Vec<usize>> {
    visited.fill(false);
    let mut cycles = Vec::new();
    for start in 0..targets.len() {
        if visited[start] || !pick(&shape.unflat(start)) {
            continue;
        }
        let mut cycle = Vec::new();
        let mut i = start;
        while !visited[i] {
            cycle.push(i);
            visited[i] = true;
            i = targets.cells()[i];
        }
        cycles.push(cycle);
    }
    cycles
}

/// Whether the permutation of cubies that decides parity is odd: the 2-sticker cubies, or for
/// `n == 2` (which has none) the corners.
///
/// For `n == 2` and `d >= 4` this isn't the whole story, so it's only a heuristic there.
pub(crate) fn state_is_odd(shape: Shape, targets: &TargetMap, visited: &mut [bool]) -> bool {
    let Shape { n, d } = shape;
    let k = if n == 2 { d } else { 2 };
    cycles_of(shape, targets, visited, |index| shape.is_k_cubie(k, index))
        .iter()
        .filter(|c| c.len() % 2 == 0)
        .count()
        % 2
        == 1
}

/// Whether every cubie with at most `up_to` stickers whose type is selected by `mask` is in the
/// right place.
pub(crate) fn is_positioned_up_to(
    shape: Shape,
    targets: &TargetMap,
    mask: u32,
    up_to: usize,
) -> bool {
    first_misplaced(shape, targets, mask, up_to, |index| shape.is_cubie(index)).is_none()
}

/// Whether every sticker of a cubie with at most `up_to` stickers whose type is selected by `mask`
/// is in the right place.
pub(crate) fn is_oriented_up_to(shape: Shape, targets: &TargetMap, mask: u32, up_to: usize) -> bool {
    shape.n <= 1
        || first_misplaced(shape, targets, mask, up_to, |index| shape.is_sticker(index)).is_none()
}

fn first_misplaced(
    shape: Shape,
    targets: &TargetMap,
    mask: u32,
    up_to: usize,
    is_kind: impl Fn(&[i32]) -> bool,
) -> Option<usize> {
    let found = targets.cells().iter().enumerate().find_map(|(i, &t)| {
        let index = shape.unflat(i);
        let k = shape.boundary_axes(&index);
        (t != i && is_kind(&index) && k <= up_to && selected(mask, k)).then_some(i)
    });
    if let Some(i) = found {
        debug!(
            "not done up to {up_to}-sticker cubies: found {:?} at {:?}",
            shape.unflat(targets.cells()[i]),
            shape.unflat(i)
        );
    }
    found
}

/// Works through the cubie types, keeping the target map up to date with the twists found so far.
struct Driver<'p, 'a> {
    targets: TargetMap,
    cache: TwistCache,
    visited: Vec<bool>,
    solution: Vec<Twist>,
    progress: &'p mut Progress<'a>,
    start: Instant,
    lap: Instant,
}

impl Driver<'_, '_> {
    fn secs(&mut self) -> (f64, f64) {
        let now = Instant::now();
        let lap = now.duration_since(self.lap).as_secs_f64();
        self.lap = now;
        (lap, now.duration_since(self.start).as_secs_f64())
    }

    /// Record and apply the twists found by one phase.
    fn apply(&mut self, verb: &str, k: usize, twists: Vec<Twist>) {
        let count = twists.len();
        self.cache.apply(&mut self.targets, &twists);
        self.solution.extend(twists);
        info!("{verb} {k}-sticker cubies: {count} twists");
        let (lap, total) = self.secs();
        self.progress.print(format_args!(
            "    {verb} {k}-sticker cubies...   + {count} = {} moves  + {lap:.3} = {total:.3} secs\n",
            self.solution.len()
        ));
    }
}

/// Twists solving the puzzle with the given target map. Only the cubie types selected by
/// `position_mask` are put in place, and only those selected by `orient_mask` are oriented (bit
/// `k` for the `k`-sticker cubies).
///
/// # Panics
///
/// If the puzzle can't be solved, or `orient_mask` has a type that `position_mask` doesn't.
pub(crate) fn solve(
    shape: Shape,
    targets: TargetMap,
    position_mask: u32,
    orient_mask: u32,
    progress: &mut Progress<'_>,
) -> Vec<Twist> {
    let Shape { n, d } = shape;
    assert_eq!(orient_mask & !position_mask, 0);
    let now = Instant::now();
    let mut driver = Driver {
        targets,
        cache: TwistCache::new(shape),
        visited: vec![false; shape.cell_count()],
        solution: Vec::new(),
        progress,
        start: now,
        lap: now,
    };

    if state_is_odd(shape, &driver.targets, &mut driver.visited) {
        info!("odd permutation, fixing with {PARITY_TWIST}");
        driver
            .progress
            .print(format_args!("    It's odd, applying one twist to fix parity..."));
        driver.solution.push(PARITY_TWIST);
        driver.cache.apply(&mut driver.targets, &[PARITY_TWIST]);
    } else {
        driver
            .progress
            .print(format_args!("    It's even                             "));
    }
    let (_, total) = driver.secs();
    driver.progress.print(format_args!("  {total:.3} secs\n"));

    for k in 2..=d {
        // no k-sticker cubies at all
        if n < 3 && k < d {
            continue;
        }
        if !selected(position_mask, k) {
            driver.progress.print(format_args!(
                "    Positioning {k}-sticker cubies... NOT!\n    Orienting {k}-sticker cubies... NOT!\n"
            ));
            continue;
        }
        assert!(is_positioned_up_to(shape, &driver.targets, position_mask, k - 1));
        assert!(is_oriented_up_to(shape, &driver.targets, orient_mask, k - 1));

        let twists = position::position_cubies(shape, k, &driver.targets, &mut driver.visited);
        driver.apply("Positioning", k, twists);
        assert!(is_positioned_up_to(shape, &driver.targets, position_mask, k));
        assert!(is_oriented_up_to(shape, &driver.targets, orient_mask, k - 1));

        if selected(orient_mask, k) {
            let twists = orient::orient_cubies(shape, k, &driver.targets, &mut driver.visited);
            driver.apply("Orienting", k, twists);
        } else {
            driver
                .progress
                .print(format_args!("    Orienting {k}-sticker cubies... NOT!\n"));
        }
        assert!(is_positioned_up_to(shape, &driver.targets, position_mask, k));
        assert!(is_oriented_up_to(shape, &driver.targets, orient_mask, k));
    }
    assert!(is_positioned_up_to(shape, &driver.targets, position_mask, d));
    assert!(is_oriented_up_to(shape, &driver.targets, orient_mask, d));

    let (hits, misses) = driver.cache.stats();
    debug!("twist cache: {hits} hits, {misses} misses");
    driver.solution
}

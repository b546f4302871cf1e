use log::trace;
use rustc_hash::FxHashMap;

use super::Twist;
use crate::coord::Shape;
use crate::grid::Grid;

/// Applies twists to grids of one shape, remembering the permutation each distinct twist induces.
///
/// A quarter turn moves every non-air cell it touches around an orbit of exactly four cells, so
/// the permutation is stored as a list of 4-cycles of flat offsets and replayed with three swaps
/// per cycle. Working the permutation out is by far the slowest part of applying a twist.
#[derive(Debug, Clone)]
pub struct TwistCache {
    shape: Shape,
    cycles: FxHashMap<Twist, Vec<[usize; 4]>>,
    hits: usize,
    misses: usize,
}

impl TwistCache {
    /// An empty cache for puzzles of the given shape.
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            cycles: FxHashMap::default(),
            hits: 0,
            misses: 0,
        }
    }

    /// Shape of the puzzles this cache works on.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Twist the grid in place by each twist in turn.
    pub fn apply<T>(&mut self, grid: &mut Grid<T>, twists: &[Twist]) {
        debug_assert_eq!(grid.side(), self.shape.side());
        debug_assert_eq!(grid.dims(), self.shape.d);
        for &twist in twists {
            let cycles = self.cycles_of(twist);
            let cells = grid.cells_mut();
            for &[i0, i1, i2, i3] in cycles {
                // i0 -> i1 -> i2 -> i3 -> i0
                cells.swap(i0, i1);
                cells.swap(i0, i2);
                cells.swap(i0, i3);
            }
        }
    }

    /// (hits, misses) so far.
    pub fn stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }

    fn cycles_of(&mut self, twist: Twist) -> &[[usize; 4]] {
        let shape = self.shape;
        let hit = self.cycles.contains_key(&twist);
        if hit {
            self.hits += 1;
        } else {
            self.misses += 1;
            trace!("computing cycles of {twist}");
        }
        self.cycles
            .entry(twist)
            .or_insert_with(|| permutation_cycles(shape, twist))
    }
}

/// Where a twist takes each flat offset, leaving untouched cells (and air) fixed.
fn permutation(shape: Shape, twist: Twist) -> Vec<usize> {
    let Twist {
        face_axis,
        from_axis,
        to_axis,
        ..
    } = twist;
    let canon = twist.canonical(shape.n);
    let n = shape.ni();
    assert!(face_axis != from_axis && from_axis != to_axis && to_axis != face_axis);

    (0..shape.cell_count())
        .map(|i| {
            let mut index = shape.unflat(i);
            if shape.is_air(&index) || !canon.moves_layer((index[face_axis] - 1).clamp(0, n - 1))
            {
                return i;
            }
            let temp = index[to_axis];
            index[to_axis] = index[from_axis];
            index[from_axis] = n + 1 - temp;
            shape.flat(&index)
        })
        .collect()
}

fn permutation_cycles(shape: Shape, twist: Twist) -> Vec<[usize; 4]> {
    let mut perm = permutation(shape, twist);
    let mut cycles = Vec::new();
    for i in 0..perm.len() {
        let i0 = perm[i];
        if i0 == i {
            continue;
        }
        let i1 = perm[i0];
        let i2 = perm[i1];
        let i3 = perm[i2];
        assert_eq!(perm[i3], i0, "twist {twist} has an orbit that isn't a 4-cycle");
        assert!(i0 != i2 && i1 != i3, "twist {twist} has a 2-cycle");
        cycles.push([i0, i1, i2, i3]);
        for j in [i0, i1, i2, i3] {
            perm[j] = j;
        }
    }
    cycles
}

/// Twist a grid one cell at a time without any caching.
#[cfg(test)]
fn apply_twist<T: Clone>(shape: Shape, grid: &Grid<T>, twist: Twist) -> Grid<T> {
    let perm = permutation(shape, twist);
    let mut out = grid.clone();
    for (from, &to) in perm.iter().enumerate() {
        out.cells_mut()[to] = grid.cells()[from].clone();
    }
    out
}

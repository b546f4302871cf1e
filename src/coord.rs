//! Index vectors, coordinate vectors and the predicates that classify cells.
//!
//! A puzzle of side `n` in `d` dimensions lives in a grid of side `n + 2`. An *index* vector has
//! components in `0..=n+1`; `0` and `n+1` are the extreme values where stickers sit. A *coords*
//! vector is the same point measured from the center of the puzzle in half-cubie units, so its
//! components are in `-(n+1)..=n+1` and have the same parity as `n + 1`.

use crate::grid::Grid;

/// The size of a puzzle: `n` cubies along each of `d` axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    /// Side length in cubies
    pub n: usize,
    /// Number of dimensions
    pub d: usize,
}

impl Shape {
    /// Make a new shape.
    pub fn new(n: usize, d: usize) -> Self {
        Self { n, d }
    }

    /// Side length of the backing grid, including the sticker layer on each side.
    pub fn side(&self) -> usize {
        self.n + 2
    }

    /// `n` as a signed integer, since almost all the arithmetic is signed.
    pub fn ni(&self) -> i32 {
        self.n as i32
    }

    /// Number of cells in the backing grid.
    pub fn cell_count(&self) -> usize {
        self.side().pow(self.d as u32)
    }

    /// Make a grid of this shape.
    pub fn grid<T>(&self, f: impl FnMut(&[i32]) -> T) -> Grid<T> {
        Grid::from_fn(self.side(), self.d, f)
    }

    /// Index vector of a flat offset.
    pub fn unflat(&self, mut flat: usize) -> Vec<i32> {
        let side = self.side();
        let mut index = vec![0; self.d];
        for x in index.iter_mut().rev() {
            *x = (flat % side) as i32;
            flat /= side;
        }
        index
    }

    /// Flat offset of an index vector.
    pub fn flat(&self, index: &[i32]) -> usize {
        let side = self.side();
        index.iter().fold(0, |acc, &x| acc * side + x as usize)
    }

    /// Rounds towards the lower cubie when the coords fall between two, which for even `n` picks
    /// a representative sticker of each face.
    pub fn coords_to_index(&self, coords: &[i32]) -> Vec<i32> {
        let n = self.ni();
        coords.iter().map(|&c| (c + n + 1) / 2).collect()
    }

    /// Exact inverse of [`coords_to_index`](Self::coords_to_index) on odd-parity coords.
    pub fn index_to_coords(&self, index: &[i32]) -> Vec<i32> {
        let n = self.ni();
        index.iter().map(|&i| 2 * i - (n + 1)).collect()
    }

    /// How many components take each value in `0..=n+1`.
    pub fn histogram(&self, index: &[i32]) -> Vec<usize> {
        let mut hist = vec![0; self.side()];
        for &x in index {
            hist[x as usize] += 1;
        }
        hist
    }

    /// Number of components at an extreme value.
    pub fn extremes(&self, index: &[i32]) -> usize {
        let n = self.ni();
        index.iter().filter(|&&x| x == 0 || x == n + 1).count()
    }

    /// A sticker sits on exactly one extreme.
    pub fn is_sticker(&self, index: &[i32]) -> bool {
        self.extremes(index) == 1
    }

    /// A cubie center doesn't sit on any extreme.
    pub fn is_cubie(&self, index: &[i32]) -> bool {
        self.extremes(index) == 0
    }

    /// Cells on two or more extremes are never occupied.
    pub fn is_air(&self, index: &[i32]) -> bool {
        self.extremes(index) >= 2
    }

    /// Whether `index` is the center of a cubie with `k` stickers.
    pub fn is_k_cubie(&self, k: usize, index: &[i32]) -> bool {
        let n = self.n;
        let hist = self.histogram(index);
        hist[0] == 0 && hist[n + 1] == 0 && hist[1] + hist[n] == k
    }

    /// Whether `index` is a sticker on a cubie with `k` stickers.
    pub fn is_k_sticker(&self, k: usize, index: &[i32]) -> bool {
        let n = self.n;
        let hist = self.histogram(index);
        hist[0] + hist[n + 1] == 1 && hist[0] + hist[1] + hist[n] + hist[n + 1] == k
    }

    /// Number of axes along which the cell is at the boundary of the puzzle, which for a cubie
    /// center is the number of stickers on it.
    pub fn boundary_axes(&self, index: &[i32]) -> usize {
        let n = self.ni();
        index.iter().filter(|&&x| x <= 1 || x >= n).count()
    }

    /// Cubie center of the cubie a sticker (or cubie center) belongs to.
    pub fn cubie_of(&self, index: &[i32]) -> Vec<i32> {
        clamp_all(index, 1, self.ni())
    }

    /// Whether two stickers or cubie centers (as indices) belong to the same cubie.
    pub fn same_cubie(&self, a: &[i32], b: &[i32]) -> bool {
        let n = self.ni();
        a.iter()
            .zip(b)
            .all(|(&x, &y)| x.clamp(1, n) == y.clamp(1, n))
    }
}

/// Clamp every component of a vector.
pub fn clamp_all(v: &[i32], lo: i32, hi: i32) -> Vec<i32> {
    v.iter().map(|&x| x.clamp(lo, hi)).collect()
}

/// Number of components where two vectors differ.
pub fn n_different(a: &[i32], b: &[i32]) -> usize {
    a.iter().zip(b).filter(|(x, y)| x != y).count()
}

/// Squared euclidean length.
pub fn norm_sqrd(v: &[i32]) -> i32 {
    v.iter().map(|x| x * x).sum()
}

/// Componentwise `a + b`.
pub fn plus(a: &[i32], b: &[i32]) -> Vec<i32> {
    a.iter().zip(b).map(|(x, y)| x + y).collect()
}

/// Componentwise `a - b`.
pub fn minus(a: &[i32], b: &[i32]) -> Vec<i32> {
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}

/// Reverse the lowest `n_bits` bits of `x`, dropping the rest.
pub fn reverse_bits(x: i32, n_bits: usize) -> i32 {
    (0..n_bits).fold(0, |acc, bit| acc | (((x >> bit) & 1) << (n_bits - 1 - bit)))
}

/// `-1` for negative numbers, otherwise `1`.
pub(crate) fn sign_of(x: i32) -> i32 {
    if x < 0 {
        -1
    } else {
        1
    }
}

/// First axis satisfying a predicate, panicking if there's none.
pub(crate) fn first_axis(d: usize, what: &str, mut pred: impl FnMut(usize) -> bool) -> usize {
    match (0..d).find(|&i| pred(i)) {
        Some(i) => i,
        None => panic!("no axis found for {what}"),
    }
}

//! A dense d-dimensional array with the same side length along every axis.
//!
//! Cells are stored in one flat buffer in major-to-minor order, so the last axis varies fastest.
//! This is also the order stickers appear in a puzzle string.

/// A d-dimensional cube of cells.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Grid<T> {
    side: usize,
    dims: usize,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    /// Make a grid where every cell is `value`.
    pub fn filled(side: usize, dims: usize, value: T) -> Self {
        Self {
            side,
            dims,
            cells: vec![value; side.pow(dims as u32)],
        }
    }
}

impl<T> Grid<T> {
    /// Make a grid by evaluating `f` at every index vector, in flat order.
    pub fn from_fn(side: usize, dims: usize, mut f: impl FnMut(&[i32]) -> T) -> Self {
        let len = side.pow(dims as u32);
        let mut index = vec![0; dims];
        let mut cells = Vec::with_capacity(len);
        for i in 0..len {
            unflat_into(side, i, &mut index);
            cells.push(f(&index));
        }
        Self { side, dims, cells }
    }

    /// Wrap a flat buffer, which must have exactly `side^dims` cells.
    pub fn from_cells(side: usize, dims: usize, cells: Vec<T>) -> Self {
        assert_eq!(cells.len(), side.pow(dims as u32));
        Self { side, dims, cells }
    }

    /// Side length along every axis.
    pub fn side(&self) -> usize {
        self.side
    }

    /// Number of axes.
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the grid has no cells at all.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Flat offset of an index vector.
    pub fn flat(&self, index: &[i32]) -> usize {
        debug_assert_eq!(index.len(), self.dims);
        index.iter().fold(0, |acc, &x| {
            debug_assert!(x >= 0 && (x as usize) < self.side);
            acc * self.side + x as usize
        })
    }

    /// Index vector of a flat offset.
    pub fn unflat(&self, flat: usize) -> Vec<i32> {
        let mut index = vec![0; self.dims];
        unflat_into(self.side, flat, &mut index);
        index
    }

    /// Get the cell at an index vector.
    pub fn get(&self, index: &[i32]) -> &T {
        &self.cells[self.flat(index)]
    }

    /// Get a mutable reference to the cell at an index vector.
    pub fn get_mut(&mut self, index: &[i32]) -> &mut T {
        let i = self.flat(index);
        &mut self.cells[i]
    }

    /// Overwrite the cell at an index vector.
    pub fn set(&mut self, index: &[i32], value: T) {
        *self.get_mut(index) = value;
    }

    /// The flat buffer.
    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    /// The flat buffer, mutably.
    pub fn cells_mut(&mut self) -> &mut [T] {
        &mut self.cells
    }

    /// Make a new grid of the same shape by transforming every cell.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Grid<U> {
        Grid {
            side: self.side,
            dims: self.dims,
            cells: self.cells.iter().map(f).collect(),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Grid<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grid")
            .field("side", &self.side)
            .field("dims", &self.dims)
            .field("cells", &self.cells)
            .finish()
    }
}

fn unflat_into(side: usize, mut flat: usize, index: &mut [i32]) {
    for x in index.iter_mut().rev() {
        *x = (flat % side) as i32;
        flat /= side;
    }
}

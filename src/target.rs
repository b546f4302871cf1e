//! Working out where every sticker of a colored puzzle belongs.
//!
//! The solver never looks at colors. It works on a *target map*: a grid holding, for every cell,
//! the flat offset of the cell its current occupant has to end up in. The puzzle is solved exactly
//! when the target map is the identity. Air cells always target themselves.

use log::debug;
use rustc_hash::FxHashMap;

use crate::coord::{clamp_all, plus, Shape};
use crate::error::{Error, Result};
use crate::grid::Grid;

/// Colors of a puzzle, `None` for cells that aren't stickers.
pub type Stickers = Grid<Option<char>>;

/// For each cell, the flat offset of where its occupant wants to go.
pub type TargetMap = Grid<usize>;

fn insane(msg: impl Into<String>) -> Error {
    Error::InsanePuzzle(msg.into())
}

/// The color belonging to each signed axis, `[negative, positive]` for each axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisColors(pub Vec<[char; 2]>);

impl AxisColors {
    /// Read the axis colors off a puzzle.
    ///
    /// Odd puzzles have a fixed center sticker on every face. Even puzzles don't, so the negative
    /// colors are read off the first cubie and each positive color is whichever color never
    /// shares a corner with its negative.
    pub fn of(shape: Shape, stickers: &Stickers) -> Result<Self> {
        let Shape { n, d } = shape;
        let ni = shape.ni();
        let odd = n % 2 == 1;

        let mut colors = Vec::with_capacity(d);
        for axis in 0..d {
            let mut pair = [' '; 2];
            for (i, sign) in [-1, 1].into_iter().enumerate() {
                let mut coords = vec![if odd { 0 } else { sign * (ni - 1) }; d];
                coords[axis] = sign * (ni + 1);
                pair[i] = (*stickers.get(&shape.coords_to_index(&coords)))
                    .ok_or_else(|| insane("no sticker at a face center"))?;
            }
            colors.push(pair);
        }

        // every color starts out possibly opposite every color (itself included), and gets
        // crossed off whenever the two share a corner
        let mut seen = Vec::new();
        for c in stickers.cells().iter().flatten() {
            if !seen.contains(c) {
                seen.push(*c);
            }
        }
        if seen.len() != 2 * d {
            return Err(insane(format!(
                "expected {} colors, found {}",
                2 * d,
                seen.len()
            )));
        }
        let mut opposites: FxHashMap<char, Vec<char>> =
            seen.iter().map(|&c| (c, seen.clone())).collect();

        for corner in 0..(1usize << d) {
            let center: Vec<i32> = (0..d)
                .map(|i| if (corner >> i) & 1 == 1 { ni } else { 1 })
                .collect();
            let mut on_cubie = Vec::with_capacity(d);
            for i in 0..d {
                let mut sticker = center.clone();
                sticker[i] += if (corner >> i) & 1 == 1 { 1 } else { -1 };
                let c = (*stickers.get(&sticker))
                    .ok_or_else(|| insane("corner is missing a sticker"))?;
                on_cubie.push(c);
            }
            for &a in &on_cubie {
                if let Some(possible) = opposites.get_mut(&a) {
                    possible.retain(|c| !on_cubie.contains(c));
                }
            }
        }
        for (c, possible) in &opposites {
            if possible.len() != 1 {
                return Err(insane(format!(
                    "color {c:?} has {} possible opposites",
                    possible.len()
                )));
            }
        }

        for pair in colors.iter_mut() {
            let opposite = opposites
                .get(&pair[0])
                .map(|p| p[0])
                .ok_or_else(|| insane("unknown face color"))?;
            if odd {
                if pair[1] != opposite {
                    return Err(insane(format!(
                        "face colors {:?} and {:?} are not opposite",
                        pair[0], pair[1]
                    )));
                }
            } else {
                pair[1] = opposite;
            }
        }
        Ok(Self(colors))
    }

    /// Color of the face at `sign` along `axis`.
    pub fn color(&self, axis: usize, sign: i32) -> char {
        self.0[axis][usize::from(sign > 0)]
    }

    /// Signed axis with the given color, preferring lower axes and then the negative side.
    pub fn find(&self, c: char) -> Option<(usize, i32)> {
        self.0.iter().enumerate().find_map(|(axis, pair)| {
            pair.iter()
                .position(|&x| x == c)
                .map(|i| (axis, 2 * i as i32 - 1))
        })
    }

    /// Follow a quarter turn of the middle slice, which for odd puzzles carries the face centers
    /// from `+from` to `+to`.
    pub fn rotate(&mut self, from_axis: usize, to_axis: usize) {
        let c = &mut self.0;
        let temp = c[from_axis][1];
        c[from_axis][1] = c[to_axis][0];
        c[to_axis][0] = c[from_axis][0];
        c[from_axis][0] = c[to_axis][1];
        c[to_axis][1] = temp;
    }
}

/// Build the target map of a colored puzzle with `n <= 3`.
///
/// Every sticker pulls its cubie towards the face of its color, which for small puzzles pins down
/// exactly where the cubie belongs. The sticker itself then belongs one step further towards that
/// face.
pub fn target_map(shape: Shape, stickers: &Stickers) -> Result<TargetMap> {
    let Shape { n, d } = shape;
    let ni = shape.ni();
    let colors = AxisColors::of(shape, stickers)?;

    let mut face_of: FxHashMap<char, Vec<i32>> = FxHashMap::default();
    for (axis, pair) in colors.0.iter().enumerate() {
        for (i, &c) in pair.iter().enumerate() {
            if c.is_whitespace() || face_of.contains_key(&c) {
                return Err(insane(format!("face color {c:?} is used twice")));
            }
            let mut coords = vec![0; d];
            coords[axis] = (2 * i as i32 - 1) * (ni + 1);
            face_of.insert(c, coords);
        }
    }

    let mut answer = shape.grid(|_| vec![0; d]);
    for flat in 0..stickers.len() {
        if let Some(c) = stickers.cells()[flat] {
            let face = face_of
                .get(&c)
                .ok_or_else(|| insane(format!("color {c:?} isn't a face color")))?;
            let cubie = shape.cubie_of(&shape.unflat(flat));
            let sum = plus(answer.get(&cubie), face);
            answer.set(&cubie, clamp_all(&sum, -(ni - 1), ni - 1));
        }
    }
    for flat in 0..stickers.len() {
        if let Some(c) = stickers.cells()[flat] {
            let face = &face_of[&c];
            let index = shape.unflat(flat);
            let step: Vec<i32> = face.iter().map(|x| (2 * x).clamp(-2, 2)).collect();
            let wants = plus(answer.get(&shape.cubie_of(&index)), &step);
            answer.cells_mut()[flat] = wants;
        }
    }

    let mut hit = vec![false; stickers.len()];
    let mut targets = Vec::with_capacity(stickers.len());
    for (flat, coords) in answer.cells().iter().enumerate() {
        if shape.is_air(&shape.unflat(flat)) {
            targets.push(flat);
            continue;
        }
        let target = shape.coords_to_index(coords);
        if target.iter().any(|&x| x < 0 || x > ni + 1) {
            return Err(insane("a sticker wants to leave the puzzle"));
        }
        if shape.is_air(&target) {
            return Err(insane("a sticker wants to float in the air"));
        }
        let t = shape.flat(&target);
        if std::mem::replace(&mut hit[t], true) {
            return Err(insane("two pieces want the same place"));
        }
        targets.push(t);
    }
    debug!("built target map for {n}^{d}");
    Ok(Grid::from_cells(shape.side(), d, targets))
}

/// The target map of a solved puzzle.
pub fn identity(shape: Shape) -> TargetMap {
    Grid::from_cells(shape.side(), shape.d, (0..shape.cell_count()).collect())
}

/// Whether every sticker is where it wants to be.
pub fn is_solved(shape: Shape, targets: &TargetMap) -> bool {
    targets
        .cells()
        .iter()
        .enumerate()
        .all(|(i, &t)| t == i || !shape.is_sticker(&shape.unflat(i)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::parse;

    const SOLVED_333: &str =
        "AAAAAAAAA BBBCcCcCcbbb BBBCcCcCcbbb BBBCcCcCcbbb aaaaaaaaa";

    #[test]
    fn solved_colors() {
        let (shape, stickers) = parse(SOLVED_333).unwrap();
        let colors = AxisColors::of(shape, &stickers).unwrap();
        assert_eq!(colors.0, vec![['A', 'a'], ['B', 'b'], ['C', 'c']]);
        assert_eq!(colors.find('b'), Some((1, 1)));
        assert_eq!(colors.color(2, -1), 'C');
    }

    #[test]
    fn solved_maps_to_itself() {
        let (shape, stickers) = parse(SOLVED_333).unwrap();
        let targets = target_map(shape, &stickers).unwrap();
        assert_eq!(targets, identity(shape));
        assert!(is_solved(shape, &targets));
    }

    #[test]
    fn two_by_two_colors_come_from_first_cubie() {
        // a solved 2^3 is just the letters of each face
        let s = "AAAA BBCcCcbb BBCcCcbb aaaa";
        let (shape, stickers) = parse(s).unwrap();
        let colors = AxisColors::of(shape, &stickers).unwrap();
        assert_eq!(colors.0, vec![['A', 'a'], ['B', 'b'], ['C', 'c']]);
        assert!(is_solved(shape, &target_map(shape, &stickers).unwrap()));
    }

    #[test]
    fn rejects_corner_with_opposite_colors() {
        // give the first corner both an A and an a sticker
        let mut chars: Vec<char> = SOLVED_333.chars().filter(|c| !c.is_whitespace()).collect();
        chars.swap(9, 45);
        let s: String = chars.into_iter().collect();
        let (shape, stickers) = parse(&s).unwrap();
        assert!(matches!(
            target_map(shape, &stickers),
            Err(Error::InsanePuzzle(_))
        ));
    }

    #[test]
    fn middle_slice_rotation_of_colors() {
        let mut colors = AxisColors(vec![['A', 'a'], ['B', 'b'], ['C', 'c']]);
        colors.rotate(1, 2);
        // the old -to color is now on +from, the old +from color on +to
        assert_eq!(colors.0, vec![['A', 'a'], ['c', 'C'], ['B', 'b']]);
    }
}

//! Deciding whether a puzzle can be solved without trying to.
//!
//! The checks are the ones the solver relies on: no corner may be a mirror image of where it
//! wants to be, the cubies of each type have to be an even permutation (after the same parity
//! twist the solver makes), the flips on each non-corner type have to pair up, and in 3 and 4
//! dimensions the corner twirls have to add up to a multiple of 3.

use log::{debug, info};

use super::{cycles_of, selected, state_is_odd, Progress, PARITY_TWIST};
use crate::coord::Shape;
use crate::moves::TwistCache;
use crate::rotation::find_rotations;
use crate::target::TargetMap;

fn has_odd_parity(cycles: &[Vec<usize>]) -> bool {
    cycles.iter().filter(|c| c.len() % 2 == 0).count() % 2 == 1
}

/// Determinant of a square integer matrix, by fraction-free elimination.
fn determinant(rows: &[Vec<i32>]) -> i64 {
    let size = rows.len();
    if size == 0 {
        return 1;
    }
    let mut m: Vec<Vec<i64>> = rows
        .iter()
        .map(|r| {
            assert_eq!(r.len(), size, "determinant of a non-square matrix");
            r.iter().map(|&x| i64::from(x)).collect()
        })
        .collect();
    let mut sign = 1;
    let mut prev = 1;
    for i in 0..size {
        if m[i][i] == 0 {
            match (i + 1..size).find(|&r| m[r][i] != 0) {
                Some(r) => {
                    m.swap(i, r);
                    sign = -sign;
                }
                None => return 0,
            }
        }
        for r in i + 1..size {
            for c in i + 1..size {
                m[r][c] = (m[r][c] * m[i][i] - m[r][i] * m[i][c]) / prev;
            }
        }
        prev = m[i][i];
    }
    sign * m[size - 1][size - 1]
}

/// Sticker of the cubie centered at `center` facing along `axis`, if it has one.
fn sticker_along(shape: Shape, center: &[i32], axis: usize) -> Option<Vec<i32>> {
    let ni = shape.ni();
    let x = center[axis];
    (x == 1 || x == ni).then(|| {
        let mut s = center.to_vec();
        s[axis] = if x == 1 { 0 } else { ni + 1 };
        s
    })
}

/// Whether some corner can only get to where it wants to be by a reflection.
fn has_inside_out_corner(shape: Shape, targets: &TargetMap) -> bool {
    let d = shape.d;
    (0..targets.len())
        .map(|i| shape.unflat(i))
        .filter(|index| shape.is_k_cubie(d, index))
        .any(|corner| {
            let (these, those): (Vec<_>, Vec<_>) = (0..d)
                .filter_map(|axis| sticker_along(shape, &corner, axis))
                .map(|s| {
                    let target = shape.unflat(targets.cells()[shape.flat(&s)]);
                    (shape.index_to_coords(&s), shape.index_to_coords(&target))
                })
                .unzip();
            let mirrored = find_rotations(&these, &those).is_err();
            if mirrored {
                debug!("corner {corner:?} is inside out");
            }
            mirrored
        })
}

/// Swap `k`-sticker cubies into place, dragging their stickers along, so that what's left of the
/// target map on their stickers is just orientation.
fn put_in_place(shape: Shape, k: usize, targets: &mut TargetMap) {
    let d = shape.d;
    let cells = targets.cells_mut();
    for start in 0..cells.len() {
        let index = shape.unflat(start);
        if !shape.is_k_cubie(k, &index) {
            continue;
        }
        while cells[start] != start {
            let target = cells[start];
            cells[start] = cells[target];
            cells[target] = target;
            for axis in 0..d {
                if let Some(s) = sticker_along(shape, &index, axis) {
                    let s = shape.flat(&s);
                    let t = cells[s];
                    cells[s] = cells[t];
                    cells[t] = t;
                }
            }
        }
    }
}

/// Sum over the twirled corners of `±1` by handedness, for 3 and 4 dimensions where a single
/// corner can't be twirled on its own.
fn twirl_modulus(shape: Shape, targets: &TargetMap, visited: &mut [bool]) -> i32 {
    let d = shape.d;
    let mut modulus = 0;
    for cycle in cycles_of(shape, targets, visited, |index| shape.is_k_sticker(d, index)) {
        if d == 3 {
            assert_ne!(cycle.len(), 2, "swapped stickers on a corner that isn't inside out");
        }
        // swaps come in pairs in 4 dimensions
        if cycle.len() <= 2 {
            continue;
        }
        assert_eq!(cycle.len(), 3);
        let mut rows: Vec<Vec<i32>> = cycle
            .iter()
            .map(|&i| shape.index_to_coords(&shape.unflat(i)))
            .collect();
        if d == 4 {
            let center = shape.cubie_of(&shape.unflat(cycle[0]));
            rows.push(shape.index_to_coords(&center));
        }
        let det = determinant(&rows);
        assert_ne!(det, 0);
        modulus += if det < 0 { -1 } else { 1 };
    }
    modulus
}

/// Whether the puzzle with the given target map can be solved, checking positions of the cubie
/// types selected by `position_mask` and orientations of those selected by `orient_mask`.
///
/// Progress lines describing each check go to `progress`.
///
/// # Panics
///
/// If `orient_mask` has a type that `position_mask` doesn't.
pub(crate) fn is_solvable(
    shape: Shape,
    targets: &TargetMap,
    position_mask: u32,
    orient_mask: u32,
    progress: &mut Progress<'_>,
) -> bool {
    let Shape { n, d } = shape;
    // a single cubie is always solved once it's sane
    if n == 1 {
        return true;
    }
    assert_eq!(orient_mask & !position_mask, 0);
    let mut solvable = true;
    let mut visited = vec![false; targets.len()];

    progress.print(format_args!(
        "    Checking for inside-outedness of corner cubies... "
    ));
    let inside_out = usize::from(has_inside_out_corner(shape, targets));
    if inside_out > 0 {
        solvable = false;
    }
    progress.print(format_args!(
        "{inside_out}/{} corners inside-out{}\n",
        1usize << d,
        if inside_out == 0 { "." } else { "!" }
    ));

    progress.print(format_args!(
        "    Checking permutation parity on {}-sticker cubies... ",
        if n == 2 { d } else { 2 }
    ));
    let mut targets = targets.clone();
    let was_odd = state_is_odd(shape, &targets, &mut visited);
    if was_odd {
        TwistCache::new(shape).apply(&mut targets, &[PARITY_TWIST]);
        progress.print(format_args!("odd; applying one twist\n"));
    } else {
        progress.print(format_args!("even.\n"));
    }

    for k in 2..=d {
        if n < 3 && k < d {
            continue;
        }
        let defect = if k == d { "twirl" } else { "flip" };
        if !selected(position_mask, k) {
            progress.print(format_args!(
                "    Checking permutation parity on {k}-sticker cubies... NOT!\n    Checking {defect} parity on {k}-sticker cubies... NOT!\n"
            ));
            continue;
        }

        // the 2-sticker check was just done above unless a twist changed things
        if k != 2 || was_odd {
            progress.print(format_args!(
                "    Checking permutation parity on {k}-sticker cubies... "
            ));
            let cycles = cycles_of(shape, &targets, &mut visited, |index| {
                shape.is_k_cubie(k, index)
            });
            if has_odd_parity(&cycles) {
                info!("{k}-sticker cubies are an odd permutation");
                solvable = false;
                progress.print(format_args!("odd!\n"));
            } else {
                progress.print(format_args!("even.\n"));
            }
        }

        if !selected(orient_mask, k) {
            progress.print(format_args!(
                "    Checking {defect} parity on {k}-sticker cubies... NOT!\n"
            ));
            continue;
        }
        progress.print(format_args!(
            "    Checking {defect} parity on {k}-sticker cubies... "
        ));
        if k == d && inside_out > 0 {
            progress.print(format_args!(" NOT (it's pointless)\n"));
            continue;
        }

        put_in_place(shape, k, &mut targets);
        if k == d {
            if d == 3 || d == 4 {
                let modulus = twirl_modulus(shape, &targets, &mut visited);
                if modulus % 3 != 0 {
                    info!("corner twirls add up to {modulus}");
                    solvable = false;
                    progress.print(format_args!("nonzero mod 3!\n"));
                } else {
                    progress.print(format_args!("zero mod 3.\n"));
                }
            } else {
                progress.print(format_args!("not necessary (d>=5)\n"));
            }
        } else {
            let cycles = cycles_of(shape, &targets, &mut visited, |index| {
                shape.is_k_sticker(k, index)
            });
            if has_odd_parity(&cycles) {
                info!("odd number of flips on {k}-sticker cubies");
                solvable = false;
                progress.print(format_args!("odd!\n"));
            } else {
                progress.print(format_args!("even.\n"));
            }
        }
    }

    if solvable {
        progress.print(format_args!("    Puzzle is solvable.\n\n"));
    } else {
        progress.print(format_args!("    Puzzle is NOT solvable.\n\n"));
    }
    solvable
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::{random_twist, Twist};
    use crate::target::identity;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn permute_stickers(shape: Shape, stickers: &[&[i32]]) -> TargetMap {
        let mut targets = identity(shape);
        let flats: Vec<usize> = stickers.iter().map(|s| shape.flat(s)).collect();
        for (i, &from) in flats.iter().enumerate() {
            targets.cells_mut()[from] = flats[(i + 1) % flats.len()];
        }
        targets
    }

    fn check(shape: Shape, targets: &TargetMap) -> (bool, String) {
        let mut out = Vec::new();
        let solvable = is_solvable(
            shape,
            targets,
            !0,
            !0,
            &mut Progress::new(Some(&mut out)),
        );
        (solvable, String::from_utf8(out).unwrap())
    }

    #[test]
    fn determinants() {
        assert_eq!(determinant(&[]), 1);
        assert_eq!(determinant(&[vec![1, 0, 0], vec![0, 1, 0], vec![0, 0, 1]]), 1);
        assert_eq!(determinant(&[vec![0, 1, 0], vec![1, 0, 0], vec![0, 0, 1]]), -1);
        assert_eq!(
            determinant(&[vec![-4, -2, -2], vec![-2, -4, -2], vec![-2, -2, -4]]),
            -32
        );
        assert_eq!(determinant(&[vec![1, 2], vec![2, 4]]), 0);
        assert_eq!(
            determinant(&[
                vec![0, 2, 0, 0],
                vec![0, 0, 0, 3],
                vec![1, 0, 0, 0],
                vec![0, 0, 5, 0],
            ]),
            -30
        );
        // a 3-cycle is even
        assert_eq!(
            determinant(&[vec![0, 2, 0], vec![0, 0, 3], vec![5, 0, 0]]),
            30
        );
    }

    #[test_log::test]
    fn solved_is_solvable() {
        for (n, d) in [(1, 3), (2, 3), (3, 3), (2, 4), (3, 4)] {
            let shape = Shape::new(n, d);
            assert!(check(shape, &identity(shape)).0, "{n}^{d}");
        }
    }

    #[test_log::test]
    fn scrambles_are_solvable() {
        for (n, d, seed) in [(3, 3, 1), (3, 3, 2), (2, 3, 3), (3, 4, 4), (2, 4, 5), (3, 5, 6)] {
            let shape = Shape::new(n, d);
            let mut rng = StdRng::seed_from_u64(seed);
            let twists: Vec<Twist> = (0..21)
                .map(|_| random_twist(shape, &mut rng).unwrap())
                .collect();
            let mut targets = identity(shape);
            TwistCache::new(shape).apply(&mut targets, &twists);
            let (solvable, text) = check(shape, &targets);
            assert!(solvable, "{n}^{d} seed {seed}:\n{text}");
        }
    }

    #[test]
    fn flipped_edge() {
        let shape = Shape::new(3, 3);
        let targets = permute_stickers(shape, &[&[0, 1, 2], &[1, 0, 2]]);
        let (solvable, text) = check(shape, &targets);
        assert!(!solvable);
        assert!(text.contains("Checking flip parity on 2-sticker cubies... odd!"));
        assert!(text.ends_with("    Puzzle is NOT solvable.\n\n"));

        let mut quiet = Progress::silent();
        assert!(is_solvable(shape, &targets, !0, !(1 << 2), &mut quiet));
    }

    #[test]
    fn stickers_swapped_across_two_edges() {
        let shape = Shape::new(3, 3);
        let targets = permute_stickers(shape, &[&[0, 1, 2], &[0, 2, 1]]);
        assert!(!check(shape, &targets).0);
    }

    #[test]
    fn twirled_corner() {
        let shape = Shape::new(3, 3);
        let targets = permute_stickers(shape, &[&[0, 1, 1], &[1, 0, 1], &[1, 1, 0]]);
        let (solvable, text) = check(shape, &targets);
        assert!(!solvable);
        assert!(text.contains("0/8 corners inside-out."));
        assert!(text.contains("nonzero mod 3!"));
    }

    #[test]
    fn one_twirled_corner_is_fine_in_five_dimensions() {
        let shape = Shape::new(2, 5);
        let stickers: [&[i32]; 3] = [&[0, 1, 1, 1, 1], &[1, 0, 1, 1, 1], &[1, 1, 0, 1, 1]];
        let targets = permute_stickers(shape, &stickers);
        let (solvable, text) = check(shape, &targets);
        assert!(solvable, "{text}");
        assert!(text.contains("not necessary (d>=5)"));
    }

    #[test]
    fn inside_out_corner() {
        let shape = Shape::new(3, 3);
        let targets = permute_stickers(shape, &[&[0, 1, 1], &[1, 0, 1]]);
        let (solvable, text) = check(shape, &targets);
        assert!(!solvable);
        assert!(text.contains("1/8 corners inside-out!"));
        assert!(text.contains(" NOT (it's pointless)"));
    }
}

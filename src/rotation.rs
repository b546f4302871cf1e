//! Finding a sequence of quarter rotations of coordinate planes that carries one list of points
//! onto another.
//!
//! Think of the points as the rows of a matrix. A rotation from axis `i` to axis `j` swaps two
//! columns and negates one of them, so the job is to sort the columns of `these` into the columns
//! of `those`, keeping track of signs. A column is *happy* if it already equals its target column
//! and *antihappy* if it equals its negation (a zero column is both). Only an even number of
//! antihappy columns can be fixed by rotations alone; an odd number left over means the two
//! configurations are mirror images of each other.

use log::trace;

use crate::coord::norm_sqrd;
use crate::moves::{rot90_coords, Twist};

/// A quarter rotation taking `+.0` to `+.1`.
pub type Rotation = (usize, usize);

/// The points can only be matched up by a reflection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MirrorImage;

fn column_equals(a: &[Vec<i32>], i: usize, b: &[Vec<i32>], j: usize, sign: i32) -> bool {
    a.iter().zip(b).all(|(x, y)| x[i] == sign * y[j])
}

fn rotate_all(from_axis: usize, to_axis: usize, points: &mut [Vec<i32>]) {
    for p in points.iter_mut() {
        *p = rot90_coords(from_axis, to_axis, p);
    }
}

/// Apply a sequence of rotations to a point.
pub fn rotate_coords(rots: &[Rotation], coords: &[i32]) -> Vec<i32> {
    rots.iter()
        .fold(coords.to_vec(), |c, &(from, to)| rot90_coords(from, to, &c))
}

/// Find rotations taking each of `these` to the corresponding one of `those`.
///
/// # Panics
///
/// If the two lists can't be matched up at all (different lengths or norms, or a column with no
/// partner). Being off by a reflection isn't a panic, that's reported as [`MirrorImage`].
pub fn find_rotations(
    these: &[Vec<i32>],
    those: &[Vec<i32>],
) -> Result<Vec<Rotation>, MirrorImage> {
    assert_eq!(these.len(), those.len());
    let d = these.first().map_or(0, Vec::len);
    for (a, b) in these.iter().zip(those) {
        assert_eq!(norm_sqrd(a), norm_sqrd(b), "{these:?} and {those:?} differ in length");
    }

    let mut cur = these.to_vec();
    let mut happy: Vec<bool> = (0..d).map(|i| column_equals(&cur, i, those, i, 1)).collect();
    let mut antihappy: Vec<bool> = (0..d).map(|i| column_equals(&cur, i, those, i, -1)).collect();
    let mut solution = Vec::new();

    // first pass: make every column happy or antihappy, preferring swaps that fix both columns
    for i in 0..d {
        if happy[i] || antihappy[i] {
            continue;
        }
        for picky in [true, false] {
            for j in i + 1..d {
                if happy[j] || antihappy[j] {
                    continue;
                }
                let rot = if column_equals(&cur, j, those, i, 1)
                    && (!picky || column_equals(&cur, i, those, j, -1))
                {
                    (j, i)
                } else if column_equals(&cur, j, those, i, -1)
                    && (!picky || column_equals(&cur, i, those, j, 1))
                {
                    (i, j)
                } else {
                    continue;
                };
                solution.push(rot);
                rotate_all(rot.0, rot.1, &mut cur);
                happy[i] = true;
                antihappy[i] = column_equals(&cur, i, those, i, -1);
                if picky {
                    happy[j] = true;
                }
                antihappy[j] = column_equals(&cur, j, those, j, -1);
                break;
            }
            if happy[i] {
                break;
            }
        }
        assert!(happy[i], "{these:?} can't be rotated to {those:?}");
    }

    // second pass: half turns fix antihappy columns two at a time
    let mut remaining = None;
    for i in 0..d {
        if happy[i] {
            continue;
        }
        // half turns always go from the later axis to the earlier one. (i, j) is the same
        // rotation but names the twists of a solution differently
        if let Some(j) = (i + 1..d).find(|&j| !happy[j]) {
            solution.extend([(j, i), (j, i)]);
            rotate_all(j, i, &mut cur);
            rotate_all(j, i, &mut cur);
            happy[i] = true;
            antihappy[i] = false;
            happy[j] = true;
            antihappy[j] = false;
        } else {
            remaining = Some(i);
        }
    }

    // third pass: a single antihappy column needs help from the others
    if let Some(i) = remaining {
        // a column equal (or opposite) to this one: one quarter turn fixes it
        for j in (0..d).filter(|&j| j != i) {
            let sign = if column_equals(&cur, i, &cur, j, 1) {
                1
            } else if column_equals(&cur, i, &cur, j, -1) {
                -1
            } else {
                continue;
            };
            let rot = if sign == 1 { (i, j) } else { (j, i) };
            solution.push(rot);
            rotate_all(rot.0, rot.1, &mut cur);
            happy[i] = true;
            antihappy[i] = false;
            break;
        }
        // a zero column: half turn with it
        if !happy[i] {
            if let Some(j) = (0..d).find(|&j| j != i && column_equals(&cur, j, &cur, j, -1)) {
                // (j, i) like the other half turns, which fixes how solutions are named
                solution.extend([(j, i), (j, i)]);
                rotate_all(j, i, &mut cur);
                rotate_all(j, i, &mut cur);
                happy[i] = true;
                antihappy[i] = false;
            }
        }
        // two other columns equal (or opposite) to each other: a quarter turn makes one of
        // them antihappy, then a half turn with that one
        if !happy[i] {
            'outer: for j in (0..d).filter(|&j| j != i) {
                for k in (0..d).filter(|&k| k != i && k != j) {
                    let sign = if column_equals(&cur, j, &cur, k, 1) {
                        1
                    } else if column_equals(&cur, j, &cur, k, -1) {
                        -1
                    } else {
                        continue;
                    };
                    solution.push((j, k));
                    rotate_all(j, k, &mut cur);
                    let other = if sign == 1 { j } else { k };
                    solution.extend([(i, other), (i, other)]);
                    rotate_all(i, other, &mut cur);
                    rotate_all(i, other, &mut cur);
                    happy[i] = true;
                    antihappy[i] = false;
                    break 'outer;
                }
            }
        }
        if !happy[i] {
            trace!("{these:?} -> {those:?} is a mirror image");
            return Err(MirrorImage);
        }
    }

    for i in 0..d {
        assert!(happy[i] && column_equals(&cur, i, those, i, 1));
        assert_eq!(antihappy[i], column_equals(&cur, i, those, i, -1));
    }
    for (a, b) in these.iter().zip(those) {
        assert_eq!(&rotate_coords(&solution, a), b);
    }
    Ok(solution)
}

/// Twists of just the one face taking `these` to `those`.
///
/// The face normal is added to both lists so the rotation leaves the face where it is.
///
/// # Panics
///
/// If there is no such rotation.
pub fn oneface_twists(
    face_axis: usize,
    face_sign: i32,
    these: &[Vec<i32>],
    those: &[Vec<i32>],
    slices: i32,
) -> Vec<Twist> {
    let Some(first) = these.first() else {
        return Vec::new();
    };
    let mut normal = vec![0; first.len()];
    normal[face_axis] = face_sign;
    let mut these = these.to_vec();
    let mut those = those.to_vec();
    these.push(normal.clone());
    those.push(normal);
    match find_rotations(&these, &those) {
        Ok(rots) => rots
            .into_iter()
            .map(|(from_axis, to_axis)| Twist {
                face_axis,
                face_sign,
                from_axis,
                to_axis,
                slices,
            })
            .collect(),
        Err(MirrorImage) => panic!("{these:?} -> {those:?} on one face needs a reflection"),
    }
}

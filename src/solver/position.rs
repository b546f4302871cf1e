//! Putting every cubie of one type in its place, three at a time.
//!
//! Any even permutation is a product of 3-cycles, and three cubies of the same type can always be
//! twisted into an L (each differing from the next in one coordinate) without touching smaller
//! cubies. Cycling an L is a commutator, built recursively one dimension at a time.

use log::{debug, trace};

use super::cycles_of;
use crate::coord::{first_axis, minus, n_different, norm_sqrd, plus, sign_of, Shape};
use crate::moves::{Move, MoveSequence, Twist};
use crate::rotation::oneface_twists;
use crate::target::TargetMap;

/// Twists putting every `k`-sticker cubie where it belongs, without disturbing any cubie with
/// fewer stickers.
///
/// # Panics
///
/// If the permutation of `k`-sticker cubies is odd.
pub(crate) fn position_cubies(
    shape: Shape,
    k: usize,
    targets: &TargetMap,
    visited: &mut [bool],
) -> Vec<Twist> {
    let cycles: Vec<Vec<usize>> = cycles_of(shape, targets, visited, |index| {
        shape.is_k_cubie(k, index)
    })
    .into_iter()
    .filter(|c| c.len() > 1)
    .collect();
    debug!("{k}-sticker cubie cycles: {cycles:?}");

    let tricycles = split_into_3_cycles(cycles);
    debug!("{k}-sticker cubie 3-cycles: {tricycles:?}");

    let mut solution = Vec::new();
    for tricycle in tricycles {
        let points: Vec<Vec<i32>> = tricycle
            .iter()
            .map(|&i| shape.index_to_coords(&shape.unflat(i)))
            .collect();
        solution.extend(cycle_three(shape, k, &points));
    }
    solution
}

/// Rewrite a product of disjoint cycles as a product of 3-cycles, applied in order.
fn split_into_3_cycles(cycles: Vec<Vec<usize>>) -> Vec<[usize; 3]> {
    let mut cycles: Vec<Option<Vec<usize>>> = cycles.into_iter().map(Some).collect();
    let mut tricycles = Vec::new();
    for i in 0..cycles.len() {
        let Some(mut cycle) = cycles[i].take() else {
            continue;
        };
        while cycle.len() != 1 {
            if cycle.len() == 2 {
                // (a b) (c d e f) -> (a b c) (c a d e f)
                let other = cycles[i + 1..]
                    .iter_mut()
                    .find(|c| c.as_ref().is_some_and(|c| c.len() % 2 == 0))
                    .and_then(Option::take);
                let Some(mut other) = other else {
                    panic!("odd permutation left over in {cycle:?}");
                };
                tricycles.push([cycle[0], cycle[1], other[0]]);
                other.insert(1, cycle[0]);
                cycle = other;
            } else {
                // (a b c d e) -> (a b c) (a d e)
                tricycles.push([cycle[0], cycle[1], cycle[2]]);
                cycle.drain(1..3);
            }
        }
    }
    tricycles
}

/// Twists taking the cubie centered at `points[0]` to `points[1]`, that one to `points[2]` and
/// that one back to `points[0]`.
pub(crate) fn cycle_three(shape: Shape, k: usize, points: &[Vec<i32>]) -> Vec<Twist> {
    let (to_l, l) = take_to_l(shape, points);
    trace!("{points:?} goes to L {l:?} in {} twists", to_l.len());
    MoveSequence(to_l)
        .conjugate(MoveSequence(cycle_l(shape, k, &l)))
        .0
}

/// Move `p` to `target`, which differs from it only along `t`, by a twist of the `t_sign` face of
/// `t`. If `p` isn't on that face yet it's first brought there by twisting the face of `helper`.
fn route(
    shape: Shape,
    t: usize,
    t_sign: i32,
    p: Vec<i32>,
    target: &[i32],
    helper: impl FnOnce(&[i32]) -> usize,
) -> Vec<Twist> {
    let d = shape.d;
    let mut twists = Vec::new();
    let mut p = p;
    if p[t] != target[t] {
        let h = helper(&p);
        assert_ne!(h, t);
        let mut way = p.clone();
        way[t] = target[t];
        if p[t] == 0 {
            let z = first_axis(d, "axis to zero out", |i| {
                i != h && i != t && way[i] != 0 && way[i].abs() == way[t].abs()
            });
            way[z] = 0;
        }
        twists.extend(oneface_twists(
            h,
            sign_of(p[h]),
            &[p],
            std::slice::from_ref(&way),
            1,
        ));
        p = way;
    }
    twists.extend(oneface_twists(t, t_sign, &[p], &[target.to_vec()], 1));
    twists
}

/// Twists bringing two or three cubies (by the coords of their centers) into an I or an L, where
/// consecutive cubies differ along exactly one axis. The first cubie stays put. Returns the twists
/// along with where the cubies ended up.
pub(crate) fn take_to_l(shape: Shape, points: &[Vec<i32>]) -> (Vec<Twist>, Vec<Vec<i32>>) {
    let Shape { n, d } = shape;
    assert!(points.len() == 2 || points.len() == 3);
    let a = points[0].clone();
    let mut b = points[1].clone();
    assert_ne!(a, b);
    if let Some(c) = points.get(2) {
        assert!(b != *c && *c != a);
    }

    let mut solution = Vec::new();
    if n_different(&a, &b) > 1 {
        let t = first_axis(d, "face of A", |i| a[i] != 0);
        let t_sign = -sign_of(a[t]);
        let mut target = a.clone();
        target[t] = -a[t];
        solution.extend(route(shape, t, t_sign, b, &target, |b| {
            first_axis(d, "helper face for B", |i| b[i] != 0 && a[i] != b[i])
        }));
        b = target;
    }
    assert_eq!(n_different(&a, &b), 1);
    assert_eq!(norm_sqrd(&a), norm_sqrd(&b));

    let Some(c) = points.get(2) else {
        return (solution, vec![a, b]);
    };
    let mut c = crate::moves::twist_all_coords(n, &solution, c);
    assert!(b != c && c != a);
    if n_different(&b, &c) > 1 {
        let t = first_axis(d, "face of B", |i| b[i] != 0 && b[i] == a[i]);
        let t_sign = -sign_of(b[t]);
        let mut target = b.clone();
        target[t] = -b[t];
        solution.extend(route(shape, t, t_sign, c, &target, |c| {
            first_axis(d, "helper face for C", |i| {
                c[i] != 0 && b[i] != c[i] && a[i] != c[i]
            })
        }));
        c = target;
    }
    assert_eq!(n_different(&a, &b), 1);
    assert_eq!(n_different(&b, &c), 1);
    assert_eq!(n_different(&c, &a), 2);
    assert_eq!(norm_sqrd(&b), norm_sqrd(&c));
    (solution, vec![a, b, c])
}

/// Twists cycling three `k`-sticker cubies in an L, `l[0]` to `l[1]` to `l[2]`, leaving every
/// cubie with at most `k` stickers alone.
fn cycle_l(shape: Shape, k: usize, l: &[Vec<i32>]) -> Vec<Twist> {
    let d = shape.d;
    let (a, b, c) = (&l[0], &l[1], &l[2]);
    assert_eq!(norm_sqrd(a), norm_sqrd(b));
    assert_eq!(norm_sqrd(b), norm_sqrd(c));
    // 1-sticker cubies never move
    assert!(k >= 2);

    if k == 2 {
        // two half turns of the faces shared by consecutive edges
        let half_turn = |p: &Vec<i32>, q: &Vec<i32>| {
            let mid = plus(p, q);
            let axis = first_axis(d, "shared face", |i| mid[i] != 0);
            let twists = oneface_twists(
                axis,
                sign_of(p[axis]),
                std::slice::from_ref(p),
                std::slice::from_ref(q),
                1,
            );
            assert_eq!(twists.len(), 2);
            MoveSequence(twists)
        };
        let ab = half_turn(a, b);
        let bc = half_turn(b, c);
        ab.clone().append(bc.clone()).append(ab).append(bc).0
    } else {
        cycle_l_of_slabs(shape, d - k, a, b, c)
    }
}

/// Cycle three `depth`-dimensional slabs in an L, identified by their centers.
///
/// Three corners of a 3d subcube are cycled by the commutator `U R U' L' U R' U' L`. A cycle of
/// slabs `(a b c)` is the commutator of the cycle `(h a b)` of thicker slabs (the points with the
/// shared face axis zeroed out, `h` being the fourth corner of the square) with the face twist
/// taking `a b c h` around.
fn cycle_l_of_slabs(shape: Shape, depth: usize, a: &[i32], b: &[i32], c: &[i32]) -> Vec<Twist> {
    let Shape { n, d } = shape;
    assert!(depth + 3 <= d);

    if depth + 3 == d {
        let u = first_axis(d, "U face", |i| a[i] != 0 && a[i] == b[i] && b[i] == c[i]);
        let l = first_axis(d, "L face", |i| a[i] != 0 && a[i] != b[i] && b[i] == c[i]);
        let f = first_axis(d, "F face", |i| a[i] != 0 && a[i] == b[i] && b[i] != c[i]);
        let (us, ls, fs) = (sign_of(a[u]), sign_of(b[l]), sign_of(c[f]));

        let up = Twist::new(u, us, f, fs, l, ls, 1);
        let left = Twist::new(l, ls, u, us, f, fs, 1);
        let right = Twist::new(l, -ls, f, fs, u, us, 1);
        return vec![
            up,
            right,
            up.inverse(),
            left.inverse(),
            up,
            right.inverse(),
            up.inverse(),
            left,
        ];
    }

    let h = plus(&minus(a, b), c);
    let face = first_axis(d, "shared face", |i| a[i] != 0 && a[i] == b[i] && b[i] == c[i]);
    let sign = sign_of(a[face]);
    let thicken = |p: &[i32]| {
        let mut p = p.to_vec();
        p[face] = 0;
        p
    };

    let inner = cycle_l_of_slabs(shape, depth + 1, &thicken(&h), &thicken(a), &thicken(b));
    let square = oneface_twists(
        face,
        sign,
        &[a.to_vec(), b.to_vec()],
        &[b.to_vec(), c.to_vec()],
        1,
    );
    assert_eq!(square.len(), 1);
    for (p, q) in [(a, b), (b, c), (c, &h[..]), (&h[..], a)] {
        assert_eq!(square[0].twist_coords(n, p), q);
    }
    MoveSequence(inner).commutator(MoveSequence(square)).0
}

//! Orienting every cubie of one type once they're all in place.
//!
//! An oriented-wrong cubie has its stickers permuted among themselves. Those permutations are
//! ground down into *flips* (swapping two stickers, for cubies that aren't corners) or *twirls*
//! (cycling three stickers of a corner), and the defects are fixed two at a time: the two cubies
//! are twisted into a canonical position, a commutator fixes both, and the first twists are
//! undone.

use log::debug;

use super::cycles_of;
use super::position::take_to_l;
use crate::coord::{clamp_all, first_axis, minus, n_different, sign_of, Shape};
use crate::moves::{rot90_index, twist_all_coords, Move, MoveSequence, Twist};
use crate::rotation::{find_rotations, oneface_twists};
use crate::target::TargetMap;

/// The two kinds of orientation defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Defect {
    /// Two stickers of a cubie that isn't a corner are swapped.
    Flip,
    /// Three stickers of a corner are cycled.
    Twirl,
}

/// A cubie pressed into service once no other cubie is left to pair a defect with. It takes the
/// opposite of every defect paired with it, as `forward` or `backward`.
#[derive(Debug)]
struct Recruit {
    forward: Vec<Vec<i32>>,
    backward: Vec<Vec<i32>>,
    /// Net number of times `forward` has been put on it
    turns: i32,
}

/// One level of the slab recursion: `setup` brings the slabs into place, the defects on `a` and
/// `b` are fixed one dimension down, and the commutator of that with `slice` leaves the fix on
/// these slabs alone.
struct Extrusion {
    setup: MoveSequence<Twist>,
    b: Vec<Vec<i32>>,
    slice: MoveSequence<Twist>,
}

impl Defect {
    fn of(k: usize, d: usize) -> Self {
        if k < d {
            Self::Flip
        } else {
            Self::Twirl
        }
    }

    /// Number of stickers involved.
    fn len(self) -> usize {
        match self {
            Self::Flip => 2,
            Self::Twirl => 3,
        }
    }

    /// Make every sticker cycle one that can be ground down `len` stickers at a time. Twirls need
    /// odd cycles, so two even cycles on one corner become two odd ones:
    /// `(a b) (c d) -> (a b c) (c a d)`.
    fn regroup(self, shape: Shape, cycles: &mut [Vec<Vec<i32>>]) {
        if self == Self::Flip {
            return;
        }
        for i in 0..cycles.len() {
            if cycles[i].len() % 2 == 0 {
                let partner = (i + 1..cycles.len()).find(|&j| {
                    cycles[j].len() % 2 == 0 && shape.same_cubie(&cycles[i][0], &cycles[j][0])
                });
                if let Some(j) = partner {
                    let c = cycles[j][0].clone();
                    let a = cycles[i][0].clone();
                    cycles[i].push(c);
                    cycles[j].insert(1, a);
                }
            }
            assert!(cycles[i].len() % 2 == 1);
        }
    }

    /// Recruit the cubie a quarter turn away from the one with defect `own`.
    fn recruit(self, shape: Shape, own: &[Vec<i32>]) -> Recruit {
        let forward: Vec<Vec<i32>> = own.iter().map(|s| rot90_index(shape, 0, 1, s)).collect();
        let backward = forward.iter().rev().cloned().collect();
        Recruit {
            forward,
            backward,
            turns: 0,
        }
    }

    /// The defect to put on the recruit so that it pairs with `own`.
    fn pair_with_recruit(
        self,
        shape: Shape,
        own: &[Vec<i32>],
        recruit: &mut Recruit,
    ) -> Vec<Vec<i32>> {
        match self {
            Self::Flip => recruit.forward.clone(),
            Self::Twirl => {
                let like_forward = same_handedness(shape, own, &recruit.forward);
                check_handedness(
                    shape.d,
                    like_forward,
                    same_handedness(shape, own, &recruit.backward),
                );
                if like_forward {
                    recruit.turns -= 1;
                    recruit.backward.clone()
                } else {
                    recruit.turns += 1;
                    recruit.forward.clone()
                }
            }
        }
    }

    /// The defect pairing with `own` taken out of `other`, the sticker cycle of another cubie.
    fn pair_with_helper(
        self,
        shape: Shape,
        own: &[Vec<i32>],
        other: &mut Vec<Vec<i32>>,
    ) -> Vec<Vec<i32>> {
        match self {
            Self::Flip => {
                let flip = other[..2].to_vec();
                other.remove(1);
                flip
            }
            Self::Twirl => {
                let hij = other[..3].to_vec();
                let jih: Vec<Vec<i32>> = hij.iter().rev().cloned().collect();
                let like_jih = same_handedness(shape, own, &jih);
                check_handedness(shape.d, same_handedness(shape, own, &hij), like_jih);
                if like_jih {
                    other.drain(1..3);
                    hij
                } else {
                    other.swap(1, 2);
                    jih
                }
            }
        }
    }

    /// Pairs putting the recruit back the way it was. A recruited corner has to end up twirled a
    /// multiple of 3 times, which in 5 or more dimensions needs fixing up against the opposite
    /// corner. Flips always cancel out.
    fn release(self, shape: Shape, recruit: Recruit) -> Vec<Pair> {
        let Recruit {
            mut forward,
            mut backward,
            turns,
        } = recruit;
        if self == Self::Flip || turns % 3 == 0 {
            return Vec::new();
        }
        assert!(shape.d >= 5, "recruited corner twirled {turns} times");
        if turns.rem_euclid(3) == 1 {
            std::mem::swap(&mut forward, &mut backward);
        }
        let opposite: Vec<Vec<i32>> = forward
            .iter()
            .map(|s| {
                let c: Vec<i32> = shape.index_to_coords(s).iter().map(|x| -x).collect();
                shape.coords_to_index(&c)
            })
            .collect();
        let opposite_backward = opposite.iter().rev().cloned().collect();
        vec![(backward.clone(), opposite), (backward, opposite_backward)]
    }

    /// An axis to turn flips about in the base case, which no sticker of `a` points along.
    fn spare_axis(self, d: usize, a: &[Vec<i32>]) -> Option<usize> {
        match self {
            Self::Flip => Some(first_axis(d, "axis along the flipped cubie", |i| a[0][i] == 0)),
            Self::Twirl => None,
        }
    }

    /// Twists fixing the defects on two cubies of a 3-dimensional cross section, given in coords.
    fn base_case(
        self,
        shape: Shape,
        a: &[Vec<i32>],
        b: &[Vec<i32>],
        spare: Option<usize>,
    ) -> Vec<Twist> {
        match self {
            Self::Flip => {
                let Some(spare) = spare else {
                    panic!("flips need a spare axis");
                };
                flip_cross_section(shape, a, b, spare)
            }
            Self::Twirl => twirl_cross_section(shape, a, b),
        }
    }

    /// The twists around one level of the recursion along `extrusion`.
    fn extrude(self, shape: Shape, extrusion: usize, a: &[Vec<i32>], b: &[Vec<i32>]) -> Extrusion {
        let d = shape.d;
        let a_center = cubie_center(shape, &a[0]);
        let mut b_center = cubie_center(shape, &b[0]);
        let extrusion_sign = sign_of(a_center[extrusion]);
        match self {
            Self::Flip => {
                let apart = n_different(&a_center, &b_center);
                assert!(apart == 1 || apart == 2);
                let a_face = first_axis(d, "A face", |i| {
                    a_center[i] != 0 && a_center[i] == -b_center[i]
                });
                let a_face_sign = sign_of(a_center[a_face]);

                let mut setup = MoveSequence::new();
                let mut b = b.to_vec();
                if apart == 1 {
                    // half turn about A's side to make the I a diagonal
                    let other = first_axis(d, "other face", |i| {
                        i != a_face && (b[0][i] != b_center[i] || b[1][i] != b_center[i])
                    });
                    let zero_face = first_axis(d, "zero face", |i| b_center[i] == 0);
                    let quarter = Twist::new(a_face, -a_face_sign, other, 1, zero_face, 1, 1);
                    setup = MoveSequence(vec![quarter; 2]);
                    for p in b.iter_mut() {
                        p[other] = -p[other];
                    }
                    b_center[other] = -b_center[other];
                }
                let b_face = first_axis(d, "B face", |i| {
                    i != a_face && b_center[i] != 0 && b_center[i] == -a_center[i]
                });
                let b_face_sign = sign_of(b_center[b_face]);
                for p in b.iter_mut() {
                    p[b_face] = -p[b_face];
                }
                let slice = Twist::new(
                    extrusion,
                    extrusion_sign,
                    a_face,
                    -a_face_sign,
                    b_face,
                    -b_face_sign,
                    1,
                );
                Extrusion {
                    setup,
                    b,
                    slice: MoveSequence(vec![slice]),
                }
            }
            Self::Twirl => {
                let a_legs = legs(&a_center, a);
                let b_legs = legs(&b_center, b);
                let bc_face = first_axis(d, "BC face", |i| b_center[i] != a_center[i]);
                let bc_sign = sign_of(b_center[bc_face]);
                let c_face = first_axis(d, "C face", |i| {
                    i != bc_face && i != extrusion && b_legs[i] != 0
                });
                let c_sign = sign_of(b_legs[c_face]);
                let abc_face = first_axis(d, "ABC face", |i| {
                    i != extrusion && i != bc_face && i != c_face && a_legs[i] != 0
                });
                let abc_sign = sign_of(a_center[abc_face]);
                Extrusion {
                    setup: MoveSequence(vec![Twist::new(
                        bc_face, bc_sign, abc_face, abc_sign, c_face, c_sign, 1,
                    )]),
                    b: b.to_vec(),
                    slice: MoveSequence(vec![
                        Twist::new(extrusion, extrusion_sign, bc_face, bc_sign, c_face, c_sign, 1),
                        Twist::new(
                            extrusion,
                            extrusion_sign,
                            c_face,
                            c_sign,
                            abc_face,
                            abc_sign,
                            1,
                        ),
                    ]),
                }
            }
        }
    }
}

/// The same defect on two different cubies, as sticker index vectors. Fixing the pair carries
/// each sticker of a list to the next one (cyclically).
type Pair = (Vec<Vec<i32>>, Vec<Vec<i32>>);

fn cubie_center(shape: Shape, p: &[i32]) -> Vec<i32> {
    let ni = shape.ni();
    clamp_all(p, -(ni - 1), ni - 1)
}

fn twist_points(n: usize, twists: &[Twist], points: &[Vec<i32>]) -> Vec<Vec<i32>> {
    points
        .iter()
        .map(|p| twist_all_coords(n, twists, p))
        .collect()
}

/// Sum of the directions from each sticker to the center of its cubie.
fn legs(center: &[i32], stickers: &[Vec<i32>]) -> Vec<i32> {
    let mut sum = vec![0; center.len()];
    for s in stickers {
        for (x, (c, y)) in sum.iter_mut().zip(center.iter().zip(s)) {
            *x += c - y;
        }
    }
    sum
}

fn without_axis(points: &[Vec<i32>], axis: usize) -> Vec<Vec<i32>> {
    points
        .iter()
        .map(|p| {
            let mut p = p.clone();
            p[axis] = 0;
            p
        })
        .collect()
}

/// Twists orienting every `k`-sticker cubie, which must all be in place already, without
/// disturbing cubies with fewer stickers.
pub(crate) fn orient_cubies(
    shape: Shape,
    k: usize,
    targets: &TargetMap,
    visited: &mut [bool],
) -> Vec<Twist> {
    let d = shape.d;
    let cycles: Vec<Vec<Vec<i32>>> = cycles_of(shape, targets, visited, |index| {
        shape.is_k_sticker(k, index)
    })
    .into_iter()
    .filter(|c| c.len() > 1)
    .map(|c| c.into_iter().map(|i| shape.unflat(i)).collect())
    .collect();
    for cycle in &cycles {
        for s in &cycle[1..] {
            assert!(
                shape.same_cubie(s, &cycle[0]),
                "{k}-sticker cubie isn't in place: {cycle:?}"
            );
        }
    }
    debug!("{k}-sticker cycles: {cycles:?}");

    let defect = Defect::of(k, d);
    let pairs = pair_defects(shape, defect, cycles);
    debug!("{defect:?} pairs: {pairs:?}");

    let mut solution = Vec::new();
    for (a, b) in pairs {
        let a: Vec<Vec<i32>> = a.iter().map(|s| shape.index_to_coords(s)).collect();
        let b: Vec<Vec<i32>> = b.iter().map(|s| shape.index_to_coords(s)).collect();
        solution.extend(fix_pair(shape, k, defect, &a, &b));
    }
    solution
}


/// Index of the first cycle after `i` that can still help, on a different cubie than `cycle`.
fn find_helper(shape: Shape, cycles: &[Vec<Vec<i32>>], i: usize, cycle: &[Vec<i32>]) -> Option<usize> {
    (i + 1..cycles.len())
        .find(|&j| cycles[j].len() > 1 && !shape.same_cubie(&cycles[j][0], &cycle[0]))
}

/// Whether twirls `p` and `q` (as index vectors) go the same way round.
fn same_handedness(shape: Shape, p: &[Vec<i32>], q: &[Vec<i32>]) -> bool {
    let p: Vec<Vec<i32>> = p.iter().map(|s| shape.index_to_coords(s)).collect();
    let q: Vec<Vec<i32>> = q.iter().map(|s| shape.index_to_coords(s)).collect();
    find_rotations(&p, &q).is_ok()
}

/// Handedness only means something in 3 and 4 dimensions.
fn check_handedness(d: usize, one: bool, other: bool) {
    if d == 3 || d == 4 {
        assert_ne!(one, other);
    } else {
        assert!(one && other);
    }
}

/// Grind sticker cycles down into pairs of defects that can be fixed together.
fn pair_defects(shape: Shape, defect: Defect, mut cycles: Vec<Vec<Vec<i32>>>) -> Vec<Pair> {
    defect.regroup(shape, &mut cycles);
    let len = defect.len();
    let mut pairs = Vec::new();
    let mut recruit: Option<Recruit> = None;
    for i in 0..cycles.len() {
        let mut cycle = std::mem::take(&mut cycles[i]);
        while cycle.len() != 1 {
            assert!(cycle.len() >= len);
            let own = cycle[..len].to_vec();
            if let Some(recruit) = recruit.as_mut() {
                let other = defect.pair_with_recruit(shape, &own, recruit);
                pairs.push((own, other));
            } else if let Some(j) = find_helper(shape, &cycles, i, &cycle) {
                let other = defect.pair_with_helper(shape, &own, &mut cycles[j]);
                pairs.push((own, other));
            } else {
                recruit = Some(defect.recruit(shape, &own));
                continue;
            }
            cycle.drain(1..len);
        }
    }
    if let Some(recruit) = recruit {
        pairs.extend(defect.release(shape, recruit));
    }
    pairs
}

/// Twists fixing a pair of defects given in coords, moving nothing else with at most `k` stickers.
fn fix_pair(shape: Shape, k: usize, defect: Defect, a: &[Vec<i32>], b: &[Vec<i32>]) -> Vec<Twist> {
    let Shape { n, d } = shape;
    assert_eq!(a.len(), defect.len());
    assert_eq!(b.len(), defect.len());

    let solution = if defect == Defect::Flip && k == 2 {
        // edges line up into an I directly
        let centers = [cubie_center(shape, &a[0]), cubie_center(shape, &b[0])];
        let (to_i, i) = take_to_l(shape, &centers);
        MoveSequence(to_i).conjugate(MoveSequence(flip_i_of_edges(shape, &i)))
    } else {
        let to_flat = flatten(shape, k, a, b);
        let a1 = twist_points(n, &to_flat, a);
        let b1 = twist_points(n, &to_flat, b);
        let spare = defect.spare_axis(d, &a1);
        let fix = fix_slabs(shape, defect, d - k, &a1, &b1, spare);
        MoveSequence(to_flat).conjugate(MoveSequence(fix))
    };

    for p in [a, b] {
        for i in 0..p.len() {
            assert_eq!(
                twist_all_coords(n, &solution.0, &p[i]),
                p[(i + 1) % p.len()]
            );
        }
    }
    solution.0
}

/// Twists bringing the cubies of two defects next to each other with their stickers lined up:
/// the centers differ along one axis, and the stickers of the second cubie (as directions from
/// its center) match those of the first, except the one facing across the gap which points the
/// other way.
fn flatten(shape: Shape, k: usize, a: &[Vec<i32>], b: &[Vec<i32>]) -> Vec<Twist> {
    let Shape { n, d } = shape;
    let len = a.len();
    assert!(len == 2 || len == 3);
    assert_eq!(b.len(), len);

    let centers = [cubie_center(shape, &a[0]), cubie_center(shape, &b[0])];
    let (mut solution, _) = take_to_l(shape, &centers);
    debug!("flattening {k}-sticker pair {a:?} {b:?}");
    let a = twist_points(n, &solution, a);
    let mut b = twist_points(n, &solution, b);
    let a_center = cubie_center(shape, &a[0]);
    let mut b_center = cubie_center(shape, &b[0]);

    let mut face = first_axis(d, "face between the cubies", |i| {
        a_center[i] != 0 && a_center[i] == -b_center[i]
    });
    let mut face_sign = sign_of(b_center[face]);
    let a_legs = legs(&a_center, &a);
    let b_legs = legs(&b_center, &b);

    if a_legs[face] == 0 || b_legs[face] == 0 {
        // the legs don't point at each other yet; the cubie with one along the face picks first
        let (a_leg, b_leg) = if a_legs[face] != 0 {
            let a_leg = first_axis(d, "leg of A", |i| i != face && a_legs[i] != 0);
            let b_leg = first_axis(d, "leg of B", |i| {
                i != face && i != a_leg && b_legs[i] != 0
            });
            (a_leg, b_leg)
        } else {
            let b_leg = first_axis(d, "leg of B", |i| i != face && b_legs[i] != 0);
            let a_leg = first_axis(d, "leg of A", |i| {
                i != face && i != b_leg && a_legs[i] != 0
            });
            (a_leg, b_leg)
        };
        let a_leg_sign = sign_of(a_legs[a_leg]);
        let b_leg_sign = sign_of(b_legs[b_leg]);
        let more = [
            Twist::new(face, face_sign, a_leg, a_leg_sign, b_leg, b_leg_sign, 1),
            Twist::new(a_leg, a_leg_sign, b_leg, b_leg_sign, face, face_sign, 1),
        ];
        solution.extend(more);
        b = twist_points(n, &more, &b);
        b_center = cubie_center(shape, &b[0]);
        face = a_leg;
        face_sign = a_leg_sign;
        assert!(b_center[face] != 0 && b_center[face] == -a_center[face]);
        assert_eq!(n_different(&a_center, &b_center), 1);
    }

    // turn B about the face so the rest of its legs match A's
    let mut a_rest = legs(&a_center, &a);
    let mut b_rest = legs(&b_center, &b);
    assert!(b_rest[face] != 0 && b_rest[face] == -a_rest[face]);
    a_rest[face] = 0;
    b_rest[face] = 0;
    let turn = oneface_twists(
        face,
        face_sign,
        &[b_rest, b_center.clone()],
        &[a_rest, b_center.clone()],
        1,
    );
    solution.extend(&turn);
    b = twist_points(n, &turn, &b);
    assert_eq!(cubie_center(shape, &b[0]), b_center);

    let spanned = (0..d)
        .filter(|&i| a.iter().any(|p| p[i] != a_center[i]) || b.iter().any(|p| p[i] != b_center[i]))
        .count();
    assert_eq!(spanned, len);
    assert_eq!(n_different(&a_center, &b_center), 1);

    if len == 3 {
        // the twirls may still run opposite ways around
        let ai = first_axis(3, "sticker of A across the gap", |i| a[i][face] != a_center[face]);
        let bi = first_axis(3, "sticker of B across the gap", |i| b[i][face] != b_center[face]);
        assert_eq!(minus(&a[ai], &a_center), minus(&b_center, &b[bi]));
        let next_a = minus(&a[(ai + 1) % 3], &a_center);
        if next_a != minus(&b[(bi + 1) % 3], &b_center) {
            assert_eq!(next_a, minus(&b[(bi + 2) % 3], &b_center));
            assert!(d >= 5, "twirls can't be reversed in {d} dimensions");
            let these = [b[bi].clone(), b[(bi + 1) % 3].clone(), b[(bi + 2) % 3].clone()];
            let those = [b[bi].clone(), b[(bi + 2) % 3].clone(), b[(bi + 1) % 3].clone()];
            let fix = oneface_twists(face, face_sign, &these, &those, 1);
            solution.extend(&fix);
            b = twist_points(n, &fix, &b);
            assert_eq!(cubie_center(shape, &b[0]), b_center);
        }
    }
    solution
}

/// Flip two edges lined up in an I, given by their centers, with a well known edge flipping
/// sequence on the faces around them.
fn flip_i_of_edges(shape: Shape, i: &[Vec<i32>]) -> Vec<Twist> {
    let d = shape.d;
    let (a, b) = (&i[0], &i[1]);
    let u = first_axis(d, "U face", |x| a[x] != 0 && a[x] == b[x]);
    let f = first_axis(d, "F face", |x| a[x] != b[x]);
    let r = first_axis(d, "R face", |x| x != u && x != f);
    let (us, fs, rs) = (sign_of(a[u]), sign_of(a[f]), 1);

    let front = Twist::new(f, fs, u, us, r, rs, 1);
    let right = Twist::new(r, rs, f, fs, u, us, 1);
    let up = Twist::new(u, us, r, rs, f, fs, 1);
    let back = Twist {
        face_sign: -fs,
        ..front.inverse()
    };
    let down = Twist {
        face_sign: -us,
        ..up.inverse()
    };
    vec![
        front,
        right,
        right,
        up,
        down,
        back,
        back,
        up,
        up,
        back.inverse(),
        up,
        back,
        up,
        back,
        back,
        down.inverse(),
        right.inverse(),
        up.inverse(),
        right.inverse(),
        front.inverse(),
    ]
}

/// Fix the defects on two lined up `depth`-dimensional slabs of cubies, given by one defect on
/// each in coords. Each level extrudes the slabs along an axis where they agree, down to a
/// 3-dimensional cross section.
fn fix_slabs(
    shape: Shape,
    defect: Defect,
    depth: usize,
    a: &[Vec<i32>],
    b: &[Vec<i32>],
    spare: Option<usize>,
) -> Vec<Twist> {
    let d = shape.d;
    assert!(depth + 3 <= d);
    if depth + 3 == d {
        return defect.base_case(shape, a, b, spare);
    }

    let extrusion = first_axis(d, "extrusion axis", |i| {
        a[0][i] != 0 && a[1..].iter().chain(b).all(|p| p[i] == a[0][i])
    });
    let Extrusion { setup, b, slice } = defect.extrude(shape, extrusion, a, b);
    let inner = fix_slabs(
        shape,
        defect,
        depth + 1,
        &without_axis(a, extrusion),
        &without_axis(&b, extrusion),
        spare,
    );
    setup.conjugate(MoveSequence(inner).commutator(slice)).0
}

/// Flip two cubies of a 3-dimensional cross section, given by one flip `[s, t]` on each. `spare`
/// is an axis no sticker of the original flips points along.
fn flip_cross_section(shape: Shape, a: &[Vec<i32>], b: &[Vec<i32>], spare: usize) -> Vec<Twist> {
    let Shape { n, d } = shape;
    let extreme = shape.ni() + 1;
    let a_center = cubie_center(shape, &a[0]);
    let b_center = cubie_center(shape, &b[0]);
    let apart = n_different(&a_center, &b_center);
    assert!(apart == 1 || apart == 2);

    if apart == 2 {
        // diagonal: a half turn of B's face makes it an I
        assert!(d > 4);
        let b_face = first_axis(d, "B face", |i| b_center[i] != a_center[i]);
        let from_axis = first_axis(d, "from axis", |i| {
            i != b_face && (b[0][i] != b_center[i] || b[1][i] != b_center[i])
        });
        let to_axis = first_axis(d, "to axis", |i| a.iter().chain(b).all(|p| p[i] == 0));
        let quarter = Twist {
            face_axis: b_face,
            face_sign: sign_of(b_center[b_face]),
            from_axis,
            to_axis,
            slices: 1,
        };
        let half = MoveSequence(vec![quarter; 2]);
        let b_moved = twist_points(n, &half.0, b);
        assert_eq!(
            n_different(&a_center, &cubie_center(shape, &b_moved[0])),
            1
        );
        let flip = MoveSequence(flip_cross_section(shape, a, &b_moved, spare));
        return half.clone().append(flip).append(half).0;
    }

    // two cubies side by side
    let i_ax = first_axis(d, "I face", |i| {
        a_center[i] != 0
            && a_center[i] == b_center[i]
            && a.iter().chain(b).all(|p| p[i].abs() != extreme)
    });
    let u = first_axis(d, "U face", |i| {
        i != i_ax && a_center[i] != 0 && a_center[i] == b_center[i]
    });
    let f = first_axis(d, "F face", |i| i != i_ax && i != u && a_center[i] != 0);
    let r = spare;
    assert!(r != i_ax && r != u && r != f);
    let (is, us, fs, rs) = (
        sign_of(a_center[i_ax]),
        sign_of(a_center[u]),
        sign_of(a_center[f]),
        1,
    );

    let setup = MoveSequence(vec![Twist::new(f, fs, u, us, i_ax, is, 1)]);
    let inner = MoveSequence(vec![
        Twist::new(u, -us, i_ax, is, r, rs, 1),
        Twist::new(u, -us, f, fs, i_ax, is, 1),
        Twist::new(u, -us, r, rs, f, fs, 1),
    ]);
    let slice = MoveSequence(vec![Twist::new(u, us, f, fs, r, rs, 1); 2]);
    // (setup inner setup') slice (setup inner' setup') slice'
    let conj = setup.clone().conjugate(inner.clone());
    let unconj = setup.conjugate(inner.inverse());
    conj.append(slice.clone())
        .append(unconj)
        .append(slice.inverse())
        .0
}

/// Twirl two corners of a 3-dimensional cross section, given by one twirl on each.
fn twirl_cross_section(shape: Shape, a: &[Vec<i32>], b: &[Vec<i32>]) -> Vec<Twist> {
    let d = shape.d;
    let extreme = shape.ni() + 1;
    let a_center = cubie_center(shape, &a[0]);
    let b_center = cubie_center(shape, &b[0]);

    let f = first_axis(d, "F face", |i| a_center[i] != b_center[i]);
    let fs = sign_of(a_center[f]);
    // start both twirls at the sticker along F
    let from_f = |p: &[Vec<i32>], center: &[i32]| -> Vec<Vec<i32>> {
        let s = (0..3).position(|i| p[i][f] != center[f]).unwrap_or(0);
        (0..3).map(|j| p[(s + j) % 3].clone()).collect()
    };
    let a = from_f(a, &a_center);
    let b = from_f(b, &b_center);
    assert_eq!(a[0][f], fs * extreme);
    assert_eq!(b[0][f], -fs * extreme);
    let u = first_axis(d, "U face", |i| a[1][i] != a_center[i]);
    let us = sign_of(a_center[u]);
    assert_eq!(a[1][u], us * extreme);
    assert_eq!(b[1][u], us * extreme);
    let r = first_axis(d, "R face", |i| a[2][i] != a_center[i]);
    let rs = sign_of(a_center[r]);
    assert_eq!(a[2][r], rs * extreme);
    assert_eq!(b[2][r], rs * extreme);

    let up = Twist::new(u, us, r, rs, f, fs, 1);
    let front = Twist::new(f, fs, u, us, r, rs, 1);
    let right = Twist::new(r, rs, f, fs, u, us, 1);
    let down = Twist::new(u, -us, f, fs, r, rs, 1);
    vec![
        front,
        down,
        down,
        front.inverse(),
        right.inverse(),
        down,
        down,
        right,
        up,
        right.inverse(),
        down,
        down,
        right,
        front,
        down,
        down,
        front.inverse(),
        up.inverse(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn stickers_of(shape: Shape, center: &[i32]) -> Vec<Vec<i32>> {
        let ni = shape.ni();
        (0..shape.d)
            .filter(|&i| center[i].abs() == ni - 1)
            .map(|i| {
                let mut s = center.to_vec();
                s[i] = sign_of(center[i]) * (ni + 1);
                s
            })
            .collect()
    }

    fn k_cubies(shape: Shape, k: usize) -> Vec<Vec<i32>> {
        (0..shape.cell_count())
            .map(|i| shape.unflat(i))
            .filter(|index| shape.is_k_cubie(k, index))
            .map(|index| shape.index_to_coords(&index))
            .collect()
    }

    fn two_cubies(count: usize) -> impl Strategy<Value = (usize, usize)> {
        (0..count, 1..count).prop_map(move |(a, x)| (a, (a + x) % count))
    }

    #[test]
    fn defect_kinds() {
        assert_eq!(Defect::of(2, 3), Defect::Flip);
        assert_eq!(Defect::of(3, 3), Defect::Twirl);
        assert_eq!(Defect::Twirl.len(), 3);
    }

    #[test]
    fn flips_pair_up_then_recruit() {
        let shape = Shape::new(3, 3);
        let cycles = vec![
            vec![vec![0, 1, 2], vec![1, 0, 2]],
            vec![vec![0, 3, 2], vec![1, 4, 2]],
            vec![vec![4, 1, 2], vec![3, 0, 2]],
        ];
        let pairs = pair_defects(shape, Defect::Flip, cycles);
        assert_eq!(
            pairs,
            vec![
                (
                    vec![vec![0, 1, 2], vec![1, 0, 2]],
                    vec![vec![0, 3, 2], vec![1, 4, 2]]
                ),
                // the last flip has nobody left, so the edge a quarter turn away takes it
                (
                    vec![vec![4, 1, 2], vec![3, 0, 2]],
                    vec![vec![3, 4, 2], vec![4, 3, 2]]
                ),
            ]
        );
    }

    #[test]
    fn twirls_pair_with_the_opposite_hand() {
        let shape = Shape::new(3, 3);
        let a = vec![vec![0, 1, 1], vec![1, 0, 1], vec![1, 1, 0]];
        let b = vec![vec![4, 3, 3], vec![3, 4, 3], vec![3, 3, 4]];
        let pairs = pair_defects(shape, Defect::Twirl, vec![a.clone(), b.clone()]);
        assert_eq!(pairs, vec![(a, b)]);
        let coords = |p: &[Vec<i32>]| -> Vec<Vec<i32>> {
            p.iter().map(|s| shape.index_to_coords(s)).collect()
        };
        for (a, b) in &pairs {
            // panics unless both twirls come undone
            fix_pair(shape, 3, Defect::Twirl, &coords(a), &coords(b));
        }
    }

    #[test]
    fn even_cycles_on_a_corner_regroup() {
        let shape = Shape::new(3, 4);
        let (a, b, c, d) = (
            vec![0, 1, 1, 1],
            vec![1, 0, 1, 1],
            vec![1, 1, 0, 1],
            vec![1, 1, 1, 0],
        );
        let mut cycles = vec![vec![a.clone(), b.clone()], vec![c.clone(), d.clone()]];
        let untouched = cycles.clone();
        Defect::Flip.regroup(shape, &mut cycles);
        assert_eq!(cycles, untouched);
        Defect::Twirl.regroup(shape, &mut cycles);
        assert_eq!(cycles, vec![vec![a.clone(), b, c.clone()], vec![c, a, d]]);
    }

    #[test]
    fn recruits_are_released() {
        let shape = Shape::new(3, 5);
        let own = vec![vec![0, 1, 1, 1, 1], vec![1, 0, 1, 1, 1], vec![1, 1, 0, 1, 1]];
        let recruit = |turns| Recruit {
            turns,
            ..Defect::Twirl.recruit(shape, &own)
        };
        assert!(Defect::Flip.release(shape, recruit(1)).is_empty());
        assert!(Defect::Twirl.release(shape, recruit(3)).is_empty());
        assert!(Defect::Twirl.release(shape, recruit(-6)).is_empty());
        let forward = recruit(0).forward;
        let pairs = Defect::Twirl.release(shape, recruit(1));
        assert_eq!(pairs.len(), 2);
        assert!(pairs.iter().all(|(p, _)| *p == forward));
    }

    #[test]
    fn edge_flip_is_twenty_twists() {
        let shape = Shape::new(3, 3);
        let i = [vec![2, 2, 0], vec![-2, 2, 0]];
        assert_eq!(flip_i_of_edges(shape, &i).len(), 20);
    }

    #[test]
    fn legs_point_inwards() {
        let center = vec![2, 2, 2];
        let stickers = vec![vec![4, 2, 2], vec![2, 4, 2]];
        assert_eq!(legs(&center, &stickers), vec![-2, -2, 0]);
    }

    fn check_flip(shape: Shape, k: usize, pick: (usize, usize), sa: (usize, usize), sb: (usize, usize)) -> Result<(), TestCaseError> {
        let cubies = k_cubies(shape, k);
        let a_stickers = stickers_of(shape, &cubies[pick.0]);
        let b_stickers = stickers_of(shape, &cubies[pick.1]);
        let choose = |s: &[Vec<i32>], (i, j): (usize, usize)| {
            let i = i % s.len();
            let j = (i + 1 + j % (s.len() - 1)) % s.len();
            vec![s[i].clone(), s[j].clone()]
        };
        let a = choose(&a_stickers, sa);
        let b = choose(&b_stickers, sb);
        let twists = fix_pair(shape, k, Defect::Flip, &a, &b);
        prop_assert_eq!(twist_all_coords(shape.n, &twists, &a[1]), a[0].clone());
        for c in (0..shape.cell_count())
            .map(|i| shape.unflat(i))
            .filter(|index| shape.is_cubie(index) && shape.boundary_axes(index) <= k)
        {
            let c = shape.index_to_coords(&c);
            prop_assert_eq!(twist_all_coords(shape.n, &twists, &c), c);
        }
        Ok(())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn flips_edges_of_a_cube(pick in two_cubies(12), sa in any::<(usize, usize)>(), sb in any::<(usize, usize)>()) {
            check_flip(Shape::new(3, 3), 2, pick, sa, sb)?;
        }

        #[test]
        fn flips_3_sticker_cubies_of_a_tesseract(pick in two_cubies(32), sa in any::<(usize, usize)>(), sb in any::<(usize, usize)>()) {
            check_flip(Shape::new(3, 4), 3, pick, sa, sb)?;
        }

        #[test]
        fn flips_edges_of_a_tesseract(pick in two_cubies(24), sa in any::<(usize, usize)>(), sb in any::<(usize, usize)>()) {
            check_flip(Shape::new(3, 4), 2, pick, sa, sb)?;
        }

        #[test]
        fn twirls_opposite_corners_of_a_cube(
            pick in two_cubies(8),
            rot in 0usize..3,
            n in 2usize..4,
        ) {
            let shape = Shape::new(n, 3);
            let corners = k_cubies(shape, 3);
            let a = stickers_of(shape, &corners[pick.0]);
            let mut b = stickers_of(shape, &corners[pick.1]);
            b.rotate_left(rot);
            // twirls on a cube only cancel when they go opposite ways
            if find_rotations(&a, &b).is_ok() {
                b.swap(0, 1);
            }
            let twists = fix_pair(shape, 3, Defect::Twirl, &a, &b);
            prop_assert_eq!(twist_all_coords(n, &twists, &b[2]), b[0].clone());
        }
    }
}

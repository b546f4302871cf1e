use std::fmt;

use rand::Rng;

use crate::coord::{reverse_bits, Shape};
use crate::error::{Error, Result};

#[cfg(test)]
use proptest::prelude::*;

/// A 90 degree twist of some slices of the puzzle.
///
/// The slices perpendicular to `face_axis` selected by `slices` are rotated so that the
/// `+from_axis` direction goes to `+to_axis`. Bit `i` of `slices` is the `i`th layer counting from
/// the face on the `face_sign` side, so a mask of `1` turns just that face and a mask with all `n`
/// bits set turns the whole puzzle.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub struct Twist {
    pub face_axis: usize,
    pub face_sign: i32,
    pub from_axis: usize,
    pub to_axis: usize,
    pub slices: i32,
}

impl Twist {
    /// Make the twist about the `face_sign` face of `face_axis` taking the signed axis
    /// `from_sign * from_axis` to `to_sign * to_axis`.
    pub fn new(
        face_axis: usize,
        face_sign: i32,
        from_axis: usize,
        from_sign: i32,
        to_axis: usize,
        to_sign: i32,
        slices: i32,
    ) -> Self {
        assert!(face_sign == 1 || face_sign == -1);
        assert!(from_sign == 1 || from_sign == -1);
        assert!(to_sign == 1 || to_sign == -1);
        assert!(face_axis != from_axis && from_axis != to_axis && to_axis != face_axis);
        // -from -> to is the same rotation as to -> from
        let (from_axis, to_axis) = if from_sign == to_sign {
            (from_axis, to_axis)
        } else {
            (to_axis, from_axis)
        };
        Self {
            face_axis,
            face_sign,
            from_axis,
            to_axis,
            slices,
        }
    }

    /// The same twist written relative to the negative face, so that bit `i` of the mask is the
    /// layer with index `i + 1` along the face axis.
    pub fn canonical(self, n: usize) -> Self {
        if self.face_sign == 1 {
            Self {
                face_sign: -1,
                slices: reverse_bits(self.slices, n),
                ..self
            }
        } else {
            self
        }
    }

    /// Whether layer `bit` (counted from the twist's own face) turns.
    pub fn moves_layer(&self, bit: i32) -> bool {
        (self.slices >> bit) & 1 == 1
    }

    /// Where this twist takes a point given in coords.
    pub fn twist_coords(&self, n: usize, coords: &[i32]) -> Vec<i32> {
        let n = n as i32;
        let bit = ((-self.face_sign * coords[self.face_axis] + n - 1) / 2).clamp(0, n - 1);
        if self.moves_layer(bit) {
            rot90_coords(self.from_axis, self.to_axis, coords)
        } else {
            coords.to_vec()
        }
    }
}

impl crate::moves::Move for Twist {
    fn inverse(self) -> Self {
        Self {
            from_axis: self.to_axis,
            to_axis: self.from_axis,
            ..self
        }
    }
}

impl fmt::Debug for Twist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for Twist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.face_sign < 0 { '-' } else { '+' };
        write!(
            f,
            "{sign}{}:{}->{}",
            self.face_axis, self.from_axis, self.to_axis
        )?;
        if self.slices != 1 {
            write!(f, "/{}", self.slices)?;
        }
        Ok(())
    }
}

/// Rotate coords by the 90 degree rotation taking `+from_axis` to `+to_axis`.
pub fn rot90_coords(from_axis: usize, to_axis: usize, coords: &[i32]) -> Vec<i32> {
    let mut result = coords.to_vec();
    result[to_axis] = coords[from_axis];
    result[from_axis] = -coords[to_axis];
    result
}

/// [`rot90_coords`] for an index vector.
pub fn rot90_index(shape: Shape, from_axis: usize, to_axis: usize, index: &[i32]) -> Vec<i32> {
    shape.coords_to_index(&rot90_coords(
        from_axis,
        to_axis,
        &shape.index_to_coords(index),
    ))
}

/// Apply a whole sequence of twists to a point given in coords.
pub fn twist_all_coords(n: usize, twists: &[Twist], coords: &[i32]) -> Vec<i32> {
    twists
        .iter()
        .fold(coords.to_vec(), |c, t| t.twist_coords(n, &c))
}

/// A random twist of one slice on the near half of a random face.
///
/// There have to be three distinct axes, so `d` must be at least 3.
pub fn random_twist(shape: Shape, rng: &mut impl Rng) -> Result<Twist> {
    let Shape { n, d } = shape;
    if d < 3 {
        return Err(Error::UnsupportedSize { n, d });
    }
    let (face_axis, from_axis, to_axis) = loop {
        let face = rng.gen_range(0..d);
        let from = rng.gen_range(0..d);
        let to = rng.gen_range(0..d);
        if face != from && from != to && to != face {
            break (face, from, to);
        }
    };
    let face_sign = if rng.gen_bool(0.5) { 1 } else { -1 };
    let slices = if n >= 2 { 1 << rng.gen_range(0..n / 2) } else { 1 };
    Ok(Twist {
        face_axis,
        face_sign,
        from_axis,
        to_axis,
        slices,
    })
}

/// Rewrite a twist sequence so it never moves the first cubie, by turning the complementary
/// slices of the opposite face instead whenever a twist would.
///
/// The result leaves the puzzle in the same state up to a rotation of the whole puzzle. That's the
/// only way an even puzzle has of remembering which way up it is.
pub fn keep_first_cubie_fixed(n: usize, d: usize, twists: &[Twist]) -> Vec<Twist> {
    // where each world axis points in the frame of the first cubie
    let mut axes: Vec<usize> = (0..d).collect();
    let mut signs = vec![1; d];

    twists
        .iter()
        .map(|t| {
            let face_axis = axes[t.face_axis];
            let mut face_sign = t.face_sign * signs[t.face_axis];
            let from_axis = axes[t.from_axis];
            let from_sign = signs[t.from_axis];
            let to_axis = axes[t.to_axis];
            let mut to_sign = signs[t.to_axis];
            let mut slices = t.slices;

            let bit = if face_sign == -1 { 0 } else { n as i32 - 1 };
            if (slices >> bit) & 1 == 1 {
                slices = reverse_bits(!slices, n);
                face_sign = -face_sign;
                to_sign = -to_sign;

                axes.swap(t.to_axis, t.from_axis);
                let temp = signs[t.to_axis];
                signs[t.to_axis] = signs[t.from_axis];
                signs[t.from_axis] = -temp;
            }
            Twist::new(
                face_axis, face_sign, from_axis, from_sign, to_axis, to_sign, slices,
            )
        })
        .collect()
}

/// Strategy for twists of a puzzle of the given shape with `d >= 3`.
#[cfg(test)]
pub(crate) fn arb_twist(shape: Shape) -> impl Strategy<Value = Twist> {
    let Shape { n, d } = shape;
    (
        0..d,
        1..d,
        1..d - 1,
        any::<bool>(),
        1i32..(1 << n),
    )
        .prop_map(move |(face_axis, a, b, positive, slices)| {
            // pick three distinct axes without rejection
            let from_axis = (face_axis + a) % d;
            let mut to_axis = (face_axis + b) % d;
            if to_axis == from_axis {
                to_axis = (face_axis + d - 1) % d;
            }
            Twist {
                face_axis,
                face_sign: if positive { 1 } else { -1 },
                from_axis,
                to_axis,
                slices,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::Move;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn signed_constructor_swaps_axes() {
        let t = Twist::new(0, 1, 1, -1, 2, 1, 1);
        assert_eq!((t.from_axis, t.to_axis), (2, 1));
        let u = Twist::new(0, 1, 1, -1, 2, -1, 1);
        assert_eq!((u.from_axis, u.to_axis), (1, 2));
    }

    #[test]
    fn canonical_flips_mask() {
        let t = Twist {
            face_axis: 0,
            face_sign: 1,
            from_axis: 1,
            to_axis: 2,
            slices: 0b001,
        };
        let c = t.canonical(3);
        assert_eq!(c.face_sign, -1);
        assert_eq!(c.slices, 0b100);
    }

    #[test]
    fn face_twist_moves_only_its_face() {
        let t = Twist {
            face_axis: 0,
            face_sign: -1,
            from_axis: 1,
            to_axis: 2,
            slices: 1,
        };
        // sticker on the -x face, and one on the far +x face
        assert_eq!(t.twist_coords(3, &[-4, 2, 0]), vec![-4, 0, 2]);
        assert_eq!(t.twist_coords(3, &[4, 2, 0]), vec![4, 2, 0]);
        // the sticker on the side of a -x cubie comes along
        assert_eq!(t.twist_coords(3, &[-2, 4, 0]), vec![-2, 0, 4]);
    }

    #[test]
    fn random_needs_three_axes() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(random_twist(Shape::new(3, 2), &mut rng).is_err());
        for _ in 0..50 {
            let t = random_twist(Shape::new(4, 4), &mut rng).unwrap();
            assert!(t.face_axis != t.from_axis && t.from_axis != t.to_axis);
            assert!(t.slices == 1 || t.slices == 2);
        }
    }

    proptest! {
        #[test]
        fn twist_then_inverse_coords(
            t in arb_twist(Shape::new(3, 4)),
            coords in proptest::collection::vec(-2i32..=2, 4),
        ) {
            let c: Vec<i32> = coords.iter().map(|x| x * 2).collect();
            prop_assert_eq!(t.inverse().twist_coords(3, &t.twist_coords(3, &c)), c);
        }

        #[test]
        fn four_quarter_turns(t in arb_twist(Shape::new(2, 5)), coords in proptest::collection::vec(-1i32..=1, 5)) {
            let c: Vec<i32> = coords.iter().map(|x| x * 3).collect();
            prop_assert_eq!(twist_all_coords(2, &[t; 4], &c), c);
        }

        #[test]
        fn first_cubie_stays_put(ts in proptest::collection::vec(arb_twist(Shape::new(2, 4)), 0..20)) {
            let fixed = keep_first_cubie_fixed(2, 4, &ts);
            let first = vec![-1; 4];
            for t in &fixed {
                prop_assert_eq!(t.twist_coords(2, &first), first.clone());
            }
        }
    }
}

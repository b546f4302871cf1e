//! Module for puzzle move generics and the 90 degree twists of an n^d puzzle.

mod cache;
mod twist;

pub use cache::TwistCache;
pub use twist::{
    keep_first_cubie_fixed, random_twist, rot90_coords, rot90_index, twist_all_coords, Twist,
};

/// A move, for use in writing expressions or algorithms. It is intended that a term of this trait
/// is a power of a symbol in some group presentation, so every move has an inverse.
pub trait Move: Eq + Clone {
    /// Take the inverse of a move. These inverses must satisfy the invertibility conditions of
    /// a group, i.e. that `X X^{-1} = X^{-1} X = e` where `e` is the empty sequence.
    fn inverse(self) -> Self
    where
        Self: Sized;
}

/// A sequence of moves (also known as an algorithm) for some specific type of move.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash)]
pub struct MoveSequence<M: Move>(pub Vec<M>);

impl<M: Move> MoveSequence<M> {
    /// The empty sequence.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Invert a sequence of moves.
    ///
    /// If `X` is a sequence of moves and `X^{-1}` is its inverse and `o` is composition, then
    /// `X o X^{-1} = X^{-1} o X = e` where `e` is the empty sequence.
    pub fn inverse(self) -> Self {
        Self(self.0.into_iter().rev().map(|m| m.inverse()).collect())
    }

    /// `self` followed by `other`.
    pub fn append(mut self, other: Self) -> Self {
        self.0.extend(other.0);
        self
    }

    /// `self other self^{-1}`, the conjugate of `other` by `self`.
    pub fn conjugate(self, other: Self) -> Self {
        let undo = self.clone().inverse();
        self.append(other).append(undo)
    }

    /// `self other self^{-1} other^{-1}`.
    pub fn commutator(self, other: Self) -> Self {
        let a = self.clone().inverse();
        let b = other.clone().inverse();
        self.append(other).append(a).append(b)
    }

    /// Number of moves.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no moves.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

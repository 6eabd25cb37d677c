#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Variables, literals and three-valued truth values.
//!
//! A literal packs its variable and sign into a single `u32` as `var * 2 + sign`,
//! where a set sign bit means the literal is negated. Negation therefore flips the
//! low bit, and literals of the same variable are adjacent when sorted.

use core::ops::{BitAnd, BitOr, BitXor, Not};
use std::fmt::{self, Debug, Display};

/// A dense variable index in `[0, num_vars)`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Var(u32);

impl Var {
    /// Placeholder for "no variable".
    pub const UNDEF: Self = Self(u32::MAX);

    /// Largest index a variable may take so that both of its literals stay
    /// below the sentinel literal codes.
    pub const MAX_INDEX: u32 = (u32::MAX >> 1) - 1;

    /// Creates a variable from its zero-based index.
    #[must_use]
    pub const fn new(idx: u32) -> Self {
        debug_assert!(idx <= Self::MAX_INDEX);
        Self(idx)
    }

    /// The zero-based index of this variable.
    #[must_use]
    pub const fn idx(self) -> u32 {
        self.0
    }

    /// The zero-based index as a `usize`, for indexing per-variable tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The positive literal of this variable.
    #[must_use]
    pub const fn positive(self) -> Lit {
        Lit::new(self, false)
    }

    /// The negative literal of this variable.
    #[must_use]
    pub const fn negative(self) -> Lit {
        Lit::new(self, true)
    }
}

impl Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::UNDEF {
            write!(f, "x?")
        } else {
            write!(f, "x{}", self.0)
        }
    }
}

impl Display for Var {
    /// Variables print 1-based, the way DIMACS numbers them.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0 + 1)
    }
}

/// A variable or its negation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Lit(u32);

impl Lit {
    /// "No literal". Never carries a truth value.
    pub const UNDEF: Self = Self(u32::MAX - 1);
    /// "Failure". Never carries a truth value.
    pub const ERROR: Self = Self(u32::MAX);

    /// Builds the literal of `var`, negated when `negated` is set.
    #[must_use]
    pub const fn new(var: Var, negated: bool) -> Self {
        Self(var.0 * 2 + negated as u32)
    }

    /// Rebuilds a literal from its raw encoding.
    #[must_use]
    pub const fn from_code(code: u32) -> Self {
        Self(code)
    }

    /// The raw `var * 2 + sign` encoding.
    #[must_use]
    pub const fn code(self) -> u32 {
        self.0
    }

    /// The raw encoding as a `usize`, for per-literal tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[must_use]
    pub const fn var(self) -> Var {
        Var(self.0 >> 1)
    }

    /// `true` for `¬x`.
    #[must_use]
    pub const fn is_negated(self) -> bool {
        self.0 & 1 == 1
    }

    /// `true` for `x`.
    #[must_use]
    pub const fn polarity(self) -> bool {
        !self.is_negated()
    }

    /// Whether this is one of the two sentinels.
    #[must_use]
    pub const fn is_sentinel(self) -> bool {
        self.0 >= Self::UNDEF.0
    }

    /// Parses a non-zero signed DIMACS integer.
    ///
    /// # Panics
    ///
    /// Panics on `0`, which DIMACS uses as the clause terminator.
    #[must_use]
    pub fn from_dimacs(value: i32) -> Self {
        assert_ne!(value, 0, "0 is not a literal");
        Self::new(Var::new(value.unsigned_abs() - 1), value < 0)
    }

    /// The signed 1-based DIMACS integer of this literal.
    #[must_use]
    pub fn to_dimacs(self) -> i32 {
        let magnitude = i32::try_from(self.var().idx() + 1).unwrap_or(i32::MAX);
        if self.is_negated() { -magnitude } else { magnitude }
    }
}

impl Not for Lit {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self(self.0 ^ 1)
    }
}

/// `lit ^ true` negates, `lit ^ false` is the identity.
impl BitXor<bool> for Lit {
    type Output = Self;

    fn bitxor(self, rhs: bool) -> Self::Output {
        Self(self.0 ^ u32::from(rhs))
    }
}

impl Debug for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::UNDEF => write!(f, "UNDEF"),
            Self::ERROR => write!(f, "ERROR"),
            lit if lit.is_negated() => write!(f, "¬{:?}", lit.var()),
            lit => write!(f, "{:?}", lit.var()),
        }
    }
}

impl Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_dimacs())
    }
}

/// A lifted boolean: `True`, `False` or `Undef`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Lbool {
    True,
    False,
    #[default]
    Undef,
}

impl Lbool {
    #[must_use]
    pub const fn is_true(self) -> bool {
        matches!(self, Self::True)
    }

    #[must_use]
    pub const fn is_false(self) -> bool {
        matches!(self, Self::False)
    }

    #[must_use]
    pub const fn is_undef(self) -> bool {
        matches!(self, Self::Undef)
    }

    /// `Some(b)` for a defined value.
    #[must_use]
    pub const fn to_bool(self) -> Option<bool> {
        match self {
            Self::True => Some(true),
            Self::False => Some(false),
            Self::Undef => None,
        }
    }

    pub(crate) const fn code(self) -> u32 {
        match self {
            Self::True => 0,
            Self::False => 1,
            Self::Undef => 2,
        }
    }

    pub(crate) const fn from_code(code: u32) -> Self {
        match code {
            0 => Self::True,
            1 => Self::False,
            _ => Self::Undef,
        }
    }
}

impl From<bool> for Lbool {
    fn from(value: bool) -> Self {
        if value { Self::True } else { Self::False }
    }
}

impl Not for Lbool {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Self::True => Self::False,
            Self::False => Self::True,
            Self::Undef => Self::Undef,
        }
    }
}

/// Flips a defined value when `rhs` is set; `Undef` stays `Undef`.
impl BitXor<bool> for Lbool {
    type Output = Self;

    fn bitxor(self, rhs: bool) -> Self::Output {
        if rhs { !self } else { self }
    }
}

impl BitAnd for Lbool {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Self::False, _) | (_, Self::False) => Self::False,
            (Self::True, Self::True) => Self::True,
            _ => Self::Undef,
        }
    }
}

impl BitOr for Lbool {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Self::True, _) | (_, Self::True) => Self::True,
            (Self::False, Self::False) => Self::False,
            _ => Self::Undef,
        }
    }
}

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// An element of `Z/pZ` for a `p` chosen at construction time.
///
/// `p` is expected to fit comfortably under 2^32 (lucky primes are
/// drawn at or above 2^30) so that two residues can be multiplied into
/// a `u64` without overflow; this mirrors the "widen, then reduce"
/// approach a fixed-modulus field would take, just without a Solinas
/// shortcut since `p` is not fixed.
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct Zp {
    value: u32,
    modulus: u32,
}

impl Zp {
    pub fn new(value: u64, modulus: u32) -> Self {
        debug_assert!(modulus > 1);
        Self {
            value: (value % modulus as u64) as u32,
            modulus,
        }
    }

    pub fn zero(modulus: u32) -> Self {
        Self { value: 0, modulus }
    }

    pub fn modulus(self) -> u32 {
        self.modulus
    }

    pub fn value(self) -> u32 {
        self.value
    }

    pub fn is_zero(self) -> bool {
        self.value == 0
    }

    /// Modular inverse via the extended Euclidean algorithm over
    /// `i64`. Returns `None` for the zero residue (no inverse exists).
    ///
    /// Tracks a Bezout coefficient pair while driving one side of the
    /// gcd computation to zero, generalized to a runtime `modulus`
    /// rather than a field order fixed at compile time.
    pub fn try_inverse(self) -> Option<Self> {
        if self.is_zero() {
            return None;
        }
        let (mut old_r, mut r) = (self.modulus as i64, self.value as i64);
        let (mut old_s, mut s) = (0i64, 1i64);
        while r != 0 {
            let q = old_r / r;
            (old_r, r) = (r, old_r - q * r);
            (old_s, s) = (s, old_s - q * s);
        }
        if old_r != 1 {
            return None;
        }
        let inv = old_s.rem_euclid(self.modulus as i64) as u32;
        Some(Zp {
            value: inv,
            modulus: self.modulus,
        })
    }

    pub fn pow(self, mut exp: u64) -> Self {
        let mut base = self;
        let mut acc = Zp::new(1, self.modulus);
        while exp > 0 {
            if exp & 1 == 1 {
                acc = acc * base;
            }
            base = base * base;
            exp >>= 1;
        }
        acc
    }
}

impl Add for Zp {
    type Output = Zp;
    fn add(self, rhs: Zp) -> Zp {
        debug_assert_eq!(self.modulus, rhs.modulus);
        Zp::new(self.value as u64 + rhs.value as u64, self.modulus)
    }
}

impl Sub for Zp {
    type Output = Zp;
    fn sub(self, rhs: Zp) -> Zp {
        debug_assert_eq!(self.modulus, rhs.modulus);
        let m = self.modulus as u64;
        Zp::new(m + self.value as u64 - rhs.value as u64, self.modulus)
    }
}

impl Neg for Zp {
    type Output = Zp;
    fn neg(self) -> Zp {
        Zp::zero(self.modulus) - self
    }
}

impl Mul for Zp {
    type Output = Zp;
    fn mul(self, rhs: Zp) -> Zp {
        debug_assert_eq!(self.modulus, rhs.modulus);
        Zp::new(self.value as u64 * rhs.value as u64, self.modulus)
    }
}

impl fmt::Debug for Zp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (mod {})", self.value, self.modulus)
    }
}

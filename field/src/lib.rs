//! Runtime-modulus residue arithmetic and a lucky-prime stream.
//!
//! Unlike the fixed-Solinas fields used by most SNARK provers, the
//! primes here are arbitrary ~31-bit integers chosen fresh for every
//! batch, so [`Zp`] carries its modulus at runtime rather than baking
//! it into the type. The arithmetic shape (checked construction,
//! `try_inverse` via an extended Euclidean step, `Add`/`Mul` by value)
//! mirrors a fixed-field implementation generalized to a runtime
//! modulus.

mod modint;
mod primes;

pub use modint::Zp;
pub use primes::{is_miller_rabin_prime, PrimeStream};

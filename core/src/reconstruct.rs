//! Pure numerical routines: multi-prime CRT seeding, incremental CRT
//! update, and bounded rational reconstruction with an optional
//! denominator guess. None of this touches `ModularImageTable` or
//! `LiftState` directly — it operates on plain `BigInt`s so it can be
//! property-tested in isolation.

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, Zero};

/// Combines two CRT residues `(a mod m1, b mod m2)` into the unique
/// representative modulo `m1 * m2`, via the extended Euclidean
/// algorithm rather than a naive search.
fn combine(a: &BigInt, m1: &BigInt, b: &BigInt, m2: &BigInt) -> (BigInt, BigInt) {
    let egcd = m1.extended_gcd(m2);
    debug_assert_eq!(egcd.gcd, BigInt::from(1), "CRT moduli must be coprime");
    let modulus = m1 * m2;
    let diff = b - a;
    let correction = (&egcd.x * diff).mod_floor(m2);
    let combined = a + m1 * correction;
    (combined.mod_floor(&modulus), modulus)
}

fn isqrt(n: &BigInt) -> BigInt {
    if n <= &BigInt::zero() {
        return BigInt::zero();
    }
    let mut x = n.clone();
    let mut y = (&x + 1) / 2;
    while y < x {
        x = y;
        y = (&x + n / &x) / 2;
    }
    x
}

fn icbrt(n: &BigInt) -> BigInt {
    if n <= &BigInt::zero() {
        return BigInt::zero();
    }
    let mut x = n.clone();
    loop {
        let y = (2 * &x + n / (&x * &x)) / 3;
        if y >= x {
            break;
        }
        x = y;
    }
    x.max(BigInt::from(1))
}

/// Centers `x` (assumed already reduced into `[0, m)`) into
/// `[-m/2, m/2]`.
fn center(x: &BigInt, m: &BigInt) -> BigInt {
    if x * 2 > *m {
        x - m
    } else {
        x.clone()
    }
}

/// Stateless numerical kernel: every method takes its operands
/// explicitly rather than holding any accumulator itself, so the
/// orchestrator owns all persistent state (in `LiftState`) and this
/// type stays trivially testable.
pub struct ReconstructionKernel;

impl ReconstructionKernel {
    /// Given `k` primes and each polynomial's mod-p witness
    /// coefficient, computes the unique integer in `[0, prod primes)`
    /// congruent to every residue, via a balanced product-tree combine
    /// (pairwise merge, halving the work list each round) rather than
    /// one long incremental chain.
    pub fn seed_crt(values: &[u64], primes: &[u64]) -> (BigInt, BigInt) {
        assert_eq!(values.len(), primes.len());
        if values.is_empty() {
            return (BigInt::zero(), BigInt::from(1));
        }
        let mut layer: Vec<(BigInt, BigInt)> = values
            .iter()
            .zip(primes)
            .map(|(&v, &p)| (BigInt::from(v), BigInt::from(p)))
            .collect();
        while layer.len() > 1 {
            let mut next = Vec::with_capacity(layer.len().div_ceil(2));
            let mut it = layer.into_iter();
            while let Some((a_res, a_mod)) = it.next() {
                match it.next() {
                    Some((b_res, b_mod)) => next.push(combine(&a_res, &a_mod, &b_res, &b_mod)),
                    None => next.push((a_res, a_mod)),
                }
            }
            layer = next;
        }
        layer.into_iter().next().unwrap()
    }

    /// Updates `acc := CRT(acc mod modulus, c mod p)`. Returns the new
    /// accumulator and the new modulus (`modulus * p`).
    pub fn crt_step(acc: &BigInt, modulus: &BigInt, c: u64, p: u64) -> (BigInt, BigInt) {
        combine(acc, modulus, &BigInt::from(c), &BigInt::from(p))
    }

    /// Recovers the unique `(n, d)` with `gcd(n, d) = 1`, `|n| <=
    /// n_bound`, `0 < d <= d_bound`, and `n == a * d (mod m)`, if one
    /// exists, via the partial extended Euclidean algorithm.
    pub fn ratrecon(a: &BigInt, m: &BigInt, n_bound: &BigInt, d_bound: &BigInt) -> Option<(BigInt, BigInt)> {
        if m <= &BigInt::zero() {
            return None;
        }
        let mut r0 = m.clone();
        let mut r1 = a.mod_floor(m);
        let mut t0 = BigInt::zero();
        let mut t1 = BigInt::from(1);
        while r1 > *n_bound {
            if r1.is_zero() {
                return None;
            }
            let q = &r0 / &r1;
            let r2 = &r0 - &q * &r1;
            let t2 = &t0 - &q * &t1;
            r0 = r1;
            r1 = r2;
            t0 = t1;
            t1 = t2;
        }
        let d = t1.abs();
        if d.is_zero() || d > *d_bound {
            return None;
        }
        if r1.gcd(&d) != BigInt::from(1) {
            return None;
        }
        let n = if t1.is_negative() { -r1 } else { r1 };
        Some((n, d))
    }

    /// First tries the supplied `den_guess` directly: if `a *
    /// den_guess`, centered modulo `m`, already has small enough
    /// absolute value, `(n, den_guess)` is returned without running
    /// the Euclidean algorithm at all. Falls back to [`Self::ratrecon`]
    /// otherwise.
    pub fn ratrecon_with_den(
        a: &BigInt,
        m: &BigInt,
        den_guess: &BigInt,
        n_bound: &BigInt,
        d_bound: &BigInt,
    ) -> Option<(BigInt, BigInt)> {
        if !den_guess.is_zero() {
            let scaled = (a * den_guess).mod_floor(m);
            let n = center(&scaled, m);
            if n.abs() <= *n_bound {
                return Some((n, den_guess.clone()));
            }
        }
        Self::ratrecon(a, m, n_bound, d_bound)
    }

    /// Bound policy: balanced for the first degree group, cube-root
    /// biased toward small denominators afterward so the running
    /// denominator guess (`gden`) amortizes across a group.
    pub fn bounds_for(cstep: usize, modulus: &BigInt) -> (BigInt, BigInt) {
        if cstep == 0 {
            let n = isqrt(&(modulus / 2));
            (n.clone(), n)
        } else {
            let d = icbrt(modulus).max(BigInt::from(1));
            let n = (modulus / 2) / &d;
            (n, d)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_primes() -> Vec<u64> {
        vec![1_000_000_007, 1_000_000_009, 1_000_000_021]
    }

    #[test]
    fn seed_crt_matches_pairwise_combine() {
        let primes = small_primes();
        let values: Vec<u64> = primes.iter().map(|&p| 12345 % p).collect();
        let (acc, modulus) = ReconstructionKernel::seed_crt(&values, &primes);
        assert_eq!(acc, BigInt::from(12345));
        let expected_modulus: BigInt = primes.iter().map(|&p| BigInt::from(p)).product();
        assert_eq!(modulus, expected_modulus);
    }

    #[test]
    fn crt_step_is_associative_with_seed() {
        let primes = small_primes();
        let value = 999_999u64;
        let (mut acc, mut modulus) =
            ReconstructionKernel::seed_crt(&[value % primes[0]], &[primes[0]]);
        for &p in &primes[1..] {
            let (a, m) = ReconstructionKernel::crt_step(&acc, &modulus, value % p, p);
            acc = a;
            modulus = m;
        }
        assert_eq!(acc, BigInt::from(value));
    }

    #[test]
    fn ratrecon_recovers_known_rational() {
        let primes = small_primes();
        let n = BigInt::from(-17);
        let d = BigInt::from(5);
        let mut residues = Vec::new();
        for &p in &primes {
            let p_big = BigInt::from(p);
            let d_inv = ReconstructionKernel::ratrecon(&d, &p_big, &p_big, &p_big);
            // build a mod p-inverse of d directly via extended gcd for the fixture
            let egcd = d.extended_gcd(&p_big);
            let inv = egcd.x.mod_floor(&p_big);
            let a = (&n * &inv).mod_floor(&p_big);
            residues.push((a.to_string().parse::<u64>().unwrap_or(0), p));
            let _ = d_inv;
        }
        let values: Vec<u64> = residues.iter().map(|&(a, _)| a).collect();
        let (acc, modulus) = ReconstructionKernel::seed_crt(&values, &primes);
        let (n_bound, d_bound) = ReconstructionKernel::bounds_for(0, &modulus);
        let (rn, rd) = ReconstructionKernel::ratrecon(&acc, &modulus, &n_bound, &d_bound)
            .expect("reconstruction should succeed with ample bounds");
        assert_eq!(rn, n);
        assert_eq!(rd, d);
    }

    #[test]
    fn ratrecon_with_den_takes_fast_path_when_guess_is_exact() {
        let primes = small_primes();
        let d = BigInt::from(2);
        let n = BigInt::from(3);
        let values: Vec<u64> = primes
            .iter()
            .map(|&p| {
                let p_big = BigInt::from(p);
                let egcd = d.extended_gcd(&p_big);
                let inv = egcd.x.mod_floor(&p_big);
                (&n * &inv).mod_floor(&p_big).to_string().parse().unwrap()
            })
            .collect();
        let (acc, modulus) = ReconstructionKernel::seed_crt(&values, &primes);
        let (n_bound, d_bound) = ReconstructionKernel::bounds_for(0, &modulus);
        let (rn, rd) =
            ReconstructionKernel::ratrecon_with_den(&acc, &modulus, &d, &n_bound, &d_bound)
                .unwrap();
        assert_eq!(rn, n);
        assert_eq!(rd, d);
    }

    #[test]
    fn bounds_for_first_group_are_balanced() {
        let modulus = BigInt::from(1_000_000_i64);
        let (n, d) = ReconstructionKernel::bounds_for(0, &modulus);
        assert_eq!(n, d);
    }

    #[test]
    fn bounds_for_later_groups_favor_small_denominators() {
        let modulus = BigInt::from(1_000_000_000_i64);
        let (n, d) = ReconstructionKernel::bounds_for(1, &modulus);
        assert!(d < n);
    }

    /// spec.md §8's round-trip invariant: for any `n/d` in lowest terms
    /// with both below the balanced bound, CRT-then-reconstruct across
    /// enough primes recovers exactly `(n, d)`.
    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn ratrecon_round_trips_arbitrary_small_rationals(n in -5_000i64..5_000, d in 1i64..5_000) {
                let n_big = BigInt::from(n);
                let d_big = BigInt::from(d);
                if n_big.gcd(&d_big) != BigInt::from(1) {
                    return Ok(());
                }
                let primes: Vec<u64> = vec![1_000_003, 1_000_033, 1_000_037, 1_000_039];
                let mut values = Vec::new();
                for &p in &primes {
                    let p_big = BigInt::from(p);
                    let egcd = d_big.extended_gcd(&p_big);
                    let inv = egcd.x.mod_floor(&p_big);
                    let a = (&n_big * &inv).mod_floor(&p_big);
                    values.push(a.to_string().parse::<u64>().unwrap());
                }
                let (acc, modulus) = ReconstructionKernel::seed_crt(&values, &primes);
                let (n_bound, d_bound) = ReconstructionKernel::bounds_for(0, &modulus);
                let recovered = ReconstructionKernel::ratrecon(&acc, &modulus, &n_bound, &d_bound);
                prop_assert_eq!(recovered, Some((n_big, d_big)));
            }
        }
    }
}

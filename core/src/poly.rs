use num_bigint::BigInt;

/// One polynomial's running modular/integer/rational images across
/// every accepted prime.
///
/// `cf_p[slot]` accumulates one `u32` coefficient per accepted prime
/// (column `k` of the table, see [`crate::table::ModularImageTable`]);
/// `cf_z[slot]` and `cf_q[slot]` are populated only once reconstruction
/// of this slot has been attempted and decided. The leading
/// coefficient is normalized to 1 by the modular solver and is never
/// stored here.
#[derive(Debug, Clone)]
pub struct ModularPoly {
    cf_p: Vec<Vec<u32>>,
    cf_z: Vec<Option<BigInt>>,
    cf_q: Vec<Option<(BigInt, BigInt)>>,
}

impl ModularPoly {
    pub fn new(len: usize, alloc_hint: usize) -> Self {
        Self {
            cf_p: (0..len).map(|_| Vec::with_capacity(alloc_hint)).collect(),
            cf_z: vec![None; len],
            cf_q: vec![None; len],
        }
    }

    pub fn len(&self) -> usize {
        self.cf_p.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cf_p.is_empty()
    }

    pub fn slot(&self, slot: usize) -> &[u32] {
        &self.cf_p[slot]
    }

    pub(crate) fn push_slot(&mut self, slot: usize, value: u32) {
        self.cf_p[slot].push(value);
    }

    pub(crate) fn reserve(&mut self, extra: usize) {
        for column in &mut self.cf_p {
            column.reserve(extra);
        }
    }

    pub fn lifted_integer(&self, slot: usize) -> Option<&BigInt> {
        self.cf_z[slot].as_ref()
    }

    pub fn set_lifted_integer(&mut self, slot: usize, value: BigInt) {
        self.cf_z[slot] = Some(value);
    }

    pub fn rational(&self, slot: usize) -> Option<&(BigInt, BigInt)> {
        self.cf_q[slot].as_ref()
    }

    pub fn set_rational(&mut self, slot: usize, num: BigInt, den: BigInt) {
        self.cf_q[slot] = Some((num, den));
    }

    /// The coefficient of `slot` under the first accepted prime
    /// (`k = 0`), or `0` if no prime has been accepted yet.
    pub fn first_value(&self, slot: usize) -> u32 {
        self.cf_p[slot].first().copied().unwrap_or(0)
    }

    /// The smallest slot whose image under the first accepted prime
    /// (`k = 0`) is non-zero, or `0` if every slot happened to reduce
    /// to zero under that prime.
    pub fn first_nonzero_slot(&self) -> usize {
        self.cf_p
            .iter()
            .position(|column| column.first().copied().unwrap_or(0) != 0)
            .unwrap_or(0)
    }
}

/// A fully reconstructed rational polynomial, emitted once every slot
/// of a [`ModularPoly`] has a finalized `(num, den)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RationalPoly {
    pub coefficients: Vec<(BigInt, BigInt)>,
}

impl std::fmt::Display for RationalPoly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, (n, d)) in self.coefficients.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if d == &BigInt::from(1) {
                write!(f, "{n}")?;
            } else {
                write!(f, "{n}/{d}")?;
            }
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_nonzero_slot_skips_leading_zero_columns() {
        let mut poly = ModularPoly::new(3, 4);
        poly.push_slot(0, 0);
        poly.push_slot(1, 0);
        poly.push_slot(2, 5);
        assert_eq!(poly.first_nonzero_slot(), 2);
    }

    #[test]
    fn first_nonzero_slot_defaults_to_zero_when_all_zero() {
        let mut poly = ModularPoly::new(2, 4);
        poly.push_slot(0, 0);
        poly.push_slot(1, 0);
        assert_eq!(poly.first_nonzero_slot(), 0);
    }

    #[test]
    fn display_renders_integers_without_denominator() {
        let poly = RationalPoly {
            coefficients: vec![(BigInt::from(-2), BigInt::from(1)), (BigInt::from(1), BigInt::from(2))],
        };
        assert_eq!(poly.to_string(), "[-2, 1/2]");
    }
}

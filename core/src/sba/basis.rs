use ratgb_util::is_divisible;

use super::{Signature, SupportPoly};

/// One survivor of the signature engine: its monomial support and
/// coefficients plus the signature that produced it.
#[derive(Debug, Clone)]
pub struct BasisElement {
    pub support: SupportPoly,
    pub signature: Signature,
}

/// The running basis. Supports append and, for non-homogeneous input,
/// in-place compaction under divisibility — a later, lower-degree
/// element can make an earlier one redundant.
#[derive(Default)]
pub struct Basis {
    elements: Vec<BasisElement>,
}

impl Basis {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> &[BasisElement] {
        &self.elements
    }

    pub fn leading_monomial(&self, i: usize) -> &[u32] {
        self.elements[i].support.leading_monomial()
    }

    pub fn leading_monomials(&self) -> Vec<Vec<u32>> {
        self.elements
            .iter()
            .map(|e| e.support.leading_monomial().to_vec())
            .collect()
    }

    pub fn is_divisible_by_any(&self, monomial: &[u32]) -> bool {
        self.elements
            .iter()
            .any(|e| is_divisible(monomial, e.support.leading_monomial()))
    }

    pub fn push(&mut self, element: BasisElement) {
        self.elements.push(element);
    }

    /// Removes any existing element whose leading monomial is
    /// properly divisible by one of `new_leading_monomials`
    /// (belonging to elements just added this round), then reappends
    /// the survivors contiguously. A no-op for homogeneous input,
    /// where this situation cannot arise.
    pub fn compact(&mut self, new_leading_monomials: &[Vec<u32>]) {
        let kept: Vec<BasisElement> = std::mem::take(&mut self.elements)
            .into_iter()
            .filter(|element| {
                let lm = element.support.leading_monomial();
                !new_leading_monomials
                    .iter()
                    .any(|new_lm| new_lm != lm && is_divisible(lm, new_lm))
            })
            .collect();
        self.elements = kept;
    }

    /// No leading monomial properly divides another — the
    /// termination invariant for a reduced basis.
    pub fn is_minimal(&self) -> bool {
        let lms = self.leading_monomials();
        lms.iter().enumerate().all(|(i, lm)| {
            lms.iter()
                .enumerate()
                .all(|(j, other)| i == j || other != lm || !is_divisible(lm, other))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sba::Signature;
    use ratgb_field::Zp;

    fn element(lm: Vec<u32>, modulus: u32) -> BasisElement {
        BasisElement {
            support: SupportPoly {
                monomials: vec![lm.clone()],
                coeffs: vec![Zp::new(1, modulus)],
            },
            signature: Signature::new(lm, 0),
        }
    }

    #[test]
    fn divisibility_check_finds_existing_leading_monomial() {
        let mut basis = Basis::new();
        basis.push(element(vec![2, 0], 101));
        assert!(basis.is_divisible_by_any(&[3, 0]));
        assert!(!basis.is_divisible_by_any(&[1, 1]));
    }

    #[test]
    fn compact_removes_elements_made_redundant_by_new_ones() {
        let mut basis = Basis::new();
        basis.push(element(vec![3, 0], 101));
        basis.compact(&[vec![1, 0]]);
        assert!(basis.is_empty());
    }

    #[test]
    fn compact_keeps_incomparable_elements() {
        let mut basis = Basis::new();
        basis.push(element(vec![0, 2], 101));
        basis.compact(&[vec![2, 0]]);
        assert_eq!(basis.len(), 1);
    }
}

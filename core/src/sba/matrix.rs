use ratgb_util::{is_divisible, ShortDivMask};

use super::{Signature, SupportPoly};

/// One row of a degree's signature matrix: a support polynomial
/// (possibly not yet reduced) paired with the signature that produced
/// it.
#[derive(Debug, Clone)]
pub struct Row {
    pub support: SupportPoly,
    pub signature: Signature,
}

/// Per-signature-index set of monomials that prune higher signatures:
/// `syz` holds confirmed Schreyer syzygies, `rew` holds this degree's
/// rewrite rules (reset every round).
///
/// Short divisor masks are recomputed against the current round's
/// signature monomials so the cheap pre-filter stays meaningful as the
/// staircase grows.
#[derive(Default)]
pub struct SignatureCriterion {
    entries: Vec<Vec<(Vec<u32>, ShortDivMask)>>,
    thresholds: Vec<Vec<u32>>,
}

impl SignatureCriterion {
    pub fn new(nvars: usize) -> Self {
        Self {
            entries: Vec::new(),
            thresholds: ShortDivMask::thresholds_for(nvars, &[]),
        }
    }

    /// Rebuilds the divmask thresholds from this round's signature
    /// monomials. Cheap relative to the degree step it guards.
    pub fn refresh_thresholds(&mut self, sample: &[Vec<u32>]) {
        if let Some(first) = sample.first() {
            self.thresholds = ShortDivMask::thresholds_for(first.len(), sample);
        }
    }

    fn ensure_index(&mut self, index: usize) {
        if self.entries.len() <= index {
            self.entries.resize_with(index + 1, Vec::new);
        }
    }

    pub fn insert(&mut self, index: usize, monomial: Vec<u32>) {
        self.ensure_index(index);
        let mask = ShortDivMask::compute(&monomial, &self.thresholds);
        self.entries[index].push((monomial, mask));
    }

    /// True if some registered monomial at `index` divides
    /// `monomial`; the divmask only ever rules candidates *out*, so a
    /// mask "maybe" always falls through to the exact check.
    pub fn any_divides(&self, index: usize, monomial: &[u32]) -> bool {
        let Some(entries) = self.entries.get(index) else {
            return false;
        };
        let query_mask = ShortDivMask::compute(monomial, &self.thresholds);
        entries
            .iter()
            .any(|(m, mask)| mask.may_divide(query_mask) && is_divisible(monomial, m))
    }

    pub fn reset(&mut self) {
        for entries in &mut self.entries {
            entries.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserted_monomial_is_found_as_a_divisor() {
        let mut criterion = SignatureCriterion::new(2);
        criterion.refresh_thresholds(&[vec![1, 0], vec![2, 1]]);
        criterion.insert(0, vec![1, 0]);
        assert!(criterion.any_divides(0, &[2, 1]));
        assert!(!criterion.any_divides(0, &[0, 1]));
    }

    #[test]
    fn entries_are_scoped_by_signature_index() {
        let mut criterion = SignatureCriterion::new(1);
        criterion.refresh_thresholds(&[vec![1]]);
        criterion.insert(0, vec![1]);
        assert!(!criterion.any_divides(1, &[2]));
    }

    #[test]
    fn reset_clears_every_index() {
        let mut criterion = SignatureCriterion::new(1);
        criterion.refresh_thresholds(&[vec![1]]);
        criterion.insert(0, vec![1]);
        criterion.reset();
        assert!(!criterion.any_divides(0, &[5]));
    }
}

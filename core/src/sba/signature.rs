use std::cmp::Ordering;

use ratgb_util::{grevlex_cmp, Monomial};

/// A `(monomial, input-index)` pair used to order and prune candidate
/// S-polynomials in the signature-based algorithm. Ordered by index
/// first (`SM_SIDX`), then by the current monomial order on the
/// monomial itself (`SM_SMON`) — this is the Schreyer order induced by
/// the input generators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub monomial: Vec<u32>,
    pub index: usize,
}

impl Signature {
    pub fn new(monomial: Vec<u32>, index: usize) -> Self {
        Self { monomial, index }
    }

    /// The signature of `self` multiplied by variable `var` (a unit
    /// exponent vector bump), used when extending a previous-degree
    /// row to the next degree.
    pub fn multiplied_by_var(&self, var: usize, nvars: usize) -> Self {
        let mut monomial = self.monomial.clone();
        if monomial.is_empty() {
            monomial = vec![0; nvars];
        }
        monomial[var] += 1;
        Signature {
            monomial,
            index: self.index,
        }
    }

    pub fn divides(&self, other: &Signature) -> bool {
        self.index == other.index && ratgb_util::is_divisible(&other.monomial, &self.monomial)
    }
}

impl PartialOrd for Signature {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Signature {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index
            .cmp(&other.index)
            .then_with(|| grevlex_cmp(&self.monomial as &Monomial, &other.monomial as &Monomial))
    }
}

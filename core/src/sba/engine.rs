use ratgb_field::Zp;
use ratgb_util::{grevlex_cmp, is_divisible, mul, mul_var, Monomial};

use super::matrix::{Row, SignatureCriterion};
use super::{Basis, BasisElement, Signature, SupportPoly};

/// One input generator waiting to enter the matrix at its degree.
struct PendingInput {
    support: SupportPoly,
    index: usize,
}

fn degree_of(monomial: &[u32]) -> u32 {
    monomial.iter().sum()
}

/// `a - c * b`, both already sorted by strictly decreasing grevlex
/// order, producing a result in the same order with zero coefficients
/// dropped and equal monomials merged.
fn poly_sub_scaled(a: &SupportPoly, c: Zp, b: &SupportPoly) -> SupportPoly {
    let mut monomials = Vec::new();
    let mut coeffs = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.monomials.len() || j < b.monomials.len() {
        match (a.monomials.get(i), b.monomials.get(j)) {
            (Some(ma), Some(mb)) => match grevlex_cmp(ma as &Monomial, mb as &Monomial) {
                std::cmp::Ordering::Greater => {
                    monomials.push(ma.clone());
                    coeffs.push(a.coeffs[i]);
                    i += 1;
                }
                std::cmp::Ordering::Less => {
                    monomials.push(mb.clone());
                    coeffs.push(Zp::zero(c.modulus()) - c * b.coeffs[j]);
                    j += 1;
                }
                std::cmp::Ordering::Equal => {
                    let merged = a.coeffs[i] - c * b.coeffs[j];
                    if !merged.is_zero() {
                        monomials.push(ma.clone());
                        coeffs.push(merged);
                    }
                    i += 1;
                    j += 1;
                }
            },
            (Some(ma), None) => {
                monomials.push(ma.clone());
                coeffs.push(a.coeffs[i]);
                i += 1;
            }
            (None, Some(mb)) => {
                monomials.push(mb.clone());
                coeffs.push(Zp::zero(c.modulus()) - c * b.coeffs[j]);
                j += 1;
            }
            (None, None) => unreachable!(),
        }
    }
    SupportPoly { monomials, coeffs }
}

/// Top-reduces `target` against `reducers` until its leading monomial
/// is no longer divisible by any reducer's leading monomial (or the
/// polynomial vanishes). Reducers are tried in the order given; this
/// mirrors a plain top-reduction pass rather than a full normal form,
/// matching the "top-reduce using only rows whose signature is
/// strictly smaller" — only the leading term's divisibility is
/// eliminated per step, not a full reduction to a canonical normal
/// form.
fn top_reduce(mut target: SupportPoly, reducers: &[&SupportPoly]) -> SupportPoly {
    'outer: loop {
        if target.is_zero() {
            return target;
        }
        let lm = target.leading_monomial().to_vec();
        for reducer in reducers {
            if reducer.is_zero() {
                continue;
            }
            let rlm = reducer.leading_monomial();
            if is_divisible(&lm, rlm) {
                let q: Vec<u32> = lm
                    .iter()
                    .zip(rlm)
                    .map(|(e, d)| e - d)
                    .collect();
                let lc = target.coeffs[0];
                let rc = reducer.coeffs[0];
                let inv = rc.try_inverse().expect("leading coefficient is never zero");
                let scale = lc * inv;
                let shifted = shift(reducer, &q);
                target = poly_sub_scaled(&target, scale, &shifted);
                continue 'outer;
            }
        }
        return target;
    }
}

/// `poly` multiplied by the monomial `m`.
fn shift(poly: &SupportPoly, m: &[u32]) -> SupportPoly {
    SupportPoly {
        monomials: poly.monomials.iter().map(|mono| mul(mono, m)).collect(),
        coeffs: poly.coeffs.clone(),
    }
}

/// Driver for the Schreyer-ordered signature-based algorithm: a degree-by-degree
/// signature-based Gröbner basis computation over a fixed prime
/// modulus, with the Schreyer syzygy and rewrite criteria pruning
/// useless S-polynomial candidates before any arithmetic is done on
/// them.
pub struct SignatureEngine {
    nvars: usize,
    inputs: Vec<PendingInput>,
    basis: Basis,
    syz: SignatureCriterion,
    rew: SignatureCriterion,
    previous_rows: Vec<Row>,
}

impl SignatureEngine {
    /// `nvars` is required explicitly (rather than inferred from the
    /// first generator) so an empty generator list still produces a
    /// well-formed engine that terminates immediately with an empty
    /// basis.
    pub fn new(generators: Vec<SupportPoly>, nvars: usize) -> Self {
        let mut inputs: Vec<PendingInput> = generators
            .into_iter()
            .enumerate()
            .map(|(index, support)| PendingInput { support, index })
            .collect();
        // Stored in decreasing degree so popping from the back always
        // yields the generator of minimum remaining degree, matching
        // the increasing-degree round order `next_degree`/`round` drive.
        inputs.sort_by(|a, b| {
            degree_of(b.support.leading_monomial()).cmp(&degree_of(a.support.leading_monomial()))
        });
        Self {
            nvars,
            inputs,
            basis: Basis::new(),
            syz: SignatureCriterion::new(nvars),
            rew: SignatureCriterion::new(nvars),
            previous_rows: Vec::new(),
        }
    }

    fn next_degree(&self) -> Option<u32> {
        let from_inputs = self.inputs.last().map(|p| degree_of(p.support.leading_monomial()));
        let from_rows = self
            .previous_rows
            .iter()
            .map(|r| degree_of(r.support.leading_monomial()))
            .min();
        match (from_inputs, from_rows) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }

    /// Runs the engine to completion and returns the final basis.
    /// `bs.constant == 1` corresponds to a singleton basis whose sole
    /// leading monomial is `1` (the unit ideal).
    pub fn run(mut self) -> Basis {
        loop {
            let Some(d) = self.next_degree() else {
                break;
            };
            if self.is_unit_ideal() {
                break;
            }
            let ne = self.round(d);
            if ne == 0 && self.inputs.is_empty() {
                break;
            }
        }
        self.basis
    }

    fn is_unit_ideal(&self) -> bool {
        self.basis
            .elements()
            .iter()
            .any(|e| degree_of(e.support.leading_monomial()) == 0)
    }

    /// Runs one degree round and returns the number of new basis
    /// elements it produced.
    fn round(&mut self, d: u32) -> usize {
        self.rew.reset();
        let mut smat: Vec<Row> = Vec::new();

        while let Some(p) = self.inputs.last() {
            if degree_of(p.support.leading_monomial()) != d {
                break;
            }
            let p = self.inputs.pop().unwrap();
            smat.push(Row {
                signature: Signature::new(p.support.leading_monomial().to_vec(), p.index),
                support: p.support,
            });
        }

        // `previous_rows` holds exactly the prior round's surviving rows
        // (one degree below `d`); each is extended by every variable to
        // reach degree `d`.
        for r in &self.previous_rows {
            for v in 0..self.nvars {
                let s = r.signature.multiplied_by_var(v, self.nvars);
                if self.syz.any_divides(s.index, &s.monomial) {
                    continue;
                }
                if self.rew.any_divides(s.index, &s.monomial) {
                    continue;
                }
                let support = shift(&r.support, &mul_var(&vec![0; self.nvars], v));
                self.rew.insert(s.index, s.monomial.clone());
                smat.push(Row {
                    signature: s,
                    support,
                });
            }
        }

        smat.sort_by(|a, b| a.signature.cmp(&b.signature));

        let sample: Vec<Vec<u32>> = smat.iter().map(|r| r.signature.monomial.clone()).collect();
        self.syz.refresh_thresholds(&sample);
        self.rew.refresh_thresholds(&sample);

        let mut reduced_rows: Vec<Row> = Vec::with_capacity(smat.len());
        for row in smat {
            let reducers: Vec<&SupportPoly> = reduced_rows
                .iter()
                .filter(|r| r.signature < row.signature)
                .map(|r| &r.support)
                .chain(self.basis.elements().iter().map(|e| &e.support))
                .collect();
            let reduced_support = top_reduce(row.support, &reducers);
            if reduced_support.is_zero() {
                self.syz.insert(row.signature.index, row.signature.monomial.clone());
            } else {
                reduced_rows.push(Row {
                    support: reduced_support,
                    signature: row.signature,
                });
            }
        }

        self.previous_rows.clear();
        let mut new_leading_monomials = Vec::new();
        let mut ne = 0;
        for row in reduced_rows {
            if self.basis.is_divisible_by_any(row.support.leading_monomial()) {
                continue;
            }
            new_leading_monomials.push(row.support.leading_monomial().to_vec());
            self.basis.push(BasisElement {
                support: row.support.clone(),
                signature: row.signature.clone(),
            });
            self.previous_rows.push(row);
            ne += 1;
        }

        if !new_leading_monomials.is_empty() {
            self.basis.compact(&new_leading_monomials);
        }

        ne
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poly(terms: &[(&[u32], u64)], modulus: u32) -> SupportPoly {
        let mut monomials: Vec<Vec<u32>> = terms.iter().map(|(m, _)| m.to_vec()).collect();
        let mut coeffs: Vec<Zp> = terms.iter().map(|(_, c)| Zp::new(*c, modulus)).collect();
        let mut idx: Vec<usize> = (0..monomials.len()).collect();
        idx.sort_by(|&a, &b| grevlex_cmp(&monomials[a] as &Monomial, &monomials[b] as &Monomial).reverse());
        monomials = idx.iter().map(|&i| monomials[i].clone()).collect();
        coeffs = idx.iter().map(|&i| coeffs[i]).collect();
        SupportPoly { monomials, coeffs }
    }

    #[test]
    fn homogeneous_quadric_ideal_terminates_with_three_generators() {
        let modulus = 32003;
        let x2 = poly(&[(&[2, 0], 1)], modulus);
        let xy = poly(&[(&[1, 1], 1)], modulus);
        let y2 = poly(&[(&[0, 2], 1)], modulus);
        let engine = SignatureEngine::new(vec![x2, xy, y2], 2);
        let basis = engine.run();
        assert_eq!(basis.len(), 3);
        let mut lms = basis.leading_monomials();
        lms.sort();
        assert_eq!(lms, vec![vec![0, 2], vec![1, 1], vec![2, 0]]);
    }

    #[test]
    fn rewrite_criterion_prunes_redundant_signature_at_degree_three() {
        let modulus = 32003;
        // xy - z, xz - y over 3 variables (x, y, z).
        let f1 = poly(&[(&[1, 1, 0], 1), (&[0, 0, 1], modulus as u64 - 1)], modulus);
        let f2 = poly(&[(&[1, 0, 1], 1), (&[0, 1, 0], modulus as u64 - 1)], modulus);
        let engine = SignatureEngine::new(vec![f1, f2], 3);
        let basis = engine.run();
        // Termination without runaway row growth is itself evidence the
        // rewrite criterion fired; every leading monomial must still be
        // pairwise incomparable.
        assert!(basis.is_minimal());
        assert!(basis.len() >= 2);
    }

    #[test]
    fn unit_ideal_terminates_immediately() {
        let modulus = 101;
        let one = poly(&[(&[0, 0], 1)], modulus);
        let engine = SignatureEngine::new(vec![one], 2);
        let basis = engine.run();
        assert_eq!(basis.len(), 1);
        assert_eq!(basis.leading_monomial(0), &[0, 0]);
    }
}

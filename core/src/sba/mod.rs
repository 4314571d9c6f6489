//! Schreyer-ordered signature-based Gröbner engine (`core_sba_schreyer`).

pub mod basis;
pub mod engine;
pub mod matrix;
pub mod signature;

pub use basis::{Basis, BasisElement};
pub use engine::SignatureEngine;
pub use matrix::{Row, SignatureCriterion};
pub use signature::Signature;

use ratgb_field::Zp;

/// A polynomial's monomial support and coefficients, kept sorted by
/// strictly decreasing grevlex order so `monomials[0]` is always the
/// leading monomial (or the type is empty, meaning the zero
/// polynomial).
#[derive(Debug, Clone, PartialEq)]
pub struct SupportPoly {
    pub monomials: Vec<Vec<u32>>,
    pub coeffs: Vec<Zp>,
}

impl SupportPoly {
    pub fn zero() -> Self {
        Self {
            monomials: Vec::new(),
            coeffs: Vec::new(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.monomials.is_empty()
    }

    pub fn leading_monomial(&self) -> &[u32] {
        &self.monomials[0]
    }
}

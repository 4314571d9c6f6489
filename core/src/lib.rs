//! Multi-modular rational Gröbner-basis lifting engine.
//!
//! Given a zero-dimensional polynomial ideal with rational
//! coefficients, [`MultiModularOrchestrator`] computes the reduced
//! Gröbner basis over the rationals by running a modular
//! Gröbner-basis computation for a sequence of lucky primes
//! ([`ModularGBProvider`]), combining the resulting mod-p coefficient
//! images by Chinese Remainder ([`ReconstructionKernel`]), and
//! recovering rational coefficients by rational reconstruction. The
//! [`sba`] module provides an alternative, signature-based
//! Gröbner-basis solver usable as a `ModularGBProvider` backend.

pub mod config;
pub mod error;
pub mod lift_state;
pub mod orchestrator;
pub mod poly;
pub mod reconstruct;
pub mod sba;
pub mod table;
pub mod timing;

pub use config::Config;
pub use error::Error;
pub use lift_state::{LargestMagnitudeWitness, LiftState, SmallestNonzeroWitness, WitnessPolicy};
pub use orchestrator::{
    return_code, ApplyOutcome, LearnOutcome, LiftOutcome, ModularGBProvider, MultiModularOrchestrator,
};
pub use poly::{ModularPoly, RationalPoly};
pub use reconstruct::ReconstructionKernel;
pub use sba::{Basis, BasisElement, Signature, SignatureEngine, SupportPoly};
pub use table::ModularImageTable;
pub use timing::TimingTree;

//! The top-level learn-once/apply-many loop: prime selection,
//! trace-application in parallel, coefficient-image accumulation,
//! incremental CRT, and rational reconstruction with witness-based
//! early termination.

use std::collections::HashSet;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{ToPrimitive, Zero};

use ratgb_field::{PrimeStream, Zp};
use ratgb_maybe_rayon::MaybeIntoParIter;

use crate::config::Config;
use crate::error::Error;
use crate::lift_state::{LiftState, SmallestNonzeroWitness, WitnessPolicy};
use crate::poly::RationalPoly;
use crate::reconstruct::ReconstructionKernel;
use crate::table::ModularImageTable;
use crate::timing::TimingTree;

/// What the learn phase hands back: the staircase, the leading
/// monomials (in staircase-scan order, matching the slot layout every
/// later `apply` must reproduce), and the mod-p coefficient image of
/// each polynomial.
pub struct LearnOutcome {
    pub staircase: Vec<Vec<u32>>,
    pub leading_monomials: Vec<Vec<u32>>,
    pub images: Vec<Vec<u32>>,
}

/// What one `apply` call hands back for a single prime.
pub struct ApplyOutcome {
    pub leading_monomials: Vec<Vec<u32>>,
    pub images: Vec<Vec<u32>>,
}

/// The external collaborator supplying the actual modular
/// Gröbner-basis routine (F4-style trace learning/application, or a
/// signature-based solver). THE CORE never constructs a basis itself;
/// it only drives this trait and reconciles the resulting images.
pub trait ModularGBProvider: Send {
    fn learn(&mut self, prime: u64) -> Result<LearnOutcome, Error>;
    fn apply(&self, prime: u64) -> Result<ApplyOutcome, Error>;

    /// Produces an independent, owned copy suitable for one worker's
    /// apply call. The source gives each thread a deep copy of the
    /// hash table and trace; this is the safe-Rust equivalent — no
    /// cross-worker aliasing, no shared mutable state.
    fn clone_for_worker(&self) -> Self
    where
        Self: Sized;
}

/// Outcome of a completed lift.
pub enum LiftOutcome {
    /// The input basis was trivially `{1}`: `dim == 0`, `dquot == 0`.
    Empty,
    /// The rational Gröbner basis, one entry per learned polynomial.
    Lifted(Vec<RationalPoly>),
}

/// Orchestrates the full learn/apply/reconstruct protocol against one
/// `ModularGBProvider`.
pub struct MultiModularOrchestrator<P: ModularGBProvider> {
    provider: P,
    config: Config,
    prime_stream: PrimeStream,
    used_primes: HashSet<u64>,
    bad_primes: HashSet<u64>,
    initial_capacity: usize,
    witness_policy: Box<dyn WitnessPolicy>,
    staircase: Vec<Vec<u32>>,
    leading_monomials: Vec<Vec<u32>>,
    table: Option<ModularImageTable>,
    state: Option<LiftState>,
    mod_p: BigInt,
    timing: TimingTree,
}

impl<P: ModularGBProvider> MultiModularOrchestrator<P> {
    pub fn new(provider: P, config: Config) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            provider,
            config,
            prime_stream: PrimeStream::starting_at(1 << 30),
            used_primes: HashSet::new(),
            bad_primes: HashSet::new(),
            initial_capacity: 8,
            witness_policy: Box::new(SmallestNonzeroWitness),
            staircase: Vec::new(),
            leading_monomials: Vec::new(),
            table: None,
            state: None,
            mod_p: BigInt::from(1),
            timing: TimingTree::default(),
        })
    }

    pub fn with_witness_policy(mut self, policy: Box<dyn WitnessPolicy>) -> Self {
        self.witness_policy = policy;
        self
    }

    /// Derives the initial per-slot prime capacity from the bit
    /// length of the largest numerator/denominator in the input
    /// generators, rather than guessing a constant.
    pub fn with_initial_capacity_hint(mut self, max_input_bits: u64) -> Self {
        self.initial_capacity = ((max_input_bits / 30) + 4) as usize;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn next_prime(&mut self) -> u64 {
        let exclude: Vec<u64> = self
            .used_primes
            .iter()
            .chain(self.bad_primes.iter())
            .copied()
            .collect();
        self.prime_stream.next_excluding(&exclude)
    }

    /// Runs the modular solver once, captures the trace, and
    /// initializes the table and lift state from the result. If the
    /// learned basis is trivially `{1}` the lifter is finished
    /// immediately.
    pub fn learn(&mut self) -> Result<(), Error> {
        let prime = self.next_prime();
        self.timing.push("learn");
        let outcome = self.provider.learn(prime)?;
        self.timing.pop();
        self.used_primes.insert(prime);

        if outcome.staircase.is_empty() {
            self.table = Some(ModularImageTable::init(self.initial_capacity, &[]));
            self.state = None;
            self.staircase = outcome.staircase;
            self.leading_monomials = outcome.leading_monomials;
            return Ok(());
        }

        let lens: Vec<usize> = outcome.images.iter().map(Vec::len).collect();
        let mut table = ModularImageTable::init(self.initial_capacity, &lens);
        table
            .append(prime, &outcome.images)
            .map_err(|e| Error::InvalidInput(e.to_string()))?;

        let steps = ratgb_util::steps_from_leading_degrees(&outcome.leading_monomials);
        let mut state = LiftState::new(lens.len(), steps)
            .map_err(|e| Error::InvalidInput(e.to_string()))?;
        state.choose_witness(&table, self.witness_policy.as_ref());
        for i in 0..lens.len() {
            let w = state.witness(i);
            state.set_crt(i, BigInt::from(table.poly(i).first_value(w) as u64));
        }

        self.mod_p = BigInt::from(prime);
        self.staircase = outcome.staircase;
        self.leading_monomials = outcome.leading_monomials;
        self.table = Some(table);
        self.state = Some(state);
        Ok(())
    }

    /// Draws `T = nr_threads` fresh lucky primes, runs trace
    /// application for each in parallel, validates each candidate
    /// against the learned staircase, and appends the survivors.
    /// Primes whose basis shape disagrees, or that the provider itself
    /// flags as bad, are recorded and skipped — the batch continues
    /// with whatever primes remain.
    pub fn apply_round(&mut self) -> Result<(), Error> {
        let Some(table) = self.table.as_ref() else {
            return Err(Error::InvalidInput("learn phase has not run yet".to_string()));
        };
        if table.ld() == 0 {
            return Ok(());
        }

        let t = self.config.nr_threads;
        let mut exclude: Vec<u64> = self
            .used_primes
            .iter()
            .chain(self.bad_primes.iter())
            .copied()
            .collect();
        let mut candidates = Vec::with_capacity(t);
        for _ in 0..t {
            let p = self.prime_stream.next_excluding(&exclude);
            exclude.push(p);
            candidates.push(p);
        }

        self.timing.push("apply");
        let paired: Vec<(u64, P)> = candidates
            .iter()
            .map(|&p| (p, self.provider.clone_for_worker()))
            .collect();
        let results: Vec<(u64, Result<ApplyOutcome, Error>)> = paired
            .into_par_iter()
            .map(|(p, worker)| (p, worker.apply(p)))
            .collect();
        self.timing.pop();

        let expected_lms = &self.leading_monomials;
        let growth = t.max(2);
        for (prime, result) in results {
            self.used_primes.insert(prime);
            match result {
                Ok(outcome) if &outcome.leading_monomials == expected_lms => {
                    let table = self.table.as_mut().expect("table initialized by learn");
                    match table
                        .append(prime, &outcome.images)
                        .map_err(|e| Error::InvalidInput(e.to_string()))?
                    {
                        true => {}
                        false => {
                            table.grow(growth);
                            table
                                .append(prime, &outcome.images)
                                .map_err(|e| Error::ResourceExhausted(e.to_string()))?;
                        }
                    }
                }
                Ok(_) => {
                    self.bad_primes.insert(prime);
                    log::warn!("prime {prime} rejected: leading-monomial sequence does not match the learned staircase");
                }
                Err(Error::BadPrime { prime, reason }) => {
                    self.bad_primes.insert(prime);
                    log::warn!("prime {prime} bad: {reason}");
                }
                Err(other) => return Err(other),
            }
        }
        Ok(())
    }

    /// The heart of the lifter: witness verification, CRT update, and
    /// rational reconstruction for the current degree group.
    ///
    /// Returns `Ok(Some(i))` when polynomial `i` regressed (its
    /// previously reconstructed witness no longer survives
    /// verification against fresh primes) so the caller can observe
    /// the event; `Ok(None)` otherwise.
    pub fn reconstruct_round(&mut self) -> Result<Option<usize>, Error> {
        let table = self
            .table
            .as_ref()
            .ok_or_else(|| Error::InvalidInput("learn phase has not run yet".to_string()))?;
        let nprimes = table.nprimes();
        let t = self.config.nr_threads.min(nprimes);
        if t == 0 {
            return Ok(None);
        }

        self.timing.push("reconstruct");
        let outcome = self.reconstruct_round_inner(nprimes, t);
        self.timing.pop();
        outcome
    }

    fn reconstruct_round_inner(&mut self, nprimes: usize, t: usize) -> Result<Option<usize>, Error> {
        let newest_start = nprimes - t;

        // Step 1: witness verification of pending polynomials. The
        // window is half-open (`start..end`): a freshly constructed
        // `LiftState` has `start == end == 0`, meaning nothing has been
        // proposed for reconstruction yet, so there is nothing to
        // verify on the very first round.
        {
            let table = self.table.as_ref().unwrap();
            let state = self.state.as_mut().unwrap();
            let (start, end) = state.pending_window();
            for i in start..end.min(state.npol()) {
                let poly = table.poly(i);
                let w = state.witness(i);
                let num = state.num(i).clone();
                let den = state.den(i).clone();
                let mut all_match = true;
                for k in newest_start..nprimes {
                    let p = table.primes()[k];
                    let p32 = p as u32;
                    let num_p = Zp::new(bigint_mod_u64(&num, p), p32);
                    let den_p = Zp::new(bigint_mod_u64(&den, p), p32);
                    let Some(den_inv) = den_p.try_inverse() else {
                        all_match = false;
                        break;
                    };
                    let predicted = (num_p * den_inv).value();
                    let actual = poly.slot(w).get(k).copied().unwrap_or(0);
                    if predicted != actual {
                        all_match = false;
                        break;
                    }
                }
                if all_match {
                    let already_checked_once = state.check1(i);
                    state.set_checks(i, true, already_checked_once);
                } else {
                    state.set_checks(i, false, false);
                    return Ok(Some(i));
                }
            }
        }

        // Step 2: CRT update of the witness.
        {
            let state = self.state.as_ref().unwrap();
            let (lstart, lend) = state.window();
            let last = state.npol().saturating_sub(1);
            let lend = lend.min(last);
            let cstep = state.cstep();
            let group_size = state.steps().get(cstep).copied().unwrap_or(0);

            if !state.crt_mult() {
                if nprimes >= (group_size / 16).max(1) {
                    let table = self.table.as_ref().unwrap();
                    let primes_vec = table.primes()[..nprimes].to_vec();
                    let mut computed_modulus = None;
                    let state = self.state.as_mut().unwrap();
                    for i in lstart..=lend {
                        let w = state.witness(i);
                        let vals: Vec<u64> = table.poly(i).slot(w)[..nprimes]
                            .iter()
                            .map(|&c| c as u64)
                            .collect();
                        let (crt_val, modulus) = ReconstructionKernel::seed_crt(&vals, &primes_vec);
                        state.set_crt(i, crt_val);
                        computed_modulus.get_or_insert(modulus);
                    }
                    if let Some(modulus) = computed_modulus {
                        self.mod_p = modulus;
                    }
                    state.set_crt_mult(true);
                } else {
                    let table = self.table.as_ref().unwrap();
                    self.mod_p = table.primes()[..nprimes]
                        .iter()
                        .map(|&p| BigInt::from(p))
                        .product();
                    return Ok(None);
                }
            } else {
                let table = self.table.as_ref().unwrap();
                let state = self.state.as_mut().unwrap();
                for k in newest_start..nprimes {
                    let p = table.primes()[k];
                    let new_mod = &self.mod_p * p;
                    for i in lstart..=lend {
                        let w = state.witness(i);
                        let c = table.poly(i).slot(w)[k] as u64;
                        let (new_crt, _) = ReconstructionKernel::crt_step(state.crt(i), &self.mod_p, c, p);
                        state.set_crt(i, new_crt);
                    }
                    self.mod_p = new_mod;
                }
            }
        }

        // Step 3: reconstruction, only on the adaptive cadence.
        let mut new_lstart;
        {
            let state = self.state.as_ref().unwrap();
            if nprimes as u64 % state.rr() != 0 {
                return Ok(None);
            }
            let (lstart, lend) = state.window();
            let last = state.npol().saturating_sub(1);
            let lend = lend.min(last);
            let cstep = state.cstep();

            let mut gden = if lstart == 0 {
                BigInt::from(1)
            } else if state.check2(lstart - 1) {
                state.den(lstart - 1).clone()
            } else {
                BigInt::from(1)
            };
            let (n_bound, d_bound) = ReconstructionKernel::bounds_for(cstep, &self.mod_p);

            new_lstart = lstart;
            let state = self.state.as_mut().unwrap();
            for i in lstart..=lend {
                match ReconstructionKernel::ratrecon_with_den(state.crt(i), &self.mod_p, &gden, &n_bound, &d_bound) {
                    Some((n, d)) => {
                        state.set_rational(i, n, d.clone());
                        gden = gden.lcm(&d);
                        new_lstart = i + 1;
                    }
                    None => break,
                }
            }
            state.set_gden(gden);
            state.set_window(new_lstart, lend);
        }

        // Step 4: full-polynomial lift for newly advanced polynomials.
        // Computation (immutable borrow of the table) and mutation are
        // kept in separate passes so the per-iteration read doesn't
        // overlap with the table-wide mutable borrow a write needs.
        let (regression, finished_updates) = {
            let table = self.table.as_ref().unwrap();
            let (pend_start, _) = self.state.as_ref().unwrap().pending_window();
            let gden = self.state.as_ref().unwrap().gden().clone();
            let cstep = self.state.as_ref().unwrap().cstep();

            let mut regression = None;
            let mut finished_updates: Vec<(usize, Vec<(BigInt, BigInt)>)> = Vec::new();
            for i in pend_start..new_lstart.min(table.ld()) {
                let poly = table.poly(i);
                let mut slot_results = Vec::with_capacity(poly.len());
                let mut ok = true;
                for slot in 0..poly.len() {
                    let vals: Vec<u64> = poly.slot(slot)[..nprimes].iter().map(|&c| c as u64).collect();
                    let primes_vec = table.primes()[..nprimes].to_vec();
                    let (acc, modulus) = ReconstructionKernel::seed_crt(&vals, &primes_vec);
                    let (n_bound, d_bound) = ReconstructionKernel::bounds_for(cstep, &modulus);
                    match ReconstructionKernel::ratrecon_with_den(&acc, &modulus, &gden, &n_bound, &d_bound) {
                        Some(pair) => slot_results.push(pair),
                        None => {
                            ok = false;
                            break;
                        }
                    }
                }
                if ok {
                    finished_updates.push((i, slot_results));
                } else {
                    regression = Some(i);
                    break;
                }
            }
            (regression, finished_updates)
        };

        for (i, slot_results) in finished_updates {
            let table = self.table.as_mut().unwrap();
            let poly = table.poly_mut(i);
            for (slot, (n, d)) in slot_results.into_iter().enumerate() {
                poly.set_rational(slot, n, d);
            }
        }

        if let Some(i) = regression {
            let state = self.state.as_mut().unwrap();
            state.set_checks(i, false, false);
            let (_, lend) = state.window();
            state.set_window(i, lend);
            return Ok(Some(i));
        }

        let state = self.state.as_mut().unwrap();
        let (mut pend_start, pend_end) = state.pending_window();
        // Keep indices in the window until step 1 has actually confirmed
        // them (`check2`), not just until they've been proposed: a
        // polynomial reconstructed this round still needs at least one
        // later round's witness check before it's allowed to leave.
        while pend_start < new_lstart && state.check2(pend_start) {
            pend_start += 1;
        }
        state.set_pending_window(pend_start, pend_end.max(new_lstart));

        let (_, lend) = state.window();
        if new_lstart > lend {
            if lend + 1 >= state.npol() {
                // last group finished: the remaining window collapses.
                state.set_window(state.npol(), state.npol());
            } else {
                state.advance_group();
            }
        }

        Ok(None)
    }

    pub fn is_done(&self) -> bool {
        match &self.state {
            None => self.table.as_ref().is_some_and(|t| t.ld() == 0),
            Some(state) => state.is_done(),
        }
    }

    /// Drives learn, then apply/reconstruct rounds, until every
    /// polynomial is doubly verified or an unrecoverable error occurs.
    pub fn run(&mut self) -> Result<LiftOutcome, Error> {
        if self.table.is_none() {
            self.learn()?;
        }
        if self.table.as_ref().unwrap().ld() == 0 {
            return Ok(LiftOutcome::Empty);
        }
        loop {
            if self.is_done() {
                break;
            }
            self.apply_round()?;
            self.reconstruct_round()?;
        }
        let table = self.table.as_ref().unwrap();
        let polys = (0..table.ld())
            .map(|i| {
                let poly = table.poly(i);
                let coefficients = (0..poly.len())
                    .map(|slot| poly.rational(slot).cloned().unwrap_or((BigInt::zero(), BigInt::from(1))))
                    .collect();
                RationalPoly { coefficients }
            })
            .collect();
        Ok(LiftOutcome::Lifted(polys))
    }
}

fn bigint_mod_u64(n: &BigInt, p: u64) -> u64 {
    let p_big = BigInt::from(p);
    n.mod_floor(&p_big).to_u64().unwrap_or(0)
}

/// Maps the outcome of [`MultiModularOrchestrator::run`] to the
/// documented integer return codes of the multi-modular entry point.
pub fn return_code(result: &Result<LiftOutcome, Error>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(e) => e.to_return_code(),
    }
}

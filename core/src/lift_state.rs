use std::time::Duration;

use num_bigint::BigInt;
use num_traits::Zero;

use crate::poly::ModularPoly;
use crate::table::ModularImageTable;

/// Picks the witness slot for one polynomial's mod-p image. The
/// source hardcodes "smallest non-zero slot"; this is kept as the
/// default (it is cheapest to verify) but made pluggable, since a
/// witness with a larger mod-p magnitude is weaker evidence of
/// coincidence and a caller chasing fewer false starts may prefer it.
pub trait WitnessPolicy: Send + Sync {
    fn choose(&self, poly: &ModularPoly) -> usize;
}

/// Default policy: the smallest slot whose image under the first
/// accepted prime is non-zero. Mirrors `choose_coef_to_lift` in the
/// source.
#[derive(Default)]
pub struct SmallestNonzeroWitness;

impl WitnessPolicy for SmallestNonzeroWitness {
    fn choose(&self, poly: &ModularPoly) -> usize {
        poly.first_nonzero_slot()
    }
}

/// Alternative policy: the slot whose image under the first accepted
/// prime has the largest absolute residue value, on the theory that a
/// lucky one-prime coincidence is less likely for a coefficient that
/// isn't small.
#[derive(Default)]
pub struct LargestMagnitudeWitness;

impl WitnessPolicy for LargestMagnitudeWitness {
    fn choose(&self, poly: &ModularPoly) -> usize {
        (0..poly.len())
            .max_by_key(|&slot| poly.first_value(slot))
            .unwrap_or(0)
    }
}

/// CRT accumulator and rational-reconstruction bookkeeping, one slice
/// of state per polynomial plus the degree-group schedule that groups
/// polynomials together for bound-policy purposes.
///
/// Created once the learn phase has produced `npol` and `steps`;
/// considered finished once every polynomial has `check2[i] == true`.
pub struct LiftState {
    npol: usize,
    steps: Vec<usize>,
    cstep: usize,
    lstart: usize,
    lend: usize,
    witness: Vec<usize>,
    crt: Vec<BigInt>,
    num: Vec<BigInt>,
    den: Vec<BigInt>,
    gden: BigInt,
    check1: Vec<bool>,
    check2: Vec<bool>,
    rr: u64,
    crt_mult: bool,
    start: usize,
    end: usize,
}

impl LiftState {
    /// `steps` must partition `0..npol` into degree groups
    /// (`sum(steps) == npol`); see
    /// [`ratgb_util::steps_from_leading_degrees`] for the default
    /// derivation from the learned staircase.
    pub fn new(npol: usize, steps: Vec<usize>) -> anyhow::Result<Self> {
        anyhow::ensure!(
            steps.iter().sum::<usize>() == npol,
            "degree-step schedule sums to {} but there are {npol} polynomials",
            steps.iter().sum::<usize>()
        );
        let lend = steps.first().copied().unwrap_or(0);
        Ok(Self {
            npol,
            steps,
            cstep: 0,
            lstart: 0,
            lend: lend.saturating_sub(1),
            witness: vec![0; npol],
            crt: vec![BigInt::zero(); npol],
            num: vec![BigInt::zero(); npol],
            den: vec![BigInt::from(1); npol],
            gden: BigInt::from(1),
            check1: vec![false; npol],
            check2: vec![false; npol],
            rr: 1,
            crt_mult: false,
            start: 0,
            end: 0,
        })
    }

    pub fn npol(&self) -> usize {
        self.npol
    }

    pub fn steps(&self) -> &[usize] {
        &self.steps
    }

    pub fn cstep(&self) -> usize {
        self.cstep
    }

    pub fn window(&self) -> (usize, usize) {
        (self.lstart, self.lend)
    }

    pub fn set_window(&mut self, lstart: usize, lend: usize) {
        self.lstart = lstart;
        self.lend = lend;
    }

    pub fn advance_group(&mut self) {
        self.cstep += 1;
        self.lstart = self.lend + 1;
        self.lend = self
            .steps
            .get(self.cstep)
            .map(|&step| self.lstart + step - 1)
            .unwrap_or(self.lstart);
        self.crt_mult = false;
        self.gden = BigInt::from(1);
    }

    /// Half-open `[start, end)` range of polynomials whose
    /// reconstruction has been proposed and is awaiting a witness
    /// double-check. `start == end` means nothing is pending; a fresh
    /// `LiftState` starts this way, since nothing has been proposed yet.
    pub fn pending_window(&self) -> (usize, usize) {
        (self.start, self.end)
    }

    pub fn set_pending_window(&mut self, start: usize, end: usize) {
        self.start = start;
        self.end = end;
    }

    pub fn witness(&self, i: usize) -> usize {
        self.witness[i]
    }

    pub fn crt(&self, i: usize) -> &BigInt {
        &self.crt[i]
    }

    pub fn set_crt(&mut self, i: usize, value: BigInt) {
        self.crt[i] = value;
    }

    pub fn num(&self, i: usize) -> &BigInt {
        &self.num[i]
    }

    pub fn den(&self, i: usize) -> &BigInt {
        &self.den[i]
    }

    pub fn set_rational(&mut self, i: usize, num: BigInt, den: BigInt) {
        self.num[i] = num;
        self.den[i] = den;
    }

    pub fn gden(&self) -> &BigInt {
        &self.gden
    }

    pub fn set_gden(&mut self, gden: BigInt) {
        self.gden = gden;
    }

    pub fn check1(&self, i: usize) -> bool {
        self.check1[i]
    }

    pub fn check2(&self, i: usize) -> bool {
        self.check2[i]
    }

    pub fn set_checks(&mut self, i: usize, check1: bool, check2: bool) {
        self.check1[i] = check1;
        self.check2[i] = check2;
    }

    pub fn rr(&self) -> u64 {
        self.rr
    }

    pub fn crt_mult(&self) -> bool {
        self.crt_mult
    }

    pub fn set_crt_mult(&mut self, value: bool) {
        self.crt_mult = value;
    }

    pub fn is_done(&self) -> bool {
        self.lstart >= self.npol && self.check2.iter().all(|&done| done)
    }

    /// Sets `witness[i]` for every polynomial according to `policy`.
    pub fn choose_witness(&mut self, table: &ModularImageTable, policy: &dyn WitnessPolicy) {
        for i in 0..self.npol {
            self.witness[i] = policy.choose(table.poly(i));
        }
    }

    /// Doubles the reconstruction cadence `rr` when the most recent
    /// reconstruction pass took longer than `rr` modular-solve rounds
    /// would have, so reconstruction work never dominates runtime.
    pub fn advance_cadence(&mut self, reconstruction_time: Duration, modular_time_per_round: Duration) {
        if modular_time_per_round.is_zero() {
            return;
        }
        let threshold = modular_time_per_round * self.rr as u32;
        if reconstruction_time > threshold {
            self.rr = self.rr.saturating_mul(2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_step_schedule_with_wrong_sum() {
        assert!(LiftState::new(5, vec![2, 2]).is_err());
    }

    #[test]
    fn accepts_matching_step_schedule() {
        let state = LiftState::new(5, vec![2, 3]).unwrap();
        assert_eq!(state.window(), (0, 1));
    }

    #[test]
    fn advance_group_slides_window_to_next_degree_group() {
        let mut state = LiftState::new(5, vec![2, 3]).unwrap();
        state.advance_group();
        assert_eq!(state.cstep(), 1);
        assert_eq!(state.window(), (2, 4));
        assert!(!state.crt_mult());
        assert_eq!(state.gden(), &BigInt::from(1));
    }

    #[test]
    fn is_done_requires_every_polynomial_doubly_checked() {
        let mut state = LiftState::new(2, vec![2]).unwrap();
        state.set_window(2, 2);
        assert!(!state.is_done());
        state.set_checks(0, true, true);
        state.set_checks(1, true, true);
        assert!(state.is_done());
    }

    #[test]
    fn choose_witness_finds_smallest_nonzero_slot_under_learning_prime() {
        let mut table = ModularImageTable::init(4, &[2]);
        table.append(101, &[vec![0, 7]]).unwrap();
        let mut state = LiftState::new(1, vec![1]).unwrap();
        state.choose_witness(&table, &SmallestNonzeroWitness);
        assert_eq!(state.witness(0), 1);
    }

    #[test]
    fn largest_magnitude_policy_prefers_bigger_residue() {
        let mut table = ModularImageTable::init(4, &[2]);
        table.append(101, &[vec![3, 40]]).unwrap();
        let mut state = LiftState::new(1, vec![1]).unwrap();
        state.choose_witness(&table, &LargestMagnitudeWitness);
        assert_eq!(state.witness(0), 1);
    }

    #[test]
    fn advance_cadence_doubles_when_reconstruction_is_slow() {
        let mut state = LiftState::new(1, vec![1]).unwrap();
        assert_eq!(state.rr(), 1);
        state.advance_cadence(Duration::from_millis(50), Duration::from_millis(10));
        assert_eq!(state.rr(), 2);
        state.advance_cadence(Duration::from_millis(5), Duration::from_millis(10));
        assert_eq!(state.rr(), 2);
    }
}

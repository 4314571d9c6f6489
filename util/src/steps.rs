use crate::monomial::degree;

/// Partitions a staircase's leading monomials into runs of equal total
/// degree and returns the run lengths — the degree-group step
/// schedule `LiftState::steps` is built from.
///
/// Scans the leading monomials (already sorted by increasing degree)
/// and counts how many consecutive entries share a degree.
/// `sum(steps) == leading_monomials.len()` always holds because every
/// monomial lands in exactly one run.
pub fn steps_from_leading_degrees(leading_monomials: &[Vec<u32>]) -> Vec<usize> {
    if leading_monomials.is_empty() {
        return Vec::new();
    }
    let mut steps = Vec::new();
    let mut run_degree = degree(&leading_monomials[0]);
    let mut run_len = 1usize;
    for lm in &leading_monomials[1..] {
        let d = degree(lm);
        if d == run_degree {
            run_len += 1;
        } else {
            steps.push(run_len);
            run_degree = d;
            run_len = 1;
        }
    }
    steps.push(run_len);
    steps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_by_total_degree() {
        let lms = vec![
            vec![1, 0], // deg 1
            vec![0, 1], // deg 1
            vec![2, 0], // deg 2
            vec![1, 1], // deg 2
            vec![0, 2], // deg 2
            vec![3, 0], // deg 3
        ];
        let steps = steps_from_leading_degrees(&lms);
        assert_eq!(steps, vec![2, 3, 1]);
        assert_eq!(steps.iter().sum::<usize>(), lms.len());
    }

    #[test]
    fn single_polynomial_is_one_step() {
        let lms = vec![vec![2, 0]];
        assert_eq!(steps_from_leading_degrees(&lms), vec![1]);
    }

    #[test]
    fn empty_staircase_has_no_steps() {
        let lms: Vec<Vec<u32>> = Vec::new();
        assert_eq!(steps_from_leading_degrees(&lms), Vec::<usize>::new());
    }
}

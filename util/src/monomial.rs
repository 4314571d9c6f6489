use std::cmp::Ordering;

/// An exponent vector over `nv` variables. Degree-reverse-lexicographic
/// (grevlex) comparison is the only order THE CORE needs: the modular
/// solver and the signature engine both hand us monomials already
/// reduced to exponent vectors, never polynomial strings.
pub type Monomial = [u32];

/// Total degree of `m`.
pub fn degree(m: &Monomial) -> u32 {
    m.iter().sum()
}

/// Degree-reverse-lexicographic comparison: higher total degree wins;
/// ties break by comparing exponents from the *last* variable down,
/// with the smaller exponent in that position ranking higher (the
/// usual grevlex "last differing exponent, reversed" rule).
///
/// Expressed as a total `Ordering` (rather than a boolean "is less
/// than" predicate) so callers can sort staircases directly with
/// `slice::sort_by`.
pub fn grevlex_cmp(a: &Monomial, b: &Monomial) -> Ordering {
    debug_assert_eq!(a.len(), b.len());
    let (da, db) = (degree(a), degree(b));
    match da.cmp(&db) {
        Ordering::Equal => {}
        other => return other,
    }
    for i in (0..a.len()).rev() {
        match a[i].cmp(&b[i]) {
            Ordering::Equal => continue,
            // Larger exponent in a trailing variable means *smaller*
            // in grevlex order.
            Ordering::Less => return Ordering::Greater,
            Ordering::Greater => return Ordering::Less,
        }
    }
    Ordering::Equal
}

/// True if `divisor` divides `m` componentwise.
pub fn is_divisible(m: &Monomial, divisor: &Monomial) -> bool {
    debug_assert_eq!(m.len(), divisor.len());
    m.iter().zip(divisor).all(|(e, d)| e >= d)
}

/// Componentwise product of two exponent vectors (multiplication of
/// the underlying monomials).
pub fn mul(a: &Monomial, b: &Monomial) -> Vec<u32> {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| x + y).collect()
}

/// `m` multiplied by the `var`-th variable.
pub fn mul_var(m: &Monomial, var: usize) -> Vec<u32> {
    let mut out = m.to_vec();
    out[var] += 1;
    out
}

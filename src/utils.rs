use rust_decimal::{Decimal, prelude::FromPrimitive};

/// Decimal digits kept when comparing payoffs
pub const ROUNDING_PRECISION: u32 = 2;

/// Factorials that fit in a u64
pub(crate) const FACTORIAL_LIMIT: usize = 21;
pub(crate) const FACTORIALS: [u64; FACTORIAL_LIMIT] = {
    let mut facts = [1u64; FACTORIAL_LIMIT];
    let mut i = 1;
    while i < FACTORIAL_LIMIT {
        facts[i] = facts[i - 1] * (i as u64);
        i += 1;
    }
    facts
};

pub(crate) fn factorial(n: usize) -> f64 {
    if n < FACTORIAL_LIMIT {
        FACTORIALS[n] as f64
    } else {
        (1..=n).map(|i| i as f64).product()
    }
}

/// Rearrange `items` into the next lexicographic permutation.
/// Returns false (and leaves `items` sorted ascending) once the last one has been reached.
pub(crate) fn next_permutation<T: Ord>(items: &mut [T]) -> bool {
    if items.len() < 2 {
        return false;
    }
    let mut i = items.len() - 1;
    while i > 0 && items[i - 1] >= items[i] {
        i -= 1;
    }
    if i == 0 {
        items.reverse();
        return false;
    }
    let mut j = items.len() - 1;
    while items[j] <= items[i - 1] {
        j -= 1;
    }
    items.swap(i - 1, j);
    items[i..].reverse();
    true
}

/// Convert f64 to Decimal, non-finite values collapse to zero
pub fn f64_to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Round to [`ROUNDING_PRECISION`] digits, ties to even
pub fn round_decimal(value: Decimal) -> Decimal {
    value.round_dp(ROUNDING_PRECISION)
}

pub fn round_value(value: f64) -> Decimal {
    round_decimal(f64_to_decimal(value))
}

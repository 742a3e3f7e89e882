#![forbid(unsafe_code)]

//! One-sided exact binomial test of accuracy against chance.

use serde::{Deserialize, Serialize};
use statrs::function::factorial::ln_binomial;

/// Null success probability for a two-alternative task.
pub const CHANCE_PROBABILITY: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinomialTest {
    pub successes: u64,
    pub trials: u64,
    pub null_probability: f64,
    /// `P(X >= successes)` under the null.
    pub p_value: f64,
}

/// Exact upper tail `P(X >= successes)` for `X ~ Binomial(n, p0)`.
///
/// Summed term by term from the pmf; `None` when `successes > n` or `p0`
/// is not a probability.
#[must_use]
pub fn binomial_tail_ge(successes: u64, n: u64, p0: f64) -> Option<f64> {
    if successes > n || !(0.0..=1.0).contains(&p0) {
        return None;
    }
    if successes == 0 {
        return Some(1.0);
    }
    if p0 == 0.0 {
        return Some(0.0);
    }
    if p0 == 1.0 {
        return Some(1.0);
    }

    let ln_p = p0.ln();
    let ln_q = (1.0 - p0).ln();
    let tail: f64 = (successes..=n)
        .map(|k| (ln_binomial(n, k) + k as f64 * ln_p + (n - k) as f64 * ln_q).exp())
        .sum();
    Some(tail.clamp(0.0, 1.0))
}

/// Test `successes` correct out of `n` against chance (`p0 = 0.5`),
/// alternative "greater". `n == 0` is not testable.
#[must_use]
pub fn binomial_test(successes: u64, n: u64) -> Option<BinomialTest> {
    if n == 0 {
        return None;
    }
    let p_value = binomial_tail_ge(successes, n, CHANCE_PROBABILITY)?;
    Some(BinomialTest {
        successes,
        trials: n,
        null_probability: CHANCE_PROBABILITY,
        p_value,
    })
}

#![no_main]

use arbitrary::Arbitrary;
use sdt_core::binomial_tail_ge;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct TailInput {
    successes: u16,
    trials: u16,
    p0: f64,
}

fuzz_target!(|input: TailInput| {
    let n = u64::from(input.trials % 2048);
    let k = u64::from(input.successes);
    match binomial_tail_ge(k, n, input.p0) {
        Some(p) => {
            assert!(k <= n);
            assert!((0.0..=1.0).contains(&p), "p = {p}");
        }
        None => assert!(k > n || !(0.0..=1.0).contains(&input.p0)),
    }
});

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::remote::{parse_response, FetchError, RemoteSource};
use crate::{Config, HybridRng, LocalRng, NullSource};

/// A remote source driven by a script of canned outcomes. `None` entries
/// simulate a network failure; the script is shared so tests can count
/// fetches after the source has moved into the generator.
#[derive(Clone, Default)]
struct ScriptedSource {
    script: Rc<RefCell<VecDeque<Option<Vec<u16>>>>>,
    fetches: Rc<Cell<usize>>,
}

impl ScriptedSource {
    fn new(script: impl IntoIterator<Item = Option<Vec<u16>>>) -> Self {
        Self {
            script: Rc::new(RefCell::new(script.into_iter().collect())),
            fetches: Rc::new(Cell::new(0)),
        }
    }

    fn fetches(&self) -> usize {
        self.fetches.get()
    }
}

impl RemoteSource for ScriptedSource {
    fn fetch(&self, _count: usize) -> Result<Vec<u16>, FetchError> {
        self.fetches.set(self.fetches.get() + 1);
        match self.script.borrow_mut().pop_front() {
            Some(Some(batch)) => Ok(batch),
            _ => Err(FetchError::Malformed("scripted failure".into())),
        }
    }
}

fn offline(seed: u64) -> HybridRng<NullSource> {
    let config = Config {
        seed,
        cooldown: 8,
        ..Config::default()
    };
    HybridRng::with_source(NullSource, config)
}

#[test]
fn below_stays_in_bounds() {
    let mut rng = offline(42);
    for bound in [1u32, 2, 3, 6, 10, 100, 255, 1000, 4096, 65535, 65536] {
        for _ in 0..1000 {
            assert!(rng.below(bound) < bound);
        }
    }
}

#[test]
#[should_panic(expected = "bound must be in")]
fn below_rejects_zero_bound() {
    offline(42).below(0);
}

#[test]
fn no_network_never_fails_and_stays_uniform() {
    // Pearson chi-squared over ten digit bins, N and the 99% critical value
    // (9 degrees of freedom) taken from the original service's daily tests.
    const N: usize = 2040;
    let mut rng = offline(42);
    let mut obs = [0usize; 10];
    for _ in 0..N {
        obs[rng.digit() as usize] += 1;
    }
    let expected = N as f64 / 10.0;
    let chisq: f64 = obs
        .iter()
        .map(|&x| {
            let d = x as f64 - expected;
            d * d / expected
        })
        .sum();
    assert!(chisq < 21.666, "chi-squared {chisq} over 99% critical value");
    assert!(rng.is_fallback());
}

#[test]
fn batch_is_consumed_in_order_then_refilled() {
    let source = ScriptedSource::new([Some(vec![3, 7, 11, 2]), Some(vec![14])]);
    let mut rng = HybridRng::with_source(source.clone(), Config::default());
    assert_eq!(rng.below(16), 3);
    assert_eq!(rng.below(16), 7);
    assert_eq!(rng.below(16), 11);
    assert_eq!(rng.below(16), 2);
    assert_eq!(source.fetches(), 1);
    // The batch is spent; the next draw refetches.
    assert_eq!(rng.below(16), 14);
    assert_eq!(source.fetches(), 2);
}

#[test]
fn fallback_waits_out_the_cooldown_before_retrying() {
    const COOLDOWN: u32 = 4;
    let source = ScriptedSource::new([None, Some(vec![9, 9, 9, 9])]);
    let config = Config {
        cooldown: COOLDOWN,
        seed: 42,
        ..Config::default()
    };
    let mut rng = HybridRng::with_source(source.clone(), config);

    // The failing draw is served locally and flips the mode immediately.
    rng.below(16);
    assert!(rng.is_fallback());
    assert_eq!(source.fetches(), 1);

    // The next COOLDOWN draws stay local without touching the network.
    for _ in 0..COOLDOWN {
        rng.below(16);
        assert_eq!(source.fetches(), 1);
    }

    // The draw after that retries and recovers.
    assert_eq!(rng.below(16), 9);
    assert_eq!(source.fetches(), 2);
    assert!(!rng.is_fallback());
}

#[test]
fn failed_retry_restarts_the_cooldown() {
    const COOLDOWN: u32 = 3;
    let source = ScriptedSource::new([None, None, Some(vec![5])]);
    let config = Config {
        cooldown: COOLDOWN,
        seed: 42,
        ..Config::default()
    };
    let mut rng = HybridRng::with_source(source.clone(), config);

    for _ in 0..2 * (COOLDOWN + 1) {
        rng.below(16);
        assert!(rng.is_fallback());
    }
    assert_eq!(source.fetches(), 2);
    assert_eq!(rng.below(16), 5);
    assert!(!rng.is_fallback());
}

#[test]
fn biased_tail_values_are_discarded() {
    // With bound 6 the raw space splits at 65532; anything at or above it
    // would skew a modulo reduction and must be redrawn, never returned.
    let source = ScriptedSource::new([Some(vec![65533, 65534, 4, 65535, 5])]);
    let mut rng = HybridRng::with_source(source, Config::default());
    assert_eq!(rng.below(6), 4);
    assert_eq!(rng.below(6), 5);
}

#[test]
fn full_bound_is_an_identity() {
    let source = ScriptedSource::new([Some(vec![0, 65535, 12345])]);
    let mut rng = HybridRng::with_source(source, Config::default());
    assert_eq!(rng.below(65536), 0);
    assert_eq!(rng.below(65536), 65535);
    assert_eq!(rng.below(65536), 12345);
}

#[test]
fn next_u32_packs_two_raw_draws() {
    let source = ScriptedSource::new([Some(vec![0xABCD, 0x1234])]);
    let mut rng = HybridRng::with_source(source, Config::default());
    assert_eq!(rng.next_u32(), 0xABCD_1234);
}

#[test]
fn real_and_bit_draws() {
    let mut rng = offline(42);
    for _ in 0..1000 {
        let x = rng.real();
        assert!((0.0..1.0).contains(&x));
        let y = rng.real_to(4.5);
        assert!((0.0..4.5).contains(&y));
    }
    // Both outcomes show up quickly in a fair stream.
    let mut heads = 0;
    for _ in 0..1000 {
        heads += rng.bit() as usize;
    }
    assert!((400..=600).contains(&heads), "suspicious bit bias: {heads}");
}

#[test]
fn seed_value_respects_digit_count() {
    let mut rng = offline(42);
    for _ in 0..100 {
        assert!(rng.seed_value(1) <= 9);
        assert!(rng.seed_value(5) < 100_000);
    }
    // Clamped to at least one digit and at most a u64's worth.
    assert!(rng.seed_value(0) <= 9);
    let _ = rng.seed_value(19);
}

#[test]
fn gauss_parameters_look_right() {
    // Tolerances from the original module's unit tests: mean within the 99%
    // band for N samples of a unit normal, sigma within 5%.
    const N: usize = 2040;
    let mut rng = offline(7);
    let samples: Vec<f64> = (0..N).map(|_| rng.gauss(0.0, 1.0)).collect();
    let mu = samples.iter().sum::<f64>() / N as f64;
    let var = samples.iter().map(|x| (x - mu) * (x - mu)).sum::<f64>() / N as f64;
    let sigma = var.sqrt();
    assert!(mu.abs() < 2.575 / (N as f64).sqrt(), "dubious mean {mu}");
    assert!((sigma - 1.0).abs() < 0.05, "dubious sdev {sigma}");
}

#[test]
fn datafile_has_header_then_exactly_count_samples() {
    const COUNT: u64 = 100;
    let mut rng = offline(42);
    let mut out = Vec::new();
    crate::datafile::write_ascii(&mut out, &mut rng, COUNT).unwrap();

    let text = String::from_utf8(out).unwrap();
    let mut lines = text.lines();
    assert!(lines.next().unwrap().starts_with('#'));
    assert_eq!(lines.next().unwrap(), format!("# generator qrand  seed = {}", rng.seed()));
    assert!(lines.next().unwrap().starts_with('#'));
    assert_eq!(lines.next().unwrap(), "type: d");
    assert_eq!(lines.next().unwrap(), format!("count: {COUNT}"));
    assert_eq!(lines.next().unwrap(), "numbit: 32");

    let samples: Vec<&str> = lines.collect();
    assert_eq!(samples.len() as u64, COUNT);
    for line in samples {
        line.parse::<u32>().unwrap();
    }
}

#[test]
fn parses_decimal_payload() {
    let body = r#"{"type":"uint16","length":3,"data":[7731,40732,1971],"success":true}"#;
    assert_eq!(parse_response(body).unwrap(), vec![7731, 40732, 1971]);
}

#[test]
fn parses_hex_payload() {
    let body = r#"{"type":"hex16","length":3,"data":["1e33","9f41","003a"],"success":true}"#;
    assert_eq!(parse_response(body).unwrap(), vec![0x1e33, 0x9f41, 0x3a]);
}

#[test]
fn rejects_bad_payloads() {
    let cases = [
        r#"{"success":false,"data":[1,2,3]}"#,
        r#"{"success":true,"data":[]}"#,
        r#"{"success":true,"data":[70000]}"#,
        r#"{"success":true,"data":["xyzw"]}"#,
        r#"not json at all"#,
        r#"{}"#,
    ];
    for body in cases {
        assert!(
            matches!(parse_response(body), Err(FetchError::Malformed(_))),
            "accepted {body:?}"
        );
    }
}

#[test]
fn local_rng_is_reproducible_per_seed() {
    let a = LocalRng::new(99);
    let b = LocalRng::new(99);
    for _ in 0..100 {
        assert_eq!(a.u64(), b.u64());
    }
    assert_eq!(a.seed(), 99);
    assert_ne!(LocalRng::new(1).u64(), LocalRng::new(2).u64());
}

#[test]
fn local_rng_fills_odd_length_buffers() {
    let rng = LocalRng::new(3);
    let mut buffer = [0u8; 13];
    rng.bytes(&mut buffer);
    assert_ne!(buffer, [0u8; 13]);
}

#[test]
#[ignore]
fn bench() {
    // Throughput of pure local draws vs. offline hybrid draws.
    // Run with `cargo test bench --release -- --ignored --nocapture`
    use std::time::Instant;

    const ITERS: usize = 10_000_000;

    let local = LocalRng::new(1);
    let start = Instant::now();
    let mut acc = 0u64;
    for _ in 0..ITERS {
        acc = acc.wrapping_add(local.u64());
    }
    let local_dur = start.elapsed();

    let mut hybrid = offline(1);
    let start = Instant::now();
    let mut acc2 = 0u32;
    for _ in 0..ITERS {
        acc2 = acc2.wrapping_add(hybrid.below(1000));
    }
    let hybrid_dur = start.elapsed();

    println!("\nlocal:  {ITERS} draws in {local_dur:?} (acc {acc})");
    println!("hybrid: {ITERS} draws in {hybrid_dur:?} (acc {acc2})");
}

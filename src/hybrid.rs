use std::time::Duration;

use log::{info, warn};

use crate::local::LocalRng;
use crate::remote::{AnuClient, RemoteSource, DEFAULT_TIMEOUT, MAX_BATCH_LEN};

/// The size of the raw value space. Both sources produce `u16` values, so
/// bounded draws are uniform no matter which source supplied them.
const RAW_SPACE: u32 = 1 << 16;

/// `4 * exp(-0.5) / sqrt(2)`, the rejection constant of the
/// Kinderman-Monahan ratio-of-uniforms method used by [`HybridRng::gauss`].
const NV_MAGICCONST: f64 = 1.715_527_769_921_41;

/// Configuration for a [`HybridRng`].
///
/// The defaults point at the ANU service with its maximum batch length and
/// retry the network after 64 local fallback draws. The cooldown is a
/// heuristic knob, not a contract: it only trades recovery latency against
/// hammering an unreachable host.
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the remote random number service.
    pub endpoint: String,
    /// Values requested per batch, clamped to the service maximum of 1024.
    pub batch_len: usize,
    /// Local draws served after a failed fetch before the next attempt.
    pub cooldown: u32,
    /// Network timeout for one fetch.
    pub timeout: Duration,
    /// Seed for the local generator; 0 picks one.
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: crate::remote::ANU_ENDPOINT.to_string(),
            batch_len: MAX_BATCH_LEN,
            cooldown: 64,
            timeout: DEFAULT_TIMEOUT,
            seed: 0,
        }
    }
}

/// Which source the generator currently prefers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Draw from the remote batch, refilling it on exhaustion.
    RemotePreferred,
    /// The last fetch failed. Serve `remaining` local draws, then retry.
    LocalFallback { remaining: u32 },
}

/// A generator that interleaves batches of quantum random numbers with a
/// local pseudorandom generator.
///
/// Draws consume a cached remote batch and refill it lazily over the
/// network. A failed refill never reaches the caller: the generator logs a
/// warning, serves local values for [`Config::cooldown`] draws, and then
/// tries the network again. There is no terminal state; the generator keeps
/// producing values for the life of the process.
///
/// Draws take `&mut self`. Concurrent callers must wrap the generator in a
/// mutex, since the batch cursor and mode are plain mutable state.
///
/// # Example
/// ```no_run
/// # use qrand::{Config, HybridRng};
/// let mut rng = HybridRng::new(Config::default());
/// let roll = rng.below(6) + 1;
/// assert!((1..=6).contains(&roll));
/// ```
pub struct HybridRng<S: RemoteSource = AnuClient> {
    source: S,
    local: LocalRng,
    batch: Vec<u16>,
    cursor: usize,
    mode: Mode,
    batch_len: usize,
    cooldown: u32,
}

impl HybridRng<AnuClient> {
    /// Returns a generator backed by the ANU client described by `config`.
    pub fn new(config: Config) -> Self {
        let client = AnuClient::new(config.endpoint.clone(), config.timeout);
        Self::with_source(client, config)
    }
}

impl<S: RemoteSource> HybridRng<S> {
    /// Returns a generator drawing remote values from `source`. This is the
    /// constructor tests use to script the network.
    pub fn with_source(source: S, config: Config) -> Self {
        Self {
            source,
            local: LocalRng::new(config.seed),
            batch: Vec::new(),
            cursor: 0,
            mode: Mode::RemotePreferred,
            batch_len: config.batch_len.clamp(1, MAX_BATCH_LEN),
            cooldown: config.cooldown,
        }
    }

    /// Returns an integer in `[0, bound)`, uniform regardless of which
    /// source supplied the raw value. `bound` must be in `1..=65536`.
    ///
    /// Raw values in the final incomplete multiple of `bound` would bias a
    /// plain modulo reduction, so they are discarded and redrawn.
    pub fn below(&mut self, bound: u32) -> u32 {
        assert!(
            bound > 0 && bound <= RAW_SPACE,
            "bound must be in 1..={RAW_SPACE}"
        );
        let limit = RAW_SPACE - RAW_SPACE % bound;
        loop {
            let raw = self.next_raw() as u32;
            if raw < limit {
                return raw % bound;
            }
        }
    }

    /// Returns a full `u32`, packed from two raw draws. This is the word
    /// width the dieharder data file and the byte stream are built from.
    pub fn next_u32(&mut self) -> u32 {
        (self.next_raw() as u32) << 16 | self.next_raw() as u32
    }

    /// Returns a random bit: the parity of one raw draw.
    pub fn bit(&mut self) -> bool {
        self.next_raw() & 1 == 1
    }

    /// Returns a decimal digit in `0..=9`.
    pub fn digit(&mut self) -> u32 {
        self.below(10)
    }

    /// Returns an `f64` in `[0, 1)`. Resolution is one part in 2^16, the
    /// raw value width of the remote service.
    pub fn real(&mut self) -> f64 {
        self.next_raw() as f64 / RAW_SPACE as f64
    }

    /// Returns an `f64` in `[0, endpoint)`.
    pub fn real_to(&mut self, endpoint: f64) -> f64 {
        self.real() * endpoint
    }

    /// Returns an integer built from `digits` random decimal digits,
    /// suitable for seeding other generators. `digits` is clamped to
    /// `1..=19` so the result fits a `u64`.
    pub fn seed_value(&mut self, digits: u32) -> u64 {
        let digits = digits.clamp(1, 19);
        let mut value = 0u64;
        for _ in 0..digits {
            value = value * 10 + self.digit() as u64;
        }
        value
    }

    /// Returns a normally distributed value with the given mean and
    /// standard deviation, via the Kinderman-Monahan ratio-of-uniforms
    /// method. About 32% of candidate pairs are rejected.
    pub fn gauss(&mut self, mean: f64, sdev: f64) -> f64 {
        loop {
            let u1 = self.real();
            let u2 = 1.0 - self.real();
            let z = NV_MAGICCONST * (u1 - 0.5) / u2;
            if z * z / 4.0 <= -u2.ln() {
                return mean + z * sdev;
            }
        }
    }

    /// Fills `data` with random bytes, two per raw draw.
    pub fn bytes(&mut self, data: &mut [u8]) {
        const CHUNK_SIZE: usize = std::mem::size_of::<u16>();
        for chunk in data.chunks_exact_mut(CHUNK_SIZE) {
            chunk.copy_from_slice(&self.next_raw().to_ne_bytes());
        }
        if data.len() % CHUNK_SIZE != 0 {
            let last = data.len() - 1;
            data[last] = self.next_raw() as u8;
        }
    }

    /// The seed of the local generator, as reported in data file headers.
    pub fn seed(&self) -> u64 {
        self.local.seed()
    }

    /// True while the generator is serving local draws after a failed
    /// fetch. Purely diagnostic.
    pub fn is_fallback(&self) -> bool {
        matches!(self.mode, Mode::LocalFallback { .. })
    }

    /// Returns the next raw `u16`, preferring the remote batch and falling
    /// back to the local generator when the network fails.
    fn next_raw(&mut self) -> u16 {
        if let Mode::LocalFallback { remaining } = &mut self.mode {
            if *remaining > 0 {
                *remaining -= 1;
                return self.local.u16();
            }
        }
        if self.cursor >= self.batch.len() {
            match self.source.fetch(self.batch_len) {
                Ok(batch) => {
                    if self.is_fallback() {
                        info!("remote source recovered");
                    }
                    self.batch = batch;
                    self.cursor = 0;
                    self.mode = Mode::RemotePreferred;
                }
                Err(err) => {
                    warn!("remote fetch failed, falling back to local draws: {err}");
                    self.mode = Mode::LocalFallback {
                        remaining: self.cooldown,
                    };
                    return self.local.u16();
                }
            }
        }
        let value = self.batch[self.cursor];
        self.cursor += 1;
        value
    }
}

impl Default for HybridRng<AnuClient> {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

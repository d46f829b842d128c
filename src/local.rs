use std::cell::Cell;

/// The increment used to update the state of the generator. Coprime to 2^64 and
/// close to `2^64 * (phi - 1)`, where `phi` is the golden ratio, so the state
/// walks a low discrepancy Weyl sequence with a period of 2^64.
pub(crate) const INCREMENT: u64 = 0x9E3779B97F4A7FFF;

// Multipliers for the output hash, also coprime to 2^64.
const ALPHA: u128 = 0x11F9ADBB8F8DA6FFF;
const BETA: u128 = 0x1E3DF208C6781EFFF;

/// The pseudorandom half of the hybrid generator: a Weyl sequence hashed with
/// `wyhash`. Draws take `&self`, the state lives in a `Cell`.
///
/// This source is pure arithmetic and cannot fail, which is what makes it a
/// safe floor to fall back on when the quantum service is unreachable.
///
/// # Example
/// ```
/// # use qrand::LocalRng;
/// let rng = LocalRng::new(42);
/// let x = rng.u16();
/// let y = rng.u16();
/// assert_ne!((x, y), (rng.u16(), rng.u16()));
/// ```
#[derive(Debug)]
pub struct LocalRng {
    /// The current state of the generator.
    state: Cell<u64>,
    /// The seed the state started from, kept for reporting.
    seed: u64,
}

impl LocalRng {
    /// Returns a new generator seeded with `seed`. A seed of 0 picks an
    /// unpredictable seed in release builds; in debug builds it is replaced
    /// with a constant to make tests reproducible.
    pub fn new(seed: u64) -> Self {
        let seed = match seed {
            0 => {
                #[cfg(not(debug_assertions))]
                {
                    use std::hash::{BuildHasher, RandomState};
                    RandomState::new().hash_one("qrand")
                }
                #[cfg(debug_assertions)]
                1234
            }
            s => s,
        };
        Self {
            state: Cell::new(seed),
            seed,
        }
    }

    /// The seed this generator started from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns the next `u64` of the pseudorandom sequence.
    pub fn u64(&self) -> u64 {
        let old_state = self.state.get();
        self.state.set(old_state.wrapping_add(INCREMENT));
        wyhash(old_state)
    }

    /// Returns a `u16`, the raw value width of the remote service. The hybrid
    /// generator draws these so that both sources share one raw value space.
    pub fn u16(&self) -> u16 {
        (self.u64() >> 48) as u16
    }

    /// Returns an `f64` in `[0, 1)`.
    pub fn f64(&self) -> f64 {
        ((self.u64() >> 11) as f64) * (-53_f64).exp2()
    }

    /// Fills the slice `data` with random bytes.
    pub fn bytes(&self, data: &mut [u8]) {
        const CHUNK_SIZE: usize = std::mem::size_of::<u64>();
        for chunk in data.chunks_exact_mut(CHUNK_SIZE) {
            chunk.copy_from_slice(&self.u64().to_ne_bytes());
        }
        let last = (data.len() / CHUNK_SIZE) * CHUNK_SIZE;
        let bytes = self.u64().to_ne_bytes();
        for (index, byte) in data[last..].iter_mut().enumerate() {
            *byte = bytes[index];
        }
    }
}

impl Default for LocalRng {
    fn default() -> Self {
        Self::new(0)
    }
}

#[inline]
pub(crate) fn wyhash(value: u64) -> u64 {
    let mut tmp = (value as u128).wrapping_mul(ALPHA);
    tmp ^= tmp >> 64;
    tmp = tmp.wrapping_mul(BETA);
    ((tmp >> 64) ^ tmp) as _
}

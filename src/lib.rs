//! True random numbers from quantum mechanics, with a pseudorandom floor.
//!
//! The ANU quantum random number service measures vacuum fluctuations and
//! streams the result as batches of `u16` values. [`HybridRng`] caches one
//! batch at a time and hands values out one per call; when the network is
//! slow, down, or returning garbage, it substitutes draws from a local
//! wyhash-based generator and quietly retries the service later. Callers
//! never see a network error, only numbers.
//!
//! ```no_run
//! use qrand::{Config, HybridRng};
//!
//! let mut rng = HybridRng::new(Config::default());
//! let die = rng.below(6) + 1;
//! let coin = rng.bit();
//! println!("rolled {die}, flipped {}", if coin { "heads" } else { "tails" });
//! ```
//!
//! The `tester` binary feeds the stream into dieharder; see also
//! [`datafile::write_ascii`] for the file format it uses.

pub mod datafile;
mod hybrid;
mod local;
mod remote;

#[cfg(feature = "rand")]
mod rand_support;

#[cfg(test)]
mod tests;

pub use hybrid::{Config, HybridRng};
pub use local::LocalRng;
pub use remote::{AnuClient, FetchError, NullSource, RemoteSource, ANU_ENDPOINT, MAX_BATCH_LEN};

use std::io::{self, Write};

use crate::hybrid::HybridRng;
use crate::remote::RemoteSource;

/// Bit width of each sample line. Matches what dieharder expects from an
/// ASCII input file of decimal integers.
const NUMBIT: u32 = 32;

/// Writes `count` samples from `rng` in the dieharder ASCII input format:
/// a `#`-framed header naming the generator and seed, the `type`, `count`
/// and `numbit` fields, then one unsigned 32-bit decimal integer per line.
///
/// The output feeds `dieharder -g 202 -f <file>`.
///
/// # Example
/// ```no_run
/// # use std::fs::File;
/// # use std::io::BufWriter;
/// # use qrand::{datafile, Config, HybridRng};
/// let mut rng = HybridRng::new(Config::default());
/// let file = File::create("samples.txt")?;
/// datafile::write_ascii(BufWriter::new(file), &mut rng, 1_000_000)?;
/// # std::io::Result::Ok(())
/// ```
pub fn write_ascii<W, S>(mut out: W, rng: &mut HybridRng<S>, count: u64) -> io::Result<()>
where
    W: Write,
    S: RemoteSource,
{
    writeln!(out, "#==================================================================")?;
    writeln!(out, "# generator qrand  seed = {}", rng.seed())?;
    writeln!(out, "#==================================================================")?;
    writeln!(out, "type: d")?;
    writeln!(out, "count: {count}")?;
    writeln!(out, "numbit: {NUMBIT}")?;
    for _ in 0..count {
        writeln!(out, "{}", rng.next_u32())?;
    }
    out.flush()
}

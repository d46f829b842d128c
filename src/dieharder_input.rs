use std::io::{self, Write};

use qrand::{Config, HybridRng};

const BUFFER_SIZE: usize = 256_usize.pow(2);

/// Streams raw bytes to stdout forever, for piping into an external test
/// harness: `dieharder -g 200 -f /dev/stdin`.
fn main() {
    env_logger::init();
    let mut rng = HybridRng::new(Config::default());
    let mut buffer = [0; BUFFER_SIZE];
    let mut output = io::stdout();
    loop {
        rng.bytes(&mut buffer);
        output.write_all(&buffer).ok();
    }
}

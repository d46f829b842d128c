use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

use qrand::{datafile, Config, HybridRng, NullSource, RemoteSource};

/// Runs the hybrid generator through the dieharder test battery.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Number of 32-bit samples to generate.
    #[arg(long, default_value_t = 21_600_000)]
    length: u64,
    /// Dieharder test number, or "all" for the whole battery.
    #[arg(long, default_value = "all")]
    test: String,
    /// Where to write the dieharder report.
    #[arg(long, default_value = "dieharder-report.txt")]
    report: PathBuf,
    /// Seed for the local generator; 0 picks one.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Skip the remote service and use only local draws.
    #[arg(long)]
    offline: bool,
    /// Keep the generated sample file instead of deleting it.
    #[arg(long)]
    keep: bool,
}

/// Deletes the sample file on every exit path unless `--keep` was given.
struct SampleFile {
    path: PathBuf,
    keep: bool,
}

impl Drop for SampleFile {
    fn drop(&mut self) {
        if !self.keep {
            let _ = fs::remove_file(&self.path);
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let samples = SampleFile {
        path: std::env::temp_dir().join(format!("qrand-samples-{}.txt", std::process::id())),
        keep: args.keep,
    };

    let config = Config {
        seed: args.seed,
        ..Config::default()
    };
    if args.offline {
        let mut rng = HybridRng::with_source(NullSource, config);
        generate(&samples.path, &mut rng, args.length)?;
    } else {
        let mut rng = HybridRng::new(config);
        generate(&samples.path, &mut rng, args.length)?;
    }

    run_dieharder(&samples.path, &args.test, &args.report)
}

fn generate<S: RemoteSource>(path: &Path, rng: &mut HybridRng<S>, count: u64) -> Result<()> {
    info!("writing {count} samples to {}", path.display());
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    datafile::write_ascii(BufWriter::new(file), rng, count)
        .with_context(|| format!("failed to write {}", path.display()))
}

fn run_dieharder(samples: &Path, test: &str, report: &Path) -> Result<()> {
    let mut command = Command::new("dieharder");
    command.arg("-g").arg("202").arg("-f").arg(samples);
    match test {
        "all" => {
            command.arg("-a");
        }
        number => {
            number
                .parse::<u32>()
                .with_context(|| format!("invalid test selector {number:?}"))?;
            command.arg("-d").arg(number);
        }
    }
    info!("running {command:?}");
    let output = command
        .output()
        .context("failed to run dieharder (is it installed?)")?;
    fs::write(report, &output.stdout)
        .with_context(|| format!("failed to write {}", report.display()))?;
    if !output.status.success() {
        bail!(
            "dieharder exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    println!("report written to {}", report.display());
    Ok(())
}

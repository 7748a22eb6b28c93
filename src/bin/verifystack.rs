//! Check a stack container's internal consistency, with optional repair.

use std::fs;
use std::path::PathBuf;

use clap::Parser;

use stack::engine::StackEngine;
use stack::error::StackError;
use stack::verify::verify;

/// Verify (and optionally repair) a stack container's cross-references.
#[derive(Parser, Debug)]
#[command(name = "verifystack", version, about)]
struct Args {
    /// Stack container to check.
    input: PathBuf,
    /// Fix superpixels with no segment assigned and write the result back
    /// to `input`. Spelled `--repair` (clap's standard double-dash long
    /// flag) rather than the original tool's single-dash `-repair`.
    #[arg(long)]
    repair: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match run(Args::parse()) {
        Ok(clean) => {
            if !clean {
                std::process::exit(1);
            }
        }
        Err(err) => {
            tracing::error!(%err, "verifystack failed");
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

fn run(args: Args) -> Result<bool, StackError> {
    let mut engine = StackEngine::load(fs::File::open(&args.input)?)?;

    let report = verify(&mut engine, args.repair)?;
    for issue in &report.issues {
        println!("{issue:?}");
    }
    if report.truncated {
        println!("... further issues omitted past the report cap");
    }
    println!(
        "{} issue(s) found{}",
        report.issues.len(),
        if report.truncated { " (truncated)" } else { "" }
    );

    if args.repair && report.repaired > 0 {
        println!("repaired {} superpixel(s)", report.repaired);
        engine.save(fs::File::create(&args.input)?, false)?;
    }

    Ok(report.issues.is_empty())
}

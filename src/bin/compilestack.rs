//! Build a stack container from the three bulk ingest text tables found
//! under a stack directory.

use std::fs;
use std::path::PathBuf;

use clap::Parser;

use stack::construct::construct;
use stack::error::StackError;
use stack::text::{read_bodies, read_bounds, read_segments};

/// Compile a superpixel/segment/body mapping from text tables into a
/// binary stack container.
#[derive(Parser, Debug)]
#[command(name = "compilestack", version, about)]
struct Args {
    /// Directory holding `superpixel_bounds.txt`, `superpixel_to_segment_map.txt`
    /// and `segment_to_body_map.txt`.
    stack_path: PathBuf,
    /// Output container path. Defaults to `stack.bin` under `stack-path`.
    /// Refuses to overwrite an existing file.
    out_path: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(err) = run(Args::parse()) {
        tracing::error!(%err, "compilestack failed");
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), StackError> {
    let out_path = args
        .out_path
        .unwrap_or_else(|| args.stack_path.join("stack.bin"));

    if out_path.exists() {
        return Err(StackError::Io(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("refusing to overwrite existing {}", out_path.display()),
        )));
    }

    let bounds = read_bounds(&fs::read_to_string(
        args.stack_path.join("superpixel_bounds.txt"),
    )?)?;
    let segments = read_segments(&fs::read_to_string(
        args.stack_path.join("superpixel_to_segment_map.txt"),
    )?)?;
    let bodies = read_bodies(&fs::read_to_string(
        args.stack_path.join("segment_to_body_map.txt"),
    )?)?;

    let (mut engine, report) = construct(&bounds, &segments, &bodies)?;
    tracing::info!(
        orphans = report.orphans,
        phantoms = report.phantoms,
        empty_segments = report.empty_segments,
        empty_bodies = report.empty_bodies,
        remapped_zero_superpixels = report.remapped_zero_superpixels,
        new_bodies = report.new_bodies.len(),
        "constructed stack"
    );

    let file = fs::File::create(&out_path)?;
    engine.save(file, false)?;
    tracing::info!(output = %out_path.display(), "wrote stack container");

    Ok(())
}

//! Interface stub for the tile-based bounds scanner.
//!
//! Walking a directory of index-coded tile images to produce a
//! `superpixel_bounds.txt` table is outside the scope of this crate; this
//! binary only documents and validates the command line the rest of the
//! toolchain expects it to accept.

use std::path::PathBuf;

use clap::Parser;

/// Scan a tile directory under `stack-path` and emit `superpixel_bounds.txt`.
/// Not implemented: bring your own tile scanner and feed its output to
/// `compilestack` directly.
#[derive(Parser, Debug)]
#[command(name = "bounds", version, about)]
struct Args {
    /// Directory of index-coded tile images to scan.
    stack_path: PathBuf,
    /// Tile edge length, in pixels.
    #[arg(default_value_t = 1024)]
    tilesize: u32,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    tracing::error!(
        stack_path = %args.stack_path.display(),
        tilesize = args.tilesize,
        "tile-based bounds scanning is not implemented by this crate"
    );
    eprintln!(
        "bounds: tile scanning is not implemented; produce a bounds text table \
         by other means and pass it to compilestack"
    );
    std::process::exit(2);
}

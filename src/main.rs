//! # chatvault CLI
//!
//! Command-line interface for the chatvault library.

use std::fs;
use std::process;
use std::time::Instant;

use clap::Parser as ClapParser;

use chatvault::ChatvaultError;
use chatvault::cli::Args;
use chatvault::export::{ExportOptions, SourceReader, export_archive};
use chatvault::progress::{no_progress, stderr_progress};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), ChatvaultError> {
    let total_start = Instant::now();
    let args = <Args as ClapParser>::parse();

    println!("chatvault v{}", env!("CARGO_PKG_VERSION"));
    println!("Source:  {}", args.database.display());
    println!("Output:  {}", args.outdir.display());

    // Counts banner before any work starts
    let counts = SourceReader::open(&args.database)?.counts()?;
    println!(
        "Servers: {} - Channels: {} - Messages: {}",
        counts.servers, counts.channels, counts.messages
    );

    let progress = if args.quiet {
        no_progress()
    } else {
        stderr_progress()
    };
    let options = ExportOptions::new(args.threads).with_progress(progress);

    let export_start = Instant::now();
    let archive = export_archive(&args.database, &options)?;
    println!(
        "Exported {} messages ({:.2}s)",
        archive.message_count(),
        export_start.elapsed().as_secs_f64()
    );

    fs::create_dir_all(&args.outdir)?;

    let metadata_path = args.metadata_path();
    fs::write(&metadata_path, archive.metadata_json()?)?;
    println!("Saved metadata to {}", metadata_path.display());

    let messages_path = args.messages_path();
    fs::write(&messages_path, archive.message_stream())?;
    println!("Saved messages to {}", messages_path.display());

    println!("Done in {:.2}s", total_start.elapsed().as_secs_f64());
    Ok(())
}

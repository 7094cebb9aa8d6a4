//! Command-line interface definition using clap.
//!
//! The CLI is a thin collaborator around the export pipeline: it parses
//! arguments, prints the source counts banner, runs the export, and writes
//! the two archive documents to disk. The core never touches the
//! filesystem itself.

use std::path::PathBuf;

use clap::Parser;

/// Flatten a relational chat archive into a self-contained document archive
/// (a metadata JSON file plus an NDJSON message stream).
#[derive(Parser, Debug, Clone)]
#[command(name = "chatvault")]
#[command(version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    chatvault tracker.db
    chatvault tracker.db --outdir export/
    chatvault tracker.db --threads 8 --quiet")]
pub struct Args {
    /// Path to the source SQLite database
    pub database: PathBuf,

    /// Output directory for the archive documents
    #[arg(short, long, default_value = ".")]
    pub outdir: PathBuf,

    /// Number of pipeline workers
    #[arg(short, long, default_value_t = 4, value_name = "N")]
    pub threads: usize,

    /// File name for the metadata document (default: <base>-metadata.json)
    #[arg(long, value_name = "NAME")]
    pub metadata_name: Option<String>,

    /// File name for the message stream (default: <base>-messages.ndjson)
    #[arg(long, value_name = "NAME")]
    pub messages_name: Option<String>,

    /// Suppress the per-message progress counter
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Base name of the source database, without extension.
    pub fn base_name(&self) -> String {
        self.database
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "archive".to_string())
    }

    /// Resolved output path of the metadata document.
    pub fn metadata_path(&self) -> PathBuf {
        let name = self
            .metadata_name
            .clone()
            .unwrap_or_else(|| format!("{}-metadata.json", self.base_name()));
        self.outdir.join(name)
    }

    /// Resolved output path of the message stream.
    pub fn messages_path(&self) -> PathBuf {
        let name = self
            .messages_name
            .clone()
            .unwrap_or_else(|| format!("{}-messages.ndjson", self.base_name()));
        self.outdir.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["chatvault", "tracker.db"]);
        assert_eq!(args.threads, 4);
        assert_eq!(args.outdir, PathBuf::from("."));
        assert!(!args.quiet);
    }

    #[test]
    fn test_base_name_strips_extension() {
        let args = parse(&["chatvault", "/data/history.db"]);
        assert_eq!(args.base_name(), "history");
    }

    #[test]
    fn test_default_output_paths() {
        let args = parse(&["chatvault", "history.db", "--outdir", "out"]);
        assert_eq!(args.metadata_path(), PathBuf::from("out/history-metadata.json"));
        assert_eq!(
            args.messages_path(),
            PathBuf::from("out/history-messages.ndjson")
        );
    }

    #[test]
    fn test_name_overrides() {
        let args = parse(&[
            "chatvault",
            "history.db",
            "--metadata-name",
            "meta.json",
            "--messages-name",
            "stream.ndjson",
        ]);
        assert_eq!(args.metadata_path(), PathBuf::from("./meta.json"));
        assert_eq!(args.messages_path(), PathBuf::from("./stream.ndjson"));
    }

    #[test]
    fn test_missing_database_is_an_error() {
        assert!(Args::try_parse_from(["chatvault"]).is_err());
    }
}

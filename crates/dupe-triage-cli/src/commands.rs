use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "dupe-triage")]
#[command(about = "Triage likely-duplicate files against a blessed/cursed catalog", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a full triage pass over the configured root paths
    Process,
    /// Classify a single file and print its status and score
    Classify {
        path: PathBuf,
    },
    /// Mark a file, or every file under a directory, as blessed
    Bless {
        path: PathBuf,
    },
    /// Mark a file, or every file under a directory, as cursed
    Curse {
        path: PathBuf,
    },
    /// List file records stored in the catalog
    LsFiles,
    /// List directory records stored in the catalog
    LsDirs,
    /// Remove a record from the catalog
    Remove {
        path: PathBuf,
    },
    /// Display the number of keys in the fingerprint cache
    CountFingerprintCache,
    /// Print configuration values
    PrintConfig,
    /// Truncate all catalog tables
    TruncateDb,
}

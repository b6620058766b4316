use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// CLI arguments for osm_wrangle
#[derive(Debug, Parser)]
#[command(
    name = "osm_wrangle",
    version,
    about = "Clean OpenStreetMap XML extracts into JSON records for mongoimport"
)]
pub struct CliArgs {
    /// JSON config file (data_path, dest_path, pretty, progress, name_substitution)
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Path to the .osm or .osm.xz input file, overrides data_path
    #[arg(short = 'i', long = "input", global = true)]
    pub input: Option<String>,

    /// Directory for output files, overrides dest_path
    #[arg(short = 'd', long = "dest", global = true)]
    pub dest: Option<String>,

    /// Indent each output record
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Show a progress bar while records are written
    #[arg(long, global = true)]
    pub progress: bool,

    /// Remove existing output first instead of reusing it
    #[arg(long, global = true)]
    pub force: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long = "log-level", default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Write one cleaned JSON record per node and way to <input>.json
    Process,

    /// Count street-type tokens of addr:street values into <input>.street_types.txt
    AuditStreets,
}

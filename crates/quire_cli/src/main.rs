//! Quire CLI
//!
//! Command-line tools for Quire modules.
//!
//! # Commands
//!
//! - `read` - Print the raw text of a reference
//! - `info` - Display module metadata and file statistics
//! - `create` - Create a module directory
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Quire command-line module tools.
#[derive(Parser)]
#[command(name = "quire")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the module directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the raw text of a reference
    Read {
        /// Reference to read, e.g. "Gen 1:1-2:3; Exo 4"
        key: String,

        /// Print a heading before each chapter
        #[arg(long)]
        headings: bool,

        /// Trim whitespace around each verse
        #[arg(short, long)]
        trim: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Display module metadata and file statistics
    Info {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Create a module directory and its metadata
    Create {
        /// Module name
        #[arg(short, long)]
        name: String,

        /// Versification definition (JSON)
        #[arg(long)]
        versification: PathBuf,

        /// Cipher key for an enciphered module
        #[arg(long)]
        cipher_key: Option<String>,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Read {
            key,
            headings,
            trim,
            format,
        } => {
            let path = cli.path.ok_or("Module path required for read")?;
            commands::read::run(&path, &key, headings, trim, &format)?;
        }
        Commands::Info { format } => {
            let path = cli.path.ok_or("Module path required for info")?;
            commands::info::run(&path, &format)?;
        }
        Commands::Create {
            name,
            versification,
            cipher_key,
        } => {
            let path = cli.path.ok_or("Module path required for create")?;
            commands::create::run(&path, &name, &versification, cipher_key.as_deref())?;
        }
        Commands::Version => {
            println!("Quire CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Quire Core v{}", quire_core::VERSION);
        }
    }

    Ok(())
}

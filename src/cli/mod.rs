pub mod output;

use chapterize::options::DEFAULT_HEADING_FONT_RATIO;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "chapterize",
    version,
    about = "Split EPUB and PDF books into plain-text chapters"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Directory for scratch workspaces (defaults to the system temp dir)
    #[arg(long, global = true, env = "CHAPTERIZE_SCRATCH_DIR")]
    pub scratch_dir: Option<PathBuf>,

    /// Fraction of the largest PDF font size that marks a heading
    #[arg(
        long,
        global = true,
        env = "CHAPTERIZE_HEADING_RATIO",
        default_value_t = DEFAULT_HEADING_FONT_RATIO
    )]
    pub heading_ratio: f32,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the chapters detected in an EPUB or PDF
    Analyze {
        /// Path to the EPUB or PDF file
        file: PathBuf,
    },
    /// Print the text of one chapter
    Show {
        /// Path to the EPUB or PDF file
        file: PathBuf,
        /// Chapter index as listed by `analyze` (1-based)
        index: usize,
    },
    /// Write every chapter to a text file
    Export {
        /// Path to the EPUB or PDF file
        file: PathBuf,
        /// Output directory (a folder named after the book is created inside)
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
    /// Remove scratch workspaces left behind by interrupted runs
    Clean,
}

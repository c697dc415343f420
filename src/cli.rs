//! Command-line arguments for the extraction binary.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "extract_awards",
    about = "Extract candidate award identifiers from government-interest statements"
)]
pub struct Args {
    /// Input file
    #[arg(short = 'i', long)]
    pub input: Option<PathBuf>,

    /// List of input files
    #[arg(short = 'I', long = "input_list", num_args = 1..)]
    pub input_list: Vec<PathBuf>,

    /// Output file
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Number of output files
    #[arg(short = 'O', long = "n_output", default_value_t = 1)]
    pub n_output: usize,

    /// Directory holding the reference tables and word list
    #[arg(long = "data_dir", default_value = "data/interim")]
    pub data_dir: PathBuf,
}

impl Args {
    /// All input files, `--input` first.
    pub fn input_files(&self) -> Vec<PathBuf> {
        self.input
            .iter()
            .cloned()
            .chain(self.input_list.iter().cloned())
            .collect()
    }
}

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Options {
    /// Files to load, in order, before anything else.
    #[arg(short, long)]
    pub load: Vec<PathBuf>,

    /// Starts a repl session after loading.
    #[arg(short, long)]
    pub repl: bool,

    /// Prints the bytecode of every compiled toplevel form.
    #[arg(short, long)]
    pub dump: bool,

    /// Maximum number of nested calls before a stack overflow.
    #[arg(long, default_value_t = 10_000)]
    pub max_depth: usize,

    /// Directory that `include` paths are resolved against.
    #[arg(long, default_value = ".")]
    pub include_root: PathBuf,
}

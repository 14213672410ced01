use std::path::Path;

use clap::Parser;
use miette::{IntoDiagnostic, WrapErr};
use tracing_subscriber::EnvFilter;

use zylisp::{disassemble, EnvOptions, Environment, Error};

mod cli;
mod repl;

/// Loads a file form by form so every compiled prototype can be dumped before it runs.
fn load(env: &mut Environment, path: &Path, dump: bool) -> Result<(), Error> {
    if !dump {
        env.load_file(path)?;
        return Ok(());
    }

    let source = std::fs::read_to_string(path).map_err(|err| zylisp::CompileError::Include {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;

    for expr in env.read(&source, Some(path.display().to_string()))? {
        let proto = env.compile(&expr)?;
        print!("{}", disassemble(&proto));
        env.run(&proto)?;
    }

    Ok(())
}

/// `RUST_LOG` overrides the default of warnings only.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> miette::Result<()> {
    init_logging();

    // Parse the command line arguments.
    let options = cli::Options::parse();

    let mut env = Environment::with_options(EnvOptions {
        include_root: options.include_root.clone(),
        max_depth: options.max_depth,
    });

    for path in &options.load {
        load(&mut env, path, options.dump)
            .into_diagnostic()
            .wrap_err_with(|| format!("while loading {}", path.display()))?;
    }

    if options.repl || options.load.is_empty() {
        repl::run(&mut env, options.dump).into_diagnostic()?;
    }

    Ok(())
}

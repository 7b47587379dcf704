use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::Args;

use crate::cli_util::print_error;
use crate::config::{Overrides, Settings};
use crate::{Error, compile, machine};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the Brainfuck source file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Trace every instruction on stderr, pausing for a keypress between steps
    /// (fallback DEBUG=true)
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Number of tape cells (fallback BF_TAPE_SIZE; default 4096)
    #[arg(long = "tape-size", value_name = "N")]
    pub tape_size: Option<usize>,

    /// Trace without waiting for a keypress between steps
    #[arg(long = "no-pause")]
    pub no_pause: bool,

    /// Print the compiled bytecode instead of running it
    #[arg(long = "disassemble")]
    pub disassemble: bool,
}

pub fn run(program: &str, args: RunArgs) -> i32 {
    let overrides = Overrides {
        debug: args.debug,
        tape_size: args.tape_size,
        no_pause: args.no_pause,
    };

    // Resolve settings: flags -> env -> bf.toml -> defaults
    let settings = match Settings::resolve(&overrides) {
        Ok(s) => s,
        Err(e) => {
            let err = Error::from(e);
            print_error(program, &[], &err);
            return err.exit_code();
        }
    };
    tracing::debug!(?settings, "resolved settings");

    let source = match read_source(&args.file) {
        Ok(bytes) => bytes,
        Err(err) => {
            print_error(program, &[], &err);
            return err.exit_code();
        }
    };

    match execute(&source, &settings, args.disassemble) {
        Ok(()) => 0,
        Err(err) => {
            print_error(program, &source, &err);
            err.exit_code()
        }
    }
}

fn read_source(path: &Path) -> Result<Vec<u8>, Error> {
    fs::read(path).map_err(|source| Error::SourceRead {
        path: path.to_path_buf(),
        source,
    })
}

fn execute(source: &[u8], settings: &Settings, disassemble: bool) -> Result<(), Error> {
    let bytecode = compile(source)?;

    let stdout = io::stdout();
    if disassemble {
        let mut out = stdout.lock();
        write!(out, "{bytecode}")
            .and_then(|_| out.flush())
            .map_err(Error::Output)?;
        return Ok(());
    }

    if settings.debug {
        eprintln!("Running on debug mode");
        let _ = io::stderr().flush();
    }

    machine::run(&bytecode, io::stdin().lock(), stdout.lock(), &settings.vm_config())?;
    Ok(())
}

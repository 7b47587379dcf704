use bfvm::commands::run::{self, RunArgs};
use clap::Parser;
use std::env;
use tracing_subscriber::filter::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "bf", version, about = "Compile and run a Brainfuck program")]
struct Cli {
    #[command(flatten)]
    run: RunArgs,
}

fn main() {
    // We still pull the program name for error prefixes
    let program = env::args().next().unwrap_or_else(|| String::from("bf"));

    // Log to stderr so stdout carries program output only
    let filter = EnvFilter::try_from_env("BF_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = run::run(&program, cli.run);
    std::process::exit(code);
}

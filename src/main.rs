use clap::Parser;
use sentidash::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}

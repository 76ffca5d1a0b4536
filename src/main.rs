use anyhow::Result;
use clap::Parser;
use dietopt::{CLIArguments, optimise_main, profiles_main};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = CLIArguments::parse();

    match args {
        CLIArguments::Optimise(args) => optimise_main(args),
        CLIArguments::Profiles(args) => profiles_main(args),
    }
}

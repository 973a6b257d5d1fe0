use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::info;

mod cli;
mod estimation;
mod io;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(args.verbosity.default_filter()))
        .init();

    info!("Running vaccine efficacy estimation");
    estimation::vaxefficacy(&args)?;
    info!("Finished vaccine efficacy estimation");
    Ok(())
}

mod cli;
mod commands;
mod input;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let args = Cli::parse();

    match args.command.unwrap_or(Commands::Interactive) {
        Commands::Convert {
            input,
            to,
            remark,
            compact,
        } => commands::convert::run(input, to.map(Into::into), remark, compact, args.verbose)?,
        Commands::Interactive => commands::interactive::run(args.verbose)?,
        Commands::Completions { shell } => commands::completions::generate(shell)?,
    }

    Ok(())
}

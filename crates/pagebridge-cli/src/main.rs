//! pagebridge entry point.

use clap::Parser;

use pagebridge_cli::cli::{Cli, Command};
use pagebridge_cli::{commands, error, logger, ui};

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    ui::init(cli.no_color);
    logger::init_logger(cli.verbose, cli.quiet, cli.no_color);

    let result = match cli.command {
        Command::Dev(args) => commands::dev::execute(&args).await,
        Command::Routes(args) => commands::routes::execute(&args),
    };

    result.map_err(error::to_miette)
}

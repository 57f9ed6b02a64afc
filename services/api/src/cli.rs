use crate::commands::{run_import, run_translate, ImportArgs, TranslateArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use estate_hub::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Estate Hub",
    about = "Serve the property catalogue API or run translation and unit import tasks",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Resolve a translation key through the fallback chain
    Translate(TranslateArgs),
    /// Import a unit spreadsheet (CSV) into an in-memory inventory
    Import(ImportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Translate(args) => run_translate(args).await,
        Command::Import(args) => run_import(args),
    }
}

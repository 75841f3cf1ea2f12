use crate::catalog::{run_catalog, CatalogArgs};
use crate::demo::{run_demo, DemoArgs};
use clap::{Parser, Subcommand};
use credit_desk::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Credit Review Desk",
    about = "Walk credit applications through verification, memo generation and decision",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Drive one application end to end on the live desk (default command)
    Demo(DemoArgs),
    /// List the application catalog shown on the dashboard
    Catalog(CatalogArgs),
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Demo(DemoArgs::default()));

    match command {
        Command::Demo(args) => run_demo(args).await,
        Command::Catalog(args) => run_catalog(args),
    }
}

use clap::{Args, Parser, Subcommand};

use enroll_core::error::AppError;

use crate::demo::{run_demo, run_extract, DemoArgs, ExtractArgs};
use crate::server;

#[derive(Parser, Debug)]
#[command(
    name = "Admission Pipeline",
    about = "Run the grade extraction and ranking service from the command line",
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
    /// Run the OCR pipeline once over an image file and print the result
    Extract(ExtractArgs),
    /// Seed in-memory stores, run a canned extraction, and print a leaderboard
    Demo(DemoArgs),
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
        Command::Extract(args) => run_extract(args),
        Command::Demo(args) => run_demo(args).await,
    }
}

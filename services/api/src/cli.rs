use crate::demo::{run_demo, run_hash_password, run_report, DemoArgs, HashPasswordArgs, ReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use health_unit::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Health Unit",
    about = "Run the health-unit clinic API or work with its exports from the command line",
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
    /// Print weekly visit and no-show series from CSV exports
    Report(ReportArgs),
    /// Hash a password for seeding user accounts
    HashPassword(HashPasswordArgs),
    /// Seed an in-memory clinic and print its dashboard
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
        Command::Report(args) => run_report(args),
        Command::HashPassword(args) => run_hash_password(args),
        Command::Demo(args) => run_demo(args),
    }
}

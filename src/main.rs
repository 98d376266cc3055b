mod cli;
mod config;
mod error;
mod fan_out;
mod fetch;
mod model;
mod providers;
mod report;
mod schedule;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use cli::Command;

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "workstate=info",
        1 => "workstate=debug",
        _ => "workstate=trace,reqwest=debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let invocation = cli::parse_args(&args)?;

    if invocation.command == Command::Help {
        cli::print_help();
        return Ok(());
    }

    init_logging(invocation.options.verbose);

    let config = config::load_config()?;
    cli::run(&invocation, &config).await
}

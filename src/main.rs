use std::process;

use clap::Parser;

use feedvault::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = cli.run().await {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}

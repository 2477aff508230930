//! k2geo: export one country's CIDR or domain list from a V2Ray geo database.

use clap::CommandFactory;
use k2geo::{Cli, Invocation};
use std::error::Error as _;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = match Cli::parse_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };

    let config = match cli.resolve() {
        Ok(Invocation::Export(config)) => config,
        Ok(Invocation::Usage) => {
            if let Err(e) = Cli::command().print_help() {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
            return;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = k2geo::run(&config) {
        eprintln!("Error: {}", e);
        let mut cause = e.source();
        while let Some(c) = cause {
            eprintln!("  caused by: {}", c);
            cause = c.source();
        }
        std::process::exit(1);
    }
}

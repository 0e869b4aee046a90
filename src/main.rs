use clap::Parser;
use sirc_dashboard::cli::output::OutputFormatter;
use sirc_dashboard::cli::{Cli, commands};
use sirc_dashboard::config::DashboardConfig;
use sirc_dashboard::log::init_logger;
use sirc_dashboard::{log_error, log_info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match DashboardConfig::load() {
        Ok(config) => {
            if let Err(e) = init_logger(config.log_config()) {
                eprintln!("{}", OutputFormatter::warning(&e.to_string()));
            }
        }
        Err(e) => {
            eprintln!("{}", OutputFormatter::error(&e.to_string()));
            std::process::exit(1);
        }
    }

    log_info!("sirc {} started", env!("CARGO_PKG_VERSION"));

    if let Err(e) = commands::handle(cli.command).await {
        log_error!("Command failed: {:#}", e);
        eprintln!("{}", OutputFormatter::error(&format!("{:#}", e)));
        std::process::exit(1);
    }
}

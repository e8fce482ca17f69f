//! TOMO Mailer CLI Entry Point

use clap::Parser;
use core_config::tracing::install_color_eyre;
use eyre::Result;
use std::process::ExitCode;
use tomo_mailer::Cli;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Install color-eyre first for colored error output
    install_color_eyre();

    let cli = Cli::parse();
    let succeeded = tomo_mailer::run(cli).await?;

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

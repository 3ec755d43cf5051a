//! tokenboot CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use tokenboot_cli::logging::{TracingConfig, init_tracing};
use tokenboot_cli::{BootstrapConfig, BootstrapResult, Bootstrapper, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut tracing_config = if cli.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::default()
    };
    if let Some(format) = cli.log_format {
        tracing_config = tracing_config.with_format(format);
    }
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> BootstrapResult<()> {
    let config = match cli.config {
        Some(ref path) => BootstrapConfig::load_from(path)?,
        None => BootstrapConfig::default(),
    }
    .apply_cli(&cli);
    config.validate()?;

    let bootstrapper = Bootstrapper::installed(config);
    let mut stdout = std::io::stdout();
    bootstrapper.run(&mut stdout).await?;
    Ok(())
}

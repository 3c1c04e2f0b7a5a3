use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;
use std::io::Write;
use supply_insight::cli::{self, Cli, Output};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let output = match Cli::try_parse() {
        Ok(cli) => cli::run(&cli),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => Output::error(e.to_string().trim_end()),
    };

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", output).context("failed to write result to stdout")?;
    Ok(())
}

use anyhow::Context;
use clap::Parser;
use taodiv::adapter::inbound::cli::command::{Cli, ColorChoice};
use taodiv::adapter::inbound::cli::output::{self, OutputConfig};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {}
    }
    output::configure(OutputConfig::new(cli.json, cli.quiet));

    if let Err(e) = run(cli).await {
        output::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.display().to_string();
    taodiv::adapter::inbound::cli::run(cli)
        .await
        .with_context(|| format!("taodiv failed (config: {config_path})"))
}

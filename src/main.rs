mod cli;
mod render;

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use trendlag::config::{self, AppConfig};
use trendlag::llm::{self, provider::Provider};
use trendlag::media::Creative;
use trendlag::paths;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            render::print_error(&err.to_string());
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<()> {
    match command {
        Command::Trends {
            provider,
            model,
            no_search,
        } => {
            let provider = Provider::from_str_loose(&provider)?;
            let mut config = load(provider, model.as_deref())?;
            if no_search {
                config.gemini.search_grounding = false;
            }

            let spinner = spinner(format!("Asking {provider} for viral trends..."));
            let result = llm::fetch_trends(provider, &config).await;
            spinner.finish_and_clear();

            render::print_trends(&result?, provider);
            Ok(())
        }

        Command::Rate {
            file,
            provider,
            model,
        } => {
            let provider = Provider::from_str_loose(&provider)?;
            let config = load(provider, model.as_deref())?;
            let creative = Creative::from_file(&file, provider, config.upload.max_bytes)?;

            let spinner = spinner(format!("Rating creative with {provider}..."));
            let result = llm::rate_creative(provider, &config, &creative).await;
            spinner.finish_and_clear();

            render::print_report(&result?);
            Ok(())
        }

        Command::Paths => {
            println!("  Config:  {}", style(paths::config_file().display()).green());
            Ok(())
        }
    }
}

fn load(provider: Provider, model: Option<&str>) -> Result<AppConfig> {
    let mut config = config::load_config()?;
    if let Some(model) = model {
        config.override_model(provider, model);
    }
    Ok(config)
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("  {spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

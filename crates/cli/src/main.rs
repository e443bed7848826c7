use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::{SeedableRng, rngs::StdRng};
use replykit_engine::{FormStore, loading::build_steps};
use replykit_types::MAX_OUTPUTS;
use replykit_util::{
    CookieJar, Location, Settings,
    logging::{self, ConsoleTarget, LoggingOptions},
};
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "replykit", version, about = "Reply generator form for the terminal")]
struct Cli {
    /// Origin of the form server (overrides settings and REPLYKIT_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Location to start from, e.g. a URL printed by a previous session
    #[arg(long, global = true)]
    url: Option<String>,
    /// Do not forward log events to the server
    #[arg(long, global = true)]
    no_remote_log: bool,
    /// Path to the settings file
    #[arg(long, global = true)]
    settings: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the loading step plan of a submission as JSON
    Plan {
        #[arg(long, default_value_t = 1)]
        num_outputs: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load(cli.settings.as_deref())?;
    if let Some(base_url) = &cli.base_url {
        settings.base_url = base_url.clone();
    }
    if cli.no_remote_log {
        settings.remote_logging = false;
    }

    // Console output would tear the terminal UI, so the form logs to a file.
    let console = match cli.command {
        Some(_) => ConsoleTarget::Stderr,
        None => ConsoleTarget::File(settings.log_file()),
    };
    let remote_endpoint = settings
        .remote_logging
        .then(|| settings.log_endpoint())
        .transpose()?;
    if let Some(worker) = logging::init(LoggingOptions {
        console,
        remote_endpoint,
        ..LoggingOptions::default()
    })? {
        tokio::spawn(worker.run());
    }

    match cli.command {
        Some(Command::Plan { num_outputs }) => print_plan(num_outputs),
        None => run_form(&settings, cli.url.as_deref()).await,
    }
}

fn print_plan(num_outputs: usize) -> Result<()> {
    let num_outputs = num_outputs.clamp(1, MAX_OUTPUTS);
    let steps = build_steps(num_outputs, &mut StdRng::from_entropy());
    let out = serde_json::json!({
        "num_outputs": num_outputs,
        "total_steps": steps.len(),
        "steps": steps,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

async fn run_form(settings: &Settings, url: Option<&str>) -> Result<()> {
    let location = match url {
        Some(value) => Location::parse(value).with_context(|| format!("invalid --url '{value}'"))?,
        None => Location::new(settings.base_url()?),
    };
    let jar = match CookieJar::open(settings.cookie_jar_path()) {
        Ok(jar) => jar,
        Err(error) => {
            warn!("Cookie jar unavailable ({error}); cookies will not persist.");
            CookieJar::ephemeral()
        }
    };
    let mut store = FormStore::new(jar, location);
    store.fill_missing_location_params();
    info!("Page loaded at {}.", store.location());

    let location = replykit_tui::run(settings, store).await?;
    println!("{location}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_the_subcommand() {
        let cli = Cli::try_parse_from(["replykit", "plan", "--num-outputs", "3", "--no-remote-log"]).expect("parse");
        assert!(cli.no_remote_log);
        assert!(matches!(cli.command, Some(Command::Plan { num_outputs: 3 })));
    }
}

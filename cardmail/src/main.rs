// cardmail - business card to email drafting
// Entry point: run one command against the local data directory

use anyhow::Context;
use cardmail::{app, commands};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "usage: cardmail <command> ['<json-args>']\n       cardmail commands";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cardmail=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut argv = std::env::args().skip(1);
    let Some(command) = argv.next() else {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    };

    if command == "commands" {
        for name in commands::COMMANDS {
            println!("{}", name);
        }
        return Ok(());
    }

    let args: serde_json::Value = match argv.next() {
        Some(raw) => serde_json::from_str(&raw).context("arguments must be JSON")?,
        None => serde_json::Value::Null,
    };

    tracing::info!("Starting cardmail");

    let data_dir = app::data_dir_from_env();
    let state = app::initialize(&data_dir)
        .await
        .with_context(|| format!("failed to initialize data directory {:?}", data_dir))?;

    match commands::invoke(&state, &command, args).await {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Command {} failed: {}", command, e);
            // Same shape the frontend receives: the error as a string
            println!("{}", serde_json::to_string(&e)?);
            if let Some(hint) = e.hint() {
                eprintln!("hint: {}", hint);
            }
            std::process::exit(1);
        }
    }
}

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use syncvoice::bus::chat_bus;
use syncvoice::console::{ConsoleSynthesizer, LineRecognizer, LoggingDashboard};
use syncvoice::{VoiceConfig, VoiceController};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "syncvoice")]
#[command(about = "Voice control for the InventorySync dashboard, driven from the terminal")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL of the intent server
    #[arg(long)]
    endpoint: Option<String>,

    /// Session language (BCP-47 tag)
    #[arg(long)]
    lang: Option<String>,

    /// Start a new conversation whenever one ends
    #[arg(long)]
    keep_alive: bool,
}

async fn converse(
    controller: &VoiceController,
    input: &LineRecognizer<tokio::io::BufReader<tokio::io::Stdin>>,
    keep_alive: bool,
) -> Result<()> {
    loop {
        controller.activate().await?;
        if input.is_closed() || !keep_alive {
            return Ok(());
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Speech goes to stdout, logs to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "syncvoice=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => VoiceConfig::load(path)?,
        None => VoiceConfig::default(),
    }
    .with_env_overrides();
    if let Some(endpoint) = cli.endpoint {
        config = config.with_endpoint(endpoint);
    }
    if let Some(lang) = cli.lang {
        config = config.with_lang(lang);
    }

    let (publisher, subscriber) = chat_bus(config.bus_capacity);
    let input = Arc::new(LineRecognizer::stdin().with_chat(publisher.clone()));
    let dashboard = Arc::new(LoggingDashboard::new().with_chat(publisher));

    let controller = VoiceController::builder()
        .with_config(config)
        .with_recognizer(input.clone())
        .with_synthesizer(Arc::new(ConsoleSynthesizer::new()))
        .with_dashboard(dashboard)
        .with_chat(subscriber)
        .build()?;

    info!(
        "Starting SyncVoice (intent endpoint: {})",
        controller.config().command_url()
    );
    println!(
        "Type what you would say. `!no-speech` simulates a recognition error, \
         `/reply <text>` posts a chatbot reply, Ctrl+D quits."
    );

    tokio::select! {
        result = converse(&controller, &input, cli.keep_alive) => result?,
        _ = tokio::signal::ctrl_c() => {
            controller.stop_listening();
            info!("Interrupted");
        }
    }

    info!("SyncVoice stopped");
    Ok(())
}

use bridge::channels::{ContentPart, GoogleChatAdapter, MessageEvent, PublicBaseResolver};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Inbound events buffered between the listener and the consumer.
const EVENT_QUEUE_CAPACITY: usize = 256;

#[derive(Parser)]
#[command(name = "chatbridge")]
#[command(about = "Google Chat webhook bridge", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config.json.
    Init {
        /// Config file path (default: CHATBRIDGE_CONFIG_PATH or ~/.chatbridge/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Run the callback listener. Each inbound message is printed to stdout as one JSON line.
    Serve {
        /// Config file path (default: CHATBRIDGE_CONFIG_PATH or ~/.chatbridge/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Listen port (default from config or 6200)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Send one message (text and/or images) to a Google Chat endpoint.
    Send {
        /// Config file path (default: CHATBRIDGE_CONFIG_PATH or ~/.chatbridge/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Destination URL (default: googleChat.webhookUrl from config)
        #[arg(long, value_name = "URL")]
        endpoint: Option<String>,

        /// Message text
        #[arg(long, short)]
        text: Option<String>,

        /// Image URL or local file (resolved via googleChat.imageBaseUrl); repeatable
        #[arg(long = "image", value_name = "REF")]
        images: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("chatbridge {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Serve { config, port }) => {
            if let Err(e) = run_serve(config, port).await {
                log::error!("serve failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Send {
            config,
            endpoint,
            text,
            images,
        }) => match run_send(config, endpoint, text, images).await {
            Ok(true) => {}
            Ok(false) => std::process::exit(1),
            Err(e) => {
                log::error!("send failed: {:#}", e);
                std::process::exit(1);
            }
        },
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(bridge::config::default_config_path);
    let dir = bridge::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

fn load_config(config_path: Option<PathBuf>) -> anyhow::Result<bridge::config::Config> {
    let (mut config, path) = bridge::config::load_config(config_path)?;
    log::debug!("loaded config from {}", path.display());
    config.google_chat.verification_token = bridge::config::resolve_verification_token(&config);
    Ok(config)
}

async fn run_serve(config_path: Option<PathBuf>, port: Option<u16>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(p) = port {
        config.google_chat.port = p;
    }
    let resolver = Arc::new(PublicBaseResolver::new(
        config.google_chat.image_base_url.clone(),
    ));
    let (event_tx, mut event_rx) = mpsc::channel::<MessageEvent>(EVENT_QUEUE_CAPACITY);
    let adapter = Arc::new(GoogleChatAdapter::new(
        config.google_chat,
        Arc::new(event_tx),
        resolver,
    ));

    let consumer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(e) => log::warn!("could not encode event: {}", e),
            }
        }
    });

    let signals = {
        let adapter = adapter.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            adapter.terminate().await;
        })
    };

    let result = adapter.start().await;
    if result.is_err() {
        signals.abort();
    }
    let _ = signals.await;
    // Last sender goes with the adapter; the consumer then drains what was acknowledged.
    drop(adapter);
    if let Err(e) = consumer.await {
        log::warn!("event consumer failed: {}", e);
    }
    result
}

/// Completes on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                log::warn!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received");
}

async fn run_send(
    config_path: Option<PathBuf>,
    endpoint: Option<String>,
    text: Option<String>,
    images: Vec<String>,
) -> anyhow::Result<bool> {
    let config = load_config(config_path)?;
    let endpoint = endpoint
        .or(config.google_chat.webhook_url.clone())
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("no endpoint: pass --endpoint or set googleChat.webhookUrl"))?;

    let mut parts: Vec<ContentPart> = text.into_iter().map(ContentPart::Text).collect();
    parts.extend(images.into_iter().map(ContentPart::image));

    let resolver = Arc::new(PublicBaseResolver::new(
        config.google_chat.image_base_url.clone(),
    ));
    // Outbound only: the listener is never started, so no event reaches this queue.
    let (event_tx, _) = mpsc::channel::<MessageEvent>(1);
    let adapter = GoogleChatAdapter::new(config.google_chat, Arc::new(event_tx), resolver);
    let delivered = adapter.send(&endpoint, &parts).await;
    if delivered {
        log::info!("message delivered");
    }
    Ok(delivered)
}

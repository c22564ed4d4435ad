use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use irc_secretary::application::errors::BotError;
use irc_secretary::application::services::{BotController, ChannelRecorder};
use irc_secretary::domain::entities::Operator;
use irc_secretary::domain::traits::SystemClock;
use irc_secretary::infrastructure::adapters::irc::{IrcAdapter, IrcOptions};
use irc_secretary::infrastructure::config::{Config, ServerAddress};
use irc_secretary::infrastructure::storage::FileLogStore;

#[derive(Parser)]
#[command(name = "irc-secretary")]
#[command(about = "An IRC bot that records channels on its operator's request", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true, default_value = "config.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect and start serving the operator
    Run {
        /// Server as host[:port]
        server: ServerAddress,

        /// Nickname of the only user allowed to give commands
        operator: String,

        /// Directory for channel logs (overrides config)
        #[arg(short, long)]
        log_dir: Option<PathBuf>,

        /// Bot nickname (default: <operator>_sec)
        #[arg(short, long)]
        nick: Option<String>,
    },
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { server, operator, log_dir, nick } => {
            let mut config = load_config(&cli.config);
            config.set_server(server);
            config.operator = Some(operator);
            if let Some(dir) = log_dir {
                config.recording.directory = dir;
            }
            if nick.is_some() {
                config.bot.nickname = nick;
            }
            run_bot(config);
        }
        Commands::Version => {
            println!("irc-secretary v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig => {
            init_config();
        }
    }
}

fn load_config(path: &str) -> Config {
    let mut config = if Path::new(path).exists() {
        Config::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {}, using defaults", e);
            Config::default()
        })
    } else {
        Config::default()
    };
    config.apply_env();
    config
}

fn run_bot(config: Config) {
    let operator = match config.operator() {
        Ok(operator) => operator,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Starting secretary for {} on {}:{}",
        operator,
        config.server.host,
        config.server.port
    );

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = rt.block_on(serve(config, operator)) {
        tracing::error!("Secretary stopped: {}", e);
        std::process::exit(1);
    }
}

async fn serve(config: Config, operator: Operator) -> Result<(), BotError> {
    let options = IrcOptions {
        host: config.server.host.clone(),
        port: config.server.port,
        nickname: config.nickname(&operator),
        realname: config.bot.realname.clone(),
        event_queue: config.runtime.event_queue,
    };
    let (adapter, events) = IrcAdapter::connect(options).await?;

    let recorder = ChannelRecorder::new(
        config.recording.directory.clone(),
        Arc::new(FileLogStore::new()),
        Arc::new(SystemClock),
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    BotController::new(adapter, operator, recorder)
        .run(events, shutdown)
        .await
}

fn init_config() {
    let config = Config::default();
    match serde_yaml::to_string(&config) {
        Ok(yaml) => {
            println!("{}", yaml);
            println!("\nSave this to config.yaml and adjust as needed.");
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

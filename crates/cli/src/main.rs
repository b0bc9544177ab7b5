mod check_commands;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    tracing::{info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(
    name = "fanout",
    about = "Fanout: broadcast forwarded Telegram messages to your channels"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (default: ./fanout.toml, then ~/.config/fanout/).
    #[arg(long, global = true, env = "FANOUT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bot (default when no subcommand is provided).
    Run,
    /// Validate the configuration and list the channels.
    Check,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    let (config, source) = fanout_config::discover_and_load(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::Check) => check_commands::handle_check(&config, source.as_deref()),
        None | Some(Commands::Run) => {
            info!(
                version = env!("CARGO_PKG_VERSION"),
                config = ?source,
                "fanout starting"
            );
            for diagnostic in fanout_config::validate(&config).into_result()? {
                warn!(path = %diagnostic.path, "{}", diagnostic.message);
            }

            let handle = fanout_telegram::start_polling(&config).await?;
            let stopped = handle.state().cancel.clone();

            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    result?;
                    info!("shutdown requested");
                },
                () = stopped.cancelled() => {},
            }

            handle.shutdown().await;
            info!("fanout stopped");
            Ok(())
        },
    }
}

mod config_commands;
mod console;
mod demo;

use std::{path::PathBuf, sync::Arc};

use {
    clap::{Parser, Subcommand},
    regnum_channels::{AllPermissions, Author, NoPermissions, StaticInformationProvider},
    regnum_commands::{CommandClient, LoggingListener},
    regnum_common::types::UserId,
    tokio::sync::Notify,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "regnum", about = "Regnum - prefix command console")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides discovery of ./regnum.toml and ~/.config/regnum/).
    #[arg(long, global = true, env = "REGNUM_CONFIG")]
    config: Option<PathBuf>,

    // Console arguments (used when no subcommand is provided, or with `run`)
    /// Custom prefix for the console guild.
    #[arg(long, global = true)]
    guild_prefix: Option<String>,
    /// User id the console speaks as.
    #[arg(long, global = true, default_value_t = 1)]
    user_id: u64,
    /// Display name of the console user.
    #[arg(long, global = true, default_value = "console")]
    user_name: String,
    /// Grant the console user every platform permission.
    #[arg(long, global = true, default_value_t = false)]
    admin: bool,
    /// Treat the console user as a bot owner.
    #[arg(long, global = true, default_value_t = false)]
    owner: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Read messages from stdin and dispatch them (default).
    Run,
    /// Validate the configuration file and report errors/warnings.
    CheckConfig {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
}

/// Initialise tracing. Logs go to stderr; stdout carries command replies.
fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

async fn run_console(cli: Cli) -> anyhow::Result<()> {
    let (config, path) = config_commands::load(cli.config.as_deref())?;
    if let Some(path) = &path {
        info!(path = %path.display(), "loaded config");
    }

    let validation = regnum_config::validate(&config);
    if validation.has_errors() {
        config_commands::report(&validation, false);
        anyhow::bail!("invalid configuration");
    }

    let user = UserId(cli.user_id);
    let mut info_provider = StaticInformationProvider::new();
    if let Some(prefix) = cli.guild_prefix {
        info_provider = info_provider.with_prefix(console::CONSOLE_GUILD, prefix);
    }
    if cli.owner {
        info_provider = info_provider.with_owner(user);
    }

    let shutdown = Arc::new(Notify::new());
    let mut builder = CommandClient::builder()
        .config(&config.commands)
        .outbound(Arc::new(console::ConsoleOutbound))
        .information_provider(Arc::new(info_provider))
        .bot_user_id(UserId(0))
        .commands(demo::commands(Arc::clone(&shutdown)));
    builder = if cli.admin {
        builder.permission_context(Arc::new(AllPermissions))
    } else {
        builder.permission_context(Arc::new(NoPermissions))
    };
    let client = builder.build()?;

    if let Some(bus) = client.event_bus() {
        bus.spawn_listener(LoggingListener);
        bus.spawn_listener(console::ConsoleListener);
    }

    let author = Author::user(user, cli.user_name);
    console::run(client, author, shutdown).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "regnum starting");

    match cli.command {
        None | Some(Commands::Run) => run_console(cli).await,
        Some(Commands::CheckConfig { verbose }) => {
            config_commands::check(cli.config.as_deref(), verbose)
        },
    }
}

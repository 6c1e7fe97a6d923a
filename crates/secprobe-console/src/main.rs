/*
[INPUT]:  CLI arguments, YAML configuration file, SECPROBE__* env vars, OS shutdown signals
[OUTPUT]: Rendered catalog/task views on stdout, engine intents, report files
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, startup flow, or shutdown handling
*/

mod cli;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use secprobe_adapter::{EngineClient, TaskId};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use secprobe_console::config::{ConsoleConfig, LoggingSettings, default_config_path};
use secprobe_console::TaskConsole;

use crate::cli::commands::{self, ExportArgs, RunArgs, TasksArgs};

#[derive(Parser, Debug)]
#[command(name = "secprobe", version, about = "Compose and track security detection tasks")]
struct Cli {
    #[arg(long = "config", value_name = "PATH", global = true)]
    config_path: Option<PathBuf>,
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    log_level: Option<String>,
    #[arg(long = "base-url", value_name = "URL", global = true)]
    base_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a configuration file
    Init {
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Print the case catalog
    Cases,
    /// Catalog totals and recent task activity
    Summary,
    /// Compose and submit a task
    Run(RunArgs),
    /// List tasks
    Tasks(TasksArgs),
    /// Follow one task until it reaches a terminal status
    Watch { task_id: TaskId },
    /// Stop a pending or running task
    Stop { task_id: TaskId },
    /// Retry the errored cases of a finished task
    Retry { task_id: TaskId },
    /// Download a task report
    Export(ExportArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    if let Command::Init { output } = &args.command {
        let output = output
            .clone()
            .or_else(default_config_path)
            .unwrap_or_else(|| PathBuf::from("secprobe.yaml"));
        return cli::init::run_init(output);
    }

    let mut config = ConsoleConfig::load(args.config_path.as_deref()).context("load config")?;
    if let Some(base_url) = args.base_url {
        config.engine.base_url = base_url;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    let _log_guard = init_tracing(&config.logging)?;
    debug!(base_url = %config.engine.base_url, "configuration loaded");

    // Anything that can be rejected locally is rejected before login.
    if let Command::Run(run) = &args.command {
        commands::check_run(run)?;
    }

    let shutdown = CancellationToken::new();
    setup_signal_handlers(shutdown.clone());

    let client = connect(&config).await?;
    let console = TaskConsole::new(Arc::new(client))
        .with_cadence(config.cadence())
        .with_shutdown(shutdown.clone());

    match args.command {
        Command::Init { .. } => Ok(()),
        Command::Cases => commands::cases(&console).await,
        Command::Summary => commands::summary(&console).await,
        Command::Run(run) => commands::run(&console, run).await,
        Command::Tasks(tasks) => commands::tasks(&console, tasks, &shutdown).await,
        Command::Watch { task_id } => commands::watch(&console, task_id).await,
        Command::Stop { task_id } => commands::stop(&console, task_id).await,
        Command::Retry { task_id } => commands::retry(&console, task_id).await,
        Command::Export(export) => commands::export(&console, export).await,
    }
}

/// Build the engine client and apply configured credentials.
async fn connect(config: &ConsoleConfig) -> Result<EngineClient> {
    let client = EngineClient::with_config(config.client_config(), &config.engine.base_url)
        .context("create engine client")?;

    let auth = &config.auth;
    match (&auth.access_token, &auth.username, &auth.password) {
        (Some(access_token), _, _) => {
            client
                .tokens()
                .set_tokens(access_token.clone(), auth.refresh_token.clone(), None);
            debug!("using configured access token");
        }
        (None, Some(username), Some(password)) => {
            client
                .login(username, password)
                .await
                .context("login to execution engine")?;
        }
        _ => warn!("no credentials configured; requests are sent anonymously"),
    }
    Ok(client)
}

fn init_tracing(logging: &LoggingSettings) -> Result<Option<WorkerGuard>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&logging.level).context("invalid log level")?,
    };
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let (file_layer, guard) = match &logging.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "secprobe.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(guard)
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT");
        shutdown_clone.cancel();
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("received SIGTERM");
                    shutdown_clone.cancel();
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGTERM handler");
                }
            }
        });
    }
}

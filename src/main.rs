use clap::{Parser, Subcommand};
use clubos_remote::clubos_api::cached_clubos_client::CachedClubOsClient;
use clubos_remote::clubos_api::clubos_client::{ClubOsClient, RemoteApiTrait};
use clubos_remote::clubos_api::models::request::action_request::ActionType;
use clubos_remote::clubos_api::models::request::task_request::NewTask;
use clubos_remote::clubos_api::models::request::ticket_request::TicketFilter;
use clubos_remote::clubos_api::models::ticket::TicketStatus;
use clubos_remote::config::{Config, LoggingConfig};
use clubos_remote::remote::dispatcher::{
    ActionDispatcher, AlwaysConfirm, Confirm, DispatchOutcome,
};
use clubos_remote::remote::notifier::LogNotifier;
use clubos_remote::remote::poller::{StatusCache, StatusPoller, report_interval};
use clubos_remote::remote::registry::LocationRegistry;
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_appender::rolling;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt};

/// ClubOS remote actions and facility status
#[derive(Parser, Debug)]
#[command(name = "clubos-remote", version, about)]
struct Cli {
    /// Path to config.toml
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Skip confirmation prompts
    #[arg(short, long)]
    yes: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show locations and their installed hardware
    Locations,

    /// Poll door and bay status once for every location
    Status,

    /// Keep polling status until interrupted
    Watch,

    /// Send a remote action
    Action {
        /// restart-trackman, restart-music, restart-tv, unlock, lock or emergency
        action: ActionType,
        location: String,
        /// Bay number for TrackMan restarts, door key for lock/unlock
        target: Option<String>,
    },

    /// List NinjaOne scripts
    Scripts,

    /// Show facility-wide system status
    SystemStatus,

    /// Show the unread conversation count and recent conversations
    Conversations {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// List tasks
    Tasks,

    /// Create a task
    TaskAdd {
        title: String,
        #[arg(long)]
        description: Option<String>,
    },

    /// List tickets
    Tickets {
        #[arg(long, value_enum)]
        status: Option<TicketStatus>,
        #[arg(long)]
        category: Option<String>,
    },

    /// Change a ticket's status
    TicketStatus {
        id: String,
        #[arg(value_enum)]
        status: TicketStatus,
    },

    /// Comment on a ticket
    TicketComment { id: String, text: String },

    /// Delete a ticket
    TicketDelete { id: String },

    /// Upload a receipt file
    ReceiptUpload { path: PathBuf },
}

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::from_file(&cli.config).or_else(|e| {
        if !cli.config.exists() {
            eprintln!("Config file not found. Creating example {}...", cli.config.display());
            Config::save_example(&cli.config)?;
            eprintln!("Please edit it with your settings and run again.");
        }
        Err(e)
    })?;

    init_tracing(&config.logging);

    let client = ClubOsClient::new(&config.api.base_url, &config.api.token)?;
    let remote_api = Arc::new(CachedClubOsClient::new(
        client.clone(),
        Duration::from_secs(config.registry.device_cache_seconds),
    ));

    match cli.command {
        Command::Locations => {
            let registry =
                LocationRegistry::load(&remote_api, config.registry.use_fallback_locations).await;
            if registry.is_fallback() {
                warn!("Showing built-in locations, the device list was empty");
            }
            print_json(&registry.locations())?;
        }
        Command::Status => {
            let registry =
                LocationRegistry::load(&remote_api, config.registry.use_fallback_locations).await;
            let poller = StatusPoller::new(
                remote_api,
                registry.location_names(),
                config.intervals.status_poll(),
                StatusCache::new(),
            );
            poller.refresh().await;
            print_json(&poller.cache().snapshot())?;
        }
        Command::Watch => {
            let registry =
                LocationRegistry::load(&remote_api, config.registry.use_fallback_locations).await;
            let interval = config.intervals.status_poll();
            let cache = StatusCache::new();
            let handle =
                StatusPoller::new(remote_api, registry.location_names(), interval, cache.clone())
                    .start();

            let mut report = report_interval(interval);
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        info!("Interrupted, stopping status poller");
                        break;
                    }
                    _ = report.tick() => {
                        print_json(&cache.snapshot())?;
                    }
                }
            }
            handle.stop().await;
        }
        Command::Action {
            action,
            location,
            target,
        } => {
            let registry =
                LocationRegistry::load(&remote_api, config.registry.use_fallback_locations).await;
            let location = match registry.get(&location) {
                Some(known) => known.name.clone(),
                None => {
                    warn!("{} is not a known location, sending anyway", location);
                    location
                }
            };

            let confirm: Arc<dyn Confirm> = if cli.yes {
                Arc::new(AlwaysConfirm)
            } else {
                Arc::new(StdinConfirm)
            };
            let dispatcher = ActionDispatcher::new(
                remote_api,
                Arc::new(LogNotifier),
                confirm,
                config.doors.unlock_duration_seconds,
            );

            match dispatcher
                .execute(action, &location, target.as_deref())
                .await
            {
                DispatchOutcome::Completed(message) => println!("{}", message),
                DispatchOutcome::Cancelled => println!("Cancelled"),
                DispatchOutcome::AlreadyInFlight => println!("Already in progress"),
                DispatchOutcome::Failed(message) | DispatchOutcome::Invalid(message) => {
                    anyhow::bail!(message)
                }
            }
        }
        Command::Scripts => print_json(&remote_api.list_scripts().await?)?,
        Command::SystemStatus => print_json(&client.system_status().await?)?,
        Command::Conversations { limit } => {
            let count = client.conversation_count().await?;
            println!("{} conversations", count);
            print_json(&client.recent_conversations(limit).await?)?;
        }
        Command::Tasks => print_json(&client.list_tasks().await?)?,
        Command::TaskAdd { title, description } => {
            let task = client.create_task(&NewTask { title, description }).await?;
            print_json(&task)?;
        }
        Command::Tickets { status, category } => {
            let tickets = client
                .list_tickets(&TicketFilter { status, category })
                .await?;
            print_json(&tickets)?;
        }
        Command::TicketStatus { id, status } => {
            let message = client.update_ticket_status(&id, status).await?;
            println!(
                "{}",
                message.unwrap_or_else(|| format!("Ticket {} is now {}", id, status))
            );
        }
        Command::TicketComment { id, text } => {
            print_json(&client.add_ticket_comment(&id, &text).await?)?;
        }
        Command::TicketDelete { id } => {
            if !cli.yes && !StdinConfirm.confirm(&format!("Delete ticket {}?", id)) {
                println!("Cancelled");
                return Ok(());
            }
            let message = client.delete_ticket(&id).await?;
            println!(
                "{}",
                message.unwrap_or_else(|| format!("Ticket {} deleted", id))
            );
        }
        Command::ReceiptUpload { path } => {
            print_json(&client.upload_receipt(&path).await?)?;
        }
    }

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let log_dir = &logging.directory;

    // One file per level
    let debug_file = rolling::daily(log_dir, &logging.debug_file);
    let info_file = rolling::daily(log_dir, &logging.info_file);
    let warn_file = rolling::daily(log_dir, &logging.warn_file);
    let error_file = rolling::daily(log_dir, &logging.error_file);

    let debug_layer = fmt::layer()
        .with_writer(debug_file)
        .with_ansi(false)
        .with_filter(EnvFilter::new("debug"));

    let info_layer = fmt::layer()
        .with_writer(info_file)
        .with_ansi(false)
        .with_filter(tracing_subscriber::filter::LevelFilter::INFO);

    let warn_layer = fmt::layer()
        .with_writer(warn_file)
        .with_ansi(false)
        .with_filter(tracing_subscriber::filter::LevelFilter::WARN);

    let error_layer = fmt::layer()
        .with_writer(error_file)
        .with_ansi(false)
        .with_filter(tracing_subscriber::filter::LevelFilter::ERROR);

    // stdout is reserved for command output
    let console_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_filter(EnvFilter::new(&logging.console_level));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(debug_layer)
        .with(info_layer)
        .with(warn_layer)
        .with(error_layer)
        .init();
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Asks on the terminal; anything but y/yes is a no.
struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        eprint!("{} [y/N] ", prompt);
        let _ = io::stderr().flush();
        let mut answer = String::new();
        if io::stdin().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

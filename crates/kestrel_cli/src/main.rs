//! `kestrel`: compose, submit and inspect training jobs from the command line.
//!
//! Jobs go to a Kestrel server when `--server` (or `KESTREL_SERVER`) is set and
//! to the local data directory otherwise. `kestrel serve` exposes that same
//! directory over HTTP.

mod render;
mod store;
mod submit;

use anyhow::Context;
use clap::{Parser, Subcommand};
use kestrel_client::KestrelClient;
use kestrel_core::constants::defaults;
use kestrel_core::hyperparameters::{self, BUILTIN_ALGORITHMS};
use kestrel_core::prelude::*;
use kestrel_fs::FileSystemJobStore;
use kestrel_server::{KestrelServer, KestrelServerConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use store::CliStore;
use submit::SubmitArgs;

#[derive(Parser, Debug)]
#[command(name = "kestrel", author, version, about = "Kestrel training-job composer", long_about = None)]
struct Cli {
    /// Kestrel server URL. When unset, jobs are stored under --data-dir
    #[arg(long, env = "KESTREL_SERVER", global = true)]
    server: Option<String>,

    /// Directory of the local job store
    #[arg(long, env = "KESTREL_DATA_DIR", default_value = defaults::DATA_DIR, global = true)]
    data_dir: PathBuf,

    /// How long new jobs stay Pending, in milliseconds
    #[arg(long, env = "KESTREL_PENDING_DELAY_MS", default_value_t = defaults::PENDING_DELAY_MS, global = true)]
    pending_delay_ms: i64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the local job store over HTTP
    Serve {
        #[arg(long, env = "PORT", default_value_t = 3000)]
        port: u16,

        /// Prefix for the job routes, e.g. `/training`
        #[arg(long, env = "KESTREL_BASE_PATH", default_value = "")]
        base_path: String,
    },

    /// Build a training job from flags, validate it and store it
    Submit(SubmitArgs),

    /// List stored jobs, newest first
    List {
        /// Print the raw job summaries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Follow the job list until Ctrl-C
    Watch {
        /// Store poll interval in milliseconds
        #[arg(long, default_value_t = defaults::POLL_INTERVAL_MS)]
        poll_ms: u64,

        /// Local status tick in milliseconds
        #[arg(long, default_value_t = defaults::TICK_INTERVAL_MS)]
        tick_ms: u64,
    },

    /// Remove every stored job and payload
    Clear,

    /// List the built-in algorithms
    Algorithms,

    /// Show the hyperparameter fields and defaults of an algorithm
    Defaults {
        /// Algorithm id, e.g. `xgboost`
        id: String,

        /// Print only the default values as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    fn status_source(&self) -> Arc<dyn StatusSource> {
        Arc::new(SimulatedDelay {
            delay_ms: self.pending_delay_ms,
        })
    }

    fn fs_store(&self) -> FileSystemJobStore {
        FileSystemJobStore::new(&self.data_dir).with_status_source(self.status_source())
    }

    fn store(&self) -> CliStore {
        match &self.server {
            Some(url) => CliStore::Http(KestrelClient::new(url.clone())),
            None => CliStore::Fs(self.fs_store()),
        }
    }
}

fn init_tracing(default: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(match cli.command {
        Command::Serve { .. } => "info",
        _ => "warn",
    });

    match &cli.command {
        Command::Serve { port, base_path } => serve(&cli, *port, base_path).await,
        Command::Submit(args) => submit(&cli, args).await,
        Command::List { json } => list(&cli, *json).await,
        Command::Watch { poll_ms, tick_ms } => {
            let config = ListViewConfig {
                poll_interval: Duration::from_millis(*poll_ms),
                tick_interval: Duration::from_millis(*tick_ms),
            };
            watch(&cli, config).await
        }
        Command::Clear => {
            let store = cli.store();
            store.clear().await.context("Failed to clear saved payloads")?;
            println!("Cleared all jobs in {}", store.describe());
            Ok(())
        }
        Command::Algorithms => {
            for algorithm in BUILTIN_ALGORITHMS {
                let config = hyperparameters::config_or_placeholder(algorithm.id);
                let mode = if config.is_read_only() { "read-only" } else { "editable" };
                println!("{:<24} {:<24} {mode}", algorithm.id, algorithm.name);
            }
            Ok(())
        }
        Command::Defaults { id, json } => {
            let config = hyperparameters::get(id)
                .with_context(|| format!("Unknown algorithm `{id}`"))?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&config.defaults())?);
            } else {
                print!("{}", render::algorithm_details(config));
            }
            Ok(())
        }
    }
}

async fn serve(cli: &Cli, port: u16, base_path: &str) -> anyhow::Result<()> {
    let store = cli.fs_store();
    let app = KestrelServer::new(KestrelServerConfig {
        base_path: base_path.to_string(),
    })
    .build(store);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(data_dir = %cli.data_dir.display(), "Server listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}

async fn submit(cli: &Cli, args: &SubmitArgs) -> anyhow::Result<()> {
    let form = args.build(TrainingJobForm::new())?;
    let session = FormSession::with_form(form, Arc::new(SystemClock), cli.status_source());

    if args.dry_run {
        for error in session.errors() {
            eprintln!("error: {error}");
        }
        println!("{}", serde_json::to_string_pretty(&session.payload())?);
        return Ok(());
    }

    let store = cli.store();
    let outcome = session.submit(&store).await;
    match &outcome {
        SubmitOutcome::Rejected { errors } => {
            for error in errors {
                eprintln!("error: {error}");
            }
            anyhow::bail!(outcome.message());
        }
        SubmitOutcome::Created { job, .. } => {
            println!("{}", outcome.message());
            println!("{} ({}) is {}", job.id, job.algorithm, job.status);
            Ok(())
        }
    }
}

async fn list(cli: &Cli, json: bool) -> anyhow::Result<()> {
    let jobs = cli.store().list().await.context("Failed to read job index")?;

    let mut view = JobListView::new();
    view.replace(jobs);

    if json {
        println!("{}", serde_json::to_string_pretty(&view.sorted())?);
    } else {
        print!("{}", render::job_table(&view.sorted(), SystemClock.now_ms()));
    }
    Ok(())
}

async fn watch(cli: &Cli, config: ListViewConfig) -> anyhow::Result<()> {
    let session = ListViewSession::start(cli.store(), Arc::new(SystemClock), cli.status_source(), config);
    let mut updates = session.subscribe();

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let jobs = updates.borrow_and_update().clone();
                println!("{}", render::job_table(&jobs, SystemClock.now_ms()));
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}

use anyhow::{Context, Result};
use axum::Server;
use sentry::{
    integrations::{anyhow::capture_anyhow, tracing as sentry_tracing},
    ClientOptions, IntoDsn,
};
use std::sync::Arc;
use structopt::StructOpt;
use tokio::{
    signal::unix::{signal, SignalKind},
    sync::oneshot,
    task,
};
use tracing::info;
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

use args::Args;

mod args;
mod config;
mod event;
mod http;
mod notifier;

use config::SharedConfig;
use notifier::Notifier;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse the cli
    let cli = Args::from_args();

    // Get the configuration, refusing to start without a secret or destination
    let configuration = config::load(cli)
        .await
        .context("Failed to load configuration")?;

    // Setup logging
    init_tracing(&configuration.server.log);

    // Initialize sentry
    let _guard = sentry::init(sentry_config(&configuration.server.sentry)?);

    match run_server(configuration).await {
        Ok(()) => Ok(()),
        Err(e) => {
            capture_anyhow(&e);
            Err(e)
        }
    }
}

/// Start the server and wait for it to be stopped
async fn run_server(configuration: SharedConfig) -> Result<()> {
    let (stop_tx, stop_rx) = oneshot::channel();

    let build = &configuration.build;
    info!(
        version = ?build.version,
        commit = ?build.commit,
        branch = ?build.branch,
        built = ?build.built,
        "starting {}",
        env!("CARGO_PKG_NAME")
    );

    // Setup the notifier
    let notifier = Notifier::new(&configuration.slack).context("failed to setup notifier")?;
    info!(timeout = ?configuration.slack.timeout, "notifications will be sent to slack");

    // Bind the server
    let address = configuration.server.address;
    let path = configuration.server.path.clone();
    let server = Server::try_bind(&address)
        .with_context(|| format!("failed to bind to {}", address))?
        .serve(http::routes(configuration, Arc::new(notifier)).into_make_service())
        .with_graceful_shutdown(async move {
            stop_rx.await.ok();
        });

    // Start the server
    let handle = task::spawn(server);
    info!(%path, "listening on {}", address);

    // Wait for shutdown
    wait_for_exit()
        .await
        .context("failed to listen for event")?;
    info!("signal received, shutting down...");

    // Let in-flight deliveries finish
    stop_tx.send(()).ok();
    handle
        .await
        .context("server task failed")?
        .context("server stopped unexpectedly")?;

    info!("successfully shutdown, good bye!");
    Ok(())
}

/// Wait for a SIGINT or SIGTERM and then exit
async fn wait_for_exit() -> Result<()> {
    let mut int = signal(SignalKind::interrupt())?;
    let mut term = signal(SignalKind::terminate())?;

    tokio::select! {
        _ = int.recv() => Ok(()),
        _ = term.recv() => Ok(()),
    }
}

/// Generate a registry for tracing
fn init_tracing(raw_filter: &str) {
    let filter = EnvFilter::builder().parse_lossy(raw_filter);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_span_events(FmtSpan::CLOSE)
                .with_filter(filter),
        )
        .with(sentry_tracing::layer())
        .init();
}

/// Generate configuration for Sentry
fn sentry_config(url: &Option<String>) -> Result<ClientOptions> {
    let dsn = url
        .as_deref()
        .map(IntoDsn::into_dsn)
        .transpose()
        .context("failed to parse Sentry DSN")?
        .flatten();

    let options = ClientOptions {
        dsn,
        release: sentry::release_name!(),
        attach_stacktrace: true,
        ..Default::default()
    };

    Ok(options)
}

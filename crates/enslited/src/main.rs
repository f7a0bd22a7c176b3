// # enslited - ENS Light Resolver Daemon
//
// Thin integration layer: settings, runtime, wiring, signals. Resolution,
// caching and sync tracking all live in enslite-core.
//
// ## Commands
//
// - `enslited start [--datadir DIR]`: run the daemon
// - `enslited stop`: ask a running daemon to shut down
// - `enslited resolve <name> [--dns] [--lookup]`: query a running daemon
// - `enslited version`
//
// ## Configuration
//
// Defaults, overlaid by `<data_dir>/config.json`, overlaid by `ENS_*`
// environment variables (see `settings.rs`).
//
// ## Example
//
// ```bash
// export ENS_RPC_URL=http://127.0.0.1:8545
// export ENS_LOG_LEVEL=debug
//
// enslited start --datadir /var/lib/ens &
// enslited resolve alice.eth --dns
// enslited stop
// ```

mod cli;
mod control;
mod settings;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use control::{ControlClient, STOPPING_MESSAGE};
use enslite_core::hub::PollerExit;
use enslite_core::{ChainClient, ResolutionService, SyncProgressHub, run_sync_poller};
use enslite_gateway::{Gateway, Shutdown};
use enslite_rpc::{EthContractsFactory, RpcChainClient};
use settings::Settings;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error
#[derive(Debug, Clone, Copy)]
enum EnsExitCode {
    CleanShutdown = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<EnsExitCode> for ExitCode {
    fn from(code: EnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Command::Version = cli.command {
        println!("enslited {}", env!("CARGO_PKG_VERSION"));
        return EnsExitCode::CleanShutdown.into();
    }

    let settings = match Settings::load(cli.datadir) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return EnsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(settings.log_level)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return EnsExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return EnsExitCode::RuntimeError.into();
        }
    };

    let code = rt.block_on(async {
        match cli.command {
            Command::Start => start(settings).await,
            Command::Stop => run_control(stop(&settings)).await,
            Command::Resolve { name, dns, lookup } => {
                run_control(resolve(&settings, &name, dns, lookup)).await
            }
            Command::Version => EnsExitCode::CleanShutdown,
        }
    });

    code.into()
}

async fn start(settings: Settings) -> EnsExitCode {
    if let Err(e) = settings.prepare_data_dir() {
        error!("{:#}", e);
        return EnsExitCode::ConfigError;
    }

    match run_daemon(settings).await {
        Ok(()) => EnsExitCode::CleanShutdown,
        Err(e) => {
            error!("Daemon error: {:#}", e);
            EnsExitCode::RuntimeError
        }
    }
}

async fn run_control(action: impl std::future::Future<Output = Result<()>>) -> EnsExitCode {
    match action.await {
        Ok(()) => EnsExitCode::CleanShutdown,
        Err(e) => {
            eprintln!("{:#}", e);
            EnsExitCode::RuntimeError
        }
    }
}

async fn stop(settings: &Settings) -> Result<()> {
    ControlClient::new(settings.gateway_url())?.stop().await?;
    println!("{}", STOPPING_MESSAGE);
    Ok(())
}

async fn resolve(settings: &Settings, name: &str, dns: bool, lookup: bool) -> Result<()> {
    let body = ControlClient::new(settings.gateway_url())?
        .resolve(name, dns, lookup)
        .await?;
    println!("{}", body);
    Ok(())
}

/// Wire the resolver together and serve until shutdown
async fn run_daemon(settings: Settings) -> Result<()> {
    let config = settings.config;
    info!("Starting enslited (data dir {})", config.data_dir.display());

    let chain = Arc::new(
        RpcChainClient::from_config(&config.chain).context("failed to create chain client")?,
    );
    chain.start().await.context("failed to start chain client")?;

    let service = ResolutionService::new(chain.clone(), Arc::new(EthContractsFactory), &config)
        .context("failed to create resolution service")?;
    let hub = SyncProgressHub::new(config.gateway.subscriber_buffer);
    let gateway = Gateway::new(Arc::new(service), hub.clone(), config.gateway.clone());
    let shutdown = gateway.shutdown();

    let listener = gateway
        .bind()
        .await
        .with_context(|| format!("failed to bind {}", config.gateway.listen_addr))?;

    let poller = tokio::spawn(run_sync_poller(
        hub,
        chain as Arc<dyn ChainClient>,
        config.hub.clone(),
        shutdown.subscribe(),
    ));
    let signals = tokio::spawn(shutdown_on_signal(shutdown.clone()));

    info!("Daemon initialized successfully");
    let served = gateway.serve(listener).await;

    signals.abort();
    wind_down(&served, &shutdown, poller).await;

    served.context("gateway failed")?;
    info!("Shutting down daemon");
    Ok(())
}

/// Wait for the poller after the server has returned
///
/// A server that failed never saw shutdown triggered, so trigger it here;
/// otherwise the poller keeps running until the chain finishes syncing.
async fn wind_down(
    served: &enslite_core::Result<()>,
    shutdown: &Shutdown,
    poller: JoinHandle<PollerExit>,
) -> Option<PollerExit> {
    if let Err(e) = served {
        warn!("Gateway stopped unexpectedly, shutting down: {}", e);
        shutdown.trigger().await;
    }

    match poller.await {
        Ok(exit) => {
            debug!("Sync poller finished: {:?}", exit);
            Some(exit)
        }
        Err(e) => {
            warn!("Sync poller task failed: {}", e);
            None
        }
    }
}

async fn shutdown_on_signal(shutdown: Shutdown) {
    match wait_for_signal().await {
        Ok(signal) => {
            info!("Received shutdown signal: {}", signal);
            shutdown.trigger().await;
        }
        Err(e) => error!("Signal handling unavailable: {}", e),
    }
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn wait_for_signal() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}

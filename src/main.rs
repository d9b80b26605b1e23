//! Gateway bootstrap.
//!
//! Ordered startup: configuration, tracing, embedded broker (blocking on
//! readiness), audit logger, HTTP surface. Ordered shutdown on
//! SIGINT/SIGTERM: stop accepting requests, let in-flight requests finish,
//! drain the broker, stop the broker. Any startup failure exits non-zero
//! before anything is served.

use std::net::SocketAddr;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use topic_bridge::adapters::audit::TrafficLogger;
use topic_bridge::adapters::broker::{BrokerSupervisor, MemoryBus, TracingLogSink};
use topic_bridge::adapters::http::{gateway_router, GatewayState};
use topic_bridge::config::AppConfig;

/// How long in-flight requests get to finish after the shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load configuration: {err}");
            process::exit(1);
        }
    };
    if let Err(err) = config.validate() {
        eprintln!("invalid configuration: {err}");
        process::exit(1);
    }

    init_tracing(config.is_production());

    // Embedded broker: started asynchronously, gateway blocks on readiness.
    let bus = Arc::new(MemoryBus::new(TracingLogSink::shared()));
    let supervisor = BrokerSupervisor::new(bus);
    info!(
        host = %config.broker.host,
        port = config.broker.port,
        url = %config.broker.client_url(),
        "bringing up embedded broker"
    );
    supervisor.start();
    if let Err(err) = supervisor.wait_ready().await {
        error!(error = %err, "broker never became ready");
        process::exit(1);
    }

    let broker = supervisor.broker();

    // Audit collaborator: off the request path, but its storage being
    // unavailable is startup-fatal.
    let _audit_task = if config.audit.enabled {
        match TrafficLogger::start(Arc::clone(&broker), &config.audit.log_path).await {
            Ok(task) => Some(task),
            Err(err) => {
                error!(error = %err, "traffic logger failed to start");
                process::exit(1);
            }
        }
    } else {
        None
    };

    let app = gateway_router(GatewayState::new(broker));
    let addr = config.server.socket_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(error = %err, %addr, "failed to bind HTTP listener");
            process::exit(1);
        }
    };
    info!(%addr, "gateway listening");

    let (close_tx, close_rx) = tokio::sync::oneshot::channel::<()>();
    let serve = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        close_rx.await.ok();
    });
    let mut server = tokio::spawn(async move { serve.await });

    tokio::select! {
        result = &mut server => {
            // The listener failed underneath us; nothing to shut down.
            if let Ok(Err(err)) = result {
                error!(error = %err, "HTTP server error");
                process::exit(1);
            }
        }
        _ = shutdown_signal() => {
            warn!("shutting down");

            // Stop accepting, then give in-flight requests a bounded grace
            // period. Open duplex sessions do not end on their own, so the
            // remainder is aborted once the grace period elapses; their
            // connections close with the process.
            let _ = close_tx.send(());
            if tokio::time::timeout(SHUTDOWN_GRACE, &mut server)
                .await
                .is_err()
            {
                warn!("grace period elapsed, aborting remaining sessions");
                server.abort();
            }
        }
    }

    // Drain buffered publishes, then stop the broker.
    supervisor.stop().await;
    info!("exit complete");
}

/// Debug-level logging in development, info-level in production, unless
/// `RUST_LOG` overrides.
fn init_tracing(production: bool) {
    let default_filter = if production { "info" } else { "debug" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Resolves when the process receives SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to install SIGINT handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
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
}

//! Server wiring: parser + engine + listeners, and signal-driven shutdown.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use siphon_config::{normalize_addr, Config, SinkType};
use siphon_pipeline::{Engine, EngineConfig, EventSink};
use siphon_sinks::{ForwarderSink, ForwarderSinkConfig, NullSink, StdoutSink};
use siphon_sources::{LineHandler, TcpSource, TcpSourceConfig, UdpSource, UdpSourceConfig};

/// How long shutdown waits for the final flush and for listeners to stop.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Parses framed lines and feeds the flush engine.
struct IngestHandler {
    engine: Arc<Engine>,
}

impl LineHandler for IngestHandler {
    fn handle_line(&self, line: &[u8], remote_addr: &str) {
        if let Some(event) = siphon_parser::parse(line, remote_addr) {
            self.engine.push(event);
        }
    }
}

/// Run the proxy until a shutdown signal arrives.
pub async fn run(config: Config) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        platform = std::env::consts::OS,
        "siphon starting"
    );

    let sink = build_sink(&config)?;
    info!(sink = sink.name(), "sink configured");

    let engine = Arc::new(Engine::new(
        EngineConfig {
            flush_interval: Duration::from_millis(config.pipeline.flush_interval_ms),
            flush_threshold: config.pipeline.flush_threshold,
            max_queued: config.pipeline.max_queued,
            drop_threshold: config.pipeline.drop_threshold,
            ..Default::default()
        },
        sink,
    ));

    let handler: Arc<dyn LineHandler> = Arc::new(IngestHandler {
        engine: Arc::clone(&engine),
    });

    let cancel = CancellationToken::new();

    let engine_task = {
        let engine = Arc::clone(&engine);
        let cancel = cancel.clone();
        tokio::spawn(async move { engine.run(cancel).await })
    };

    // Listener failures surface here so startup problems become exit-worthy
    // errors instead of silent dead sockets.
    let (fail_tx, mut fail_rx) = mpsc::channel::<anyhow::Error>(2);
    let mut listener_tasks = Vec::new();

    if config.listeners.tcp_enabled {
        let source = TcpSource::new(
            TcpSourceConfig {
                addr: normalize_addr(&config.listeners.addr_tcp),
                read_timeout: Duration::from_secs(config.listeners.tcp_read_timeout_secs),
                max_line_size: config.listeners.max_line_size,
                ..Default::default()
            },
            Arc::clone(&handler),
        );
        listener_tasks.push(spawn_listener("tcp", fail_tx.clone(), cancel.clone(), move |c| {
            async move { source.run(c).await.map_err(anyhow::Error::from) }
        }));
    } else {
        info!("syslog tcp disabled");
    }

    if config.listeners.udp_enabled {
        let source = UdpSource::new(
            UdpSourceConfig::with_addr(normalize_addr(&config.listeners.addr_udp)),
            Arc::clone(&handler),
        );
        listener_tasks.push(spawn_listener("udp", fail_tx.clone(), cancel.clone(), move |c| {
            async move { source.run(c).await.map_err(anyhow::Error::from) }
        }));
    } else {
        info!("syslog udp disabled");
    }

    drop(fail_tx);

    let mut failure: Option<anyhow::Error> = None;
    tokio::select! {
        _ = wait_for_shutdown() => {
            info!("shutdown signal received, stopping proxy...");
        }
        Some(err) = fail_rx.recv() => {
            failure = Some(err);
        }
    }

    // Stop listeners first, then let the engine run its final flush.
    cancel.cancel();

    for task in listener_tasks {
        if tokio::time::timeout(SHUTDOWN_TIMEOUT, task).await.is_err() {
            warn!("listener did not stop within timeout");
        }
    }

    match tokio::time::timeout(SHUTDOWN_TIMEOUT, engine_task).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!(error = %err, "flush engine task panicked"),
        Err(_) => warn!("flush engine did not finish its final flush within timeout"),
    }

    match failure {
        Some(err) => Err(err),
        None => {
            info!("siphon shutdown complete");
            Ok(())
        }
    }
}

fn build_sink(config: &Config) -> Result<Arc<dyn EventSink>> {
    let sink: Arc<dyn EventSink> = match config.sink.sink_type {
        SinkType::Stdout => Arc::new(StdoutSink::new()),
        SinkType::Null => Arc::new(NullSink::new()),
        SinkType::Forwarder => {
            let endpoint = config
                .sink
                .endpoint
                .clone()
                .context("forwarder sink requires an endpoint")?;
            Arc::new(ForwarderSink::new(ForwarderSinkConfig { endpoint }))
        }
    };
    Ok(sink)
}

/// Spawn one listener task, reporting its failure on `fail_tx`.
fn spawn_listener<F, Fut>(
    name: &'static str,
    fail_tx: mpsc::Sender<anyhow::Error>,
    cancel: CancellationToken,
    run: F,
) -> tokio::task::JoinHandle<()>
where
    F: FnOnce(CancellationToken) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = Result<()>> + Send,
{
    tokio::spawn(async move {
        if let Err(err) = run(cancel).await {
            let _ = fail_tx
                .send(err.context(format!("{name} listener failed")))
                .await;
        }
    })
}

/// Wait for SIGINT, SIGTERM, SIGHUP or SIGQUIT.
async fn wait_for_shutdown() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        let mut hangup = signal(SignalKind::hangup()).expect("failed to install SIGHUP handler");
        let mut quit = signal(SignalKind::quit()).expect("failed to install SIGQUIT handler");

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate.recv() => {},
            _ = hangup.recv() => {},
            _ = quit.recv() => {},
        }
    }

    #[cfg(not(unix))]
    ctrl_c.await;
}

//! Serve command - Relay the feeder to the configured sink
//!
//! Builds the TCP source, the publisher and the pipeline from the loaded
//! configuration, then runs until the pipeline terminates or a shutdown
//! signal arrives.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use flightfeed_config::{Config, PipelineMode, PubSubSinkConfig, SinkConfig, SourceConfig};
use flightfeed_pipeline::{
    Driver, DriverConfig, MetricsReporter, PipelineMetrics, StagedPipeline,
};
use flightfeed_sinks::{
    FilePublisher, FilePublisherConfig, NullPublisher, PubSubConfig, PubSubPublisher, Publisher,
    StdoutPublisher, StdoutPublisherConfig,
};
use flightfeed_sources::{TcpLineSource, TcpSourceConfig};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Serve command arguments
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Feeder address (host:port); overrides [source].address
    #[arg(long)]
    pub host: Option<String>,

    /// Destination topic; overrides [publish].topic
    #[arg(long)]
    pub topic: Option<String>,

    /// Pub/Sub project; selects the pubsub sink
    #[arg(long)]
    pub project: Option<String>,
}

/// Run the serve command
pub async fn run(args: ServeArgs, mut config: Config) -> Result<ExitCode> {
    apply_overrides(&mut config, &args);
    config.validate().context("invalid configuration")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        address = %config.source.address,
        sink = config.sink.sink_type(),
        topic = %config.publish.topic,
        mode = ?config.pipeline.mode,
        "flightfeed starting"
    );

    let source = connect_source(&config.source).await;
    let source_metrics = Arc::clone(source.metrics());
    let publisher = build_publisher(&config.sink).await?;

    let driver_config = DriverConfig::from_config(&config);
    let mut pipeline = match config.pipeline.mode {
        PipelineMode::Sequential => Pipeline::Sequential(Driver::new(
            driver_config,
            Box::new(source),
            Arc::clone(&publisher),
        )),
        PipelineMode::Staged => Pipeline::Staged(StagedPipeline::new(
            driver_config,
            Box::new(source),
            Arc::clone(&publisher),
        )),
    };

    let cancel = CancellationToken::new();
    let signals = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            wait_for_shutdown().await;
            info!("shutdown signal received");
            cancel.cancel();
        })
    };

    // Outlives the pipeline so the final report includes everything
    let reporter_cancel = CancellationToken::new();
    let reporter = MetricsReporter::new(config.metrics.clone(), Arc::clone(pipeline.metrics()))
        .with_source(source_metrics)
        .with_publisher(publisher);
    let reporter = tokio::spawn(reporter.run(reporter_cancel.clone()));

    let result = pipeline.run(cancel).await;

    signals.abort();
    reporter_cancel.cancel();
    if let Err(e) = reporter.await {
        warn!(error = %e, "metrics reporter task failed");
    }

    match result {
        Ok(()) => {
            info!("flightfeed shutdown complete");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!(reason = %e.reason(), error = %e, "pipeline terminated");
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Apply command-line overrides on top of the file configuration
fn apply_overrides(config: &mut Config, args: &ServeArgs) {
    if let Some(host) = &args.host {
        config.source.address = host.clone();
    }

    if let Some(topic) = &args.topic {
        config.publish.topic = topic.clone();
    }

    if let Some(project) = &args.project {
        match &mut config.sink {
            SinkConfig::PubSub(pubsub) => pubsub.project = project.clone(),
            other => {
                *other = SinkConfig::PubSub(PubSubSinkConfig {
                    project: project.clone(),
                    ..Default::default()
                });
            }
        }
    }
}

/// Connect to the feeder
///
/// A failed first connect is not fatal: the source starts disconnected and
/// the pipeline's reconnect policy takes over.
async fn connect_source(config: &SourceConfig) -> TcpLineSource {
    let tcp = TcpSourceConfig {
        id: "feeder".into(),
        address: config.address.clone(),
        connect_timeout: config.connect_timeout,
        read_timeout: config.read_timeout,
        max_line_size: config.max_line_size,
        buffer_size: config.buffer_size,
        nodelay: config.nodelay,
        keepalive: config.keepalive_interval(),
    };

    match TcpLineSource::connect(tcp.clone()).await {
        Ok(source) => source,
        Err(e) => {
            warn!(address = %config.address, error = %e, "initial connect failed");
            TcpLineSource::new(tcp)
        }
    }
}

/// Build the publisher for the configured sink
async fn build_publisher(config: &SinkConfig) -> Result<Arc<dyn Publisher>> {
    let publisher: Arc<dyn Publisher> = match config {
        SinkConfig::PubSub(c) => {
            let access_token_env =
                (!c.access_token_env.is_empty()).then(|| c.access_token_env.clone());
            let publisher = PubSubPublisher::connect(PubSubConfig {
                project: c.project.clone(),
                endpoint: c.endpoint.clone(),
                credentials_file: c.credentials_file.clone(),
                access_token_env,
                request_timeout: c.request_timeout,
            })
            .await
            .context("failed to create Pub/Sub publisher")?;
            Arc::new(publisher)
        }
        SinkConfig::Stdout(c) => Arc::new(StdoutPublisher::new(StdoutPublisherConfig {
            include_topic: c.include_topic,
        })),
        SinkConfig::File(c) => {
            let publisher = FilePublisher::open(FilePublisherConfig {
                path: c.path.clone(),
                sync: c.sync,
            })
            .await
            .with_context(|| format!("failed to open {}", c.path.display()))?;
            Arc::new(publisher)
        }
        SinkConfig::Null => Arc::new(NullPublisher::new()),
    };

    Ok(publisher)
}

/// The configured pipeline flavour
enum Pipeline {
    Sequential(Driver),
    Staged(StagedPipeline),
}

impl Pipeline {
    fn metrics(&self) -> &Arc<PipelineMetrics> {
        match self {
            Self::Sequential(driver) => driver.metrics(),
            Self::Staged(pipeline) => pipeline.metrics(),
        }
    }

    async fn run(&mut self, cancel: CancellationToken) -> flightfeed_pipeline::Result<()> {
        match self {
            Self::Sequential(driver) => driver.run(cancel).await,
            Self::Staged(pipeline) => pipeline.run(cancel).await,
        }
    }
}

/// Wait for SIGINT or SIGTERM
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
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

use std::sync::Arc;

use anyhow::Context;
use cardgate::config::Config;
use cardgate::middleware::TracingAccessLog;
use cardgate::{Server, cancel_on_signal, routes, telemetry};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    telemetry::init(&config.log).context("initialising logging")?;
    info!("logger started");

    // Signals only cancel the token; the server decides what shutdown means.
    let cancel = CancellationToken::new();
    cancel_on_signal(cancel.clone()).context("installing signal handlers")?;

    let mut server = Server::new().grace_period(config.grace_period());
    let router = routes::build(Arc::new(TracingAccessLog), server.subscribe())
        .context("building route table")?;

    info!(host = %config.host, port = config.port, "HTTP REST API server starting");
    server
        .start(&config.bind_addr(), router)
        .await
        .context("starting HTTP server")?;

    server.run(cancel).await?;
    Ok(())
}

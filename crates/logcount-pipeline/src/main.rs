//! logcount pipeline binary.
//!
//! - Config: first argument, default `logcount.yaml`
//! - Input: newline-delimited messages on stdin, one message per line
//! - Output: every injected payload written to stdout
//! - Stops on stdin EOF or Ctrl-C

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, EnvFilter};

use logcount_core::error::{LogCountError, Result};
use logcount_core::message::Message;
use logcount_pipeline::registry::PluginRegistry;
use logcount_pipeline::runtime::Pipeline;
use logcount_pipeline::sink::StdoutSink;
use logcount_pipeline::config;

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        tracing::error!(code = e.code().as_str(), error = %e, "logcount-pipeline failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "logcount.yaml".to_string());
    let cfg = config::load_from_file(&path)?;

    let registry = PluginRegistry::with_builtins();
    let pipeline = Pipeline::start(&cfg, &registry, Arc::new(StdoutSink::new()))?;
    tracing::info!(config = %path, filters = ?pipeline.filter_names(), "logcount-pipeline started");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line {
                    Ok(Some(l)) => {
                        pipeline.route(Message::new("line", l)).await;
                    }
                    Ok(None) => break,
                    Err(e) => {
                        pipeline.shutdown().await;
                        return Err(LogCountError::Internal(format!("stdin read failed: {e}")));
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupt received");
                break;
            }
        }
    }

    pipeline.shutdown().await;
    Ok(())
}

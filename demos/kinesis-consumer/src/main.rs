//! Kinesis Consumer Example
//!
//! Loads `conflux.toml`, binds the `aws2-kinesis` section and starts a
//! consumer against an in-process stream. Any setting can be overridden from
//! the environment, e.g. `CONFLUX_COMPONENTS__AWS2_KINESIS__SHARD_ID`.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package kinesis-consumer -- --config demos/kinesis-consumer/conflux.toml
//! cargo run --package kinesis-consumer -- --catalog
//! ```

use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use conflux::aws2_kinesis::{KinesisApi, KinesisClient, KinesisEndpoint};
use conflux::core::{BoxError, RegistryBuilder};
use conflux::prelude::*;
use tracing::info;

#[derive(Debug, Parser)]
#[command(about = "Kinesis consumer configured through Conflux")]
struct Args {
    /// Configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Configuration profile (development, production, ...).
    #[arg(short, long)]
    profile: Option<String>,

    /// Shards of the in-process stream.
    #[arg(long, value_delimiter = ',', default_value = "shardId-000000000000,shardId-000000000001")]
    shards: Vec<String>,

    /// Print the component catalog as JSON and exit.
    #[arg(long)]
    catalog: bool,
}

// ============================================================================
// In-process stream
// ============================================================================

/// A stream whose shards never change.
struct LocalStream {
    shards: Vec<String>,
}

#[async_trait]
impl KinesisApi for LocalStream {
    async fn list_shards(&self, _stream: &str) -> Result<Vec<String>, BoxError> {
        Ok(self.shards.clone())
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.catalog {
        let registry = RegistryBuilder::new().with_linked_components()?.build();
        println!("{}", serde_json::to_string_pretty(&registry.catalog().to_json())?);
        return Ok(());
    }

    let mut builder = ConfluxRuntime::builder().bean(
        "kinesis",
        KinesisClient::new(LocalStream {
            shards: args.shards,
        }),
    );
    if let Some(path) = &args.config {
        builder = builder.config_file(path);
    }
    if let Some(profile) = &args.profile {
        builder = builder.profile(profile);
    }
    let runtime = builder.build()?;

    runtime.start().await?;
    info!("{}", runtime.stats().await);

    runtime
        .with_endpoint_as::<KinesisEndpoint, _>("aws2-kinesis", |endpoint| {
            let settings = endpoint.settings();
            info!(
                stream = %settings.stream_name,
                iterator = %settings.iterator_type,
                shards = ?endpoint.shards(),
                "Consuming"
            );
        })
        .await;

    tokio::signal::ctrl_c().await?;
    runtime.stop().await?;
    Ok(())
}

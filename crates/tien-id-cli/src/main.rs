#![doc = include_str!("../README.md")]

mod config;
mod telemetry;

use anyhow::Context;
use clap::Parser;
use config::{CliArgs, CliConfig, Command, OutputFormat};
use std::io::{self, BufWriter, Write};
use tien_id::{NodeConfig, SnowflakeGenerator, SnowflakeId, TIEN_EPOCH};

// mimalloc for the musl release builds.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = CliConfig::try_from(args)?;

    telemetry::init_telemetry()?;

    match config.command {
        Command::Generate { count, format } => generate(&config.node, count, format),
        Command::Decode { ids } => decode(&ids),
    }
}

fn generate(node: &NodeConfig, count: usize, format: OutputFormat) -> anyhow::Result<()> {
    let generator = SnowflakeGenerator::from_node_config(node)
        .context("failed to initialize the snowflake generator")?;

    if cfg!(debug_assertions) {
        tracing::info!("Generating {} IDs with full config: {:#?}", count, node);
    } else {
        tracing::info!(
            "Generating {} IDs as worker {} in data center {}",
            count,
            node.worker_id,
            node.data_center_id
        );
    }

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for _ in 0..count {
        let id = generator.next_id().context("failed to generate an ID")?;
        match format {
            OutputFormat::Decimal => writeln!(out, "{id}")?,
            OutputFormat::Padded => writeln!(out, "{}", id.to_padded_string())?,
            OutputFormat::Json => writeln!(out, "{}", describe(id))?,
        }
    }
    out.flush()?;

    if let tien_id::Clock::Cached(clock) = generator.time_source() {
        clock.shutdown();
    }
    Ok(())
}

fn decode(ids: &[String]) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for raw in ids {
        let id: SnowflakeId = raw
            .parse()
            .with_context(|| format!("cannot decode `{raw}`"))?;
        writeln!(out, "{}", describe(id))?;
    }
    out.flush()?;
    Ok(())
}

fn describe(id: SnowflakeId) -> serde_json::Value {
    serde_json::json!({
        "id": id.to_i64(),
        "timestamp": id.timestamp(),
        "unixMillis": id.unix_millis(TIEN_EPOCH),
        "dataCenterId": id.data_center_id(),
        "workerId": id.worker_id(),
        "sequence": id.sequence(),
    })
}

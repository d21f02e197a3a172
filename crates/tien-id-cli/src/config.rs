use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use std::{fs::File, io::BufReader, path::PathBuf};
use tien_id::{ConfigSnapshot, NodeConfig};

/// Runtime configuration for the `tien-id` binary.
///
/// Node identity and generator tuning are read from an optional JSON snapshot
/// and then overridden by any flag or environment variable that is set.
/// Values are validated once, before the generator is built; there is no
/// reload.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "tien-id",
    version,
    about = "Generate and decode Snowflake IDs"
)]
pub struct CliArgs {
    /// JSON object with generator settings (`workerId`, `dataCenterId`,
    /// `isClock`, ...).
    ///
    /// Environment variable: `TIEN_CONFIG`
    #[arg(long, env = "TIEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Worker ID of this process, `0..=31`.
    ///
    /// Environment variable: `WORKER_ID`
    #[arg(long, env = "WORKER_ID", allow_negative_numbers = true)]
    pub worker_id: Option<i64>,

    /// Data center ID of this process, `0..=31`.
    ///
    /// Environment variable: `DATA_CENTER_ID`
    #[arg(long, env = "DATA_CENTER_ID", allow_negative_numbers = true)]
    pub data_center_id: Option<i64>,

    /// Read time from a cell refreshed by a background ticker instead of the
    /// system clock.
    ///
    /// Environment variable: `IS_CLOCK`
    #[arg(long, env = "IS_CLOCK")]
    pub is_clock: Option<bool>,

    /// Refresh period of the cached clock, in milliseconds.
    ///
    /// Environment variable: `CLOCK_PERIOD_MS`
    #[arg(long, env = "CLOCK_PERIOD_MS")]
    pub clock_period_ms: Option<u64>,

    /// Largest backward clock step, in milliseconds, that is waited out
    /// instead of failing.
    ///
    /// Environment variable: `MAX_BACKWARD_SKEW_MS`
    #[arg(long, env = "MAX_BACKWARD_SKEW_MS")]
    pub max_backward_skew_ms: Option<u64>,

    /// Multiplier applied to a tolerated backward step to get the wait.
    ///
    /// Environment variable: `BACKWARD_WAIT_FACTOR`
    #[arg(long, env = "BACKWARD_WAIT_FACTOR")]
    pub backward_wait_factor: Option<u32>,

    /// Bound, in milliseconds, on waiting for the clock once a millisecond's
    /// sequence is exhausted. `0` waits indefinitely.
    ///
    /// Environment variable: `STALL_TIMEOUT_MS`
    #[arg(long, env = "STALL_TIMEOUT_MS")]
    pub stall_timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print freshly generated IDs, one per line.
    Generate {
        /// Number of IDs to generate.
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Decimal)]
        format: OutputFormat,
    },
    /// Print the fields of existing IDs as JSON, one per line.
    Decode {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain decimal.
    Decimal,
    /// Zero-padded to 19 digits.
    Padded,
    /// A JSON object with the decoded fields.
    Json,
}

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub node: NodeConfig,
    pub command: Command,
}

impl TryFrom<CliArgs> for CliConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let snapshot = snapshot_from_args(&args)?;
        let node = NodeConfig::from_snapshot(&snapshot);

        // Fail here with the flag names rather than later in the generator.
        node.node_id()
            .context("invalid WORKER_ID / DATA_CENTER_ID")?;

        let command = args.command.unwrap_or(Command::Generate {
            count: 1,
            format: OutputFormat::Decimal,
        });

        if let Command::Generate { count: 0, .. } = command {
            bail!("COUNT must be greater than 0");
        }

        Ok(Self { node, command })
    }
}

/// Builds the snapshot: file values first, then every explicitly set flag or
/// environment variable on top.
fn snapshot_from_args(args: &CliArgs) -> anyhow::Result<ConfigSnapshot> {
    let mut snapshot = match &args.config {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open config file {}", path.display()))?;
            ConfigSnapshot::from_reader(BufReader::new(file))
                .with_context(|| format!("failed to parse config file {}", path.display()))?
        }
        None => ConfigSnapshot::new(),
    };

    if let Some(v) = args.worker_id {
        snapshot.set(NodeConfig::WORKER_ID_KEY, v);
    }
    if let Some(v) = args.data_center_id {
        snapshot.set(NodeConfig::DATA_CENTER_ID_KEY, v);
    }
    if let Some(v) = args.is_clock {
        snapshot.set(NodeConfig::IS_CLOCK_KEY, v);
    }
    if let Some(v) = args.clock_period_ms {
        snapshot.set(NodeConfig::CLOCK_PERIOD_KEY, v);
    }
    if let Some(v) = args.max_backward_skew_ms {
        snapshot.set(NodeConfig::MAX_BACKWARD_SKEW_KEY, v);
    }
    if let Some(v) = args.backward_wait_factor {
        snapshot.set(NodeConfig::BACKWARD_WAIT_FACTOR_KEY, v);
    }
    if let Some(v) = args.stall_timeout_ms {
        snapshot.set(NodeConfig::STALL_TIMEOUT_KEY, v);
    }

    Ok(snapshot)
}

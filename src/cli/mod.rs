//! Command-line interface for the probe.
//!
//! Flags follow the classic `check_mssql_database` plugin so existing Nagios
//! command definitions keep working. Parse failures exit with UNKNOWN rather
//! than clap's usual status 2, which a scheduler would read as CRITICAL.

use crate::core::config::ConfigBuilder;
use crate::core::{Config, ProbeError, Result, ServiceState};
use crate::gateway::{ConnectionSettings, MssqlGateway};
use crate::metrics::{Catalog, Mode, SystemClock};
use crate::probe::Probe;
use crate::report::{RangeSpecs, Report};
use crate::storage::FileStateStore;
use clap::{Args, Parser};
use std::path::PathBuf;

/// Check SQL Server database performance counters against Nagios ranges.
#[derive(Parser, Debug)]
#[command(name = "check_mssql_database")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Specify MSSQL Server Address
    #[arg(short = 'H', long)]
    pub hostname: String,

    /// Specify MSSQL User Name
    #[arg(short = 'U', long)]
    pub user: String,

    /// Specify MSSQL Password
    #[arg(short = 'P', long, env = "MSSQLPROBE_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Specify the databases to check (comma separated)
    #[arg(short = 'D', long)]
    pub databases: String,

    /// Specify instance
    #[arg(short = 'I', long, conflicts_with = "port")]
    pub instance: Option<String>,

    /// Specify port
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Specify warning range
    #[arg(short = 'w', long, allow_hyphen_values = true)]
    pub warning: Option<String>,

    /// Specify critical range
    #[arg(short = 'c', long, allow_hyphen_values = true)]
    pub critical: Option<String>,

    /// Check mode
    #[command(flatten)]
    pub mode: ModeFlags,

    /// Configuration file path (default: ~/.config/mssqlprobe/config.yaml)
    #[arg(long, env = "MSSQLPROBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory for rate-of-change state files
    #[arg(long, env = "MSSQLPROBE_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Enable debug logging (written to stderr)
    #[arg(short, long, env = "MSSQLPROBE_DEBUG")]
    pub debug: bool,
}

/// Mode options; at most one may be given.
#[derive(Args, Debug, Default, Clone)]
#[group(id = "mode", multiple = false)]
pub struct ModeFlags {
    /// Log Cache Hit Ratio
    #[arg(long)]
    pub logcachehit: bool,
    /// Active Transactions
    #[arg(long)]
    pub activetrans: bool,
    /// Log Flushes Per Second
    #[arg(long)]
    pub logflushes: bool,
    /// Log File Usage
    #[arg(long)]
    pub logfileusage: bool,
    /// Transactions Per Second
    #[arg(long)]
    pub transpec: bool,
    /// Log Growths
    #[arg(long)]
    pub loggrowths: bool,
    /// Log Shrinks
    #[arg(long)]
    pub logshrinks: bool,
    /// Log Truncations
    #[arg(long)]
    pub logtruncs: bool,
    /// Log Flush Wait Time
    #[arg(long)]
    pub logwait: bool,
    /// Database Size
    #[arg(long)]
    pub datasize: bool,
    /// Time to connect to the database.
    #[arg(long)]
    pub time2connect: bool,
    /// Run tests of all queries against the database.
    #[arg(long)]
    pub test: bool,
}

impl ModeFlags {
    /// The selected mode; connect time when none is given.
    pub fn selected(&self) -> Mode {
        let flags = [
            (self.logcachehit, Mode::LogCacheHit),
            (self.activetrans, Mode::ActiveTransactions),
            (self.logflushes, Mode::LogFlushes),
            (self.logfileusage, Mode::LogFileUsage),
            (self.transpec, Mode::TransactionsPerSecond),
            (self.loggrowths, Mode::LogGrowths),
            (self.logshrinks, Mode::LogShrinks),
            (self.logtruncs, Mode::LogTruncations),
            (self.logwait, Mode::LogWait),
            (self.datasize, Mode::DataSize),
            (self.time2connect, Mode::TimeToConnect),
            (self.test, Mode::SelfTest),
        ];
        flags
            .into_iter()
            .find_map(|(set, mode)| set.then_some(mode))
            .unwrap_or(Mode::TimeToConnect)
    }
}

/// What parsing the command line produced.
pub enum Invocation {
    /// Run the check
    Run(Box<Cli>),
    /// Help or version was requested; print and exit 0
    Exit(String),
    /// Invalid arguments
    Invalid(ProbeError),
}

impl Cli {
    /// Parse command-line arguments without exiting the process.
    pub fn parse_args() -> Invocation {
        Self::parse_from_iter(std::env::args_os())
    }

    /// Parse the given arguments.
    pub fn parse_from_iter<I, T>(args: I) -> Invocation
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        use clap::error::ErrorKind;

        match Cli::try_parse_from(args) {
            Ok(cli) => Invocation::Run(Box::new(cli)),
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                Invocation::Exit(e.to_string())
            },
            Err(e) => {
                let rendered = e.to_string();
                let first = rendered
                    .lines()
                    .next()
                    .unwrap_or_default()
                    .trim_start_matches("error: ")
                    .to_string();
                Invocation::Invalid(ProbeError::config(first))
            },
        }
    }

    /// Comma-separated database list, trimmed, empties dropped.
    pub fn database_list(&self) -> Result<Vec<String>> {
        let databases: Vec<String> = self
            .databases
            .split(',')
            .map(str::trim)
            .filter(|db| !db.is_empty())
            .map(str::to_string)
            .collect();
        if databases.is_empty() {
            return Err(ProbeError::config("Databases is a required option."));
        }
        Ok(databases)
    }

    /// Reject values clap accepts but the check cannot use.
    pub fn validate(&self) -> Result<()> {
        if self.hostname.trim().is_empty() {
            return Err(ProbeError::config("Hostname is a required option."));
        }
        if self.user.is_empty() {
            return Err(ProbeError::config("User is a required option."));
        }
        if self.password.is_empty() {
            return Err(ProbeError::config("Password is a required option."));
        }
        if self.port == Some(0) {
            return Err(ProbeError::config("Port must be greater than 0."));
        }
        self.database_list()?;
        Ok(())
    }

    /// Threshold specs as given.
    pub fn ranges(&self) -> RangeSpecs {
        RangeSpecs::new(self.warning.as_deref(), self.critical.as_deref())
    }

    /// Load configuration with proper precedence:
    /// 1. CLI arguments (highest priority)
    /// 2. Environment variables
    /// 3. Config file
    /// 4. Defaults (lowest priority)
    pub async fn load_config(&self) -> Result<Config> {
        let mut builder = ConfigBuilder::new();

        let config_path = if let Some(path) = &self.config {
            path.clone()
        } else {
            let default_path = dirs::config_dir()
                .map(|d| d.join("mssqlprobe").join("config.yaml"))
                .unwrap_or_else(|| PathBuf::from("~/.config/mssqlprobe/config.yaml"));

            if default_path.exists() {
                default_path
            } else {
                return self.build_config_from_args(builder);
            }
        };

        match tokio::fs::read_to_string(&config_path).await {
            Ok(content) => {
                builder = builder.from_yaml(&content)?;
                tracing::debug!("Loaded configuration from: {:?}", config_path);
            },
            Err(e) if self.config.is_some() => {
                return Err(ProbeError::config(format!(
                    "Failed to read config file {:?}: {}",
                    config_path, e
                )));
            },
            Err(_) => {
                tracing::debug!("No config file found at {:?}, using defaults", config_path);
            },
        }

        self.build_config_from_args(builder)
    }

    fn build_config_from_args(&self, mut builder: ConfigBuilder) -> Result<Config> {
        if let Some(dir) = &self.state_dir {
            builder = builder.state_dir(dir.clone());
        }
        builder.debug(self.debug).build()
    }

    /// Initialize logging. Everything goes to stderr; stdout carries only
    /// the plugin output.
    ///
    /// Level precedence: `RUST_LOG`, `--debug`, `MSSQLPROBE_LOG_LEVEL`, then
    /// the configured level.
    pub fn init_logging(config: &Config) -> Result<()> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

        let level = log_level(config, std::env::var("MSSQLPROBE_LOG_LEVEL").ok());
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

        let detailed = config.debug || config.logging.structured;
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(detailed)
            .with_line_number(detailed)
            .compact();

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| ProbeError::config(format!("Failed to initialize logging: {}", e)))?;

        Ok(())
    }
}

/// Level used when `RUST_LOG` is unset: debug mode, then the environment
/// override, then the configured level.
fn log_level(config: &Config, env_level: Option<String>) -> String {
    if config.debug {
        return "debug".to_string();
    }
    env_level
        .filter(|level| !level.trim().is_empty())
        .unwrap_or_else(|| config.logging.level.as_str().to_string())
}

/// Run the probe and always produce a report; faults become UNKNOWN.
pub async fn execute(cli: Cli) -> Report {
    let config = match cli.load_config().await {
        Ok(config) => config,
        Err(e) => return Report::unknown(&e),
    };
    if let Err(e) = Cli::init_logging(&config) {
        eprintln!("{}", e);
    }

    match run(&cli, &config).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(category = e.category(), error = %e, "Check failed");
            Report::unknown(&e)
        },
    }
}

async fn run(cli: &Cli, config: &Config) -> Result<Report> {
    cli.validate()?;
    let mode = cli.mode.selected();
    let databases = cli.database_list()?;
    let ranges = cli.ranges();

    // Malformed ranges are reported before touching the server.
    ranges.parse()?;

    let settings = ConnectionSettings::new(&cli.hostname, &cli.user, &cli.password, &config.connection)
        .with_instance(cli.instance.clone())
        .with_port(cli.port);
    let host = settings.host_identity();
    tracing::info!(server = %host, mode = %mode, databases = ?databases, "Starting check");

    let (mut gateway, connect_time) = MssqlGateway::connect(&settings).await?;
    let mut store = FileStateStore::from_config(&config.state);
    let clock = SystemClock;

    let report = {
        let mut probe = Probe::new(Catalog::builtin(), host, &mut gateway, &mut store, &clock);
        probe.check(mode, &databases, &ranges, connect_time).await
    };

    if let Err(e) = gateway.close().await {
        tracing::debug!(error = %e, "Error closing connection");
    }

    let report = report?;
    if report.state == ServiceState::Unknown {
        tracing::warn!(mode = %mode, "Check finished with UNKNOWN");
    }
    Ok(report)
}

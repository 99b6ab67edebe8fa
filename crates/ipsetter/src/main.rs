// # ipsetter
//
// Points one DNS A record at this host's current public IP, then exits.
// Meant to be run from cron or a systemd timer.
//
// This binary is a thin integration layer: it reads options and the config
// file, sets up logging, wires the DigitalOcean provider and the HTTP IP
// source into an `ipsetter_core::Engine`, runs one pass and reports it.
//
// ## Options
//
// - `-c/--config <PATH>`: config file (default `./config.json`)
// - `-l/--logfile <PATH>`: also append logs and the report to this file
// - `-s/--silent`: hide the "already points to" line and info-level logs
//
// ## Environment
//
// - `IPSETTER_ACCESS_TOKEN`: overrides `access_token` from the config file
// - `IPSETTER_LOG_LEVEL`: trace, debug, info (default), warn, error
//
// ## Example
//
// ```bash
// ipsetter --config /etc/ipsetter/config.json --logfile /var/log/ipsetter.log --silent
// ```

mod report;

use anyhow::{Context, Result};
use clap::Parser;
use ipsetter_core::traits::IpVersion;
use ipsetter_core::{Config, Engine, FileStateStore, RecordSetter, StaticToken};
use ipsetter_ip_http::HttpIpSource;
use ipsetter_provider_digitalocean::DigitalOceanProvider;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use tracing::{Level, debug, error, warn};
use tracing_subscriber::FmtSubscriber;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};

use report::Reporter;

/// Environment variable selecting the log level
const LOG_LEVEL_ENV: &str = "IPSETTER_LOG_LEVEL";

/// Exit codes
///
/// - 0: The record points at the current IP
/// - 1: Configuration or startup error
/// - 2: The pass failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IpsetterExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<IpsetterExitCode> for ExitCode {
    fn from(code: IpsetterExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "ipsetter",
    version,
    about = "Point a DigitalOcean DNS A record at this host's public IP"
)]
struct Options {
    /// Path to the JSON config file
    #[arg(short, long, default_value = "./config.json")]
    config: PathBuf,

    /// Also append output to this file
    #[arg(short, long)]
    logfile: Option<PathBuf>,

    /// Only report changes and errors
    #[arg(short, long)]
    silent: bool,
}

fn main() -> ExitCode {
    let options = Options::parse();

    let report_writer = match init_logging(&options) {
        Ok(writer) => writer,
        Err(e) => {
            eprintln!("Logging setup error: {:#}", e);
            return IpsetterExitCode::ConfigError.into();
        }
    };
    let reporter = Reporter::new(report_writer, options.silent);

    let config = match Config::load(&options.config) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return IpsetterExitCode::ConfigError.into();
        }
    };
    debug!(?config, "Configuration loaded");

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return IpsetterExitCode::RuntimeError.into();
        }
    };

    let code = rt.block_on(async {
        let engine = match build_engine(&config).await {
            Ok(engine) => engine,
            Err(e) => {
                error!("Startup error: {:#}", e);
                return IpsetterExitCode::ConfigError;
            }
        };
        run_pass(&engine, &reporter).await
    });

    code.into()
}

/// Wire the provider, IP source and optional state store into an engine
async fn build_engine(config: &Config) -> Result<Engine> {
    let token = StaticToken::from_config(config).context("Invalid access token")?;
    let provider = DigitalOceanProvider::new(Arc::new(token))
        .context("Failed to set up the DigitalOcean client")?;
    let ip_source = HttpIpSource::new(config.ip_source_url.clone())
        .context("Failed to set up the IP source")?
        .with_version(IpVersion::V4);

    let setter = RecordSetter::new(Box::new(provider), config.dns_config.ttl);
    let mut engine = Engine::new(
        Box::new(ip_source),
        setter,
        config.dns_config.domain.clone(),
        config.dns_config.name.clone(),
    );

    if let Some(store) = open_state_store(config.state_path.as_deref()).await {
        engine = engine.with_state_store(Box::new(store));
    }

    Ok(engine)
}

/// Open the state file; a file that cannot be used only costs the hint
async fn open_state_store(path: Option<&Path>) -> Option<FileStateStore> {
    let path = path?;
    match FileStateStore::new(path).await {
        Ok(store) => Some(store),
        Err(e) => {
            warn!(
                "State file {} unusable, running without remembered records: {}",
                path.display(),
                e
            );
            None
        }
    }
}

/// Run one pass and report it
async fn run_pass<W>(engine: &Engine, reporter: &Reporter<W>) -> IpsetterExitCode
where
    W: for<'a> tracing_subscriber::fmt::MakeWriter<'a>,
{
    let ip = match engine.discover().await {
        Ok(ip) => ip,
        Err(e) => {
            error!("Pass failed: {}", e);
            reporter.failure(engine.name(), None, &e);
            return IpsetterExitCode::RuntimeError;
        }
    };

    match engine.reconcile(ip).await {
        Ok(outcome) => {
            reporter.outcome(engine.name(), ip, &outcome);
            IpsetterExitCode::Success
        }
        Err(e) => {
            error!("Pass failed: {}", e);
            reporter.failure(engine.name(), Some(ip), &e);
            IpsetterExitCode::RuntimeError
        }
    }
}

/// Install the global subscriber; returns the writer for the report line
fn init_logging(options: &Options) -> Result<BoxMakeWriter> {
    let level = parse_log_level(std::env::var(LOG_LEVEL_ENV).ok().as_deref())?;
    let level = effective_level(level, options.silent);

    let (log_writer, report_writer) = match &options.logfile {
        Some(path) => {
            let file = open_log_file(path)?;
            let second = file
                .try_clone()
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            (
                BoxMakeWriter::new(std::io::stderr.and(Mutex::new(file))),
                BoxMakeWriter::new(std::io::stdout.and(Mutex::new(second))),
            )
        }
        None => (
            BoxMakeWriter::new(std::io::stderr),
            BoxMakeWriter::new(std::io::stdout),
        ),
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_ansi(options.logfile.is_none())
        .with_writer(log_writer)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    Ok(report_writer)
}

fn open_log_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}

fn parse_log_level(value: Option<&str>) -> Result<Level> {
    let Some(value) = value else {
        return Ok(Level::INFO);
    };

    match value.trim().to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" | "" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "{} '{}' is not valid. Valid levels: trace, debug, info, warn, error",
            LOG_LEVEL_ENV,
            value
        ),
    }
}

/// `--silent` caps verbosity at warn
fn effective_level(level: Level, silent: bool) -> Level {
    if silent && level > Level::WARN {
        Level::WARN
    } else {
        level
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Write;

    #[test]
    fn options_are_well_formed() {
        Options::command().debug_assert();
    }

    #[test]
    fn options_default_to_local_config() {
        let options = Options::try_parse_from(["ipsetter"]).unwrap();
        assert_eq!(options.config, PathBuf::from("./config.json"));
        assert_eq!(options.logfile, None);
        assert!(!options.silent);
    }

    #[test]
    fn options_accept_short_and_long_flags() {
        let options =
            Options::try_parse_from(["ipsetter", "-c", "/etc/ipsetter.json", "-l", "out.log", "-s"])
                .unwrap();
        assert_eq!(options.config, PathBuf::from("/etc/ipsetter.json"));
        assert_eq!(options.logfile, Some(PathBuf::from("out.log")));
        assert!(options.silent);

        let options = Options::try_parse_from([
            "ipsetter",
            "--config",
            "a.json",
            "--logfile",
            "b.log",
            "--silent",
        ])
        .unwrap();
        assert_eq!(options.config, PathBuf::from("a.json"));
        assert!(options.silent);
    }

    #[test]
    fn log_level_parsing() {
        assert_eq!(parse_log_level(None).unwrap(), Level::INFO);
        assert_eq!(parse_log_level(Some("DEBUG")).unwrap(), Level::DEBUG);
        assert_eq!(parse_log_level(Some(" warn ")).unwrap(), Level::WARN);
        assert!(parse_log_level(Some("verbose")).is_err());
    }

    #[test]
    fn silent_caps_verbosity_at_warn() {
        assert_eq!(effective_level(Level::DEBUG, true), Level::WARN);
        assert_eq!(effective_level(Level::INFO, true), Level::WARN);
        assert_eq!(effective_level(Level::ERROR, true), Level::ERROR);
        assert_eq!(effective_level(Level::DEBUG, false), Level::DEBUG);
    }

    #[test]
    fn log_file_is_appended_to() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ipsetter.log");
        std::fs::write(&path, "earlier run\n").unwrap();

        let mut file = open_log_file(&path).unwrap();
        writeln!(file, "this run").unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "earlier run\nthis run\n"
        );
    }

    #[tokio::test]
    async fn unusable_state_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();

        assert!(open_state_store(None).await.is_none());
        // A directory cannot be read as a state file
        assert!(open_state_store(Some(dir.path())).await.is_none());
        assert!(open_state_store(Some(&dir.path().join("state.json"))).await.is_some());
    }

    #[test]
    fn exit_codes_match_their_meaning() {
        assert_eq!(IpsetterExitCode::Success as u8, 0);
        assert_eq!(IpsetterExitCode::ConfigError as u8, 1);
        assert_eq!(IpsetterExitCode::RuntimeError as u8, 2);
    }
}

mod config;

use std::fmt;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use calnow_core::{CalNowError, CalNowResult, CalendarSource, Verdict, scan};
use calnow_provider_caldav::CalDavSource;
use chrono::{DateTime, Local, TimeZone};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::{DEFAULT_TIMEOUT_SECS, Settings};

/// Exit status when an event covers now.
const EXIT_BUSY: u8 = 0;
/// Exit status when nothing covers now.
const EXIT_FREE: u8 = 1;
const EXIT_CONFIG: u8 = 2;
const EXIT_FAILURE: u8 = 3;

#[derive(Parser)]
#[command(name = "calnow")]
#[command(about = "Exit 0 if a calendar event is happening right now, 1 if not")]
struct Cli {
    /// Print debug messages
    #[arg(short, long, visible_alias = "verbose")]
    debug: bool,

    /// CalDAV user name
    #[arg(long, env = "CALNOW_USER")]
    user: Option<String>,

    /// CalDAV server URL
    #[arg(long, env = "CALNOW_URL")]
    url: Option<String>,

    /// CalDAV password
    #[arg(long, env = "CALNOW_PASS", hide_env_values = true)]
    password: Option<String>,

    /// Give up after this many seconds
    #[arg(long, env = "CALNOW_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::new(cli.user, cli.url, cli.password, cli.debug, cli.timeout) {
        Ok(settings) => settings,
        Err(err) => return fail(err.into()),
    };

    init_tracing(&settings);

    match run(&settings).await {
        Ok(Verdict::Busy(found)) => {
            debug!(
                calendar = %found.calendar,
                summary = found.summary.as_deref().unwrap_or("(No title)"),
                path = %found.resolution,
                "Event in progress"
            );
            ExitCode::from(EXIT_BUSY)
        }
        Ok(Verdict::Free) => ExitCode::from(EXIT_FREE),
        Err(err) => fail(err),
    }
}

async fn run(settings: &Settings) -> Result<Verdict<Local>> {
    let source = CalDavSource::connect(&settings.url, &settings.user, &settings.password)?;
    let now = Local::now();

    Ok(scan_within(&source, &now, settings.timeout).await?)
}

/// Discovery and scan under one deadline.
async fn scan_within<S, Tz>(source: &S, now: &DateTime<Tz>, timeout: Duration) -> CalNowResult<Verdict<Tz>>
where
    S: CalendarSource,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    tokio::time::timeout(timeout, scan(source, now))
        .await
        .map_err(|_| CalNowError::Timeout(timeout.as_secs()))?
}

/// Debug level for calnow's own crates with `--debug`, errors only otherwise.
/// `RUST_LOG` wins over both.
fn init_tracing(settings: &Settings) {
    let default_directive = if settings.verbose {
        "calnow=debug,calnow_core=debug,calnow_provider_caldav=debug"
    } else {
        "error"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn fail(err: anyhow::Error) -> ExitCode {
    eprintln!("calnow: {:#}", err);
    ExitCode::from(exit_status(&err))
}

fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<CalNowError>() {
        Some(CalNowError::Config(_)) => EXIT_CONFIG,
        _ => EXIT_FAILURE,
    }
}

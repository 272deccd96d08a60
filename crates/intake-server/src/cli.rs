//! Command line

use crate::config::{Backend, LogFormat, Overrides};
use clap::{value_parser, Arg, ArgMatches, Command};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

/// What the binary was asked to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Run the webhook
    Serve,
    /// Bring the header row up to date and exit
    Migrate,
}

/// Parsed command line
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Selected subcommand
    pub mode: Mode,
    /// Config file, if any
    pub config_path: Option<PathBuf>,
    /// Flag and environment overrides
    pub overrides: Overrides,
}

/// The `intake-server` command
#[must_use]
pub fn command() -> Command {
    Command::new("intake-server")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Records form submissions as spreadsheet rows")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .env("INTAKE_CONFIG")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML config file"),
        )
        .arg(
            Arg::new("bind")
                .long("bind")
                .env("INTAKE_BIND")
                .global(true)
                .value_parser(value_parser!(SocketAddr))
                .help("Listen address [default: 127.0.0.1:8080]"),
        )
        .arg(
            Arg::new("spreadsheet-id")
                .long("spreadsheet-id")
                .env("INTAKE_SPREADSHEET_ID")
                .global(true)
                .help("Id of the target spreadsheet, from its URL"),
        )
        .arg(
            Arg::new("sheet-title")
                .long("sheet-title")
                .env("INTAKE_SHEET_TITLE")
                .global(true)
                .help("Worksheet receiving responses"),
        )
        .arg(
            Arg::new("backend")
                .long("backend")
                .env("INTAKE_BACKEND")
                .global(true)
                .value_parser(Backend::from_str)
                .help("Storage backend: google-sheets or memory"),
        )
        .arg(
            Arg::new("access-token")
                .long("access-token")
                .env("INTAKE_ACCESS_TOKEN")
                .hide_env_values(true)
                .global(true)
                .help("OAuth bearer token for the Sheets API"),
        )
        .arg(
            Arg::new("service-account-key")
                .long("service-account-key")
                .env("INTAKE_SERVICE_ACCOUNT_KEY")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Service account JSON key file"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .env("INTAKE_LOG_FORMAT")
                .global(true)
                .value_parser(LogFormat::from_str)
                .help("Log output: text or json"),
        )
        .subcommand(Command::new("serve").about("Run the webhook (default)"))
        .subcommand(Command::new("migrate").about("Bring the header row up to date and exit"))
}

impl Invocation {
    /// Extract the invocation from parsed arguments
    #[must_use]
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let (mode, args) = match matches.subcommand() {
            Some(("migrate", args)) => (Mode::Migrate, args),
            Some((_, args)) => (Mode::Serve, args),
            None => (Mode::Serve, matches),
        };

        Self {
            mode,
            config_path: args.get_one::<PathBuf>("config").cloned(),
            overrides: Overrides {
                bind: args.get_one::<SocketAddr>("bind").copied(),
                spreadsheet_id: args.get_one::<String>("spreadsheet-id").cloned(),
                sheet_title: args.get_one::<String>("sheet-title").cloned(),
                backend: args.get_one::<Backend>("backend").copied(),
                access_token: args.get_one::<String>("access-token").cloned(),
                service_account_key: args.get_one::<PathBuf>("service-account-key").cloned(),
                log_format: args.get_one::<LogFormat>("log-format").copied(),
            },
        }
    }
}

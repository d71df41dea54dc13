//! Command-line driver for `daynotes_core`.
//!
//! # Responsibility
//! - Run one daily-notes use case against a configured vault directory.
//! - Keep output line-oriented so it can be piped and diffed.
//!
//! # Invariants
//! - Exit code is `0` on success and `1` on any error, with the message on stderr.
//! - Every color mutation is durable before the command reports success.

use chrono::NaiveDate;
use daynotes_core::{
    init_logging, load_config, BlobError, BlobStore, ConfigError, CoreConfig, DailyNotesService, DailyView,
    DayEntry, FsVault, LoggingError, ServiceError, VaultError,
};
use log::info;
use std::env;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::process::ExitCode;

const USAGE: &str = "usage: daynotes_cli [--config PATH] <command>

commands:
  ping                    print core health and version
  day [YYYY-MM-DD]        list notes created/updated on a day (default: today)
  color-get PATH          print the color of a note
  color-set PATH COLOR    set the color of a note
  color-rm PATH           clear the color of a note
  palette                 print the configured palette";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Ping,
    Day(Option<NaiveDate>),
    ColorGet(String),
    ColorSet(String, String),
    ColorRemove(String),
    Palette,
}

#[derive(Debug, PartialEq, Eq)]
struct Invocation {
    config_path: Option<PathBuf>,
    command: Command,
}

#[derive(Debug)]
enum CliError {
    Usage(String),
    Config(ConfigError),
    Logging(LoggingError),
    Blob(BlobError),
    Vault(VaultError),
    Service(ServiceError),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Usage(message) => write!(f, "{message}\n\n{USAGE}"),
            Self::Config(err) => write!(f, "config: {err}"),
            Self::Logging(err) => write!(f, "logging: {err}"),
            Self::Blob(err) => write!(f, "data store: {err}"),
            Self::Vault(err) => write!(f, "vault: {err}"),
            Self::Service(err) => write!(f, "{err}"),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<LoggingError> for CliError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<BlobError> for CliError {
    fn from(value: BlobError) -> Self {
        Self::Blob(value)
    }
}

impl From<VaultError> for CliError {
    fn from(value: VaultError) -> Self {
        Self::Vault(value)
    }
}

impl From<ServiceError> for CliError {
    fn from(value: ServiceError) -> Self {
        Self::Service(value)
    }
}

fn main() -> ExitCode {
    match run(env::args().skip(1).collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("daynotes_cli: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Vec<String>) -> Result<(), CliError> {
    let invocation = parse_args(args)?;
    if invocation.command == Command::Ping {
        println!("daynotes_core ping={}", daynotes_core::ping());
        println!("daynotes_core version={}", daynotes_core::core_version());
        return Ok(());
    }

    let config = load_config(invocation.config_path.as_deref())?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, &log_dir.to_string_lossy())?;
    }
    let mut service = open_service(&config)?;

    match invocation.command {
        Command::Ping => {}
        Command::Day(day) => {
            let view = match day {
                Some(day) => service.select_day(day)?,
                None => service.refresh()?,
            };
            print_view(&view);
        }
        Command::ColorGet(path) => match service.get_color(&path) {
            Some(color) => println!("{color}"),
            None => println!("(none)"),
        },
        Command::ColorSet(path, color) => {
            service.set_color(&path, &color)?;
            println!("{path} -> {color}");
        }
        Command::ColorRemove(path) => {
            if service.remove_color(&path)? {
                println!("{path} -> (none)");
            } else {
                println!("{path} had no color");
            }
        }
        Command::Palette => {
            for (index, color) in service.settings().palette.iter().enumerate() {
                println!("{index}\t{color}");
            }
        }
    }
    Ok(())
}

fn open_service(
    config: &CoreConfig,
) -> Result<DailyNotesService<FsVault, Box<dyn BlobStore + Send>>, CliError> {
    let vault = FsVault::with_pattern(&config.vault_root, &config.include_pattern)?;
    let blobs = config.open_blob_store()?;
    let service =
        DailyNotesService::open_with_keys(vault, blobs, &config.data_key, &config.settings_key)?;
    info!(
        "event=cli_open module=cli status=ok backend={:?}",
        config.backend
    );
    Ok(service)
}

fn parse_args(args: Vec<String>) -> Result<Invocation, CliError> {
    let mut config_path = None;
    let mut rest = Vec::new();
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            let value = iter
                .next()
                .ok_or_else(|| CliError::Usage("--config requires a path".to_string()))?;
            config_path = Some(PathBuf::from(value));
        } else {
            rest.push(arg);
        }
    }

    let mut rest = rest.into_iter();
    let name = rest
        .next()
        .ok_or_else(|| CliError::Usage("missing command".to_string()))?;
    let operands: Vec<String> = rest.collect();
    let command = match (name.as_str(), operands.as_slice()) {
        ("ping", []) => Command::Ping,
        ("day", []) => Command::Day(None),
        ("day", [date]) => Command::Day(Some(parse_day(date)?)),
        ("color-get", [path]) => Command::ColorGet(path.clone()),
        ("color-set", [path, color]) => Command::ColorSet(path.clone(), color.clone()),
        ("color-rm", [path]) => Command::ColorRemove(path.clone()),
        ("palette", []) => Command::Palette,
        ("ping" | "day" | "color-get" | "color-set" | "color-rm" | "palette", _) => {
            return Err(CliError::Usage(format!(
                "wrong number of arguments for `{name}`"
            )))
        }
        _ => return Err(CliError::Usage(format!("unknown command `{name}`"))),
    };
    Ok(Invocation {
        config_path,
        command,
    })
}

fn parse_day(raw: &str) -> Result<NaiveDate, CliError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| CliError::Usage(format!("invalid date `{raw}`, expected YYYY-MM-DD")))
}

fn print_view(view: &DailyView) {
    println!("{}", view.day.format("%Y-%m-%d"));
    print_section("created", &view.created);
    print_section("updated", &view.updated);
}

fn print_section(label: &str, entries: &[DayEntry]) {
    println!("{label} ({})", entries.len());
    for entry in entries {
        println!(
            "  {}\t{}\t{}",
            entry.color.as_deref().unwrap_or("-"),
            entry.title,
            entry.path
        );
    }
}

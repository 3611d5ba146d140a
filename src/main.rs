//! `harpia`: command-line control of a HARPIA pump-probe spectrometer.
//!
//! Exit codes: 0 on success, 2 when a command was rejected before reaching
//! the instrument, 1 for instrument, network and fatal failures.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use harpia_daq::config::{HarpiaConfig, DEFAULT_CONFIG_PATH};
use harpia_daq::instrument::{DelayValue, Harpia, ShutterTarget};
use harpia_daq::notifier::{Fatal, Level, Notifier};
use harpia_daq::{tracing_setup, HarpiaError, NotifyError};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

const EXIT_FAILURE: u8 = 1;
const EXIT_PRECONDITION: u8 = 2;

/// Control a HARPIA spectrometer over its HTTP API
#[derive(Parser, Debug)]
#[command(name = "harpia", version, about, long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Instrument base URL, overriding the configuration
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Deliver notifications through the configured channel
    #[arg(long, global = true)]
    notify: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open or close shutters
    Shutter {
        #[command(subcommand)]
        action: ShutterCommand,
    },
    /// Move the delay line
    Delay {
        #[command(subcommand)]
        action: DelayCommand,
    },
    /// Read pump-probe spectra
    Spectrum {
        #[command(subcommand)]
        action: SpectrumCommand,
    },
    /// Set the number of spectra averaged per acquisition
    SpectraPerAcquisition {
        /// Whole number greater than zero
        count: String,
    },
    /// Send an operator notification
    Notify {
        /// Severity
        #[arg(value_enum)]
        level: LevelArg,
        /// Message text
        message: String,
    },
    /// Send a PNG or JPEG image to the operator
    NotifyImage {
        /// Image file
        path: PathBuf,
    },
    /// Inspect the effective configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ShutterCommand {
    /// Open a shutter (pump, probe or gate)
    Open { name: String },
    /// Close a shutter, or all of them
    Close {
        #[arg(default_value = "all")]
        target: String,
    },
}

#[derive(Subcommand, Debug)]
enum DelayCommand {
    /// Move to a target delay
    Set { value: String },
}

#[derive(Subcommand, Debug)]
enum SpectrumCommand {
    /// Read the current pump-probe spectrum
    Read {
        /// Delay to read at
        #[arg(long)]
        delay: Option<String>,
        /// Write the spectrum JSON here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print the merged configuration as TOML
    Show,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum LevelArg {
    Log,
    Info,
    Warning,
    Error,
    Fatal,
}

impl From<LevelArg> for Level {
    fn from(level: LevelArg) -> Self {
        match level {
            LevelArg::Log => Level::Log,
            LevelArg::Info => Level::Info,
            LevelArg::Warning => Level::Warning,
            LevelArg::Error => Level::Error,
            LevelArg::Fatal => Level::Fatal,
        }
    }
}

impl Command {
    fn is_notification(&self) -> bool {
        matches!(self, Command::Notify { .. } | Command::NotifyImage { .. })
    }
}

fn load_config(cli: &Cli) -> Result<HarpiaConfig> {
    let mut config = HarpiaConfig::load_from(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    if let Some(base_url) = &cli.base_url {
        config.instrument.base_url.clone_from(base_url);
        config.validate()?;
    }
    Ok(config)
}

fn write_json(value: &serde_json::Value, output: Option<&Path>) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => std::fs::write(path, text)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{text}"),
    }
    Ok(())
}

fn parse_spectra_count(count: &str) -> Result<f64, HarpiaError> {
    count
        .trim()
        .parse::<f64>()
        .map_err(|_| HarpiaError::InvalidSpectraCount(format!("'{count}' is not a number")))
}

fn parse_delay(text: &str) -> DelayValue {
    match text.parse() {
        Ok(delay) => delay,
        Err(never) => match never {},
    }
}

fn run(command: &Command, config: &HarpiaConfig, notifier: &mut Notifier) -> Result<()> {
    match command {
        Command::Shutter { action } => {
            let harpia = Harpia::from_config(&config.instrument)?;
            match action {
                ShutterCommand::Open { name } => harpia.shutters().open_named(name)?,
                ShutterCommand::Close { target } => {
                    let target: ShutterTarget = target.parse()?;
                    harpia.shutters().close(target)?;
                }
            }
        }
        Command::Delay {
            action: DelayCommand::Set { value },
        } => {
            let harpia = Harpia::from_config(&config.instrument)?;
            harpia.delay_line().set(parse_delay(value))?;
        }
        Command::Spectrum {
            action: SpectrumCommand::Read { delay, output },
        } => {
            let delay = delay.as_deref().map(parse_delay);
            let harpia = Harpia::from_config(&config.instrument)?;
            let spectrum = harpia.spectrometer().read_spectrum(delay)?;
            write_json(&spectrum, output.as_deref())?;
        }
        Command::SpectraPerAcquisition { count } => {
            let count = parse_spectra_count(count)?;
            let harpia = Harpia::from_config(&config.instrument)?;
            harpia.spectrometer().set_spectra_per_acquisition(count)?;
        }
        Command::Notify { level, message } => match Level::from(*level) {
            Level::Fatal => return Err(notifier.fatal(message, None).into()),
            level => notifier.notify(level, message)?,
        },
        Command::NotifyImage { path } => notifier.image(path)?,
        Command::Config {
            action: ConfigCommand::Show,
        } => print!("{}", config.to_toml()?),
    }
    Ok(())
}

/// Map a failed command to its exit code, notifying the operator where the
/// failure came from the instrument or the network.
fn report(err: &anyhow::Error, notifier: &mut Notifier) -> u8 {
    if let Some(fatal) = err.downcast_ref::<Fatal>() {
        if let Some(delivery) = fatal.delivery_error() {
            eprintln!("Fatal notification was not delivered: {delivery}");
        }
        return EXIT_FAILURE;
    }

    let precondition = err
        .downcast_ref::<HarpiaError>()
        .is_some_and(HarpiaError::is_precondition)
        || err
            .downcast_ref::<NotifyError>()
            .is_some_and(NotifyError::is_precondition);
    if precondition {
        eprintln!("Error: {err}");
        return EXIT_PRECONDITION;
    }

    error!(error = %format!("{err:#}"), "Command failed");
    eprintln!("Error: {err:#}");
    if err.downcast_ref::<NotifyError>().is_none() {
        if let Err(e) = notifier.error(&format!("{err:#}")) {
            eprintln!("Failed to notify operator: {e}");
        }
    }
    EXIT_FAILURE
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    if let Err(e) = tracing_setup::init_from_config(&config) {
        eprintln!("Error: {e}");
        return ExitCode::from(EXIT_FAILURE);
    }

    let deliver = cli.notify || cli.command.is_notification();
    let mut notifier = if deliver {
        match Notifier::from_config(&config.notifier) {
            Ok(notifier) => notifier,
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::from(EXIT_FAILURE);
            }
        }
    } else {
        Notifier::silent()
    };

    info!(
        app = %config.application.name,
        base_url = %config.instrument.base_url,
        "Starting"
    );

    let code = match run(&cli.command, &config, &mut notifier) {
        Ok(()) => 0,
        Err(e) => report(&e, &mut notifier),
    };

    info!(summary = %notifier.summary(), "Notification summary");
    ExitCode::from(code)
}

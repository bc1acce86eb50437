mod status_spinner;
mod auth;
mod preferences;
mod session;

use thiserror::Error;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use log::{LevelFilter, SetLoggerError, debug, error};
use indicatif_log_bridge::LogWrapper;
use indicatif::MultiProgress;
use directories::BaseDirs;
use std::{io::stdout, path::PathBuf, process::ExitCode};
use crate::{credential_storage::{CredentialStorageError, CredentialStorageNetrc}, http_client::{HttpClient, HttpClientError}, preferences::{DataStore, PreferencesError}};

/// Hazy toolbelt
#[derive(Parser, Debug)]
#[command(version, about, long_about = "Hazy toolbelt: log in to the Hazy web service and manage the access token stored in your .netrc file.", name = "hazy")]
struct Args {
    /// Maximum logging level
    #[arg(short, long, global = true)]
    log_level: Option<LevelFilter>,

    /// Base URL of the Hazy web service
    #[arg(long, env = "HAZY_API_URL", global = true, value_name = "URL")]
    api_url: Option<String>,

    /// Credential file to use instead of ~/.netrc
    #[arg(long, env = "NETRC", global = true, value_name = "PATH")]
    netrc: Option<PathBuf>,

    #[command(subcommand)]
    command: Command
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(flatten)]
    Auth(auth::Command),
    /// Manage CLI preferences
    #[command(alias = "preferences")]
    Config {
        #[command(subcommand)]
        command: Option<preferences::Command>
    },
    /// Generate shell completion files
    Completion {
        shell: Shell
    }
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Preferences store error: {0}")]
    PreferencesError(#[from] PreferencesError),
    #[error("API error: {0}")]
    ApiError(#[from] HttpClientError),
    #[error("Credential storage error: {0}")]
    CredentialStorageError(#[from] CredentialStorageError),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Input error: {0}")]
    InputError(#[from] dialoguer::Error),
    #[error("You are not currently logged in. Run `hazy login` first")]
    NotLoggedIn,
    #[error("{0} is not implemented yet")]
    NotImplemented(&'static str),
    #[error("Invalid preference value: {0}")]
    InvalidPreference(String),
    #[error("Could not determine your home directory")]
    NoHomeDirectory
}

type Result<T = ()> = std::result::Result<T, CliError>;

fn setup_logging(args: &Args) -> std::result::Result<MultiProgress, SetLoggerError> {
    let mut logger = env_logger::Builder::from_default_env();

    if let Some(level) = args.log_level {
        logger.filter_level(level);
    }

    let multi = MultiProgress::new();
    let logger = logger.build();
    let log_filter = logger.filter();
    LogWrapper::new(multi.clone(), logger).try_init()?;
    log::set_max_level(log_filter);

    Ok(multi)
}

/// `--netrc`/`NETRC` wins, then `~/.netrc`
fn netrc_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".netrc"))
            .ok_or(CliError::NoHomeDirectory)
    }
}

async fn run_internal(multi: MultiProgress, args: Args) -> Result {
    let Args { api_url, netrc, command, .. } = args;
    match command {
        Command::Completion { shell } => {
            let mut command = Args::command();
            let name = command.get_name().to_string();
            generate(shell, &mut command, name, &mut stdout());
        },
        Command::Config { command } => {
            let prefs = DataStore::new().await?;
            preferences::handle(command, &prefs, multi).await?
        },
        Command::Auth(command) => {
            let prefs = DataStore::new().await?;
            let (api_url, machine) = {
                let lock = prefs.read()?;
                let api_url = api_url.unwrap_or_else(|| lock.api_url().to_string());
                (api_url, lock.machine().to_string())
            };
            let netrc = netrc_path(netrc)?;
            debug!("Using {} with credentials for {} in {}", api_url, machine, netrc.display());

            let client = HttpClient::init(api_url);
            let cred_storage = CredentialStorageNetrc::new(netrc, machine);
            auth::handle(command, &client, &cred_storage, &session::TerminalPrompter, multi).await?
        }
    }

    Ok(())
}

pub async fn run() -> ExitCode {
    let args = Args::parse();
    let multi = match setup_logging(&args) {
        Ok(multi) => multi,
        Err(err) => {
            eprintln!("Could not initialize logging: {}", err);
            return ExitCode::from(1);
        }
    };

    if let Err(err) = run_internal(multi, args).await {
        error!("{}", err);
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

use clap::Subcommand;
use console::style;
use indicatif::MultiProgress;
use log::{debug, info};
use super::{CliError, Result, session::{Credential, Prompter, SessionInput}, status_spinner::StatusSpinner};
use crate::{credential_storage::{CredentialStorage, HazyCredentials}, duration::{ExpiresIn, DEFAULT_EXPIRES_IN}, http_client::{HttpClient, HttpClientError}};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in with your Hazy credentials
    #[command(long_about = "Log in with your Hazy credentials.\n\n\
                            This will prompt for your email and password and store the resulting\n\
                            access token in your .netrc file. Alternatively, provide --email and\n\
                            --token directly, which is useful for automated scripts.")]
    Login {
        /// Your email address. Will prompt if not given
        #[arg(short, long, value_name = "ADDRESS")]
        email: Option<String>,
        /// How long you want to stay logged in for, e.g. "2 weeks" or "1d 12h"
        #[arg(long, value_name = "DURATION", default_value = DEFAULT_EXPIRES_IN)]
        expires_in: ExpiresIn,
        /// Your API access token
        #[arg(long, value_name = "ACCESS_TOKEN")]
        token: Option<String>
    },
    /// Log out and clear local toolbelt credentials
    Logout,
    /// Display the current access token
    Token,
    /// Display the currently logged in user
    Whoami,
    /// Open the online documentation on authentication
    Docs
}

/// Authenticate and store the issued token, replacing any previous login
pub async fn login(input: SessionInput, client: &HttpClient, cred_storage: &dyn CredentialStorage) -> Result<HazyCredentials> {
    debug!("Requested session lifetime: {:?}", input.expires_in.as_duration());

    let password = match input.credential {
        Credential::Password(password) => password,
        Credential::Token(token) => {
            debug!("Token login requested with a {} character token", token.len());
            return Err(CliError::NotImplemented("Logging in with an access token"));
        }
    };

    let session = client.authenticate(&input.email, &password).await?;
    if cred_storage.logged_in().await? {
        info!("Replacing stored credentials");
    }

    let creds = HazyCredentials {
        login: session.email,
        token: session.token
    };
    cred_storage.store_credentials(&creds).await?;

    Ok(creds)
}

pub async fn current_credentials(cred_storage: &dyn CredentialStorage) -> Result<HazyCredentials> {
    cred_storage.get_credentials().await?.ok_or(CliError::NotLoggedIn)
}

pub async fn handle(
    command: Command,
    client: &HttpClient,
    cred_storage: &dyn CredentialStorage,
    prompter: &dyn Prompter,
    multi: MultiProgress
) -> Result {
    match command {
        Command::Login { email, expires_in, token } => {
            let input = SessionInput::resolve(email, expires_in, token, prompter)?;
            let status = StatusSpinner::new("Logging in...", &multi);

            match login(input, client, cred_storage).await {
                Ok(creds) => {
                    status.finish(
                        &format!("Logged in as {}", style(creds.login).bold()),
                        true
                    );
                },
                Err(CliError::ApiError(HttpClientError::AuthenticationFailed)) => {
                    status.finish("Authentication error", false);
                },
                Err(e) => {
                    status.finish("Login failed", false);
                    return Err(e);
                }
            }
        },
        Command::Logout => {
            let status = StatusSpinner::new("Logging out...", &multi);
            cred_storage.clear_credentials().await?;
            status.finish("Logged out", true);
        },
        Command::Token => {
            // plain output so it can be captured by scripts
            println!("{}", current_credentials(cred_storage).await?.token);
        },
        Command::Whoami => {
            println!("{}", current_credentials(cred_storage).await?.login);
        },
        Command::Docs => return Err(CliError::NotImplemented("Opening the documentation"))
    }

    Ok(())
}

use dialoguer::{Input, Password, theme::ColorfulTheme};

use crate::duration::ExpiresIn;

/// how the user proves who they are
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    Password(String),
    Token(String)
}

/// Everything `login` needs, resolved from flags and prompts up front
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInput {
    pub email: String,
    pub credential: Credential,
    /// accepted and validated, but the service is not told about it yet
    pub expires_in: ExpiresIn
}

pub trait Prompter {
    fn email(&self) -> Result<String, dialoguer::Error>;
    fn password(&self) -> Result<String, dialoguer::Error>;
}

pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn email(&self) -> Result<String, dialoguer::Error> {
        Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Email")
            .interact_text()
    }

    fn password(&self) -> Result<String, dialoguer::Error> {
        Password::with_theme(&ColorfulTheme::default())
            .with_prompt("Password")
            .interact()
    }
}

impl SessionInput {
    /// Fill in whatever the flags left out. The password is only asked for
    /// when no token was given
    pub fn resolve(
        email: Option<String>,
        expires_in: ExpiresIn,
        token: Option<String>,
        prompter: &dyn Prompter
    ) -> Result<Self, dialoguer::Error> {
        let email = match email {
            Some(email) => email,
            None => prompter.email()?
        };
        let credential = match token {
            Some(token) => Credential::Token(token),
            None => Credential::Password(prompter.password()?)
        };

        Ok(Self { email, credential, expires_in })
    }
}

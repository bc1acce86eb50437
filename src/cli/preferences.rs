use clap::{Subcommand, ValueEnum};
use dialoguer::{Input, theme::ColorfulTheme};
use indicatif::MultiProgress;
use console::{user_attended, style};
use crate::{preferences::{DataStore, Preferences}, cli::status_spinner::StatusSpinner};
use super::Result;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read a preference key
    Get {
        /// Preference key to retrieve
        #[arg(value_enum)]
        key: PrefKey
    },
    /// Set a preference key. Will prompt for value
    Set {
        /// Preference key to set
        #[command(subcommand)]
        key: SetValues
    },
    /// Reset a preference key to its default
    Unset {
        #[arg(value_enum)]
        key: PrefKey
    }
}

#[derive(Subcommand, Debug)]
pub enum SetValues {
    /// Base URL of the Hazy web service
    ApiUrl {
        value: Option<String>
    },
    /// Machine name the access token is stored under in .netrc
    Machine {
        value: Option<String>
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum PrefKey {
    /// Base URL of the Hazy web service
    ApiUrl,
    /// Machine name the access token is stored under in .netrc
    Machine
}

impl PrefKey {
    fn label(self) -> &'static str {
        match self {
            PrefKey::ApiUrl => "API URL:",
            PrefKey::Machine => "Machine:"
        }
    }

    fn value(self, prefs: &Preferences) -> &str {
        match self {
            PrefKey::ApiUrl => prefs.api_url(),
            PrefKey::Machine => prefs.machine()
        }
    }

    fn is_default(self, prefs: &Preferences) -> bool {
        match self {
            PrefKey::ApiUrl => prefs.api_url.is_none(),
            PrefKey::Machine => prefs.machine.is_none()
        }
    }
}

fn validate_api_url(input: &String) -> std::result::Result<(), &'static str> {
    if input.starts_with("http://") || input.starts_with("https://") {
        Ok(())
    } else {
        Err("URL must start with http:// or https://")
    }
}

fn validate_machine(input: &String) -> std::result::Result<(), &'static str> {
    if input.is_empty() || input.chars().any(char::is_whitespace) {
        Err("machine name may not be empty or contain spaces")
    } else {
        Ok(())
    }
}

/// apply a `set` to the preferences, prompting for the value if needed
fn apply_set(prefs: &mut Preferences, key: SetValues) -> Result {
    match key {
        SetValues::ApiUrl { value } => {
            let input = match value {
                Some(value) => value,
                None => Input::with_theme(&ColorfulTheme::default())
                    .with_prompt("Enter the Hazy API URL")
                    .with_initial_text(prefs.api_url())
                    .validate_with(validate_api_url)
                    .interact_text()?
            };
            validate_api_url(&input).map_err(|msg| super::CliError::InvalidPreference(msg.into()))?;
            prefs.api_url = Some(input);
        },
        SetValues::Machine { value } => {
            let input = match value {
                Some(value) => value,
                None => Input::with_theme(&ColorfulTheme::default())
                    .with_prompt("Enter the .netrc machine name")
                    .with_initial_text(prefs.machine())
                    .validate_with(validate_machine)
                    .interact_text()?
            };
            validate_machine(&input).map_err(|msg| super::CliError::InvalidPreference(msg.into()))?;
            prefs.machine = Some(input);
        }
    }
    Ok(())
}

fn print_value(key: PrefKey, prefs: &Preferences) {
    let value = key.value(prefs);
    if user_attended() {
        let suffix = if key.is_default(prefs) { style(" (default)").dim().to_string() } else { String::new() };
        println!("{} {}{}", style(key.label()).dim(), style(value).bright().cyan().bold(), suffix);
    } else {
        // just print the value without formatting
        println!("{}", value);
    }
}

pub async fn handle(command: Option<Command>, prefs: &DataStore, multi: MultiProgress) -> Result {
    match command {
        Some(Command::Get { key }) => print_value(key, &*prefs.read()?),
        Some(Command::Set { key }) => {
            apply_set(&mut *prefs.write()?, key)?;
            let status = StatusSpinner::new("Saving...", &multi);
            prefs.save().await?;
            status.finish("Saved", true);
        },
        Some(Command::Unset { key }) => {
            {
                let mut lock = prefs.write()?;
                match key {
                    PrefKey::ApiUrl => lock.api_url = None,
                    PrefKey::Machine => lock.machine = None
                }
            }
            let status = StatusSpinner::new("Saving...", &multi);
            prefs.save().await?;
            status.finish("Reset to default", true);
        },
        None => {
            // list all values
            let lock = prefs.read()?;
            println!("{}", style("Preferences:").green().bold().bright());
            for key in [PrefKey::ApiUrl, PrefKey::Machine] {
                print_value(key, &lock);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CliError;

    fn hidden() -> MultiProgress {
        MultiProgress::with_draw_target(indicatif::ProgressDrawTarget::hidden())
    }

    #[tokio::test]
    async fn set_get_and_unset_through_handler() {
        let dir = tempfile::TempDir::new().unwrap();
        let prefs = DataStore::open(dir.path().to_path_buf()).await.unwrap();

        handle(Some(Command::Set {
            key: SetValues::ApiUrl { value: Some("https://hazy.example.com".into()) }
        }), &prefs, hidden()).await.unwrap();
        handle(Some(Command::Get { key: PrefKey::ApiUrl }), &prefs, hidden()).await.unwrap();
        handle(None, &prefs, hidden()).await.unwrap();

        let reloaded = DataStore::open(dir.path().to_path_buf()).await.unwrap();
        assert_eq!(reloaded.read().unwrap().api_url(), "https://hazy.example.com");

        handle(Some(Command::Unset { key: PrefKey::ApiUrl }), &prefs, hidden()).await.unwrap();
        let reloaded = DataStore::open(dir.path().to_path_buf()).await.unwrap();
        assert_eq!(*reloaded.read().unwrap(), Preferences::default());
    }

    #[test]
    fn set_with_value_does_not_prompt() {
        let mut prefs = Preferences::default();
        apply_set(&mut prefs, SetValues::ApiUrl { value: Some("https://hazy.example.com".into()) }).unwrap();
        apply_set(&mut prefs, SetValues::Machine { value: Some("hazy.example.com".into()) }).unwrap();

        assert_eq!(prefs.api_url(), "https://hazy.example.com");
        assert_eq!(prefs.machine(), "hazy.example.com");
        assert!(!PrefKey::ApiUrl.is_default(&prefs));
    }

    #[test]
    fn set_rejects_invalid_values() {
        let mut prefs = Preferences::default();
        assert!(matches!(
            apply_set(&mut prefs, SetValues::ApiUrl { value: Some("localhost:4002".into()) }),
            Err(CliError::InvalidPreference(_))
        ));
        assert!(matches!(
            apply_set(&mut prefs, SetValues::Machine { value: Some("two words".into()) }),
            Err(CliError::InvalidPreference(_))
        ));
        assert_eq!(prefs, Preferences::default());
    }
}

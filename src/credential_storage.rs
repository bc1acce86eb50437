use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use log::debug;

use crate::netrc::{Netrc, NetrcError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HazyCredentials {
    pub login: String,
    pub token: String
}

#[derive(Error, Debug)]
pub enum CredentialStorageError {
    #[error("credential file error: {0}")]
    Netrc(#[from] NetrcError)
}

type Result<T> = std::result::Result<T, CredentialStorageError>;

#[async_trait(?Send)]
pub trait CredentialStorage {
    async fn store_credentials(&self, creds: &HazyCredentials) -> Result<()>;
    async fn get_credentials(&self) -> Result<Option<HazyCredentials>>;
    async fn clear_credentials(&self) -> Result<()>;

    async fn logged_in(&self) -> Result<bool> {
        Ok(self.get_credentials().await?.is_some())
    }
}

/// Stores the access token for one machine in a netrc file
pub struct CredentialStorageNetrc {
    path: PathBuf,
    machine: String
}

impl CredentialStorageNetrc {
    pub fn new(path: impl Into<PathBuf>, machine: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            machine: machine.into()
        }
    }
}

#[async_trait(?Send)]
impl CredentialStorage for CredentialStorageNetrc {
    async fn get_credentials(&self) -> Result<Option<HazyCredentials>> {
        debug!("Loading credentials for {}", self.machine);
        let netrc = Netrc::load(&self.path).await?;

        Ok(netrc.get(&self.machine).map(|entry| HazyCredentials {
            login: entry.login.clone(),
            token: entry.secret.clone()
        }))
    }

    async fn clear_credentials(&self) -> Result<()> {
        let mut netrc = Netrc::load(&self.path).await?;

        // leave the file untouched when there is nothing to remove
        if netrc.remove(&self.machine).is_some() {
            debug!("Removed {}, {} other machines left", self.machine, netrc.hosts().count());
            netrc.save().await?;
        } else {
            debug!("No credentials stored for {}", self.machine);
        }

        Ok(())
    }

    async fn store_credentials(&self, creds: &HazyCredentials) -> Result<()> {
        debug!("Saving credentials for {} on {}", creds.login, self.machine);
        let mut netrc = Netrc::load(&self.path).await?;
        netrc.set(&self.machine, &creds.login, &creds.token)?;
        netrc.save().await?;

        Ok(())
    }
}

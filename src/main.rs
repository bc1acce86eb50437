mod credential_storage;
mod duration;
mod http_client;
mod netrc;
mod preferences;
mod cli;

use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    cli::run().await
}

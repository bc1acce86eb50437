mod account;

use reqwest::Client;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HttpClientError {
    #[error("HTTP error")]
    Http(#[from] reqwest::Error),

    #[error("Authentication error")]
    AuthenticationFailed,

    #[error("Unexpected or malformed response from Hazy backend: {0}")]
    UnexpectedResponse(&'static str)
}

type Result<T> = std::result::Result<T, HttpClientError>;

pub struct HttpClient {
    client: Client,
    base_url: String
}

impl HttpClient {
    pub fn init(base_url: impl Into<String>) -> Self {
        let client = Client::new();
        Self {
            client,
            base_url: base_url.into()
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        assert_eq!(
            HttpClient::init("http://localhost:4002/").endpoint("/api/v2/auth"),
            "http://localhost:4002/api/v2/auth"
        );
        assert_eq!(
            HttpClient::init("https://hazy.example.com/base").endpoint("/api/v2/auth"),
            "https://hazy.example.com/base/api/v2/auth"
        );
    }
}

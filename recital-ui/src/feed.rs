//! Program feeds
//!
//! Where the program list is read from: a local CSV file, or an HTTP
//! resource serving either CSV or the JSON sequences payload.

use recital_common::config::{ApiConfig, ProgramConfig};
use recital_common::program::parse_program;
use recital_common::{FetchError, LoadError, ParseError, ProgramFormat, ProgramIndex, ProgramItem};
use std::future::Future;
use std::path::PathBuf;
use tracing::debug;

/// Loads the full program, marking the item matching `current`
pub trait ProgramSource {
    fn load(
        &self,
        current: &ProgramIndex,
    ) -> impl Future<Output = Result<Vec<ProgramItem>, LoadError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgramLocation {
    File(PathBuf),
    Url(String),
}

impl ProgramLocation {
    /// `http://` and `https://` sources are URLs, anything else a file path
    pub fn parse(source: &str) -> Self {
        let trimmed = source.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            ProgramLocation::Url(trimmed.to_string())
        } else {
            ProgramLocation::File(PathBuf::from(trimmed))
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProgramFeed {
    location: ProgramLocation,
    format: ProgramFormat,
    http: reqwest::Client,
}

impl ProgramFeed {
    pub fn new(location: ProgramLocation, format: ProgramFormat, http: reqwest::Client) -> Self {
        Self {
            location,
            format,
            http,
        }
    }

    /// Sequences are always read from the API's sequences resource; CSV from
    /// the configured source
    pub fn from_config(program: &ProgramConfig, api: &ApiConfig, http: reqwest::Client) -> Self {
        let location = match program.format {
            ProgramFormat::Sequences => ProgramLocation::Url(api.sequences_url.clone()),
            ProgramFormat::Csv => ProgramLocation::parse(&program.source),
        };
        Self::new(location, program.format, http)
    }

    pub fn location(&self) -> &ProgramLocation {
        &self.location
    }

    async fn fetch_body(&self) -> Result<String, LoadError> {
        let bytes = match &self.location {
            ProgramLocation::File(path) => tokio::fs::read(path).await.map_err(FetchError::Io)?,
            ProgramLocation::Url(url) => {
                let response = self
                    .http
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| FetchError::Network(e.to_string()))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(FetchError::Status {
                        status: status.as_u16(),
                        url: url.clone(),
                    }
                    .into());
                }

                response
                    .bytes()
                    .await
                    .map_err(|e| FetchError::Network(e.to_string()))?
                    .to_vec()
            }
        };

        String::from_utf8(bytes).map_err(|_| ParseError::Encoding.into())
    }
}

impl ProgramSource for ProgramFeed {
    async fn load(&self, current: &ProgramIndex) -> Result<Vec<ProgramItem>, LoadError> {
        let body = self.fetch_body().await?;
        let items = parse_program(self.format, &body, current)?;
        debug!(items = items.len(), current = %current, "Program loaded");
        Ok(items)
    }
}

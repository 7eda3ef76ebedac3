//! Recital API client
//!
//! HTTP transport for the current-program and check-in resources. The two
//! traits are the seams the sync engine, admin client and check-in board are
//! written against, so they can run over this client or over a test double.

use recital_common::api::{CheckinUpdateRequest, CurrentProgramResponse, SetCurrentProgramRequest};
use recital_common::checkin::parse_status;
use recital_common::config::ApiConfig;
use recital_common::{
    time, FetchError, LoadError, MutationError, ParseError, PerformerCheckinRecord, ProgramIndex,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

const USER_AGENT: &str = concat!("recital-ui/", env!("CARGO_PKG_VERSION"));

/// Read and write the current program index
pub trait CurrentIndexApi {
    fn fetch_current_index(
        &self,
    ) -> impl Future<Output = Result<ProgramIndex, LoadError>> + Send;

    fn post_current_index(
        &self,
        index: &ProgramIndex,
    ) -> impl Future<Output = Result<(), MutationError>> + Send;
}

/// Read performer records and push single-flag updates
pub trait CheckinApi {
    fn fetch_checkin_status(
        &self,
    ) -> impl Future<Output = Result<Vec<PerformerCheckinRecord>, LoadError>> + Send;

    /// Returns the server's view of the record when the response carries one
    fn send_checkin_update(
        &self,
        request: &CheckinUpdateRequest,
    ) -> impl Future<Output = Result<Option<PerformerCheckinRecord>, MutationError>> + Send;
}

/// reqwest-backed client for the recital API
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    endpoints: ApiConfig,
}

fn network(e: reqwest::Error) -> FetchError {
    FetchError::Network(e.to_string())
}

impl ApiClient {
    pub fn new(endpoints: ApiConfig, timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(network)?;

        Ok(Self { http, endpoints })
    }

    /// Underlying HTTP client, shared with the program feed
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, LoadError> {
        let response = self.http.get(url).send().await.map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            }
            .into());
        }

        let bytes = response.bytes().await.map_err(network)?;
        serde_json::from_slice(&bytes).map_err(|e| ParseError::Json(e.to_string()).into())
    }

    async fn post_json<B: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<reqwest::Response, MutationError> {
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| MutationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MutationError::Rejected(status.as_u16()));
        }
        Ok(response)
    }
}

impl CurrentIndexApi for ApiClient {
    async fn fetch_current_index(&self) -> Result<ProgramIndex, LoadError> {
        let body: CurrentProgramResponse =
            self.get_json(&self.endpoints.current_program_url).await?;
        Ok(body.index())
    }

    async fn post_current_index(&self, index: &ProgramIndex) -> Result<(), MutationError> {
        let request = SetCurrentProgramRequest::new(index, time::iso_timestamp(time::now()));
        self.post_json(&self.endpoints.current_program_url, &request)
            .await?;

        tracing::info!(index = %index, "Current program posted");
        Ok(())
    }
}

impl CheckinApi for ApiClient {
    async fn fetch_checkin_status(&self) -> Result<Vec<PerformerCheckinRecord>, LoadError> {
        let body: Value = self.get_json(&self.endpoints.checkin_status_url).await?;
        Ok(parse_status(body)?)
    }

    async fn send_checkin_update(
        &self,
        request: &CheckinUpdateRequest,
    ) -> Result<Option<PerformerCheckinRecord>, MutationError> {
        let response = self
            .post_json(&self.endpoints.checkin_update_url, request)
            .await?;

        // The update endpoint may answer with an empty or non-JSON body.
        let text = response.text().await.unwrap_or_default();
        let record = serde_json::from_str::<Value>(&text)
            .ok()
            .filter(|body| {
                body.get("name")
                    .and_then(Value::as_str)
                    .map(|name| !name.is_empty())
                    .unwrap_or(false)
            })
            .map(|body| PerformerCheckinRecord::from_value(&body));

        Ok(record)
    }
}

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::ConnectError;
use crate::components::{Api, SecretStore, StateItem, StateStore};
use crate::config::SidecarConfig;
use crate::error::ApiError;

/// The sidecar answered with a status this client does not expect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("sidecar answered {status}: {body}")]
pub struct UnexpectedStatus {
    pub status: u16,
    pub body: String,
}

/// Direct HTTP client for the sidecar API (`/v1.0/state`, `/v1.0/secrets`).
///
/// One pooled `reqwest::Client` is shared by every call.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base: Url,
}

impl HttpClient {
    /// Fails when `DAPR_HTTP_PORT` was not configured.
    pub fn new(config: &SidecarConfig) -> Result<Self, ConnectError> {
        let address = config.http_base_url()?;
        let base = Url::parse(&address).map_err(|e| ConnectError::InvalidAddress {
            address: address.clone(),
            reason: e.to_string(),
        })?;
        let http = reqwest::Client::builder().build()?;
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// GET a JSON document; 204 and 404 mean "not found".
    async fn fetch<T: DeserializeOwned + Send>(&self, url: Url, what: &str) -> Result<T, ApiError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::internal(e, format!("could not get {what}")))?;

        match response.status() {
            StatusCode::NO_CONTENT | StatusCode::NOT_FOUND => {
                Err(ApiError::not_found(format!("{what} not found")))
            }
            status if status.is_success() => response
                .json::<T>()
                .await
                .map_err(|e| ApiError::internal(e, format!("could not decode {what}"))),
            status => Err(unexpected(status, response, &format!("could not get {what}")).await),
        }
    }
}

async fn unexpected(status: StatusCode, response: reqwest::Response, message: &str) -> ApiError {
    let body = response.text().await.unwrap_or_default();
    ApiError::internal(
        UnexpectedStatus {
            status: status.as_u16(),
            body,
        },
        message,
    )
}

#[async_trait]
impl StateStore for HttpClient {
    async fn set_state(&self, store: &str, items: Vec<StateItem>) -> Result<(), ApiError> {
        let url = self.url(&["v1.0", "state", store]);
        let response = self
            .http
            .post(url)
            .json(&items)
            .send()
            .await
            .map_err(|e| ApiError::internal(e, format!("could not save state to {store:?}")))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(unexpected(status, response, &format!("could not save state to {store:?}")).await)
        }
    }

    async fn get_state<T>(&self, store: &str, key: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Send,
    {
        let url = self.url(&["v1.0", "state", store, key]);
        self.fetch(url, &format!("key {key:?} in state store {store:?}"))
            .await
    }
}

#[async_trait]
impl SecretStore for HttpClient {
    async fn get_secret<T>(&self, store: &str, name: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Send,
    {
        let url = self.url(&["v1.0", "secrets", store, name]);
        self.fetch(url, &format!("secret {name:?} in secret store {store:?}"))
            .await
    }
}

impl Api for HttpClient {
    fn name(&self) -> &'static str {
        "Custom HTTP (reqwest)"
    }
}

//! Client for the hosted backend's REST data API (PostgREST dialect).
//!
//! The repositories here speak the same protocol the site uses from the
//! browser, so the coupon engine can run without a direct database
//! connection. They expect the tables from `migrations/` (coupons keyed by a
//! `coupon_id` UUID) to be exposed through the API.
//!
//! Filters use PostgREST syntax (`?code=eq.SAVE10&order=created_at.desc`),
//! and every request carries the project's API key twice, as `apikey` and as
//! a bearer token.

pub mod coupons;
pub mod profiles;

pub use coupons::RestCouponRepository;
pub use profiles::RestProfileRepository;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;
use atelier_common::error::Error;

#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl RestClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, Error> {
        Self::with_client(reqwest::Client::new(), base_url, api_key)
    }

    pub fn with_client(http: reqwest::Client, base_url: &str, api_key: &str) -> Result<Self, Error> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("invalid backend url '{base_url}': {e}")))?;
        // Url::join drops the last path segment unless the base ends with '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        if api_key.trim().is_empty() {
            return Err(Error::Config("backend api key is empty".into()));
        }
        Ok(Self {
            http,
            base_url,
            api_key: api_key.to_string(),
        })
    }

    pub fn table_url(&self, table: &str) -> Result<Url, Error> {
        self.base_url
            .join(&format!("rest/v1/{table}"))
            .map_err(|e| Error::Config(format!("cannot build url for table '{table}': {e}")))
    }

    pub fn request(&self, method: Method, table: &str) -> Result<RequestBuilder, Error> {
        let url = self.table_url(table)?;
        debug!("{} {}", method, url);
        Ok(self
            .http
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key))
    }

    /// Sends the request and decodes a JSON body.
    pub async fn send_json<T: DeserializeOwned>(&self, rb: RequestBuilder) -> Result<T, Error> {
        let resp = self.send(rb).await?;
        let body = resp.text().await.map_err(to_unavailable)?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Sends the request and checks the status, discarding the body.
    pub async fn send(&self, rb: RequestBuilder) -> Result<Response, Error> {
        let resp = rb.send().await.map_err(to_unavailable)?;
        check_status(resp).await
    }
}

fn to_unavailable(e: reqwest::Error) -> Error {
    Error::StorageUnavailable(e.to_string())
}

async fn check_status(resp: Response) -> Result<Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(status_error(status, &body))
}

fn status_error(status: StatusCode, body: &str) -> Error {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::Forbidden(format!("backend refused the request ({status}): {body}"))
        }
        StatusCode::NOT_FOUND => Error::NotFound(format!("backend resource missing: {body}")),
        // Callers that know the offending code replace the body with it.
        StatusCode::CONFLICT => Error::DuplicateCode(body.to_string()),
        s if s.is_server_error() || s == StatusCode::TOO_MANY_REQUESTS => {
            Error::StorageUnavailable(format!("backend answered {s}: {body}"))
        }
        s => Error::Parse(format!("backend rejected the request ({s}): {body}")),
    }
}

/// `eq.` filter value for a PostgREST query string.
pub(crate) fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

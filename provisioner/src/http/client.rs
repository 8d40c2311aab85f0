//! HTTP client implementation

use reqwest::{header, Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;
use url::Url;

use crate::errors::ProvisionError;

/// Dev Center data-plane API version
pub const DEV_CENTER_API_VERSION: &str = "2023-04-01";

/// Resource manager deployments API version
pub const MANAGEMENT_API_VERSION: &str = "2021-04-01";

/// Response of a request that starts a long-running operation
#[derive(Debug, Clone)]
pub struct LroResponse {
    pub status: http::StatusCode,

    /// Where to poll for completion, if the service handed one out
    pub operation_location: Option<Url>,
}

/// HTTP client for the Dev Center and resource manager endpoints
pub struct HttpClient {
    client: Client,
    endpoint: Url,
    management_endpoint: Url,
    access_token: SecretString,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(
        endpoint: &str,
        management_endpoint: &str,
        access_token: SecretString,
    ) -> Result<Self, ProvisionError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            endpoint: Url::parse(endpoint)?,
            management_endpoint: Url::parse(management_endpoint)?,
            access_token,
        })
    }

    /// Get the Dev Center endpoint
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Build a Dev Center URL from path segments
    pub fn dev_center_url(&self, segments: &[&str]) -> Result<Url, ProvisionError> {
        build_url(&self.endpoint, segments, DEV_CENTER_API_VERSION)
    }

    /// Build a resource manager URL from a resource id and trailing segments
    pub fn management_url(&self, resource_id: &str, segments: &[&str]) -> Result<Url, ProvisionError> {
        let mut all: Vec<&str> = resource_id.split('/').filter(|s| !s.is_empty()).collect();
        all.extend_from_slice(segments);
        build_url(&self.management_endpoint, &all, MANAGEMENT_API_VERSION)
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, ProvisionError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header(header::AUTHORIZATION, self.bearer())
            .send()
            .await?;

        let response = check_status("GET", response).await?;
        let body = response.json().await?;
        Ok(body)
    }

    /// Make a PUT request that starts a long-running operation
    pub async fn put<B: Serialize>(&self, url: Url, body: &B) -> Result<LroResponse, ProvisionError> {
        debug!("PUT {}", url);

        let response = self
            .client
            .put(url)
            .header(header::AUTHORIZATION, self.bearer())
            .json(body)
            .send()
            .await?;

        let response = check_status("PUT", response).await?;
        lro_response(&response)
    }

    /// Make a DELETE request that starts a long-running operation
    pub async fn delete(&self, url: Url) -> Result<LroResponse, ProvisionError> {
        debug!("DELETE {}", url);

        let response = self
            .client
            .delete(url)
            .header(header::AUTHORIZATION, self.bearer())
            .send()
            .await?;

        let response = check_status("DELETE", response).await?;
        lro_response(&response)
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token.expose_secret())
    }
}

fn build_url(base: &Url, segments: &[&str], api_version: &str) -> Result<Url, ProvisionError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ProvisionError::ConfigError(format!("'{}' cannot be a base URL", base)))?
        .pop_if_empty()
        .extend(segments);
    url.query_pairs_mut().append_pair("api-version", api_version);
    Ok(url)
}

async fn check_status(method: &str, response: Response) -> Result<Response, ProvisionError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let body = match serde_json::from_str::<devcenter_api::models::ErrorResponse>(&body) {
        Ok(parsed) => format!("{}: {}", parsed.error.code, parsed.error.message),
        Err(_) => body,
    };
    debug!("HTTP {} failed: {} - {}", method, status, body);
    Err(ProvisionError::StatusError { status, body })
}

fn lro_response(response: &Response) -> Result<LroResponse, ProvisionError> {
    let operation_location = response
        .headers()
        .get("operation-location")
        .and_then(|v| v.to_str().ok())
        .map(Url::parse)
        .transpose()?;

    Ok(LroResponse {
        status: response.status(),
        operation_location,
    })
}

// Shared HTTP client utilities

use crate::error::{RepositoryError, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// User-Agent string for all HTTP requests
pub const USER_AGENT: &str = concat!(
    "craftpm/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/craftpm/craftpm)"
);

/// Default request timeout when the configuration does not set one
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the HTTP client shared by every repository in one run
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(RepositoryError::from)
}

/// Send a prepared request and decode a JSON body
pub async fn send_json<T: DeserializeOwned>(request: RequestBuilder, url: &str) -> Result<T> {
    let response = check_status(request.send().await?, url)?;

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| RepositoryError::InvalidResponse {
        url: url.to_string(),
        message: e.to_string(),
    })
}

/// Fetch JSON from a URL and deserialize it
pub async fn fetch_json<T: DeserializeOwned>(client: &Client, url: &str) -> Result<T> {
    send_json(client.get(url), url).await
}

/// Fetch JSON with extra headers
pub async fn fetch_json_with<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    headers: HeaderMap,
) -> Result<T> {
    send_json(client.get(url).headers(headers), url).await
}

/// Map non-success statuses onto repository errors
fn check_status(response: Response, url: &str) -> Result<Response> {
    let status = response.status();

    if status == StatusCode::NOT_FOUND {
        return Err(RepositoryError::not_found(url));
    }

    if !status.is_success() {
        return Err(RepositoryError::UpstreamUnavailable(format!(
            "HTTP request failed: {} ({})",
            url, status
        )));
    }

    Ok(response)
}

/// Download a file and return its bytes
pub async fn fetch_bytes(client: &Client, url: &str) -> Result<Vec<u8>> {
    let response = check_status(client.get(url).send().await?, url)?;
    let bytes = response.bytes().await?;
    Ok(bytes.to_vec())
}

/// Headers for the GitHub REST API
pub fn github_headers(token: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT,
        HeaderValue::from_static("application/vnd.github.v3+json"),
    );
    if let Some(token) = token
        && let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token))
    {
        headers.insert(reqwest::header::AUTHORIZATION, value);
    }
    headers
}

/// Extract a file name from the last path segment of a URL
pub fn file_name_from_url(url: &str) -> Option<String> {
    let name = url
        .split('?')
        .next()
        .unwrap_or(url)
        .rsplit('/')
        .next()
        .unwrap_or_default();

    if name.is_empty() {
        None
    } else {
        Some(urlencoding::decode(name).map(|n| n.into_owned()).unwrap_or_else(|_| name.to_string()))
    }
}

/// Turn an arbitrary name into something safe to use as a file name
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '+') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

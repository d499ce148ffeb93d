//! HTTP utilities for management API calls

use super::auth::Credentials;
use crate::error::{ProviderError, Result};
use reqwest::header::LOCATION;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use serde_json::Value;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut cut = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Outcome of a mutating call
///
/// Mutating calls never fail on HTTP status alone; callers decide what a
/// 404 or a 4xx means for the operation at hand.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

impl ApiResponse {
    /// Status line text, e.g. `404 Not Found`
    pub fn status_text(&self) -> String {
        self.status.to_string()
    }

    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
    }

    pub fn is_error(&self) -> bool {
        self.status.as_u16() >= 400
    }
}

/// HTTP client wrapper for management API calls
#[derive(Clone)]
pub struct ManagementHttpClient {
    client: Client,
}

impl ManagementHttpClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Make a GET request and decode the JSON body
    ///
    /// 404 maps to [`ProviderError::NotFound`], other error statuses to
    /// [`ProviderError::RemoteRejected`].
    pub async fn get(&self, url: &str, credentials: &Credentials) -> Result<Value> {
        tracing::debug!("GET {}", url);

        let response = credentials.authorize(self.client.get(url)).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            tracing::debug!("GET {} -> 404", url);
            return Err(ProviderError::NotFound(url.to_string()));
        }

        if !status.is_success() {
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(ProviderError::rejected("API request failed", status.to_string()));
        }

        serde_json::from_str(&body)
            .map_err(|e| ProviderError::UnexpectedResponse(format!("GET {}: {}", url, e)))
    }

    /// Make a PUT request with a JSON body
    pub async fn put<B: Serialize + ?Sized>(
        &self,
        url: &str,
        credentials: &Credentials,
        body: &B,
    ) -> Result<ApiResponse> {
        tracing::debug!("PUT {}", url);
        let request = credentials.authorize(self.client.put(url)).json(body);
        self.execute(request, url).await
    }

    /// Make a POST request with a JSON body
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        url: &str,
        credentials: &Credentials,
        body: &B,
    ) -> Result<ApiResponse> {
        tracing::debug!("POST {}", url);
        let request = credentials.authorize(self.client.post(url)).json(body);
        self.execute(request, url).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, url: &str, credentials: &Credentials) -> Result<ApiResponse> {
        tracing::debug!("DELETE {}", url);
        let request = credentials.authorize(self.client.delete(url));
        self.execute(request, url).await
    }

    async fn execute(&self, request: RequestBuilder, url: &str) -> Result<ApiResponse> {
        let response = request.send().await?;

        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = response.text().await?;

        if status.as_u16() >= 400 {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::debug!("{} answered {} - {}", url, status, sanitize_for_log(&body));
        }

        Ok(ApiResponse {
            status,
            location,
            body,
        })
    }
}

/// Format a provider error for display
/// Adds an actionable hint for the common management API failures
pub fn format_api_error(error: &ProviderError) -> String {
    let hint = match error {
        ProviderError::RemoteRejected { status, .. } if status.starts_with("401") => {
            Some("Authentication failed. Check the management username and password.")
        }
        ProviderError::RemoteRejected { status, .. } if status.starts_with("403") => {
            Some("Permission denied. The management user needs the administrator tag.")
        }
        ProviderError::RemoteRejected { status, .. } if status.starts_with("400") => {
            Some("Invalid request. Check the resource attributes.")
        }
        ProviderError::Transport(_) => {
            Some("Cannot reach the management API. Check the endpoint and that the management plugin is enabled.")
        }
        _ => None,
    };

    match hint {
        Some(hint) => format!("{} ({})", error, hint),
        None => error.to_string(),
    }
}

//! HTTP client for the record server API

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::ApiResponse;

use crate::{ClientConfig, ClientError, ClientResult};

pub const PROJECT_ID_HEADER: &str = "x-project-id";
pub const API_KEY_HEADER: &str = "x-api-key";

/// Shared HTTP client; cheap to clone
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    /// Build a client from configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let mut headers = HeaderMap::new();
        if let Some(project_id) = &config.project_id {
            headers.insert(PROJECT_ID_HEADER, header_value(project_id)?);
        }
        if let Some(api_key) = &config.api_key {
            headers.insert(API_KEY_HEADER, header_value(api_key)?);
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let request = self.client.request(method, url);
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// GET and unwrap the response envelope
    pub async fn get<T: DeserializeOwned>(&self, path: &str, token: Option<&str>) -> ClientResult<T> {
        let response = self.request(Method::GET, path, token).send().await?;
        Self::handle_response(response).await
    }

    /// POST a JSON body and unwrap the response envelope
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        token: Option<&str>,
        body: &B,
    ) -> ClientResult<T> {
        let response = self
            .request(Method::POST, path, token)
            .json(body)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// POST without a body
    pub async fn post_empty<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
    ) -> ClientResult<T> {
        let response = self.request(Method::POST, path, token).send().await?;
        Self::handle_response(response).await
    }

    /// PATCH a JSON body and unwrap the response envelope
    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        token: Option<&str>,
        body: &B,
    ) -> ClientResult<T> {
        let response = self
            .request(Method::PATCH, path, token)
            .json(body)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Unwrap `ApiResponse::data`, mapping error envelopes to [`ClientError`]
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();
        let text = response.text().await?;

        let envelope: ApiResponse<T> = match serde_json::from_str(&text) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => return Err(e.into()),
            Err(_) => return Err(Self::status_error(status, text)),
        };

        if !status.is_success() || !envelope.is_success() {
            return Err(ClientError::from_api(&envelope.code, envelope.message));
        }

        envelope
            .data
            .ok_or_else(|| ClientError::InvalidResponse("Missing response data".to_string()))
    }

    /// Error for a response without an envelope (proxy pages, extractor rejections)
    fn status_error(status: StatusCode, text: String) -> ClientError {
        match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized(text),
            StatusCode::FORBIDDEN => ClientError::Forbidden(text),
            StatusCode::NOT_FOUND => ClientError::NotFound(text),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ClientError::Validation(text)
            }
            _ => ClientError::Server(format!("{status}: {text}")),
        }
    }
}

fn header_value(value: &str) -> ClientResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| ClientError::Validation(format!("invalid header value: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalized() {
        let client = HttpClient::new(&ClientConfig::new("http://localhost:3000/")).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
    }

    #[test]
    fn test_rejects_unusable_header() {
        let config = ClientConfig::new("http://localhost:3000").with_api_key("bad\nkey");
        assert!(matches!(
            HttpClient::new(&config),
            Err(ClientError::Validation(_))
        ));
    }

    #[test]
    fn test_status_error_mapping() {
        assert!(HttpClient::status_error(StatusCode::UNAUTHORIZED, String::new()).is_auth());
        assert!(matches!(
            HttpClient::status_error(StatusCode::BAD_GATEWAY, "down".into()),
            ClientError::Server(_)
        ));
    }
}

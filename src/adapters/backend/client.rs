//! HTTP client for the REST backend
//!
//! Only the two read endpoints the exporter needs are covered: the responses
//! of one user's book and the user list (to name single-response documents).

use super::models::{ResponsesBody, UserSummary, UsersEnvelope};
use crate::config::BackendConfig;
use crate::domain::{BackendError, BookId, KeepsakeError, ResponseRecord, Result};
use reqwest::{Client, ClientBuilder, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Read-only backend client with retries
///
/// # Example
///
/// ```no_run
/// use keepsake::adapters::backend::BackendClient;
/// use keepsake::config::BackendConfig;
/// use keepsake::domain::BookId;
///
/// # async fn example() -> keepsake::domain::Result<()> {
/// let client = BackendClient::new(BackendConfig::default())?;
/// let records = client
///     .fetch_book_responses("7", &BookId::new("12").expect("non-empty book id"))
///     .await?;
/// println!("{} responses", records.len());
/// # Ok(())
/// # }
/// ```
pub struct BackendClient {
    base_url: String,
    client: Client,
    config: BackendConfig,
}

impl BackendClient {
    /// Creates a client from the backend settings
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(config: BackendConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.timeout_seconds.min(30)))
            .build()
            .map_err(|e| KeepsakeError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            config,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches every response a user wrote for a book
    pub async fn fetch_book_responses(
        &self,
        user_id: &str,
        book_id: &BookId,
    ) -> Result<Vec<ResponseRecord>> {
        let url = self.endpoint(&["user-responses", user_id, book_id.as_str()])?;

        let body: ResponsesBody = self
            .retry_request(|| async { self.get_json(&url).await })
            .await?;
        let records = body.into_records();

        tracing::info!(
            user_id = %user_id,
            book_id = %book_id,
            count = records.len(),
            "Fetched responses"
        );
        Ok(records)
    }

    /// Lists every user known to the backend
    pub async fn fetch_users(&self) -> Result<Vec<UserSummary>> {
        let url = self.endpoint(&["users", "all"])?;
        let envelope: UsersEnvelope = self
            .retry_request(|| async { self.get_json(&url).await })
            .await?;
        Ok(envelope.users)
    }

    /// Looks up a user's name, `None` when the backend does not know the id
    pub async fn find_username(&self, user_id: &str) -> Result<Option<String>> {
        let users = self.fetch_users().await?;
        Ok(users
            .into_iter()
            .find(|u| u.id == user_id)
            .map(|u| u.username))
    }

    fn endpoint(&self, segments: &[&str]) -> Result<String> {
        let mut url = url::Url::parse(&self.base_url)
            .map_err(|e| KeepsakeError::Configuration(format!("Invalid backend URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| {
                KeepsakeError::Configuration(format!(
                    "Backend URL cannot carry a path: {}",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url.into())
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.config.api_token.as_deref() {
            Some(token) if !token.is_empty() => request.bearer_auth(token),
            _ => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let resp = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout(e.to_string())
                } else {
                    BackendError::ConnectionFailed(e.to_string())
                }
            })?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(url.to_string()).into());
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                message: body,
            }
            .into());
        }

        resp.json::<T>()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()).into())
    }

    /// Retries retryable backend errors with exponential backoff
    async fn retry_request<F, T, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let retry = &self.config.retry;
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    attempt += 1;
                    let retryable =
                        matches!(&e, KeepsakeError::Backend(err) if err.is_retryable());
                    if !retryable || attempt >= retry.max_retries {
                        return Err(e);
                    }

                    let factor = retry.backoff_multiplier.powf((attempt - 1) as f64);
                    let delay_ms =
                        ((retry.initial_delay_ms as f64 * factor) as u64).min(retry.max_delay_ms);

                    crate::log_retry_attempt!(attempt, retry.max_retries, e);
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = BackendConfig {
            base_url: "https://api.example.com/".to_string(),
            ..BackendConfig::default()
        };
        let client = BackendClient::new(config).unwrap();
        assert_eq!(client.base_url(), "https://api.example.com");
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let config = BackendConfig {
            base_url: "https://api.example.com/v1".to_string(),
            ..BackendConfig::default()
        };
        let client = BackendClient::new(config).unwrap();
        assert_eq!(
            client.endpoint(&["user-responses", "7", "a/b c"]).unwrap(),
            "https://api.example.com/v1/user-responses/7/a%2Fb%20c"
        );
        assert_eq!(
            client.endpoint(&["users", "all"]).unwrap(),
            "https://api.example.com/v1/users/all"
        );
    }
}

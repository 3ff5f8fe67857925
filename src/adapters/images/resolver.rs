//! HTTP image resolver with a per-image deadline

use super::{AssetResolver, EmbeddedImage};
use crate::config::ExportConfig;
use crate::domain::{KeepsakeError, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Default per-image deadline
pub const DEFAULT_IMAGE_TIMEOUT: Duration = Duration::from_millis(8000);

/// Resolves images over HTTP(S) and from `data:` URLs
///
/// The whole fetch, headers and body, races a single timer. Whatever loses
/// the race is dropped and the image is reported missing.
///
/// # Example
///
/// ```no_run
/// use keepsake::adapters::images::{AssetResolver, HttpAssetResolver};
/// use std::time::Duration;
///
/// # async fn example() -> keepsake::domain::Result<()> {
/// let resolver = HttpAssetResolver::new(Duration::from_secs(8))?;
/// if let Some(image) = resolver.resolve("https://img.example.com/a.jpg").await {
///     println!("{}x{}", image.width_px, image.height_px);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpAssetResolver {
    client: Client,
    timeout: Duration,
}

impl HttpAssetResolver {
    /// Creates a resolver with its own HTTP client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = ClientBuilder::new()
            .user_agent(concat!("keepsake/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| KeepsakeError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self::with_client(client, timeout))
    }

    /// Creates a resolver using the export settings
    pub fn from_config(config: &ExportConfig) -> Result<Self> {
        Self::new(Duration::from_millis(config.image_timeout_ms))
    }

    /// Creates a resolver around an existing client
    pub fn with_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Deadline applied by [`AssetResolver::resolve`]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolves `url` with an explicit deadline
    pub async fn resolve_with_timeout(&self, url: &str, timeout: Duration) -> Option<EmbeddedImage> {
        let url = url.trim();
        if url.is_empty() {
            return None;
        }

        if let Some(rest) = url.strip_prefix("data:") {
            return decode_data_url(rest).and_then(|bytes| decode_or_log(url, &bytes));
        }

        match url::Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            _ => {
                tracing::warn!(url = %url, "Skipping image with unsupported URL");
                return None;
            }
        }

        match tokio::time::timeout(timeout, self.fetch(url)).await {
            Ok(Ok(bytes)) => decode_or_log(url, &bytes),
            Ok(Err(reason)) => {
                tracing::warn!(url = %url, reason = %reason, "Image fetch failed");
                None
            }
            Err(_) => {
                tracing::warn!(
                    url = %url,
                    timeout_ms = timeout.as_millis() as u64,
                    "Image fetch timed out"
                );
                None
            }
        }
    }

    async fn fetch(&self, url: &str) -> std::result::Result<Vec<u8>, String> {
        let resp = self.client.get(url).send().await.map_err(|e| e.to_string())?;

        let status = resp.status();
        if !status.is_success() {
            return Err(format!("status {status}"));
        }

        let bytes = resp.bytes().await.map_err(|e| e.to_string())?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl AssetResolver for HttpAssetResolver {
    async fn resolve(&self, url: &str) -> Option<EmbeddedImage> {
        self.resolve_with_timeout(url, self.timeout).await
    }
}

fn decode_or_log(url: &str, bytes: &[u8]) -> Option<EmbeddedImage> {
    match EmbeddedImage::decode(bytes) {
        Ok(image) => {
            tracing::debug!(
                url = %truncate_for_log(url),
                width = image.width_px,
                height = image.height_px,
                "Image resolved"
            );
            Some(image)
        }
        Err(e) => {
            tracing::warn!(url = %truncate_for_log(url), error = %e, "Image could not be decoded");
            None
        }
    }
}

/// Decodes the part of a `data:` URL after the scheme
fn decode_data_url(rest: &str) -> Option<Vec<u8>> {
    let (meta, payload) = rest.split_once(',')?;
    if meta.ends_with(";base64") {
        let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        general_purpose::STANDARD.decode(cleaned).ok()
    } else {
        Some(payload.as_bytes().to_vec())
    }
}

fn truncate_for_log(url: &str) -> &str {
    match url.char_indices().nth(96) {
        Some((idx, _)) => &url[..idx],
        None => url,
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::sample_image;
    use super::*;
    use image::ImageFormat;
    use std::time::Instant;

    fn resolver(timeout_ms: u64) -> HttpAssetResolver {
        HttpAssetResolver::new(Duration::from_millis(timeout_ms)).unwrap()
    }

    #[tokio::test]
    async fn test_resolve_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/photo.jpg")
            .with_status(200)
            .with_header("content-type", "image/jpeg")
            .with_body(sample_image(30, 10, ImageFormat::Jpeg))
            .create_async()
            .await;

        let image = resolver(2000)
            .resolve(&format!("{}/photo.jpg", server.url()))
            .await
            .unwrap();

        assert_eq!((image.width_px, image.height_px), (30, 10));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_resolve_non_success_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/missing.png")
            .with_status(404)
            .create_async()
            .await;

        let result = resolver(2000)
            .resolve(&format!("{}/missing.png", server.url()))
            .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_resolve_undecodable_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/fake.png")
            .with_status(200)
            .with_body("definitely not a png")
            .create_async()
            .await;

        let result = resolver(2000)
            .resolve(&format!("{}/fake.png", server.url()))
            .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_resolve_times_out() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/slow.png")
            .with_status(200)
            .with_chunked_body(|w| {
                std::thread::sleep(Duration::from_millis(1500));
                w.write_all(b"late")
            })
            .create_async()
            .await;

        let started = Instant::now();
        let result = resolver(8000)
            .resolve_with_timeout(
                &format!("{}/slow.png", server.url()),
                Duration::from_millis(150),
            )
            .await;

        assert!(result.is_none());
        assert!(started.elapsed() < Duration::from_millis(1400));
    }

    #[tokio::test]
    async fn test_resolve_unreachable_host() {
        // Port 9 on localhost is the discard service and normally closed.
        let result = resolver(2000).resolve("http://127.0.0.1:9/a.png").await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_resolve_data_url() {
        let encoded = general_purpose::STANDARD.encode(sample_image(3, 6, ImageFormat::Png));
        let url = format!("data:image/png;base64,{encoded}");

        let image = resolver(100).resolve(&url).await.unwrap();
        assert_eq!((image.width_px, image.height_px), (3, 6));
    }

    #[tokio::test]
    async fn test_resolve_rejects_blank_and_unsupported_urls() {
        let resolver = resolver(100);
        assert!(resolver.resolve("   ").await.is_none());
        assert!(resolver.resolve("ftp://example.com/a.png").await.is_none());
        assert!(resolver.resolve("data:image/png;base64,@@@").await.is_none());
    }

    #[test]
    fn test_decode_data_url_plain() {
        assert_eq!(decode_data_url("text/plain,abc"), Some(b"abc".to_vec()));
        assert_eq!(decode_data_url("no-comma"), None);
    }

    #[test]
    fn test_from_config_uses_image_timeout() {
        let config = ExportConfig {
            image_timeout_ms: 2500,
            ..ExportConfig::default()
        };
        let resolver = HttpAssetResolver::from_config(&config).unwrap();
        assert_eq!(resolver.timeout(), Duration::from_millis(2500));
    }
}

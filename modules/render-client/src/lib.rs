pub mod error;

pub use error::{RenderError, Result};

use std::time::Duration;

use async_trait::async_trait;
use slideforge_common::Aspect;

/// `(html, aspect) -> png bytes`, kept as a trait so pipeline tests can
/// supply a fake renderer without a live browser service.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, html: &str, aspect: Aspect) -> Result<Vec<u8>>;
}

/// Talks to a Browserless-compatible `/screenshot` endpoint.
pub struct BrowserlessRenderer {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl BrowserlessRenderer {
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
        }
    }

    fn endpoint(&self) -> String {
        let mut endpoint = format!("{}/screenshot", self.base_url);
        if let Some(ref token) = self.token {
            endpoint.push_str(&format!("?token={token}"));
        }
        endpoint
    }
}

#[async_trait]
impl Renderer for BrowserlessRenderer {
    async fn render(&self, html: &str, aspect: Aspect) -> Result<Vec<u8>> {
        let (width, height) = aspect.canvas();
        let body = serde_json::json!({
            "html": html,
            "options": { "type": "png", "fullPage": false },
            "viewport": { "width": width, "height": height },
        });

        let response = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RenderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn renders_png_bytes_for_aspect() {
        let server = MockServer::start().await;
        let fake_png = vec![0x89, 0x50, 0x4E, 0x47, 1, 2, 3];

        Mock::given(method("POST"))
            .and(path("/screenshot"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(fake_png.clone()))
            .mount(&server)
            .await;

        let renderer = BrowserlessRenderer::new(&server.uri(), None);
        let bytes = renderer.render("<html></html>", Aspect::Widescreen).await.unwrap();
        assert_eq!(bytes, fake_png);
    }

    #[tokio::test]
    async fn surfaces_api_errors() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/screenshot"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let renderer = BrowserlessRenderer::new(&server.uri(), None);
        let err = renderer
            .render("<html></html>", Aspect::Standard)
            .await
            .unwrap_err();
        match err {
            RenderError::Api { status, .. } => assert_eq!(status, 503),
            other => panic!("expected Api error, got {other:?}"),
        }
    }
}

// 外部インペイントサービスの呼び出し境界

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::blocking::multipart::{Form, Part};

use crate::config::settings::{HdStrategy, Settings};
use crate::error::{InpaintFailure, RetouchError};

/// Options forwarded to the service with every call.
#[derive(Debug, Clone, Copy)]
pub struct InpaintOptions {
    /// Quality/speed tradeoff (diffusion steps).
    pub steps: u32,
    pub strategy: HdStrategy,
}

impl InpaintOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        InpaintOptions {
            steps: settings.steps,
            strategy: settings.strategy,
        }
    }
}

/// External inpaint boundary: stateless per call, crop dimensions in equal
/// dimensions out, mask and image pixel-aligned.
///
/// `image_png` and `mask_png` are PNG-encoded; the return value is the
/// PNG-encoded repaired image.
pub trait InpaintBackend: Send + Sync {
    fn inpaint(
        &self,
        image_png: &[u8],
        mask_png: &[u8],
        opts: &InpaintOptions,
    ) -> crate::error::Result<Vec<u8>>;
}

/// Blocking HTTP client for an IOPaint-style inpaint endpoint.
///
/// One bounded wait per call; a timeout is reported as
/// [`InpaintFailure::Timeout`] and never retried here (retry is a
/// user-initiated re-click).
pub struct HttpInpaintClient {
    client: Client,
    url: String,
}

impl HttpInpaintClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> crate::error::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(HttpInpaintClient {
            client,
            url: url.into(),
        })
    }

    pub fn from_settings(settings: &Settings) -> crate::error::Result<Self> {
        Self::new(
            settings.inpaint_api_url.clone(),
            Duration::from_secs(settings.request_timeout_secs),
        )
    }
}

impl InpaintBackend for HttpInpaintClient {
    fn inpaint(
        &self,
        image_png: &[u8],
        mask_png: &[u8],
        opts: &InpaintOptions,
    ) -> crate::error::Result<Vec<u8>> {
        let form = Form::new()
            .part(
                "image",
                Part::bytes(image_png.to_vec())
                    .file_name("image.png")
                    .mime_str("image/png")?,
            )
            .part(
                "mask",
                Part::bytes(mask_png.to_vec())
                    .file_name("mask.png")
                    .mime_str("image/png")?,
            )
            .text("steps", opts.steps.to_string())
            .text("hd_strategy", opts.strategy.as_str());

        tracing::debug!(url = %self.url, steps = opts.steps, "submitting inpaint request");

        let response = self.client.post(&self.url).multipart(form).send()?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, url = %self.url, "inpaint service returned failure status");
            return Err(RetouchError::Inpaint(InpaintFailure::ServiceUnavailable));
        }

        let bytes = response.bytes()?;
        if bytes.is_empty() {
            return Err(RetouchError::Inpaint(InpaintFailure::MalformedResponse));
        }
        Ok(bytes.to_vec())
    }
}

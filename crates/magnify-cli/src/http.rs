//! [`UpscaleService`] over a blocking `reqwest` client.
//!
//! The controller drives services through `async fn`s; here each call
//! completes synchronously inside the future, which is all a CLI driven
//! by `pollster` needs.

use std::time::Duration;

use magnify_core::service::{IMAGE_FIELD, SCALE_FIELD};
use magnify_core::{
    HealthReport, RemoteServiceError, ScaleFactor, ServiceConfig, SourceImage, UpscaleService,
};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, Response};

/// Talks to the upscaling service over HTTP.
#[derive(Debug, Clone)]
pub struct ReqwestService {
    client: Client,
    config: ServiceConfig,
}

impl ReqwestService {
    /// Build a client whose uploads are bounded by
    /// [`ServiceConfig::timeout`] and whose health checks are bounded by
    /// [`ServiceConfig::health_deadline`].
    ///
    /// # Errors
    ///
    /// Returns the `reqwest` error if the TLS backend cannot initialise.
    pub fn new(config: ServiceConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("magnify-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    fn classify(err: &reqwest::Error, limit: Duration) -> RemoteServiceError {
        if err.is_timeout() {
            RemoteServiceError::Timeout(limit)
        } else if let Some(status) = err.status() {
            RemoteServiceError::Status(status.as_u16())
        } else {
            RemoteServiceError::Network(err.to_string())
        }
    }

    fn checked(&self, result: reqwest::Result<Response>) -> Result<Response, RemoteServiceError> {
        let response = result.map_err(|e| Self::classify(&e, self.config.timeout))?;
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteServiceError::Status(status.as_u16()));
        }
        Ok(response)
    }
}

impl UpscaleService for ReqwestService {
    async fn health(&self) -> Result<HealthReport, RemoteServiceError> {
        let limit = self.config.health_deadline();
        let response = self
            .client
            .get(self.config.health_url())
            .timeout(limit)
            .send()
            .map_err(|e| Self::classify(&e, limit))?;
        let status = response.status().as_u16();
        let body = response.text().map_err(|e| Self::classify(&e, limit))?;
        HealthReport::from_response(status, &body)
    }

    async fn upscale(
        &self,
        source: &SourceImage,
        scale: ScaleFactor,
    ) -> Result<Vec<u8>, RemoteServiceError> {
        let part = Part::bytes(source.bytes().to_vec())
            .file_name(source.name().to_owned())
            .mime_str(source.mime_type())
            .map_err(|e| RemoteServiceError::Network(e.to_string()))?;
        let form = Form::new()
            .part(IMAGE_FIELD, part)
            .text(SCALE_FIELD, scale.get().to_string());

        log::debug!(
            "POST {} ({} bytes)",
            self.config.upscale_url(),
            source.bytes().len()
        );
        let response = self.checked(
            self.client
                .post(self.config.upscale_url())
                .multipart(form)
                .send(),
        )?;
        let bytes = response
            .bytes()
            .map_err(|e| Self::classify(&e, self.config.timeout))?;
        Ok(bytes.to_vec())
    }
}

//! The remote upscaling service seam and its configuration.
//!
//! Implementations live outside this crate: `magnify-io` talks to the
//! service with the browser's `fetch`, `magnify-cli` with `reqwest`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::health::HealthReport;
use crate::source::SourceImage;
use crate::types::{RemoteServiceError, ScaleFactor};

/// Where the remote service lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL, without a trailing slash.
    pub base_url: String,
    /// Upper bound on a single upload/download round trip.
    #[serde(with = "duration_millis")]
    pub timeout: Duration,
    /// Interval between health checks.
    #[serde(with = "duration_millis")]
    pub poll_interval: Duration,
    /// Upper bound on a single health check, capped at `poll_interval`
    /// by [`health_deadline`](Self::health_deadline).
    #[serde(with = "duration_millis")]
    pub health_timeout: Duration,
}

impl ServiceConfig {
    /// Default base URL of a locally running service.
    pub const DEFAULT_BASE_URL: &'static str = "http://127.0.0.1:5000";
    /// Default upload timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
    /// Default health poll interval.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);
    /// Default health check timeout.
    pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_millis(4000);

    /// Default configuration pointed at a different base URL.
    #[must_use]
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            ..Self::default()
        }
    }

    /// How long one health check may take.
    ///
    /// Never longer than the poll interval, so a hanging server cannot
    /// hold readiness at a stale value past the next poll.
    #[must_use]
    pub fn health_deadline(&self) -> Duration {
        self.health_timeout.min(self.poll_interval)
    }

    /// `GET` endpoint reporting server and model status.
    #[must_use]
    pub fn health_url(&self) -> String {
        format!("{}/health", self.base_url.trim_end_matches('/'))
    }

    /// `POST` endpoint accepting the multipart upload.
    #[must_use]
    pub fn upscale_url(&self) -> String {
        format!("{}/upscale", self.base_url.trim_end_matches('/'))
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_owned(),
            timeout: Self::DEFAULT_TIMEOUT,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            health_timeout: Self::DEFAULT_HEALTH_TIMEOUT,
        }
    }
}

/// Name of the multipart field carrying the image file.
pub const IMAGE_FIELD: &str = "image";
/// Name of the multipart field carrying the integer scale factor.
pub const SCALE_FIELD: &str = "scale";

/// An HTTP service that can report health and upscale an uploaded image.
///
/// Futures are not required to be `Send`: the browser implementation
/// runs on the single WASM thread.
#[allow(async_fn_in_trait)]
pub trait UpscaleService {
    /// `GET <base>/health`.
    ///
    /// # Errors
    ///
    /// Returns a [`RemoteServiceError`] if the request fails or the body
    /// cannot be parsed.
    async fn health(&self) -> Result<HealthReport, RemoteServiceError>;

    /// `POST <base>/upscale` with `image` and `scale` multipart fields.
    ///
    /// Returns the encoded image bytes of a successful response.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteServiceError::Status`] for a non-2xx response,
    /// [`RemoteServiceError::Timeout`] when the configured timeout
    /// elapses, and [`RemoteServiceError::Network`] otherwise.
    async fn upscale(
        &self,
        source: &SourceImage,
        scale: ScaleFactor,
    ) -> Result<Vec<u8>, RemoteServiceError>;
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::cast_possible_truncation)]
    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

//! Shared types for the magnify upscaling flow.

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::health::Readiness;
use crate::source::SourceImage;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create a new set of dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Multiply both axes by `scale`, or `None` on overflow.
    #[must_use]
    pub const fn scaled(self, scale: ScaleFactor) -> Option<Self> {
        let factor = scale.get();
        match (
            self.width.checked_mul(factor),
            self.height.checked_mul(factor),
        ) {
            (Some(width), Some(height)) => Some(Self { width, height }),
            _ => None,
        }
    }

    /// Returns `true` if either axis is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} × {}", self.width, self.height)
    }
}

/// Interpolation method selected by the user.
///
/// The three local methods map onto the `image` crate's resampling
/// filters; [`Method::Ai`] delegates to the remote super-resolution model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Nearest neighbour: smoothing disabled, blocky output.
    Nearest,
    /// Bilinear interpolation over the 4 surrounding pixels.
    Bilinear,
    /// Bicubic interpolation over the 16 surrounding pixels.
    #[default]
    Bicubic,
    /// Remote AI super-resolution.
    Ai,
}

impl Method {
    /// All methods in the order they are offered in the UI.
    pub const ALL: [Self; 4] = [Self::Nearest, Self::Bilinear, Self::Bicubic, Self::Ai];

    /// Stable lowercase identifier (form values, CLI arguments, JSON).
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::Bilinear => "bilinear",
            Self::Bicubic => "bicubic",
            Self::Ai => "ai",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Nearest => "Nearest Neighbor",
            Self::Bilinear => "Bilinear",
            Self::Bicubic => "Bicubic",
            Self::Ai => "AI (Real-ESRGAN)",
        }
    }

    /// Whether the method runs in-process rather than on the remote service.
    #[must_use]
    pub const fn is_local(self) -> bool {
        !matches!(self, Self::Ai)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown interpolation method: {s:?}"))
    }
}

/// Positive integer upscaling factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct ScaleFactor(NonZeroU32);

impl ScaleFactor {
    /// The factor every UI submission uses.
    pub const DEFAULT: Self = Self(NonZeroU32::MIN.saturating_add(3));

    /// Create a scale factor, rejecting zero.
    #[must_use]
    pub const fn new(factor: u32) -> Option<Self> {
        match NonZeroU32::new(factor) {
            Some(n) => Some(Self(n)),
            None => None,
        }
    }

    /// The factor as a plain integer.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl Default for ScaleFactor {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for ScaleFactor {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| "scale factor must be positive".to_owned())
    }
}

impl From<ScaleFactor> for u32 {
    fn from(value: ScaleFactor) -> Self {
        value.get()
    }
}

impl fmt::Display for ScaleFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.get())
    }
}

/// A single user-initiated upscale request. Consumed once.
#[derive(Debug, Clone)]
pub struct UpscaleRequest {
    /// The image to upscale.
    pub source: SourceImage,
    /// Which interpolation method to use.
    pub method: Method,
    /// How much larger the output should be on each axis.
    pub scale: ScaleFactor,
}

impl UpscaleRequest {
    /// Create a request with the default scale factor.
    #[must_use]
    pub fn new(source: SourceImage, method: Method) -> Self {
        Self {
            source,
            method,
            scale: ScaleFactor::DEFAULT,
        }
    }

    /// Override the scale factor.
    #[must_use]
    pub const fn with_scale(mut self, scale: ScaleFactor) -> Self {
        self.scale = scale;
        self
    }
}

/// Output of a finished job, before any display handles exist.
#[derive(Debug, Clone)]
pub struct UpscaledImage {
    /// The source the job ran on.
    pub source: SourceImage,
    /// The method that produced the output.
    pub method: Method,
    /// Dimensions of the decoded source image.
    pub original_dimensions: Dimensions,
    /// Dimensions of the upscaled image.
    pub upscaled_dimensions: Dimensions,
    /// Encoded upscaled image bytes.
    pub bytes: Vec<u8>,
    /// MIME type of `bytes` (e.g. `image/png`).
    pub mime_type: String,
}

/// The currently displayed before/after pair.
///
/// `H` is an opaque handle to displayable image data; in the browser it
/// is a Blob URL that must be revoked once the result is superseded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpscaleResult<H> {
    /// Monotonic id, bumped on every successful completion.
    pub id: u64,
    /// The method that produced the result.
    pub method: Method,
    /// Handle to the original image.
    pub original: H,
    /// Handle to the upscaled image.
    pub upscaled: H,
    /// Dimensions of the original image.
    pub original_dimensions: Dimensions,
    /// Dimensions of the upscaled image.
    pub upscaled_dimensions: Dimensions,
}

/// A request was refused before any work started.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreconditionError {
    /// No source image has been selected.
    #[error("select an image to upscale first")]
    NoSourceImage,

    /// The AI method was requested while the service is not ready.
    #[error("the AI upscaling service is not ready ({0}); try again shortly")]
    ServiceNotReady(Readiness),

    /// Another request is still running.
    #[error("an upscale request is already in progress")]
    RequestInFlight,
}

/// The remote upscaling service failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteServiceError {
    /// The service answered with a non-success HTTP status.
    #[error("upscaling service returned HTTP status {0}")]
    Status(u16),

    /// The request never produced a response.
    #[error("could not reach the upscaling service: {0}")]
    Network(String),

    /// No response arrived within the configured timeout.
    #[error("upscaling service did not respond within {0:?}")]
    Timeout(Duration),

    /// The response body could not be interpreted.
    #[error("invalid response from upscaling service: {0}")]
    InvalidResponse(String),
}

impl RemoteServiceError {
    /// The HTTP status code, if the service answered at all.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status(code) => Some(*code),
            _ => None,
        }
    }
}

/// Errors that can end an upscale request.
///
/// Every variant is terminal for the current request; nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum UpscaleError {
    /// The request was refused before starting.
    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    /// The remote service failed.
    #[error(transparent)]
    Remote(#[from] RemoteServiceError),

    /// The source (or remote output) could not be decoded as an image.
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// The source image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// The requested output size does not fit in `u32` pixels.
    #[error("{dimensions} scaled by {scale} is too large")]
    TooLarge {
        /// Source dimensions.
        dimensions: Dimensions,
        /// Requested scale factor.
        scale: ScaleFactor,
    },

    /// Encoding the upscaled image failed.
    #[error("failed to encode upscaled image: {0}")]
    Encode(String),

    /// A display handle could not be created for the result.
    #[error("failed to prepare image for display: {0}")]
    Handle(String),
}

impl UpscaleError {
    /// Returns `true` for decode failures (including empty input).
    #[must_use]
    pub const fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::EmptyInput)
    }
}

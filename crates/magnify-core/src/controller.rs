//! Upscale request lifecycle.
//!
//! [`UpscaleController`] owns the selected source, the readiness of the
//! AI path, the busy flag, and the single displayed result. A request is
//! split into three transitions so the controller is never borrowed
//! across a suspension point:
//!
//! 1. [`UpscaleController::begin`] checks preconditions and marks the
//!    controller busy, returning a [`Job`].
//! 2. [`Job::run`] does the work (local resample or remote upload). It
//!    holds no controller state, so health polls may interleave freely.
//! 3. [`UpscaleController::complete`] clears the busy flag and, on
//!    success, swaps in the new result, releasing the superseded
//!    handles exactly once.
//!
//! [`UpscaleController::submit`] composes the three for callers that own
//! the controller outright.

use image::ImageFormat;
use web_time::Instant;

use crate::health::{HealthStatus, Readiness, Transition};
use crate::resample;
use crate::service::UpscaleService;
use crate::source::SourceImage;
use crate::types::{
    Dimensions, Method, PreconditionError, RemoteServiceError, ScaleFactor, UpscaleError,
    UpscaleRequest, UpscaleResult, UpscaledImage,
};

/// Creates and releases transient display handles for encoded images.
///
/// In the browser a handle is a Blob URL; releasing it revokes the URL.
pub trait HandleStore {
    /// The displayable handle.
    type Handle: Clone;

    /// Create a handle for encoded image bytes.
    ///
    /// # Errors
    ///
    /// Returns a description of the failure if the platform refuses.
    fn create(&mut self, bytes: &[u8], mime_type: &str) -> Result<Self::Handle, String>;

    /// Release a handle. Called exactly once per created handle.
    fn release(&mut self, handle: &Self::Handle);
}

/// The work of one accepted request.
///
/// Obtained from [`UpscaleController::begin`]; its outcome must be handed
/// back to [`UpscaleController::complete`].
#[derive(Debug)]
#[must_use = "a job must be run and its outcome passed to `complete`"]
pub struct Job {
    request: UpscaleRequest,
}

impl Job {
    /// The request being processed.
    pub const fn request(&self) -> &UpscaleRequest {
        &self.request
    }

    /// Perform the upscale.
    ///
    /// Local methods resample synchronously; [`Method::Ai`] uploads the
    /// source to `service` and awaits the response. This is the only
    /// suspension point of a request.
    ///
    /// # Errors
    ///
    /// Returns [`UpscaleError::Decode`] if the source is not an image,
    /// [`UpscaleError::Remote`] if the service fails, and the resampler's
    /// errors for local methods.
    #[allow(clippy::future_not_send)] // the browser service is !Send
    pub async fn run<S: UpscaleService>(self, service: &S) -> Result<UpscaledImage, UpscaleError> {
        let UpscaleRequest {
            source,
            method,
            scale,
        } = self.request;

        let start = Instant::now();
        let output = if method.is_local() {
            resample::resample_local(&source, method, scale)
        } else {
            // Reject undecodable files before touching the network.
            let original_dimensions = source.probe()?.dimensions;
            let bytes = service.upscale(&source, scale).await?;
            remote_output(source, method, original_dimensions, bytes)
        };
        log::debug!("{method} finished in {:.1?}", start.elapsed());
        output
    }
}

/// Validate a remote response body and describe it.
fn remote_output(
    source: SourceImage,
    method: Method,
    original_dimensions: Dimensions,
    bytes: Vec<u8>,
) -> Result<UpscaledImage, UpscaleError> {
    let invalid = |e: image::ImageError| RemoteServiceError::InvalidResponse(e.to_string());
    let format = image::guess_format(&bytes).map_err(invalid)?;
    let (width, height) =
        image::ImageReader::with_format(std::io::Cursor::new(&bytes), format)
            .into_dimensions()
            .map_err(invalid)?;

    Ok(UpscaledImage {
        source,
        method,
        original_dimensions,
        upscaled_dimensions: Dimensions::new(width, height),
        bytes,
        mime_type: format.to_mime_type().to_owned(),
    })
}

/// A displayed result together with the name it downloads under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presented<H> {
    /// The before/after pair.
    pub result: UpscaleResult<H>,
    /// Suggested download file name (`upscaled_<stem>.<ext>`).
    pub download_name: String,
}

/// Drives the upscale flow for one page session.
pub struct UpscaleController<H: HandleStore> {
    handles: H,
    source: Option<SourceImage>,
    readiness: Readiness,
    busy: bool,
    presented: Option<Presented<H::Handle>>,
    next_id: u64,
}

impl<H: HandleStore> UpscaleController<H> {
    /// Create an idle controller with nothing selected.
    pub const fn new(handles: H) -> Self {
        Self {
            handles,
            source: None,
            readiness: Readiness::Unreachable,
            busy: false,
            presented: None,
            next_id: 0,
        }
    }

    /// Select a new source image. The displayed result is kept until the
    /// next successful request replaces it.
    pub fn select_source(&mut self, source: SourceImage) {
        log::info!(
            "selected {} ({} bytes)",
            source.name(),
            source.bytes().len()
        );
        self.source = Some(source);
    }

    /// Forget the selected source. The displayed result stays, but no
    /// request can be submitted until a new source is selected.
    pub fn clear_source(&mut self) {
        if let Some(source) = self.source.take() {
            log::info!("cleared {}", source.name());
        }
    }

    /// The selected source, if any.
    pub const fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    /// Current readiness of the AI path.
    pub const fn readiness(&self) -> Readiness {
        self.readiness
    }

    /// Feed one health poll into the readiness state machine.
    pub fn apply_health(&mut self, status: HealthStatus) -> Transition {
        let transition = Transition {
            from: self.readiness,
            to: Readiness::from_status(status),
        };
        if transition.changed() {
            log::debug!("readiness {} -> {}", transition.from, transition.to);
        }
        self.readiness = transition.to;
        transition
    }

    /// Whether a request is running.
    pub const fn is_busy(&self) -> bool {
        self.busy
    }

    /// Check the preconditions for submitting `method`.
    ///
    /// # Errors
    ///
    /// Returns the first unmet [`PreconditionError`].
    pub const fn check(&self, method: Method) -> Result<(), PreconditionError> {
        if self.busy {
            return Err(PreconditionError::RequestInFlight);
        }
        if self.source.is_none() {
            return Err(PreconditionError::NoSourceImage);
        }
        if !method.is_local() && !self.readiness.allows_ai() {
            return Err(PreconditionError::ServiceNotReady(self.readiness));
        }
        Ok(())
    }

    /// Whether the submit control should be enabled for `method`.
    pub const fn can_submit(&self, method: Method) -> bool {
        self.check(method).is_ok()
    }

    /// Accept a request and mark the controller busy.
    ///
    /// # Errors
    ///
    /// Returns a [`PreconditionError`] without side effects if no source
    /// is selected, the AI path is not ready, or a request is running.
    pub fn begin(&mut self, method: Method, scale: ScaleFactor) -> Result<Job, PreconditionError> {
        self.check(method)?;
        let source = self
            .source
            .clone()
            .ok_or(PreconditionError::NoSourceImage)?;
        log::info!("upscaling {} {scale} with {method}", source.name());
        self.busy = true;
        Ok(Job {
            request: UpscaleRequest::new(source, method).with_scale(scale),
        })
    }

    /// Finish the running request.
    ///
    /// On success the new handle pair replaces the previous one, whose
    /// handles are released. On failure the displayed result is left
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns the job's error, or [`UpscaleError::Handle`] if display
    /// handles cannot be created.
    pub fn complete(
        &mut self,
        outcome: Result<UpscaledImage, UpscaleError>,
    ) -> Result<&Presented<H::Handle>, UpscaleError> {
        self.busy = false;
        let image = outcome.inspect_err(|e| log::warn!("upscale failed: {e}"))?;

        let original = self
            .handles
            .create(image.source.bytes(), image.source.mime_type())
            .map_err(UpscaleError::Handle)?;
        let upscaled = match self.handles.create(&image.bytes, &image.mime_type) {
            Ok(handle) => handle,
            Err(e) => {
                self.handles.release(&original);
                return Err(UpscaleError::Handle(e));
            }
        };

        self.release_presented();
        self.next_id += 1;
        log::info!(
            "upscaled {} -> {} with {}",
            image.original_dimensions,
            image.upscaled_dimensions,
            image.method
        );

        let download_name = download_name(Some(image.source.stem()), &image.mime_type);
        Ok(self.presented.insert(Presented {
            result: UpscaleResult {
                id: self.next_id,
                method: image.method,
                original,
                upscaled,
                original_dimensions: image.original_dimensions,
                upscaled_dimensions: image.upscaled_dimensions,
            },
            download_name,
        }))
    }

    /// Run a whole request: [`begin`](Self::begin), [`Job::run`], and
    /// [`complete`](Self::complete).
    ///
    /// # Errors
    ///
    /// Any error from the three steps; precondition failures happen
    /// before any resampling or network work.
    #[allow(clippy::future_not_send)] // the browser service is !Send
    pub async fn submit<S: UpscaleService>(
        &mut self,
        method: Method,
        scale: ScaleFactor,
        service: &S,
    ) -> Result<&Presented<H::Handle>, UpscaleError> {
        let job = self.begin(method, scale)?;
        let outcome = job.run(service).await;
        self.complete(outcome)
    }

    /// The displayed result, if any.
    pub const fn presented(&self) -> Option<&Presented<H::Handle>> {
        self.presented.as_ref()
    }

    /// The displayed before/after pair, if any.
    pub fn result(&self) -> Option<&UpscaleResult<H::Handle>> {
        self.presented.as_ref().map(|p| &p.result)
    }

    /// Download name for the displayed result.
    pub fn download_name(&self) -> Option<&str> {
        self.presented.as_ref().map(|p| p.download_name.as_str())
    }

    /// Drop the displayed result and release its handles.
    pub fn clear_result(&mut self) {
        self.release_presented();
    }

    /// The handle store, e.g. for inspection in tests.
    pub const fn handles(&self) -> &H {
        &self.handles
    }

    fn release_presented(&mut self) {
        if let Some(previous) = self.presented.take() {
            self.handles.release(&previous.result.original);
            self.handles.release(&previous.result.upscaled);
        }
    }
}

impl<H: HandleStore> Drop for UpscaleController<H> {
    fn drop(&mut self) {
        self.release_presented();
    }
}

/// Download file name for an upscaled image: `upscaled_<stem>.<ext>`.
///
/// Falls back to `image` for a missing or empty stem and to `png` for an
/// unrecognised MIME type.
#[must_use]
pub fn download_name(stem: Option<&str>, mime_type: &str) -> String {
    let stem = stem.filter(|s| !s.is_empty()).unwrap_or("image");
    let ext = ImageFormat::from_mime_type(mime_type)
        .and_then(|f| f.extensions_str().first().copied())
        .unwrap_or("png");
    format!("upscaled_{stem}.{ext}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::health::HealthReport;

    /// Hands out numbered handles and records releases.
    #[derive(Debug, Default)]
    struct CountingStore {
        created: u32,
        released: Vec<u32>,
    }

    impl HandleStore for CountingStore {
        type Handle = u32;

        fn create(&mut self, _bytes: &[u8], _mime_type: &str) -> Result<u32, String> {
            self.created += 1;
            Ok(self.created)
        }

        fn release(&mut self, handle: &u32) {
            self.released.push(*handle);
        }
    }

    /// A service whose every call fails, counting attempts.
    struct OfflineService {
        calls: Cell<u32>,
    }

    impl UpscaleService for OfflineService {
        async fn health(&self) -> Result<HealthReport, RemoteServiceError> {
            self.calls.set(self.calls.get() + 1);
            Err(RemoteServiceError::Network("offline".into()))
        }

        async fn upscale(
            &self,
            _source: &SourceImage,
            _scale: ScaleFactor,
        ) -> Result<Vec<u8>, RemoteServiceError> {
            self.calls.set(self.calls.get() + 1);
            Err(RemoteServiceError::Network("offline".into()))
        }
    }

    fn png_source(w: u32, h: u32) -> SourceImage {
        let img = image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            w,
            h,
            image::Rgba([200, 100, 50, 255]),
        ));
        SourceImage::new("cat.png", resample::encode_png(&img).unwrap())
    }

    const READY: HealthStatus = HealthStatus {
        server_ready: true,
        model_ready: true,
    };

    #[test]
    fn begin_without_source_is_refused() {
        let mut controller = UpscaleController::new(CountingStore::default());
        let err = controller
            .begin(Method::Nearest, ScaleFactor::DEFAULT)
            .unwrap_err();
        assert_eq!(err, PreconditionError::NoSourceImage);
        assert!(!controller.is_busy());
    }

    #[test]
    fn begin_marks_busy_and_blocks_second_request() {
        let mut controller = UpscaleController::new(CountingStore::default());
        controller.select_source(png_source(4, 4));
        let job = controller.begin(Method::Bilinear, ScaleFactor::DEFAULT).unwrap();
        assert!(controller.is_busy());
        assert!(!controller.can_submit(Method::Bilinear));
        assert_eq!(
            controller
                .begin(Method::Bilinear, ScaleFactor::DEFAULT)
                .unwrap_err(),
            PreconditionError::RequestInFlight
        );
        assert_eq!(job.request().method, Method::Bilinear);
    }

    #[test]
    fn ai_requires_ready_state() {
        let mut controller = UpscaleController::new(CountingStore::default());
        controller.select_source(png_source(4, 4));
        assert!(controller.can_submit(Method::Nearest));
        assert!(!controller.can_submit(Method::Ai));

        controller.apply_health(HealthStatus {
            server_ready: true,
            model_ready: false,
        });
        assert_eq!(
            controller.check(Method::Ai),
            Err(PreconditionError::ServiceNotReady(Readiness::ServerOnly))
        );

        controller.apply_health(READY);
        assert!(controller.can_submit(Method::Ai));
    }

    #[test]
    fn health_transitions_are_reported() {
        let mut controller = UpscaleController::new(CountingStore::default());
        let up = controller.apply_health(READY);
        assert_eq!(up.from, Readiness::Unreachable);
        assert_eq!(up.to, Readiness::Ready);
        assert!(up.changed());
        assert!(!controller.apply_health(READY).changed());
        let down = controller.apply_health(HealthStatus::UNREACHABLE);
        assert_eq!(down.to, Readiness::Unreachable);
    }

    #[test]
    fn readiness_downgrade_does_not_touch_running_job() {
        let mut controller = UpscaleController::new(CountingStore::default());
        controller.select_source(png_source(2, 2));
        controller.apply_health(READY);
        let job = controller.begin(Method::Ai, ScaleFactor::DEFAULT).unwrap();
        controller.apply_health(HealthStatus::UNREACHABLE);
        assert!(controller.is_busy());
        assert_eq!(job.request().method, Method::Ai);
    }

    #[test]
    fn local_submit_presents_result() {
        let mut controller = UpscaleController::new(CountingStore::default());
        controller.select_source(png_source(100, 100));
        let service = OfflineService {
            calls: Cell::new(0),
        };
        let presented = pollster::block_on(controller.submit(
            Method::Nearest,
            ScaleFactor::DEFAULT,
            &service,
        ))
        .unwrap();
        assert_eq!(presented.result.upscaled_dimensions, Dimensions::new(400, 400));
        assert_eq!(presented.result.original_dimensions, Dimensions::new(100, 100));
        assert_eq!(presented.download_name, "upscaled_cat.png");
        assert_eq!(service.calls.get(), 0);
        assert!(!controller.is_busy());
    }

    #[test]
    fn failure_keeps_previous_result() {
        let mut controller = UpscaleController::new(CountingStore::default());
        controller.select_source(png_source(3, 3));
        let service = OfflineService {
            calls: Cell::new(0),
        };
        pollster::block_on(controller.submit(Method::Bicubic, ScaleFactor::DEFAULT, &service))
            .unwrap();
        let before = controller.presented().cloned();

        controller.apply_health(READY);
        let err =
            pollster::block_on(controller.submit(Method::Ai, ScaleFactor::DEFAULT, &service))
                .unwrap_err();
        assert!(matches!(err, UpscaleError::Remote(RemoteServiceError::Network(_))));
        assert_eq!(controller.presented().cloned(), before);
        assert!(controller.handles().released.is_empty());
        assert!(!controller.is_busy());
    }

    #[test]
    fn ai_with_undecodable_source_never_uploads() {
        let mut controller = UpscaleController::new(CountingStore::default());
        controller.select_source(SourceImage::new("junk.png", vec![1u8, 2, 3, 4]));
        controller.apply_health(READY);
        let service = OfflineService {
            calls: Cell::new(0),
        };
        let err =
            pollster::block_on(controller.submit(Method::Ai, ScaleFactor::DEFAULT, &service))
                .unwrap_err();
        assert!(err.is_decode());
        assert_eq!(service.calls.get(), 0);
    }

    #[test]
    fn clear_result_and_drop_release_handles() {
        let mut controller = UpscaleController::new(CountingStore::default());
        controller.select_source(png_source(2, 2));
        let service = OfflineService {
            calls: Cell::new(0),
        };
        pollster::block_on(controller.submit(Method::Nearest, ScaleFactor::DEFAULT, &service))
            .unwrap();
        controller.clear_result();
        assert_eq!(controller.handles().released, vec![1, 2]);
        assert!(controller.presented().is_none());
        controller.clear_result();
        assert_eq!(controller.handles().released.len(), 2);
    }

    #[test]
    fn download_name_variants() {
        assert_eq!(download_name(Some("photo"), "image/png"), "upscaled_photo.png");
        assert_eq!(download_name(Some("photo"), "image/jpeg"), "upscaled_photo.jpg");
        assert_eq!(download_name(None, "image/png"), "upscaled_image.png");
        assert_eq!(download_name(Some(""), "text/plain"), "upscaled_image.png");
    }
}

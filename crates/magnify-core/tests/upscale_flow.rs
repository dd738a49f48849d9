//! Integration test: drive the controller and slider end to end with a
//! scripted service and a counting handle store.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use magnify_core::{
    ContainerRect, Dimensions, HandleStore, HealthReport, HealthStatus, ImageComparisonSlider,
    Method, PointerTarget, PreconditionError, Readiness, RemoteServiceError, ScaleFactor,
    SourceImage, UpscaleController, UpscaleError, UpscaleService, check_service_health,
    compute_divider_fraction,
};

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

/// Replays canned upload responses in order and records every call.
#[derive(Default)]
struct ScriptedService {
    health_body: RefCell<Option<String>>,
    uploads: RefCell<VecDeque<Result<Vec<u8>, RemoteServiceError>>>,
    calls: Cell<u32>,
}

impl ScriptedService {
    fn push_upload(&self, response: Result<Vec<u8>, RemoteServiceError>) {
        self.uploads.borrow_mut().push_back(response);
    }
}

impl UpscaleService for ScriptedService {
    async fn health(&self) -> Result<HealthReport, RemoteServiceError> {
        self.calls.set(self.calls.get() + 1);
        let body = self
            .health_body
            .borrow()
            .clone()
            .ok_or_else(|| RemoteServiceError::Network("connection refused".into()))?;
        HealthReport::from_response(200, &body)
    }

    async fn upscale(
        &self,
        _source: &SourceImage,
        _scale: ScaleFactor,
    ) -> Result<Vec<u8>, RemoteServiceError> {
        self.calls.set(self.calls.get() + 1);
        self.uploads
            .borrow_mut()
            .pop_front()
            .expect("unexpected upload")
    }
}

fn png(w: u32, h: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        w,
        h,
        image::Rgb([10, 120, 240]),
    ));
    magnify_core::resample::encode_png(&img).unwrap()
}

fn ready_controller(service: &ScriptedService) -> UpscaleController<CountingStore> {
    let mut controller = UpscaleController::new(CountingStore::default());
    *service.health_body.borrow_mut() =
        Some(r#"{"server_status":"ready","model_status":"ready"}"#.to_owned());
    let status = pollster::block_on(check_service_health(service));
    controller.apply_health(status);
    assert_eq!(controller.readiness(), Readiness::Ready);
    controller
}

#[test]
fn submit_without_source_touches_nothing() {
    let service = ScriptedService::default();
    let mut controller = UpscaleController::new(CountingStore::default());
    for method in Method::ALL {
        let err = pollster::block_on(controller.submit(method, ScaleFactor::DEFAULT, &service))
            .unwrap_err();
        assert!(matches!(
            err,
            UpscaleError::Precondition(PreconditionError::NoSourceImage)
        ));
    }
    assert_eq!(service.calls.get(), 0);
    assert_eq!(controller.handles().created, 0);
}

#[test]
fn ai_before_ready_makes_no_network_call() {
    let service = ScriptedService::default();
    let mut controller = UpscaleController::new(CountingStore::default());
    controller.select_source(SourceImage::new("a.png", png(8, 8)));

    // Unreachable server folds into the not-ready state.
    let status = pollster::block_on(check_service_health(&service));
    assert_eq!(status, HealthStatus::UNREACHABLE);
    controller.apply_health(status);
    let polls = service.calls.get();

    let err = pollster::block_on(controller.submit(Method::Ai, ScaleFactor::DEFAULT, &service))
        .unwrap_err();
    assert!(matches!(
        err,
        UpscaleError::Precondition(PreconditionError::ServiceNotReady(Readiness::Unreachable))
    ));
    assert_eq!(service.calls.get(), polls);
}

#[test]
fn local_four_x_on_hundred_square() {
    let service = ScriptedService::default();
    let mut controller = UpscaleController::new(CountingStore::default());
    controller.select_source(SourceImage::new("photo.jpg", png(100, 100)));
    let presented =
        pollster::block_on(controller.submit(Method::Bicubic, ScaleFactor::DEFAULT, &service))
            .unwrap();
    assert_eq!(presented.result.upscaled_dimensions, Dimensions::new(400, 400));
    assert_eq!(presented.download_name, "upscaled_photo.png");
    assert_eq!(controller.download_name(), Some("upscaled_photo.png"));
}

#[test]
fn cleared_source_blocks_submission_but_keeps_result() {
    let service = ScriptedService::default();
    let mut controller = UpscaleController::new(CountingStore::default());
    controller.select_source(SourceImage::new("cat.png", png(4, 4)));
    pollster::block_on(controller.submit(Method::Nearest, ScaleFactor::DEFAULT, &service))
        .unwrap();

    controller.clear_source();
    assert!(controller.source().is_none());
    assert!(!controller.can_submit(Method::Nearest));
    let err = pollster::block_on(controller.submit(Method::Nearest, ScaleFactor::DEFAULT, &service))
        .unwrap_err();
    assert!(matches!(
        err,
        UpscaleError::Precondition(PreconditionError::NoSourceImage)
    ));

    assert_eq!(controller.download_name(), Some("upscaled_cat.png"));
    assert!(controller.handles().released.is_empty());
    assert_eq!(service.calls.get(), 0);
}

#[test]
fn http_500_keeps_previous_result() {
    let service = ScriptedService::default();
    let mut controller = ready_controller(&service);
    controller.select_source(SourceImage::new("a.png", png(10, 10)));

    service.push_upload(Ok(png(40, 40)));
    pollster::block_on(controller.submit(Method::Ai, ScaleFactor::DEFAULT, &service)).unwrap();
    let shown = controller.result().cloned().unwrap();

    service.push_upload(Err(RemoteServiceError::Status(500)));
    let err = pollster::block_on(controller.submit(Method::Ai, ScaleFactor::DEFAULT, &service))
        .unwrap_err();
    match err {
        UpscaleError::Remote(remote) => assert_eq!(remote.status(), Some(500)),
        other => panic!("expected remote error, got {other:?}"),
    }
    assert_eq!(controller.result(), Some(&shown));
    assert!(controller.handles().released.is_empty());
    assert!(!controller.is_busy());
}

#[test]
fn garbage_remote_body_is_invalid_response() {
    let service = ScriptedService::default();
    let mut controller = ready_controller(&service);
    controller.select_source(SourceImage::new("a.png", png(10, 10)));
    service.push_upload(Ok(b"<html>oops</html>".to_vec()));
    let err = pollster::block_on(controller.submit(Method::Ai, ScaleFactor::DEFAULT, &service))
        .unwrap_err();
    assert!(matches!(
        err,
        UpscaleError::Remote(RemoteServiceError::InvalidResponse(_))
    ));
    assert!(controller.result().is_none());
}

#[test]
fn sequential_successes_release_superseded_handles_once() {
    let service = ScriptedService::default();
    let mut controller = ready_controller(&service);
    controller.select_source(SourceImage::new("a.png", png(10, 10)));

    service.push_upload(Ok(png(40, 40)));
    pollster::block_on(controller.submit(Method::Ai, ScaleFactor::DEFAULT, &service)).unwrap();
    let first = controller.result().cloned().unwrap();
    assert!(controller.handles().released.is_empty());

    let second = pollster::block_on(controller.submit(
        Method::Nearest,
        ScaleFactor::DEFAULT,
        &service,
    ))
    .unwrap()
    .result
    .clone();
    assert!(second.id > first.id);
    assert_eq!(
        controller.handles().released,
        vec![first.original, first.upscaled]
    );

    let third = pollster::block_on(controller.submit(
        Method::Bilinear,
        ScaleFactor::DEFAULT,
        &service,
    ))
    .unwrap()
    .result
    .clone();
    let mut released = controller.handles().released.clone();
    assert_eq!(released.len(), 4);
    released.sort_unstable();
    released.dedup();
    assert_eq!(released.len(), 4, "each superseded handle released once");
    assert!(!released.contains(&third.original));
    assert!(!released.contains(&third.upscaled));
}

#[test]
fn readiness_drop_during_upload_does_not_cancel() {
    let service = ScriptedService::default();
    let mut controller = ready_controller(&service);
    controller.select_source(SourceImage::new("a.png", png(5, 5)));

    let job = controller.begin(Method::Ai, ScaleFactor::DEFAULT).unwrap();
    *service.health_body.borrow_mut() = None;
    let status = pollster::block_on(check_service_health(&service));
    assert!(controller.apply_health(status).changed());
    assert_eq!(controller.readiness(), Readiness::Unreachable);

    service.push_upload(Ok(png(20, 20)));
    let outcome = pollster::block_on(job.run(&service));
    let presented = controller.complete(outcome).unwrap();
    assert_eq!(presented.result.upscaled_dimensions, Dimensions::new(20, 20));
}

#[test]
fn divider_fraction_stays_in_unit_interval() {
    let rect = ContainerRect::new(37.0, 0.0, 613.0, 400.0);
    let mut x = -1.0e7;
    while x < 1.0e7 {
        let fraction = compute_divider_fraction(x, rect).unwrap();
        assert!((0.0..=1.0).contains(&fraction), "x = {x} gave {fraction}");
        let expected = ((x - rect.left) / rect.width).clamp(0.0, 1.0);
        assert!((fraction - expected).abs() < f64::EPSILON);
        x += 9_973.3;
    }
}

#[test]
fn slider_follows_presented_results() {
    let service = ScriptedService::default();
    let mut controller = UpscaleController::new(CountingStore::default());
    controller.select_source(SourceImage::new("a.png", png(30, 20)));

    let mut slider = ImageComparisonSlider::default();
    slider.set_container(ContainerRect::new(0.0, 0.0, 300.0, 300.0));

    for scale in [2, 3] {
        let presented = pollster::block_on(controller.submit(
            Method::Nearest,
            ScaleFactor::new(scale).unwrap(),
            &service,
        ))
        .unwrap();
        slider.present(
            presented.result.original_dimensions,
            presented.result.upscaled_dimensions,
        );
        assert!((slider.fraction() - 0.5).abs() < f64::EPSILON);

        slider.pointer_down(PointerTarget::Handle, 150.0);
        slider.pointer_move(-500.0);
        assert!(slider.fraction().abs() < f64::EPSILON);
        slider.pointer_up();
    }

    let layout = slider.layout().unwrap();
    // 3:2 images in a square container are letterboxed vertically.
    assert!((layout.after.width - 300.0).abs() < 1e-9);
    assert!((layout.after.y - 50.0).abs() < 1e-9);
}

//! magnify-core: Upscale request lifecycle and comparison slider (sans-IO).
//!
//! Covers everything about upscaling an image that does not touch the
//! browser or the network directly:
//! source validation -> local resampling or remote upload (behind the
//! [`UpscaleService`] trait) -> before/after result with display handles
//! (behind the [`HandleStore`] trait) -> comparison slider state.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices. Browser fetch, Blob URLs, and the Dioxus UI live in
//! `magnify-io`; the native HTTP client lives in `magnify-cli`.

pub mod compare;
pub mod controller;
pub mod health;
pub mod help;
pub mod resample;
pub mod service;
pub mod slider;
pub mod source;
pub mod types;

pub use compare::render_comparison;
pub use controller::{HandleStore, Job, Presented, UpscaleController, download_name};
pub use health::{HealthReport, HealthStatus, Readiness, Transition, check_service_health};
pub use help::{GUIDE, GUIDE_INTRO, GuideStep, HelpTopic, MethodHelp, method_help};
pub use resample::resample_local;
pub use service::{ServiceConfig, UpscaleService};
pub use slider::{
    ContainerRect, FitRect, ImageComparisonSlider, PointerTarget, SliderLayout, SliderState,
    compute_divider_fraction, fit_centered,
};
pub use source::{SourceImage, SourceInfo};
pub use types::{
    Dimensions, Method, PreconditionError, RemoteServiceError, ScaleFactor, UpscaleError,
    UpscaleRequest, UpscaleResult, UpscaledImage,
};

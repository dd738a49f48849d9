//! magnify-io: Browser I/O and Dioxus component library.
//!
//! Handles file uploads, Blob URLs and downloads, `fetch` calls to the
//! upscaling service, console logging, and provides reusable UI
//! components for the magnify web application.

pub mod blob;
pub mod components;
pub mod config;
pub mod console;
pub mod download;
pub mod notify;
pub mod remote;

pub use blob::BlobUrlStore;
pub use components::{
    ComparisonSlider, DownloadButton, FileUpload, HelpPopup, MethodPicker, Progress,
    ProgressOverlay, ServiceStatus, SourceInfoCard,
};
pub use remote::FetchService;

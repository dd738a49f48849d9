//! Dioxus UI components for magnify.
//!
//! Provides the upload zone, source details, method picker, service
//! status line, comparison slider with download button, help popup, and
//! progress overlay.

mod comparison;
mod help;
mod method_picker;
mod progress;
mod service_status;
mod source_info;
mod upload;

pub use comparison::{ComparisonSlider, DownloadButton};
pub use help::HelpPopup;
pub use method_picker::MethodPicker;
pub use progress::{Progress, ProgressOverlay};
pub use service_status::ServiceStatus;
pub use source_info::SourceInfoCard;
pub use upload::FileUpload;

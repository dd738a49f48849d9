//! Progress overlay shown while a request runs.

use dioxus::prelude::*;
use magnify_core::Method;

/// What the overlay is reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Nothing to show.
    Hidden,
    /// A request with this method is running.
    Running(Method),
    /// The request finished successfully.
    Done(Method),
    /// The request failed.
    Failed,
}

impl Progress {
    /// Overlay message.
    #[must_use]
    pub fn message(self) -> String {
        match self {
            Self::Hidden => String::new(),
            Self::Running(method) if method.is_local() => {
                format!("Upscaling with {} in the browser...", method.label())
            }
            Self::Running(method) => format!("Upscaling with {} on the server...", method.label()),
            Self::Done(method) => format!("Upscaled with {}", method.label()),
            Self::Failed => "Upscaling failed".to_owned(),
        }
    }

    /// Progress bar fill in percent.
    #[must_use]
    pub const fn percent(self) -> u8 {
        match self {
            Self::Done(_) => 100,
            _ => 0,
        }
    }
}

/// Modal overlay with a spinner while running and a full bar when done.
#[component]
pub fn ProgressOverlay(progress: Progress) -> Element {
    if progress == Progress::Hidden {
        return rsx! {};
    }
    let message = progress.message();
    let percent = progress.percent();
    let running = matches!(progress, Progress::Running(_));

    rsx! {
        div { class: "modal-backdrop",
            div { class: "modal progress", role: "status",
                if running {
                    div { class: "spinner" }
                }
                p { "{message}" }
                div { class: "progress-track",
                    div { class: "progress-bar", style: "width: {percent}%" }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_where_the_work_happens() {
        assert!(Progress::Running(Method::Bilinear).message().contains("browser"));
        assert!(Progress::Running(Method::Ai).message().contains("server"));
        assert_eq!(Progress::Hidden.message(), "");
    }

    #[test]
    fn bar_fills_only_on_success() {
        assert_eq!(Progress::Done(Method::Nearest).percent(), 100);
        assert_eq!(Progress::Running(Method::Nearest).percent(), 0);
        assert_eq!(Progress::Failed.percent(), 0);
    }
}

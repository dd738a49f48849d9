//! Status line for the remote upscaling service.

use dioxus::prelude::*;
use magnify_core::Readiness;

/// Coloured indicator and message for the current [`Readiness`].
#[component]
pub fn ServiceStatus(readiness: Readiness) -> Element {
    let state = match readiness {
        Readiness::Unreachable => "status-down",
        Readiness::ServerOnly => "status-loading",
        Readiness::Ready => "status-ready",
    };
    let message = readiness.message();

    rsx! {
        p { class: "service-status {state}", role: "status",
            span { class: "status-dot" }
            "{message}"
        }
    }
}

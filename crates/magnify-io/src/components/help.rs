//! Help popup: the getting-started guide or details for one method.

use dioxus::prelude::*;
use dioxus_free_icons::Icon;
use dioxus_free_icons::icons::ld_icons::LdX;
use magnify_core::{GUIDE, GUIDE_INTRO, GuideStep, HelpTopic, method_help};

/// Props for the [`HelpPopup`] component.
#[derive(Props, Clone, PartialEq)]
pub struct HelpPopupProps {
    /// What to show.
    topic: HelpTopic,
    /// Called when the popup is dismissed.
    on_close: EventHandler<()>,
}

/// Modal help dialog. Clicking the backdrop or the close button
/// dismisses it.
#[component]
pub fn HelpPopup(props: HelpPopupProps) -> Element {
    let content = match props.topic {
        HelpTopic::Guide => rsx! {
            section { class: "help-section",
                h3 { "Getting started" }
                p { "{GUIDE_INTRO}" }
            }
            for GuideStep { heading, body } in GUIDE {
                section { key: "{heading}", class: "help-section",
                    h4 { "{heading}" }
                    p { "{body}" }
                }
            }
        },
        HelpTopic::Method(method) => {
            let help = method_help(method);
            rsx! {
                section { class: "help-section",
                    h3 { "{help.title}" }
                    p { strong { "How it works: " } "{help.description}" }
                    p { strong { "When to use it: " } "{help.usage}" }
                }
                section { class: "help-section",
                    p { class: "text-muted",
                        "Select another method and click \"Learn more\" to read about it."
                    }
                }
            }
        }
    };

    rsx! {
        div {
            class: "modal-backdrop",
            onclick: move |_| props.on_close.call(()),
            div {
                class: "modal",
                role: "dialog",
                aria_modal: "true",
                onclick: move |evt| evt.stop_propagation(),
                button {
                    class: "modal-close",
                    aria_label: "Close help",
                    onclick: move |_| props.on_close.call(()),
                    Icon { width: 18, height: 18, icon: LdX }
                }
                {content}
            }
        }
    }
}

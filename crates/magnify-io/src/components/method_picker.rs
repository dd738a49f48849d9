//! Interpolation method selection.

use dioxus::prelude::*;
use dioxus_free_icons::Icon;
use dioxus_free_icons::icons::ld_icons::LdInfo;
use magnify_core::{Method, Readiness};

/// Props for the [`MethodPicker`] component.
#[derive(Props, Clone, PartialEq)]
pub struct MethodPickerProps {
    /// Currently selected method.
    selected: Method,
    /// Readiness of the AI path; the AI option is disabled unless ready.
    readiness: Readiness,
    /// Called when the user picks a method.
    on_select: EventHandler<Method>,
    /// Called when the user asks for details on a method.
    on_learn_more: EventHandler<Method>,
}

/// Radio group offering every [`Method`], each with a "Learn more"
/// button.
#[component]
pub fn MethodPicker(props: MethodPickerProps) -> Element {
    let readiness = props.readiness;

    rsx! {
        fieldset { class: "method-picker",
            legend { "Interpolation method" }
            for method in Method::ALL {
                {
                    let id = format!("method-{}", method.key());
                    let unavailable = !method.is_local() && !readiness.allows_ai();
                    let label = method.label();
                    rsx! {
                        div { key: "{id}", class: "method-option",
                            input {
                                r#type: "radio",
                                name: "method",
                                id: "{id}",
                                value: method.key(),
                                checked: props.selected == method,
                                disabled: unavailable,
                                onchange: move |_| props.on_select.call(method),
                            }
                            label {
                                r#for: "{id}",
                                class: if unavailable { "text-muted" } else { "" },
                                "{label}"
                                if !method.is_local() {
                                    span { class: "ai-state", " ({readiness})" }
                                }
                            }
                            button {
                                class: "btn-link",
                                r#type: "button",
                                onclick: move |_| props.on_learn_more.call(method),
                                Icon { width: 14, height: 14, icon: LdInfo }
                                "Learn more"
                            }
                        }
                    }
                }
            }
        }
    }
}

//! Before/after comparison slider and download button.
//!
//! All geometry and drag logic lives in
//! [`magnify_core::ImageComparisonSlider`]; this component only measures
//! the container, forwards pointer x-coordinates, and positions the two
//! image layers from the computed [`SliderLayout`].
//!
//! A drag starts on the handle but is tracked on the window, so moving
//! past either edge of the container pins the divider to that edge. The
//! drag ends on release, cancel, or when the window loses focus.
//!
//! Give the component a `key` derived from the result id so every new
//! result mounts a fresh slider, which presents the pair with the divider
//! centred.

use std::rc::Rc;

use dioxus::prelude::*;
use dioxus_free_icons::Icon;
use dioxus_free_icons::icons::ld_icons::LdDownload;
use gloo_events::EventListener;
use magnify_core::{
    ContainerRect, Dimensions, FitRect, ImageComparisonSlider, PointerTarget, SliderLayout,
};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use crate::download;
use crate::notify;

/// Props for the [`ComparisonSlider`] component.
#[derive(Props, Clone, PartialEq)]
pub struct ComparisonSliderProps {
    /// Blob URL of the original image.
    before_url: String,
    /// Blob URL of the upscaled image.
    after_url: String,
    /// Pixel size of the original image.
    before_dimensions: Dimensions,
    /// Pixel size of the upscaled image.
    after_dimensions: Dimensions,
}

/// Resolve on the next animation frame.
#[allow(clippy::future_not_send)] // JsFuture is !Send
async fn next_frame() {
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        let scheduled = web_sys::window()
            .is_some_and(|window| window.request_animation_frame(&resolve).is_ok());
        if !scheduled {
            let _ = resolve.call0(&JsValue::NULL);
        }
    });
    let _ = JsFuture::from(promise).await;
}

/// Wait until layout has been painted: the first frame callback runs
/// before paint, the second after it.
#[allow(clippy::future_not_send)]
async fn after_paint() {
    next_frame().await;
    next_frame().await;
}

#[allow(clippy::future_not_send)] // MountedData is !Send
async fn measure(element: &MountedData) -> Option<ContainerRect> {
    match element.get_client_rect().await {
        Ok(rect) => Some(ContainerRect::new(
            rect.origin.x,
            rect.origin.y,
            rect.size.width,
            rect.size.height,
        )),
        Err(e) => {
            log::debug!("comparison container not measurable: {e:?}");
            None
        }
    }
}

fn layer_style(fit: FitRect) -> String {
    format!(
        "left: {:.2}px; top: {:.2}px; width: {:.2}px; height: {:.2}px;",
        fit.x, fit.y, fit.width, fit.height
    )
}

fn end_drag(mut slider: Signal<ImageComparisonSlider>) {
    if slider.peek().state().is_dragging() {
        slider.write().pointer_up();
    }
}

/// Window listeners that follow a drag outside the container and count
/// resizes. Dropping them detaches them.
fn window_listeners(
    mut slider: Signal<ImageComparisonSlider>,
    mut resized: Signal<u32>,
) -> Vec<EventListener> {
    let Some(window) = web_sys::window() else {
        return Vec::new();
    };
    let release = move |_: &web_sys::Event| end_drag(slider);

    vec![
        EventListener::new(&window, "pointermove", move |event| {
            if !slider.peek().state().is_dragging() {
                return;
            }
            let Some(event) = event.dyn_ref::<web_sys::PointerEvent>() else {
                return;
            };
            if event.buttons() == 0 {
                // Released somewhere the window never saw.
                slider.write().pointer_up();
            } else {
                slider.write().pointer_move(f64::from(event.client_x()));
            }
        }),
        EventListener::new(&window, "pointerup", release),
        EventListener::new(&window, "pointercancel", release),
        EventListener::new(&window, "blur", release),
        EventListener::new(&window, "resize", move |_| resized += 1),
    ]
}

/// Draggable before/after comparison of an upscale result.
///
/// The upscaled image shows to the left of the divider, the original to
/// the right. Dragging the handle moves the divider; pressing anywhere
/// else on the track jumps it to the pointer.
#[component]
pub fn ComparisonSlider(props: ComparisonSliderProps) -> Element {
    let before_dimensions = props.before_dimensions;
    let after_dimensions = props.after_dimensions;
    let mut slider = use_signal(move || {
        let mut slider = ImageComparisonSlider::default();
        slider.present(before_dimensions, after_dimensions);
        slider
    });
    let mut container = use_signal(|| Option::<Rc<MountedData>>::None);
    let resized = use_signal(|| 0u32);
    use_hook(move || Rc::new(window_listeners(slider, resized)));

    // Re-measure after a window resize; the first measurement happens on
    // mount.
    use_effect(move || {
        if resized() == 0 {
            return;
        }
        if let Some(element) = container.peek().clone() {
            spawn(async move {
                if let Some(rect) = measure(&element).await {
                    slider.write().set_container(rect);
                }
            });
        }
    });

    // Re-measure before interaction in case the page scrolled.
    let remeasure = move |_| async move {
        let element = container.peek().clone();
        if let Some(element) = element
            && let Some(rect) = measure(&element).await
        {
            slider.write().set_container(rect);
        }
    };

    let layout: Option<SliderLayout> = slider.read().layout();
    let dragging = slider.read().state().is_dragging();
    let percent = format!("{:.0}", slider.read().fraction() * 100.0);

    rsx! {
        div {
            class: if dragging { "comparison dragging" } else { "comparison" },
            onmounted: move |evt: MountedEvent| async move {
                let element = evt.data();
                container.set(Some(Rc::clone(&element)));
                after_paint().await;
                if let Some(rect) = measure(&element).await {
                    slider.write().set_container(rect);
                }
            },
            onpointerenter: remeasure,
            onpointerdown: move |evt: PointerEvent| {
                slider.write().pointer_down(PointerTarget::Track, evt.client_coordinates().x);
            },

            if let Some(layout) = layout {
                img {
                    class: "comparison-layer",
                    src: "{props.before_url}",
                    alt: "Original",
                    draggable: "false",
                    style: layer_style(layout.before),
                }
                div {
                    class: "comparison-clip",
                    style: format!("clip-path: inset(0 {:.2}px 0 0);", layout.after_clip_right()),
                    img {
                        class: "comparison-layer",
                        src: "{props.after_url}",
                        alt: "Upscaled",
                        draggable: "false",
                        style: layer_style(layout.after),
                    }
                }
                div {
                    class: "comparison-divider",
                    style: format!("left: {:.2}px;", layout.divider_x),
                    div {
                        class: "comparison-handle",
                        role: "slider",
                        aria_label: "Comparison divider",
                        aria_valuemin: "0",
                        aria_valuemax: "100",
                        aria_valuenow: "{percent}",
                        onpointerdown: move |evt: PointerEvent| {
                            evt.stop_propagation();
                            evt.prevent_default();
                            let x = evt.client_coordinates().x;
                            slider.write().pointer_down(PointerTarget::Handle, x);
                        },
                    }
                }
                span { class: "comparison-label left", "Upscaled" }
                span { class: "comparison-label right", "Original" }
            } else {
                p { class: "text-muted comparison-pending", "Preparing comparison..." }
            }
        }
    }
}

/// Props for the [`DownloadButton`] component.
#[derive(Props, Clone, PartialEq)]
pub struct DownloadButtonProps {
    /// Blob URL of the upscaled image.
    url: String,
    /// File name to save under.
    filename: String,
}

/// Saves the upscaled image.
#[component]
pub fn DownloadButton(props: DownloadButtonProps) -> Element {
    let onclick = move |_| {
        if let Err(e) = download::trigger_download(&props.url, &props.filename) {
            log::warn!("download failed: {e}");
            notify::alert(&format!("Download failed: {e}"));
        }
    };

    rsx! {
        button { class: "btn btn-primary", onclick,
            Icon { width: 16, height: 16, icon: LdDownload }
            "Download upscaled image"
        }
    }
}

use std::rc::Rc;

use dioxus::prelude::*;
use dioxus_free_icons::Icon;
use dioxus_free_icons::icons::ld_icons::{LdInfo, LdSparkles};
use gloo_timers::future::TimeoutFuture;
use magnify_core::{
    HelpTopic, Method, ScaleFactor, SourceImage, SourceInfo, UpscaleController,
    check_service_health,
};
use magnify_io::{
    BlobUrlStore, ComparisonSlider, DownloadButton, FetchService, FileUpload, HelpPopup,
    MethodPicker, Progress, ProgressOverlay, ServiceStatus, SourceInfoCard, blob, notify,
};

/// How long the finished/failed overlay stays up.
const PROGRESS_LINGER_MS: u32 = 1000;

fn main() {
    magnify_io::console::init(log::LevelFilter::Info);
    dioxus::launch(app);
}

/// Root application component.
///
/// Owns the [`UpscaleController`] in a signal and wires together the
/// upload zone, method picker, service status, comparison slider, help
/// popup, and progress overlay. A background future polls the service
/// health for the lifetime of the page.
#[allow(clippy::too_many_lines)]
fn app() -> Element {
    // --- Application state ---
    let config = use_hook(magnify_io::config::service_config);
    let service = use_hook(|| Rc::new(FetchService::new(config.clone())));
    let mut controller = use_signal(|| UpscaleController::new(BlobUrlStore::default()));
    let mut method = use_signal(Method::default);
    let mut source_info = use_signal(|| Option::<SourceInfo>::None);
    let mut preview_url = use_signal(|| Option::<String>::None);
    let mut progress = use_signal(|| Progress::Hidden);
    let mut help = use_signal(|| Option::<HelpTopic>::None);

    // --- Health polling ---
    // Runs for the page lifetime; never touches a running job.
    let poll_millis = u32::try_from(config.poll_interval.as_millis()).unwrap_or(u32::MAX);
    let poll_service = Rc::clone(&service);
    use_future(move || {
        let service = Rc::clone(&poll_service);
        async move {
            loop {
                let status = check_service_health(&*service).await;
                let transition = controller.write().apply_health(status);
                if transition.changed() {
                    log::info!("upscaling service is {}", transition.to);
                }
                TimeoutFuture::new(poll_millis).await;
            }
        }
    });

    // --- File upload handler ---
    let on_upload = move |source: SourceImage| {
        let info = match source.probe() {
            Ok(info) => info,
            Err(e) => {
                notify::alert(&format!("Could not read {}: {e}", source.name()));
                return;
            }
        };

        let url = blob::bytes_to_blob_url(source.bytes(), source.mime_type())
            .inspect_err(|e| log::warn!("no preview for {}: {e}", info.name))
            .ok();
        let previous = std::mem::replace(&mut *preview_url.write(), url);
        if let Some(old) = previous {
            blob::revoke_blob_url(&old);
        }

        source_info.set(Some(info));
        controller.write().select_source(source);
    };

    // --- Picker dismissed without a file ---
    let on_clear = move |()| {
        if let Some(old) = preview_url.write().take() {
            blob::revoke_blob_url(&old);
        }
        source_info.set(None);
        controller.write().clear_source();
    };

    // --- Submit handler ---
    let on_submit = move |_| {
        let chosen = method();
        let job = match controller.write().begin(chosen, ScaleFactor::DEFAULT) {
            Ok(job) => job,
            Err(e) => {
                notify::alert(&e.to_string());
                return;
            }
        };
        progress.set(Progress::Running(chosen));

        let service = Rc::clone(&service);
        spawn(async move {
            // Let the overlay paint before local resampling blocks the thread.
            TimeoutFuture::new(0).await;

            let outcome = job.run(&*service).await;
            let completed = controller.write().complete(outcome).map(|_| ());
            match completed {
                Ok(()) => progress.set(Progress::Done(chosen)),
                Err(e) => {
                    progress.set(Progress::Failed);
                    notify::alert(&format!("Upscaling failed: {e}"));
                }
            }

            TimeoutFuture::new(PROGRESS_LINGER_MS).await;
            progress.set(Progress::Hidden);
        });
    };

    // --- Derived view state ---
    let (readiness, busy, can_submit, presented) = {
        let ctl = controller.read();
        (
            ctl.readiness(),
            ctl.is_busy(),
            ctl.can_submit(method()),
            ctl.presented().cloned(),
        )
    };

    // --- Layout ---
    rsx! {
        style { dangerous_inner_html: include_str!("../assets/main.css") }

        div { class: "app",
            header { class: "app-header",
                div {
                    h1 { class: "title-brand", "magnify" }
                    p { class: "text-muted",
                        "Upscale images with classic interpolation or an AI model"
                    }
                }
                button {
                    class: "btn btn-ghost",
                    aria_label: "Help",
                    onclick: move |_| help.set(Some(HelpTopic::Guide)),
                    Icon { width: 18, height: 18, icon: LdInfo }
                    "Help"
                }
            }

            main { class: "app-main",
                // Left column: input and options
                section { class: "panel",
                    FileUpload { on_upload: on_upload, on_clear: on_clear, disabled: busy }

                    if let Some(info) = source_info() {
                        SourceInfoCard { info: info, preview_url: preview_url() }
                    }

                    MethodPicker {
                        selected: method(),
                        readiness: readiness,
                        on_select: move |m| method.set(m),
                        on_learn_more: move |m| help.set(Some(HelpTopic::Method(m))),
                    }

                    ServiceStatus { readiness: readiness }

                    button {
                        class: "btn btn-primary btn-wide",
                        disabled: !can_submit,
                        onclick: on_submit,
                        Icon { width: 16, height: 16, icon: LdSparkles }
                        if busy { "Upscaling..." } else { "Upscale" }
                    }
                }

                // Right column: result
                section { class: "panel result",
                    if let Some(shown) = presented {
                        {
                            let result = shown.result;
                            let id = result.id;
                            let before = result.original_dimensions;
                            let after = result.upscaled_dimensions;
                            let label = result.method.label();
                            rsx! {
                                ComparisonSlider {
                                    key: "{id}",
                                    before_url: result.original.clone(),
                                    after_url: result.upscaled.clone(),
                                    before_dimensions: before,
                                    after_dimensions: after,
                                }
                                p { class: "text-muted small", "{before} → {after} ({label})" }
                                DownloadButton {
                                    url: result.upscaled.clone(),
                                    filename: shown.download_name,
                                }
                            }
                        }
                    } else {
                        div { class: "placeholder",
                            p { "Upload an image and click Upscale to compare the result here" }
                        }
                    }
                }
            }
        }

        if let Some(topic) = help() {
            HelpPopup { topic: topic, on_close: move |()| help.set(None) }
        }

        ProgressOverlay { progress: progress() }
    }
}

//! File upload component with drag-and-drop and file picker.

use dioxus::html::{FileData, HasFileData};
use dioxus::prelude::*;
use dioxus_free_icons::Icon;
use dioxus_free_icons::icons::ld_icons::LdUpload;
use magnify_core::SourceImage;
use magnify_core::source::has_allowed_extension;

/// Props for the [`FileUpload`] component.
#[derive(Props, Clone, PartialEq)]
pub struct FileUploadProps {
    /// Called with the selected image after a successful read.
    on_upload: EventHandler<SourceImage>,
    /// Called when the picker closes without a file.
    on_clear: EventHandler<()>,
    /// Disables the picker while a request is running.
    #[props(default)]
    disabled: bool,
}

/// A drag-and-drop zone with a file picker button.
///
/// Accepts PNG, JPEG, GIF, BMP, and WebP images. When a file is
/// selected (via the picker or drag-and-drop), reads the bytes and fires
/// `on_upload` with a [`SourceImage`]. A picker that comes back without
/// a file fires `on_clear`.
#[component]
pub fn FileUpload(props: FileUploadProps) -> Element {
    let mut dragging = use_signal(|| false);
    let mut error = use_signal(|| Option::<String>::None);
    let disabled = props.disabled;

    // Validate, read, and forward the first file from a list.
    let process_files = move |files: Vec<FileData>| async move {
        if let Some(file) = files.first() {
            let name = file.name();
            if !has_allowed_extension(&name) {
                error.set(Some(format!("Unsupported file type: {name}")));
                return;
            }
            match file.read_bytes().await {
                Ok(bytes) => {
                    error.set(None);
                    props.on_upload.call(SourceImage::new(name, bytes.to_vec()));
                }
                Err(e) => {
                    error.set(Some(format!("Failed to read file: {e}")));
                }
            }
        }
    };

    let handle_files = move |evt: FormEvent| async move {
        let files = evt.files();
        if files.is_empty() {
            error.set(None);
            props.on_clear.call(());
        } else {
            process_files(files).await;
        }
    };

    let handle_drop = move |evt: DragEvent| async move {
        evt.prevent_default();
        dragging.set(false);
        if !disabled {
            process_files(evt.files()).await;
        }
    };

    let zone_class = if dragging() {
        "upload-zone dragging"
    } else {
        "upload-zone"
    };

    rsx! {
        div {
            class: "{zone_class}",
            ondragover: move |evt| {
                evt.prevent_default();
                dragging.set(true);
            },
            ondragleave: move |_| {
                dragging.set(false);
            },
            ondrop: handle_drop,

            if let Some(ref err) = error() {
                p { class: "text-error", "{err}" }
            }

            p { class: "text-secondary", "Drop an image here or " }

            label {
                class: if disabled { "btn btn-primary disabled" } else { "btn btn-primary" },
                input {
                    r#type: "file",
                    accept: ".png,.jpg,.jpeg,.gif,.bmp,.webp",
                    class: "hidden",
                    disabled,
                    onchange: handle_files,
                }
                Icon { width: 16, height: 16, icon: LdUpload }
                "Choose image"
            }

            p { class: "text-muted small", "PNG, JPEG, GIF, BMP, WebP" }
        }
    }
}

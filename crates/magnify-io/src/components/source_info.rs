//! Preview and metadata of the selected source image.

use dioxus::prelude::*;
use magnify_core::SourceInfo;

/// Props for the [`SourceInfoCard`] component.
#[derive(Props, Clone, PartialEq)]
pub struct SourceInfoCardProps {
    /// Name, dimensions, and size of the selected file.
    info: SourceInfo,
    /// Blob URL of the selected file for the thumbnail.
    preview_url: Option<String>,
}

/// Shows the file name, resolution, and size of the selected image.
#[component]
pub fn SourceInfoCard(props: SourceInfoCardProps) -> Element {
    let info = &props.info;
    let name = info.name.clone();
    let dimensions = info.dimensions.to_string();
    let size = info.size_label();

    rsx! {
        div { class: "source-info",
            if let Some(ref url) = props.preview_url {
                img { class: "source-thumb", src: "{url}", alt: "{name}" }
            }
            dl {
                dt { "File" }
                dd { "{name}" }
                dt { "Resolution" }
                dd { "{dimensions}" }
                dt { "Size" }
                dd { "{size}" }
            }
        }
    }
}

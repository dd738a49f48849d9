//! Static help content shown in the help popup.

use crate::types::Method;

/// Help for one upscaling method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodHelp {
    /// Popup heading.
    pub title: &'static str,
    /// How the method works.
    pub description: &'static str,
    /// When to use it.
    pub usage: &'static str,
}

/// Help text for `method`.
#[must_use]
pub const fn method_help(method: Method) -> MethodHelp {
    match method {
        Method::Nearest => MethodHelp {
            title: "Nearest Neighbor",
            description: "Enlarges the image by copying the colour of the closest source \
                          pixel. The fastest method, but the result can look blocky.",
            usage: "Good when speed matters or for pixel art, where hard edges are wanted.",
        },
        Method::Bilinear => MethodHelp {
            title: "Bilinear",
            description: "Computes each new pixel from the 4 surrounding source pixels. \
                          Smoother than nearest neighbor, but can look slightly soft.",
            usage: "Suits everyday photos and graphics; a good balance of speed and quality.",
        },
        Method::Bicubic => MethodHelp {
            title: "Bicubic",
            description: "Computes each new pixel from the 16 surrounding source pixels. \
                          The smoothest and most detailed of the local methods, and the slowest.",
            usage: "Use when the highest local quality is needed, for example print output.",
        },
        Method::Ai => MethodHelp {
            title: "Real-ESRGAN (AI)",
            description: "A neural upscaler that restores lost detail and sharpens edges. \
                          It improves low-resolution images far more than interpolation can.",
            usage: "Recommended for photos and illustrations. Runs on the server, so it \
                    takes longer and is only available once the model has loaded.",
        },
    }
}

/// One step of the getting-started guide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuideStep {
    /// Step heading.
    pub heading: &'static str,
    /// Step body.
    pub body: &'static str,
}

/// Introduction shown above the guide steps.
pub const GUIDE_INTRO: &str = "Magnify raises the resolution of an image using classic \
                               interpolation in your browser or an AI model on the server.";

/// The getting-started guide shown by the main help button.
pub const GUIDE: [GuideStep; 4] = [
    GuideStep {
        heading: "1. Upload an image",
        body: "Click \"Choose image\" and pick a PNG, JPEG, GIF, BMP or WebP file. \
               Its name, resolution and size are shown right away.",
    },
    GuideStep {
        heading: "2. Choose a method",
        body: "Pick nearest neighbor, bilinear, bicubic or AI. Use \"Learn more\" next \
               to a method for details. AI is enabled only while the server and model \
               are ready.",
    },
    GuideStep {
        heading: "3. Start upscaling",
        body: "Click \"Upscale\". Local methods run in the browser; AI uploads the \
               image to the server. A progress overlay is shown meanwhile.",
    },
    GuideStep {
        heading: "4. Compare and download",
        body: "Drag the slider to compare the original with the result, then click \
               \"Download\" to save the upscaled image.",
    },
];

/// What the help popup is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    /// The getting-started guide.
    Guide,
    /// Details for one method.
    Method(Method),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_method_has_help() {
        for method in Method::ALL {
            let help = method_help(method);
            assert!(!help.title.is_empty());
            assert!(!help.description.is_empty());
            assert!(!help.usage.is_empty());
        }
    }

    #[test]
    fn guide_steps_are_numbered_in_order() {
        for (i, step) in GUIDE.iter().enumerate() {
            assert!(step.heading.starts_with(&format!("{}.", i + 1)));
        }
    }
}

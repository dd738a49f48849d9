//! Page-level configuration read from the URL.
//!
//! `?api=<url>` points the app at a different upscaling service.

use magnify_core::ServiceConfig;

/// Query parameter overriding [`ServiceConfig::base_url`].
pub const API_PARAM: &str = "api";

/// Build the service configuration for this page.
///
/// Falls back to [`ServiceConfig::default`] when there is no window or
/// no usable `api` parameter.
#[must_use]
pub fn service_config() -> ServiceConfig {
    match api_override() {
        Some(base_url) => {
            log::info!("using upscaling service at {base_url}");
            ServiceConfig::with_base_url(&base_url)
        }
        None => ServiceConfig::default(),
    }
}

fn api_override() -> Option<String> {
    let search = web_sys::window()?.location().search().ok()?;
    let params = web_sys::UrlSearchParams::new_with_str(&search).ok()?;
    params
        .get(API_PARAM)
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

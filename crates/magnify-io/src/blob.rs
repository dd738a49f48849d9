//! Blob URL creation and revocation.
//!
//! Encoded image bytes become browser-displayable `blob:` URLs so they
//! can be used as `<img src>` and download targets. [`BlobUrlStore`]
//! plugs this into the controller as its [`HandleStore`].

use magnify_core::HandleStore;
use wasm_bindgen::JsValue;
use web_sys::BlobPropertyBag;

/// Errors that can occur while creating a Blob or its URL.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// A browser API call returned an error.
    #[error("browser API error: {0}")]
    JsError(String),
}

impl From<JsValue> for BlobError {
    fn from(value: JsValue) -> Self {
        Self::JsError(format!("{value:?}"))
    }
}

/// Wrap `bytes` in a `Blob` with the given MIME type.
///
/// # Errors
///
/// Returns [`BlobError::JsError`] if Blob construction fails.
pub fn bytes_to_blob(bytes: &[u8], mime_type: &str) -> Result<web_sys::Blob, BlobError> {
    let uint8_array = js_sys::Uint8Array::from(bytes);
    let parts = js_sys::Array::new();
    parts.push(&uint8_array);

    let opts = BlobPropertyBag::new();
    opts.set_type(mime_type);
    Ok(web_sys::Blob::new_with_u8_array_sequence_and_options(
        &parts, &opts,
    )?)
}

/// Create an object URL for encoded image bytes.
///
/// The returned URL must be revoked via [`revoke_blob_url`] when no
/// longer needed to avoid memory leaks.
///
/// # Errors
///
/// Returns [`BlobError::JsError`] if Blob or URL creation fails.
pub fn bytes_to_blob_url(bytes: &[u8], mime_type: &str) -> Result<String, BlobError> {
    let blob = bytes_to_blob(bytes, mime_type)?;
    Ok(web_sys::Url::create_object_url_with_blob(&blob)?)
}

/// Revoke a Blob URL previously created by [`bytes_to_blob_url`].
///
/// Best-effort: the URL may already have been revoked.
pub fn revoke_blob_url(url: &str) {
    let _ = web_sys::Url::revoke_object_url(url);
}

/// Display handles backed by Blob URLs.
///
/// Tracks how many URLs are live so leaks show up in the debug log.
#[derive(Debug, Default)]
pub struct BlobUrlStore {
    live: usize,
}

impl HandleStore for BlobUrlStore {
    type Handle = String;

    fn create(&mut self, bytes: &[u8], mime_type: &str) -> Result<String, String> {
        let url = bytes_to_blob_url(bytes, mime_type).map_err(|e| e.to_string())?;
        self.live += 1;
        log::trace!("created {url} ({} live)", self.live);
        Ok(url)
    }

    fn release(&mut self, url: &String) {
        revoke_blob_url(url);
        self.live = self.live.saturating_sub(1);
        log::trace!("revoked {url} ({} live)", self.live);
    }
}

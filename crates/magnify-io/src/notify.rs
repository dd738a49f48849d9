//! Blocking user notifications.

/// Show `message` in a browser alert dialog.
///
/// Falls back to the log when no window is available.
pub fn alert(message: &str) {
    let shown = web_sys::window().is_some_and(|w| w.alert_with_message(message).is_ok());
    if !shown {
        log::warn!("{message}");
    }
}

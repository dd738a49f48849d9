//! [`UpscaleService`] over the browser `fetch` API.
//!
//! Every request carries an `AbortSignal` wired to a timer, so a stalled
//! server surfaces as [`RemoteServiceError::Timeout`] instead of hanging
//! the page. Uploads use [`ServiceConfig::timeout`]; health checks use the
//! much shorter [`ServiceConfig::health_deadline`].

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use gloo_timers::callback::Timeout;
use magnify_core::service::{IMAGE_FIELD, SCALE_FIELD};
use magnify_core::{
    HealthReport, RemoteServiceError, ScaleFactor, ServiceConfig, SourceImage, UpscaleService,
};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortController, FormData, RequestInit, Response};

use crate::blob::bytes_to_blob;

/// Talks to the upscaling service with `fetch`.
#[derive(Debug, Clone)]
pub struct FetchService {
    config: ServiceConfig,
}

impl FetchService {
    /// Create a service client for `config`.
    #[must_use]
    pub const fn new(config: ServiceConfig) -> Self {
        Self { config }
    }

    #[allow(clippy::future_not_send)] // WASM is single-threaded; Response is !Send
    async fn send(
        &self,
        deadline: &Deadline,
        url: &str,
        method: &str,
        body: Option<&FormData>,
    ) -> Result<Response, RemoteServiceError> {
        let window = web_sys::window()
            .ok_or_else(|| RemoteServiceError::Network("no global window".into()))?;

        let init = RequestInit::new();
        init.set_method(method);
        init.set_signal(Some(&deadline.signal()));
        if let Some(form) = body {
            init.set_body(form);
        }

        let value = JsFuture::from(window.fetch_with_str_and_init(url, &init))
            .await
            .map_err(|e| deadline.error(&e))?;
        value.dyn_into::<Response>().map_err(|_| {
            RemoteServiceError::InvalidResponse("fetch did not return a Response".into())
        })
    }
}

impl UpscaleService for FetchService {
    async fn health(&self) -> Result<HealthReport, RemoteServiceError> {
        let deadline = Deadline::start(self.config.health_deadline())?;
        let response = self
            .send(&deadline, &self.config.health_url(), "GET", None)
            .await?;
        let status = response.status();
        let promise = response.text().map_err(|e| deadline.error(&e))?;
        let text = JsFuture::from(promise)
            .await
            .map_err(|e| deadline.error(&e))?
            .as_string()
            .ok_or_else(|| {
                RemoteServiceError::InvalidResponse("health body is not text".into())
            })?;
        HealthReport::from_response(status, &text)
    }

    async fn upscale(
        &self,
        source: &SourceImage,
        scale: ScaleFactor,
    ) -> Result<Vec<u8>, RemoteServiceError> {
        let form = FormData::new().map_err(|e| js_network(&e))?;
        let blob = bytes_to_blob(source.bytes(), source.mime_type())
            .map_err(|e| RemoteServiceError::Network(e.to_string()))?;
        form.append_with_blob_and_filename(IMAGE_FIELD, &blob, source.name())
            .map_err(|e| js_network(&e))?;
        form.append_with_str(SCALE_FIELD, &scale.get().to_string())
            .map_err(|e| js_network(&e))?;

        let deadline = Deadline::start(self.config.timeout)?;
        let response = self
            .send(&deadline, &self.config.upscale_url(), "POST", Some(&form))
            .await?;
        if !response.ok() {
            return Err(RemoteServiceError::Status(response.status()));
        }
        let promise = response.array_buffer().map_err(|e| deadline.error(&e))?;
        let buffer = JsFuture::from(promise)
            .await
            .map_err(|e| deadline.error(&e))?;
        Ok(js_sys::Uint8Array::new(&buffer).to_vec())
    }
}

/// Aborts the request it signals once `limit` has elapsed.
///
/// Dropping the deadline cancels the timer.
struct Deadline {
    controller: AbortController,
    fired: Rc<Cell<bool>>,
    limit: Duration,
    _timer: Timeout,
}

impl Deadline {
    fn start(limit: Duration) -> Result<Self, RemoteServiceError> {
        let controller = AbortController::new().map_err(|e| js_network(&e))?;
        let fired = Rc::new(Cell::new(false));

        let abort = controller.clone();
        let flag = Rc::clone(&fired);
        let millis = u32::try_from(limit.as_millis()).unwrap_or(u32::MAX);
        let timer = Timeout::new(millis, move || {
            flag.set(true);
            abort.abort();
        });

        Ok(Self {
            controller,
            fired,
            limit,
            _timer: timer,
        })
    }

    fn signal(&self) -> web_sys::AbortSignal {
        self.controller.signal()
    }

    /// Classify a rejected promise: aborted by us, or a network failure.
    fn error(&self, value: &JsValue) -> RemoteServiceError {
        if self.fired.get() {
            RemoteServiceError::Timeout(self.limit)
        } else {
            js_network(value)
        }
    }
}

fn js_network(value: &JsValue) -> RemoteServiceError {
    let message = value
        .dyn_ref::<js_sys::Error>()
        .map_or_else(|| format!("{value:?}"), |e| String::from(e.message()));
    RemoteServiceError::Network(message)
}

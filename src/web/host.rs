use super::{describe, format_all_dates};
use crate::{FetchRequest, Host, Payload, Settle, SyncError, Tick};
use core::time::Duration;
use tracing::{instrument, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{Document, FormData, Headers, HtmlFormElement, Request, RequestCredentials, RequestInit, Response, UrlSearchParams, VisibilityState, Window};

/// [`Host`] backed by the current browser window.
#[derive(Debug, Clone)]
pub struct WebHost {
	window: Window,
	document: Document,
}

impl WebHost {
	/// # Errors
	///
	/// Iff there is no `window` or no `document`, e.g. in a worker.
	pub fn new() -> Result<Self, SyncError> {
		let window = web_sys::window().ok_or_else(|| SyncError::Transport("No `window` found.".to_owned()))?;
		let document = window.document().ok_or_else(|| SyncError::Transport("No `document` found.".to_owned()))?;
		Ok(Self { window, document })
	}
}

impl Host for WebHost {
	fn is_visible(&self) -> bool {
		self.document.visibility_state() != VisibilityState::Hidden
	}

	fn set_timeout(&self, delay: Duration, tick: Tick) -> Result<(), SyncError> {
		let callback = Closure::once_into_js(move || tick());
		let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
		self.window
			.set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), millis)
			.map(drop)
			.map_err(|error| SyncError::Timer(describe(&error)))
	}

	fn fetch(&self, request: FetchRequest, settle: Settle) {
		let window = self.window.clone();
		let document = self.document.clone();
		spawn_local(async move { settle(fetch_payload(&window, &document, &request).await) });
	}

	fn format_dates(&self) {
		if let Err(error) = format_all_dates() {
			warn!("`window.formatAllDates()` failed: {}", describe(&error));
		}
	}
}

fn transport(error: JsValue) -> SyncError {
	SyncError::Transport(describe(&error))
}

#[instrument(skip(window, document))]
async fn fetch_payload(window: &Window, document: &Document, request: &FetchRequest) -> Result<Payload, SyncError> {
	let headers = Headers::new().map_err(transport)?;
	headers.set("Accept", "application/json").map_err(transport)?;
	headers.set("X-Requested-With", "XMLHttpRequest").map_err(transport)?;

	let init = RequestInit::new();
	init.set_method(request.method().as_str());
	init.set_credentials(RequestCredentials::SameOrigin);
	if let Some(form) = &request.form {
		let body = serialize_form(document, form)?;
		headers.set("Content-Type", "application/x-www-form-urlencoded; charset=UTF-8").map_err(transport)?;
		init.set_body(&JsValue::from_str(&body));
	}
	init.set_headers(&headers);

	let web_request = Request::new_with_str_and_init(request.resource.as_str(), &init).map_err(transport)?;
	let response: Response = JsFuture::from(window.fetch_with_request(&web_request))
		.await
		.map_err(transport)?
		.dyn_into()
		.map_err(|value| SyncError::Transport(format!("`fetch` resolved to a non-`Response`: {}", describe(&value))))?;
	if !response.ok() {
		return Err(SyncError::Status(response.status()));
	}

	let text = JsFuture::from(response.text().map_err(transport)?).await.map_err(transport)?;
	let text = text.as_string().ok_or_else(|| SyncError::Transport("Response body is not text.".to_owned()))?;
	Payload::from_json(&text)
}

/// URL-encodes the fields of the `<form>` with id `form_id`.
///
/// # Errors
///
/// Iff there is no such form or the browser rejects its fields.
pub fn serialize_form(document: &Document, form_id: &str) -> Result<String, SyncError> {
	let form: HtmlFormElement = document
		.get_element_by_id(form_id)
		.and_then(|element| element.dyn_into().ok())
		.ok_or_else(|| SyncError::MissingForm { id: form_id.to_owned() })?;
	let data = FormData::new_with_form(&form).map_err(transport)?;
	let params = UrlSearchParams::new_with_str_sequence_sequence(&data).map_err(transport)?;
	Ok(params.to_string().into())
}

//! Browser bindings: the [`WebHost`], the diffDOM-backed [`DiffDomReconciler`] and the JavaScript-facing [`UpdateContent`].

mod host;
mod reconcile;

pub use host::{serialize_form, WebHost};
pub use reconcile::{DiffDom, DiffDomReconciler};

use crate::{Controller, SyncError};
use std::rc::Rc;
use wasm_bindgen::{prelude::wasm_bindgen, JsValue};

#[wasm_bindgen]
extern "C" {
	/// The page's date-formatting pass.
	#[wasm_bindgen(js_namespace = window, js_name = formatAllDates, catch)]
	fn format_all_dates() -> Result<(), JsValue>;
}

/// Best-effort description of a thrown JavaScript value.
pub(crate) fn describe(value: &JsValue) -> String {
	value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

/// Live-updating components for one page.
///
/// ```js
/// const updateContent = new UpdateContent();
/// document.querySelectorAll("[data-module=update-content]").forEach((component) => updateContent.start(component));
/// ```
///
/// Every component started through the same instance shares its request deduplication.
#[wasm_bindgen]
pub struct UpdateContent {
	controller: Controller<WebHost>,
	diff_dom: Rc<DiffDom>,
}

#[wasm_bindgen]
impl UpdateContent {
	/// # Errors
	///
	/// Iff there is no `window`/`document` or `window.DiffDOM` can't be constructed.
	#[wasm_bindgen(constructor)]
	pub fn new() -> Result<UpdateContent, JsValue> {
		let host = WebHost::new()?;
		let diff_dom = DiffDom::new().map_err(|error| SyncError::Patch(format!("`new DiffDOM()` failed: {}", describe(&error))))?;
		Ok(Self {
			controller: Controller::new(Rc::new(host)),
			diff_dom: Rc::new(diff_dom),
		})
	}

	/// Reads `component`'s `data-*` configuration and starts polling for it.
	///
	/// # Errors
	///
	/// Iff the configuration is incomplete or invalid.
	pub fn start(&self, component: web_sys::Element) -> Result<(), JsValue> {
		let reconciler = DiffDomReconciler::new(Rc::clone(&self.diff_dom), component.clone());
		self.controller.start(|name| component.get_attribute(name), reconciler)?;
		Ok(())
	}
}

use super::describe;
use crate::{Reconcile, SyncError};
use std::rc::Rc;
use tracing::trace;
use wasm_bindgen::{prelude::wasm_bindgen, JsCast, JsValue};
use web_sys::{Element, HtmlTemplateElement};

#[wasm_bindgen]
extern "C" {
	/// The page's [diffDOM](https://github.com/fiduswriter/diffDOM) engine.
	#[wasm_bindgen(js_name = DiffDOM)]
	#[derive(Debug)]
	pub type DiffDom;

	#[wasm_bindgen(constructor, js_class = "DiffDOM", catch)]
	pub fn new() -> Result<DiffDom, JsValue>;

	/// Computes the patch that turns `old` into `new`.
	#[wasm_bindgen(method, catch)]
	pub fn diff(this: &DiffDom, old: &Element, new: &Element) -> Result<JsValue, JsValue>;

	/// Applies `patch` to `tree` in place. Resolves to `false` if the patch didn't fit.
	#[wasm_bindgen(method, catch)]
	pub fn apply(this: &DiffDom, tree: &Element, patch: &JsValue) -> Result<JsValue, JsValue>;
}

/// Reconciles one mount point through a shared [`DiffDom`].
///
/// The fragment's first element is diffed against the mount point itself, attributes included.
#[derive(Debug, Clone)]
pub struct DiffDomReconciler {
	engine: Rc<DiffDom>,
	mount: Element,
}

impl DiffDomReconciler {
	#[must_use]
	pub fn new(engine: Rc<DiffDom>, mount: Element) -> Self {
		Self { engine, mount }
	}
}

impl Reconcile for DiffDomReconciler {
	fn reconcile(&self, fragment: &str) -> Result<(), SyncError> {
		let target = parse_fragment(&self.mount, fragment)?;
		let patch = self.engine.diff(&self.mount, &target).map_err(|error| SyncError::Patch(describe(&error)))?;
		match self.engine.apply(&self.mount, &patch) {
			Ok(applied) if applied.as_bool() == Some(false) => Err(SyncError::Patch("diffDOM could not apply the patch.".to_owned())),
			Ok(_) => {
				trace!("Patched.");
				Ok(())
			}
			Err(error) => Err(SyncError::Patch(describe(&error))),
		}
	}
}

/// Parses `fragment` in `mount`'s document, without attaching it, and returns its first element.
pub(crate) fn parse_fragment(mount: &Element, fragment: &str) -> Result<Element, SyncError> {
	let document = mount.owner_document().ok_or_else(|| SyncError::Patch("Mount point has no owner document.".to_owned()))?;
	let template: HtmlTemplateElement = document
		.create_element("template")
		.map_err(|error| SyncError::Patch(describe(&error)))?
		.dyn_into()
		.map_err(|_| SyncError::Patch("`<template>` is not an `HTMLTemplateElement`.".to_owned()))?;
	template.set_inner_html(fragment);
	template
		.content()
		.first_element_child()
		.ok_or_else(|| SyncError::Patch("Fragment contains no element.".to_owned()))
}

//! Accessible `<details>`/`<summary>` disclosure widgets.
//!
//! Each widget's parts are kept in a side table keyed by its `<summary>` element (through a `WeakMap`),
//! so the DOM elements themselves carry no extra properties.
//! The polyfill is active at most once per document, marked by [`INSTALLED_ATTRIBUTE`] on the root element.

use crate::web::describe;
use core::cell::{Cell, RefCell};
use js_sys::{Reflect, WeakMap};
use std::rc::Rc;
use tracing::{debug, instrument, trace, warn};
use wasm_bindgen::{closure::Closure, prelude::wasm_bindgen, JsCast, JsValue};
use web_sys::{Document, Element, Event, HtmlElement, KeyboardEvent, Node};

/// Present on `<html>` while a [`DisclosurePolyfill`] handles the document's events.
pub const INSTALLED_ATTRIBUTE: &str = "data-details-polyfill";

pub const OPEN_GLYPH: &str = "\u{25bc}";
pub const CLOSED_GLYPH: &str = "\u{25ba}";

/// Open or closed, and the attribute values that follow from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisclosureState {
	pub open: bool,
}

impl DisclosureState {
	#[must_use]
	pub fn toggled(self) -> Self {
		Self { open: !self.open }
	}

	#[must_use]
	pub fn aria_expanded(self) -> &'static str {
		if self.open {
			"true"
		} else {
			"false"
		}
	}

	#[must_use]
	pub fn aria_hidden(self) -> &'static str {
		if self.open {
			"false"
		} else {
			"true"
		}
	}

	/// `tabIndex` of links, inputs and buttons inside the content.
	#[must_use]
	pub fn interactive_tab_index(self) -> &'static str {
		if self.open {
			"0"
		} else {
			"-1"
		}
	}

	/// `display` of the content where the browser doesn't hide it natively.
	#[must_use]
	pub fn content_display(self) -> &'static str {
		if self.open {
			""
		} else {
			"none"
		}
	}

	#[must_use]
	pub fn glyph(self) -> &'static str {
		if self.open {
			OPEN_GLYPH
		} else {
			CLOSED_GLYPH
		}
	}

	#[must_use]
	pub fn twisty_class(self) -> &'static str {
		if self.open {
			"arrow arrow-open"
		} else {
			"arrow arrow-closed"
		}
	}
}

/// Which keys activate a focused summary.
#[must_use]
pub fn is_activation_key(key: &str) -> bool {
	matches!(key, "Enter" | " " | "Spacebar")
}

struct Disclosure {
	details: Element,
	summary: Element,
	content: HtmlElement,
	interactive: Vec<Element>,
	twisty: Element,
	state: Cell<DisclosureState>,
}

impl Disclosure {
	fn apply(&self, native: bool) -> Result<(), JsValue> {
		let state = self.state.get();
		self.summary.set_attribute("aria-expanded", state.aria_expanded())?;
		self.content.set_attribute("aria-hidden", state.aria_hidden())?;
		for element in &self.interactive {
			element.set_attribute("tabIndex", state.interactive_tab_index())?;
		}

		if !native {
			self.content.style().set_property("display", state.content_display())?;
			if state.open {
				self.details.set_attribute("open", "open")?;
			} else {
				self.details.remove_attribute("open")?;
			}
		}

		self.twisty.set_text_content(Some(state.glyph()));
		self.twisty.set_attribute("class", state.twisty_class())
	}
}

struct Widgets {
	disclosures: RefCell<Vec<Disclosure>>,
	by_summary: WeakMap,
	native: bool,
}

impl Widgets {
	fn insert(&self, disclosure: Disclosure) -> Result<(), JsValue> {
		let mut disclosures = self.disclosures.borrow_mut();
		let index = u32::try_from(disclosures.len()).map_err(|_| JsValue::from_str("Too many <details> elements."))?;
		self.by_summary.set(disclosure.summary.as_ref(), &JsValue::from(index));
		disclosures.push(disclosure);
		Ok(())
	}

	fn disclosure_index(&self, summary: &Element) -> Option<usize> {
		let stored = self.by_summary.get(summary).as_f64()?;
		// Only ever an exact `u32`, as written by `insert`.
		#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::float_cmp)]
		let index = Some(stored as u32).filter(|index| f64::from(*index) == stored)?;
		usize::try_from(index).ok()
	}

	fn toggle(&self, summary: &Element) -> Result<(), JsValue> {
		let index = match self.disclosure_index(summary) {
			Some(index) => index,
			None => return Ok(trace!("Summary outside a polyfilled <details>; ignored.")),
		};
		let disclosures = self.disclosures.borrow();
		let disclosure = &disclosures[index];
		disclosure.state.set(disclosure.state.get().toggled());
		debug!(index, open = disclosure.state.get().open, "Toggled disclosure.");
		disclosure.apply(self.native)
	}
}

/// The installed polyfill. Its event listeners stay registered as long as this value exists.
#[wasm_bindgen]
pub struct DisclosurePolyfill {
	widgets: Rc<Widgets>,
	listeners: Vec<(&'static str, Closure<dyn Fn(Event)>)>,
	document: Document,
}

#[wasm_bindgen]
impl DisclosurePolyfill {
	/// Enhances every `<details>` element currently in `document` and starts handling activation.
	///
	/// Returns [`None`] (`undefined` in JavaScript) without touching anything if another instance is active on `document`.
	/// Dropping (or `free`ing) the returned instance removes its listeners and allows installing again.
	///
	/// # Errors
	///
	/// Iff a `<details>` element lacks a `<summary>` or content `<div>`, or the DOM rejects an update.
	pub fn install(document: Document) -> Result<Option<DisclosurePolyfill>, JsValue> {
		let root = document.document_element();
		if root.as_ref().map_or(false, |root| root.has_attribute(INSTALLED_ATTRIBUTE)) {
			debug!("Disclosure polyfill already installed; ignored.");
			return Ok(None);
		}

		let native = supports_native_details(&document)?;
		let widgets = Rc::new(Widgets {
			disclosures: RefCell::new(Vec::new()),
			by_summary: WeakMap::new(),
			native,
		});

		let list = document.get_elements_by_tag_name("details");
		for i in 0..list.length() {
			let details = match list.item(i) {
				Some(details) => details,
				None => continue,
			};
			widgets.insert(enhance(&document, &details, i, native)?)?;
		}
		debug!(count = widgets.disclosures.borrow().len(), native, "Installed disclosure polyfill.");

		if let Some(root) = &root {
			root.set_attribute(INSTALLED_ATTRIBUTE, "")?;
		}
		let mut polyfill = Self {
			widgets,
			listeners: Vec::new(),
			document,
		};
		polyfill.listen("keypress", |_, event| {
			if let (Some(key), Some(target)) = (event.dyn_ref::<KeyboardEvent>(), event.target()) {
				let is_summary = target.dyn_ref::<Node>().map_or(false, |node| node.node_name().eq_ignore_ascii_case("summary"));
				if is_summary && matches!(key.key().as_str(), " " | "Spacebar") {
					// Keeps Space from scrolling the page.
					event.prevent_default();
				}
			}
		})?;
		polyfill.listen("keyup", |widgets, event| {
			if event.dyn_ref::<KeyboardEvent>().map_or(false, |key| is_activation_key(&key.key())) {
				activate(widgets, &event);
			}
		})?;
		polyfill.listen("mouseup", |widgets, event| activate(widgets, &event))?;
		Ok(Some(polyfill))
	}

	/// Number of enhanced `<details>` elements.
	#[wasm_bindgen(getter)]
	pub fn count(&self) -> usize {
		self.widgets.disclosures.borrow().len()
	}
}

impl DisclosurePolyfill {
	fn listen(&mut self, name: &'static str, handler: impl 'static + Fn(&Widgets, Event)) -> Result<(), JsValue> {
		let widgets = Rc::clone(&self.widgets);
		let closure = Closure::wrap(Box::new(move |event: Event| handler(&widgets, event)) as Box<dyn Fn(Event)>);
		self.document.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
		self.listeners.push((name, closure));
		Ok(())
	}
}

impl Drop for DisclosurePolyfill {
	fn drop(&mut self) {
		for (name, closure) in &self.listeners {
			if let Err(error) = self.document.remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref()) {
				warn!("Failed to remove {:?} listener: {}", name, describe(&error));
			}
		}
		if let Some(root) = self.document.document_element() {
			if let Err(error) = root.remove_attribute(INSTALLED_ATTRIBUTE) {
				warn!("Failed to unmark the document: {}", describe(&error));
			}
		}
	}
}

fn supports_native_details(document: &Document) -> Result<bool, JsValue> {
	let probe = document.create_element("details")?;
	Ok(Reflect::get(&probe, &JsValue::from_str("open"))?.as_bool().is_some())
}

#[instrument(skip(document, details))]
fn enhance(document: &Document, details: &Element, i: u32, native: bool) -> Result<Disclosure, JsValue> {
	let summary = details
		.get_elements_by_tag_name("summary")
		.item(0)
		.ok_or_else(|| JsValue::from_str("<details> without <summary>"))?;
	let content: HtmlElement = details
		.get_elements_by_tag_name("div")
		.item(0)
		.ok_or_else(|| JsValue::from_str("<details> without content <div>"))?
		.dyn_into()
		.map_err(|_| JsValue::from_str("<details> content is not an HTML element"))?;
	let interactive_list = content.query_selector_all("a, input, button")?;
	let interactive = (0..interactive_list.length())
		.filter_map(|i| interactive_list.item(i))
		.filter_map(|node| node.dyn_into::<Element>().ok())
		.collect();

	if content.id().is_empty() {
		content.set_id(&format!("details-content-{}", i));
	}
	details.set_attribute("role", "group")?;
	summary.set_attribute("role", "button")?;
	summary.set_attribute("aria-controls", &content.id())?;
	if !native {
		summary.set_attribute("tabIndex", "0")?;
	}

	let state = DisclosureState {
		open: details.has_attribute("open"),
	};
	let twisty = match summary.first_element_child().filter(is_twisty) {
		// Left behind by an earlier, since dropped, instance.
		Some(twisty) => twisty,
		None => {
			let twisty = document.create_element("i")?;
			twisty.set_attribute("aria-hidden", "true")?;
			summary.insert_before(&twisty, summary.first_child().as_ref())?;
			twisty
		}
	};

	let disclosure = Disclosure {
		details: details.clone(),
		summary,
		content,
		interactive,
		twisty,
		state: Cell::new(state),
	};
	disclosure.apply(native)?;
	Ok(disclosure)
}

fn is_twisty(element: &Element) -> bool {
	element.tag_name().eq_ignore_ascii_case("i") && element.get_attribute("class").map_or(false, |class| class.starts_with("arrow "))
}

/// Toggles the disclosure whose summary is or contains the event target.
fn activate(widgets: &Widgets, event: &Event) {
	let mut node = event.target().and_then(|target| target.dyn_into::<Node>().ok());
	while let Some(current) = node {
		if current.node_name().eq_ignore_ascii_case("summary") {
			if let Ok(summary) = current.dyn_into::<Element>() {
				if let Err(error) = widgets.toggle(&summary) {
					warn!("Failed to toggle disclosure: {}", describe(&error));
				}
			}
			return;
		}
		node = current.parent_node();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn closed_state() {
		let closed = DisclosureState { open: false };
		assert_eq!(closed.aria_expanded(), "false");
		assert_eq!(closed.aria_hidden(), "true");
		assert_eq!(closed.interactive_tab_index(), "-1");
		assert_eq!(closed.content_display(), "none");
		assert_eq!(closed.glyph(), "\u{25ba}");
		assert_eq!(closed.twisty_class(), "arrow arrow-closed");
	}

	#[test]
	fn toggling_opens_and_closes() {
		let open = DisclosureState { open: false }.toggled();
		assert_eq!(open, DisclosureState { open: true });
		assert_eq!(open.aria_expanded(), "true");
		assert_eq!(open.aria_hidden(), "false");
		assert_eq!(open.interactive_tab_index(), "0");
		assert_eq!(open.content_display(), "");
		assert_eq!(open.glyph(), "\u{25bc}");
		assert_eq!(open.twisty_class(), "arrow arrow-open");
		assert_eq!(open.toggled().toggled(), open);
	}

	#[test]
	fn activation_keys() {
		assert!(is_activation_key("Enter"));
		assert!(is_activation_key(" "));
		assert!(!is_activation_key("Tab"));
		assert!(!is_activation_key("a"));
	}
}

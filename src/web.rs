//! A [`Dom`] over the browser's DOM, through [`web_sys`].

use crate::{
	chunk::{Chunk, Component},
	dom::Dom,
	scan_store::{ScanMap, ScanSet},
	store::Identity,
};
use std::rc::Rc;
use tracing::{error, instrument, trace};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, DocumentFragment, Element, HtmlTemplateElement, Node};

/// JavaScript identity (`===`).
impl Identity for Node {
	fn same(&self, other: &Self) -> bool {
		let this: &JsValue = self.as_ref();
		let other: &JsValue = other.as_ref();
		this == other
	}
}

/// Renders into nodes owned by `document`.
///
/// Browser node handles can't be held weakly from Rust, so the registries are [`ScanMap`] and [`ScanSet`].
/// Use [`Renderer::unbind`](`crate::Renderer::unbind`) on render targets that are discarded to keep them small.
#[derive(Debug, Clone)]
pub struct WebDom {
	document: Document,
}

impl WebDom {
	#[must_use]
	pub fn new(document: Document) -> Self {
		Self { document }
	}

	#[must_use]
	pub fn document(&self) -> &Document {
		&self.document
	}

	fn template(&self) -> Result<HtmlTemplateElement, JsValue> {
		self.document
			.create_element("template")?
			.dyn_into::<HtmlTemplateElement>()
			.map_err(Into::into)
	}
}

fn parent(node: &Node) -> Option<Node> {
	let parent = node.parent_node();
	if parent.is_none() {
		error!("Node has no parent.");
	}
	parent
}

fn log_failure<T>(operation: &str, result: Result<T, JsValue>) {
	if let Err(error) = result {
		if cfg!(feature = "dangerous-logging") {
			error!("Failed to {}: {:?}", operation, error);
		} else {
			error!("Failed to {}.", operation);
		}
	}
}

impl Dom for WebDom {
	type Node = Node;
	type OwnedChunks = ScanMap<Node, Rc<Chunk<Node>>>;
	type Views<V> = ScanMap<Component<Node>, V>;
	type Visited = ScanSet<Component<Node>>;

	/// Parses `markup` through a `<template>` element, so that scripts in it stay inert.
	#[instrument(skip(self, markup))]
	fn parse_fragment(&self, markup: &str) -> Node {
		let template = match self.template() {
			Ok(template) => template,
			Err(error) => {
				error!("Failed to create template element: {:?}", error);
				return self.document.create_document_fragment().into();
			}
		};
		template.set_inner_html(markup);

		let content: DocumentFragment = template.content();
		match self.document.adopt_node(&content) {
			Ok(adopted) => adopted,
			Err(error) => {
				error!("Failed to adopt parsed content: {:?}", error);
				content.into()
			}
		}
	}

	fn elements_by_tag_name(&self, root: &Node, tag: &str) -> Vec<Node> {
		let found = if let Some(fragment) = root.dyn_ref::<DocumentFragment>() {
			fragment.query_selector_all(tag)
		} else if let Some(element) = root.dyn_ref::<Element>() {
			element.query_selector_all(tag)
		} else {
			trace!("Root can't contain elements.");
			return Vec::new();
		};

		match found {
			Ok(list) => (0..list.length()).filter_map(|i| list.get(i)).collect(),
			Err(error) => {
				error!("Failed to query {:?}: {:?}", tag, error);
				Vec::new()
			}
		}
	}

	fn attribute(&self, node: &Node, name: &str) -> Option<String> {
		node.dyn_ref::<Element>()?.get_attribute(name)
	}

	fn replace_with(&self, old: &Node, new: &Node) {
		if old.same(new) {
			return;
		}
		if let Some(parent) = parent(old) {
			log_failure("replace node", parent.replace_child(new, old));
		}
	}

	fn insert_after(&self, reference: &Node, new: &Node) {
		if let Some(parent) = parent(reference) {
			log_failure("insert node", parent.insert_before(new, reference.next_sibling().as_ref()));
		}
	}

	fn remove(&self, node: &Node) {
		if let Some(parent) = node.parent_node() {
			log_failure("remove node", parent.remove_child(node));
		}
	}

	fn clear_children(&self, node: &Node) {
		node.set_text_content(None);
	}

	fn move_children(&self, from: &Node, to: &Node) {
		while let Some(child) = from.first_child() {
			if let Err(error) = to.append_child(&child) {
				error!("Failed to move child node: {:?}", error);
				break;
			}
		}
	}
}

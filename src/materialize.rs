//! Turns flat markup into detached output nodes and splices components into its placeholders.

use crate::{
	dom::Dom,
	markup::{number_placeholders, SLOT_ATTRIBUTE, SLOT_TAG},
};
use tracing::{error, instrument, trace};

/// Parses `markup` into a detached container, numbering its placeholders by document order first.
///
/// Placeholders are later located by that number rather than by position, so a placeholder the host
/// parser moves or drops doesn't shift the components of the others. The moved placeholder's component
/// still lands where the parser put it, see [`markup`](crate::markup#known-limitation).
#[instrument(skip(dom, markup), fields(markup.len = markup.len()))]
pub fn materialize<D: Dom>(dom: &D, markup: &str) -> D::Node {
	let (numbered, count) = number_placeholders(markup);
	trace!("Numbered {} placeholder(s).", count);
	if cfg!(feature = "dangerous-logging") {
		trace!("Parsing {:?}", numbered);
	}
	dom.parse_fragment(&numbered)
}

/// Replaces each numbered placeholder in `fragment` with its component's nodes.
///
/// The `i`th component replaces placeholder `i`. A component with several nodes puts the first in the
/// placeholder's place and the others after it, in order. A component with no nodes just removes its
/// placeholder.
///
/// All placeholders are located before any is replaced, so components don't depend on each other.
#[instrument(skip(dom, fragment, components), fields(components = components.len()))]
pub fn splice<D: Dom, C: AsRef<[D::Node]>>(dom: &D, fragment: &D::Node, components: &[C]) {
	let mut slots: Vec<Option<D::Node>> = vec![None; components.len()];
	for marker in dom.elements_by_tag_name(fragment, SLOT_TAG) {
		match dom.attribute(&marker, SLOT_ATTRIBUTE).and_then(|index| index.parse::<usize>().ok()) {
			Some(index) if index < slots.len() => {
				if let Some(earlier) = slots[index].replace(marker) {
					error!("Duplicate placeholder {}. Removing the earlier one.", index);
					dom.remove(&earlier);
				}
			}
			index => {
				error!("Placeholder {:?} has no component. Removing it.", index);
				dom.remove(&marker);
			}
		}
	}

	for (index, (slot, component)) in slots.into_iter().zip(components).enumerate() {
		let marker = match slot {
			Some(marker) => marker,
			None => {
				error!("Component {} has no placeholder. Skipping it.", index);
				continue;
			}
		};

		let nodes = component.as_ref();
		match nodes.split_first() {
			None => dom.remove(&marker),
			Some((first, rest)) => {
				dom.replace_with(&marker, first);
				let mut previous = first;
				for node in rest {
					dom.insert_after(previous, node);
					previous = node;
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		markup::PLACEHOLDER,
		memory::{MemoryDom, Node},
	};

	fn markup(template: &str) -> String {
		template.replace('#', PLACEHOLDER)
	}

	#[test]
	fn splices_in_document_order() {
		let fragment = materialize(&MemoryDom, &markup("<main>#<p>#</p></main>#"));
		let components = vec![vec![Node::element("a")], vec![Node::element("b")], vec![Node::element("c")]];
		splice(&MemoryDom, &fragment, &components);
		assert_eq!(fragment.inner_html(), "<main><a></a><p><b></b></p></main><c></c>");
	}

	#[test]
	fn multi_root_components_keep_sibling_order() {
		let fragment = materialize(&MemoryDom, &markup("x#y"));
		let components = vec![vec![Node::element("a"), Node::text("b"), Node::element("c")]];
		splice(&MemoryDom, &fragment, &components);
		assert_eq!(fragment.inner_html(), "x<a></a>b<c></c>y");
	}

	#[test]
	fn empty_component_removes_placeholder() {
		let fragment = materialize(&MemoryDom, &markup("<b>#</b>"));
		let components: Vec<Vec<Node>> = vec![Vec::new()];
		splice(&MemoryDom, &fragment, &components);
		assert_eq!(fragment.inner_html(), "<b></b>");
	}

	#[test]
	fn literal_markers_do_not_capture_components() {
		// A hand-written marker pointing beyond the component list is dropped.
		let fragment = materialize(&MemoryDom, &format!("{}<lit-slot data-slot=\"7\"></lit-slot>", PLACEHOLDER));
		let components = vec![vec![Node::element("a")]];
		splice(&MemoryDom, &fragment, &components);
		assert_eq!(fragment.inner_html(), "<a></a>");
	}

	#[test]
	fn adjacent_placeholders() {
		let fragment = materialize(&MemoryDom, &markup("##"));
		let components = vec![vec![Node::text("1"), Node::text("2")], vec![Node::text("3")]];
		splice(&MemoryDom, &fragment, &components);
		assert_eq!(fragment.text_content(), "123");
	}
}

//! An in-memory output tree.
//!
//! Useful for rendering without a browser (for example to serve the resulting markup) and for tests.
//! Node handles are reference-counted, so render targets and views that become unreachable drop out
//! of the renderer's registries on their own.

use crate::{
	chunk::{Chunk, Component},
	dom::Dom,
	markup::escape,
	store::{Downgrade, Identity, Upgrade, WeakMap, WeakSet},
};
use html5gum::{State, Token, Tokenizer};
use std::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
	rc::{Rc, Weak},
};
use tracing::{error, instrument, trace};

/// HTML void elements that cannot have children.
const VOID_ELEMENTS: &[&str] = &[
	"area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source", "track", "wbr",
];

fn is_void_element(name: &str) -> bool {
	VOID_ELEMENTS.contains(&name)
}

fn is_raw_text_element(name: &str) -> bool {
	matches!(name, "script" | "style")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
	/// A detached container, like a `DocumentFragment`.
	Fragment,
	Element {
		/// Lowercase.
		name: String,
		attributes: Vec<(String, String)>,
	},
	Text(String),
	Comment(String),
}

struct NodeData {
	kind: NodeKind,
	parent: RefCell<Weak<NodeData>>,
	children: RefCell<Vec<Node>>,
}

/// A shared handle to one node of a [`MemoryDom`] tree.
///
/// Clones refer to the same node. A parent holds its children strongly and is held weakly by them.
#[derive(Clone)]
pub struct Node(Rc<NodeData>);

impl Node {
	fn new(kind: NodeKind) -> Self {
		Self(Rc::new(NodeData {
			kind,
			parent: RefCell::new(Weak::new()),
			children: RefCell::new(Vec::new()),
		}))
	}

	#[must_use]
	pub fn fragment() -> Self {
		Self::new(NodeKind::Fragment)
	}

	#[must_use]
	pub fn element(name: &str) -> Self {
		Self::element_with_attributes(name, Vec::new())
	}

	#[must_use]
	pub fn element_with_attributes(name: &str, attributes: Vec<(String, String)>) -> Self {
		Self::new(NodeKind::Element {
			name: name.to_ascii_lowercase(),
			attributes,
		})
	}

	#[must_use]
	pub fn text(text: &str) -> Self {
		Self::new(NodeKind::Text(text.to_owned()))
	}

	#[must_use]
	pub fn comment(comment: &str) -> Self {
		Self::new(NodeKind::Comment(comment.to_owned()))
	}

	#[must_use]
	pub fn kind(&self) -> &NodeKind {
		&self.0.kind
	}

	/// The element name, if this is an element.
	#[must_use]
	pub fn name(&self) -> Option<&str> {
		match &self.0.kind {
			NodeKind::Element { name, .. } => Some(name),
			_ => None,
		}
	}

	#[must_use]
	pub fn attribute(&self, name: &str) -> Option<&str> {
		match &self.0.kind {
			NodeKind::Element { attributes, .. } => attributes.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str()),
			_ => None,
		}
	}

	#[must_use]
	pub fn parent(&self) -> Option<Node> {
		self.0.parent.borrow().upgrade().map(Node)
	}

	#[must_use]
	pub fn children(&self) -> Vec<Node> {
		self.0.children.borrow().clone()
	}

	#[must_use]
	pub fn child_count(&self) -> usize {
		self.0.children.borrow().len()
	}

	#[must_use]
	pub fn child(&self, index: usize) -> Option<Node> {
		self.0.children.borrow().get(index).cloned()
	}

	#[must_use]
	pub fn ptr_eq(&self, other: &Node) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	fn is_inclusive_ancestor_of(&self, node: &Node) -> bool {
		let mut current = Some(node.clone());
		while let Some(node) = current {
			if node.ptr_eq(self) {
				return true;
			}
			current = node.parent();
		}
		false
	}

	/// Detaches this node from its parent, if any.
	pub fn detach(&self) {
		if let Some(parent) = self.parent() {
			parent.0.children.borrow_mut().retain(|child| !child.ptr_eq(self));
		}
		*self.0.parent.borrow_mut() = Weak::new();
	}

	/// Inserts `child` at `index`, detaching it from its previous parent first.
	///
	/// Insertions that would create a cycle are logged and skipped.
	pub fn insert_child(&self, index: usize, child: &Node) {
		if child.is_inclusive_ancestor_of(self) {
			return error!("Refusing to insert a node into itself or its descendant.");
		}
		child.detach();
		let mut children = self.0.children.borrow_mut();
		let index = index.min(children.len());
		children.insert(index, child.clone());
		*child.0.parent.borrow_mut() = Rc::downgrade(&self.0);
	}

	pub fn append_child(&self, child: &Node) {
		self.insert_child(usize::MAX, child);
	}

	fn index_in_parent(&self) -> Option<(Node, usize)> {
		let parent = self.parent()?;
		let index = parent.0.children.borrow().iter().position(|child| child.ptr_eq(self))?;
		Some((parent, index))
	}

	/// Concatenated text of all descendant text nodes.
	#[must_use]
	pub fn text_content(&self) -> String {
		let mut text = String::new();
		self.collect_text(&mut text);
		text
	}

	fn collect_text(&self, text: &mut String) {
		match &self.0.kind {
			NodeKind::Text(t) => text.push_str(t),
			NodeKind::Comment(_) => (),
			NodeKind::Fragment | NodeKind::Element { .. } => {
				for child in self.0.children.borrow().iter() {
					child.collect_text(text);
				}
			}
		}
	}

	/// Serializes this node's children.
	#[must_use]
	pub fn inner_html(&self) -> String {
		let mut html = String::new();
		let raw = self.name().map_or(false, is_raw_text_element);
		for child in self.0.children.borrow().iter() {
			child.write_html(&mut html, raw);
		}
		html
	}

	/// Serializes this node including itself.
	#[must_use]
	pub fn outer_html(&self) -> String {
		let mut html = String::new();
		self.write_html(&mut html, false);
		html
	}

	fn write_html(&self, html: &mut String, raw_text: bool) {
		match &self.0.kind {
			NodeKind::Fragment => {
				for child in self.0.children.borrow().iter() {
					child.write_html(html, false);
				}
			}
			NodeKind::Element { name, attributes } => {
				html.push('<');
				html.push_str(name);
				for (key, value) in attributes {
					html.push(' ');
					html.push_str(key);
					html.push_str("=\"");
					html.push_str(&escape(value));
					html.push('"');
				}
				html.push('>');
				if is_void_element(name) {
					return;
				}
				let raw = is_raw_text_element(name);
				for child in self.0.children.borrow().iter() {
					child.write_html(html, raw);
				}
				html.push_str("</");
				html.push_str(name);
				html.push('>');
			}
			NodeKind::Text(text) if raw_text => html.push_str(text),
			NodeKind::Text(text) => html.push_str(&escape(text)),
			NodeKind::Comment(comment) => {
				html.push_str("<!--");
				html.push_str(comment);
				html.push_str("-->");
			}
		}
	}
}

impl Debug for Node {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		if cfg!(feature = "dangerous-logging") {
			f.debug_tuple("Node").field(&self.outer_html()).finish()
		} else {
			match &self.0.kind {
				NodeKind::Fragment => f.write_str("Node(#fragment)"),
				NodeKind::Element { name, .. } => write!(f, "Node(<{}>)", name),
				NodeKind::Text(_) => f.write_str("Node(#text)"),
				NodeKind::Comment(_) => f.write_str("Node(#comment)"),
			}
		}
	}
}

impl Identity for Node {
	fn same(&self, other: &Self) -> bool {
		self.ptr_eq(other)
	}
}

pub struct WeakNode(Weak<NodeData>);

impl Upgrade for WeakNode {
	type Strong = Node;

	fn upgrade(&self) -> Option<Node> {
		self.0.upgrade().map(Node)
	}
}

impl Downgrade for Node {
	type Weak = WeakNode;

	fn downgrade(&self) -> WeakNode {
		WeakNode(Rc::downgrade(&self.0))
	}

	fn address(&self) -> usize {
		Rc::as_ptr(&self.0).cast::<()>() as usize
	}
}

/// A [`Dom`] over [`Node`]s, parsing markup with [`html5gum`].
///
/// The parser builds the tree directly from tokens without the HTML tree construction rules:
/// end tags close the nearest matching open element, stray end tags are ignored and unclosed
/// elements are closed at the end of the input.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryDom;

impl MemoryDom {
	#[must_use]
	pub fn new() -> Self {
		Self
	}
}

impl Dom for MemoryDom {
	type Node = Node;
	type OwnedChunks = WeakMap<Node, Rc<Chunk<Node>>>;
	type Views<V> = WeakMap<Component<Node>, V>;
	type Visited = WeakSet<Component<Node>>;

	#[instrument(skip(markup))]
	fn parse_fragment(&self, markup: &str) -> Node {
		let fragment = Node::fragment();
		let mut open = vec![fragment.clone()];
		let mut text = String::new();

		fn flush(text: &mut String, parent: &Node) {
			if !text.is_empty() {
				parent.append_child(&Node::text(text));
				text.clear();
			}
		}

		let mut tokenizer = Tokenizer::new(markup);
		while let Some(token) = tokenizer.next() {
			let token = match token {
				Ok(token) => token,
				Err(error) => {
					error!("Markup tokenizer failed: {:?}. Ignoring the rest of the input.", error);
					break;
				}
			};
			let top = open.last().cloned().unwrap_or_else(|| fragment.clone());

			match token {
				Token::StartTag(tag) => {
					flush(&mut text, &top);
					let name = String::from_utf8_lossy(&tag.name).to_ascii_lowercase();
					let attributes = tag
						.attributes
						.iter()
						.map(|(k, v)| (String::from_utf8_lossy(k).into_owned(), String::from_utf8_lossy(v).into_owned()))
						.collect();
					let element = Node::element_with_attributes(&name, attributes);
					top.append_child(&element);

					if !tag.self_closing && !is_void_element(&name) {
						match name.as_str() {
							"script" | "style" => tokenizer.set_state(State::ScriptData),
							"textarea" | "title" => tokenizer.set_state(State::RcData),
							_ => (),
						}
						open.push(element);
					}
				}
				Token::EndTag(tag) => {
					flush(&mut text, &top);
					let name = String::from_utf8_lossy(&tag.name).to_ascii_lowercase();
					// Index 0 is the fragment itself, which no end tag closes.
					match open.iter().skip(1).rposition(|element| element.name() == Some(name.as_str())) {
						Some(i) => open.truncate(i + 1),
						None => trace!("Ignoring stray end tag </{}>.", name),
					}
				}
				Token::String(string) => text.push_str(&String::from_utf8_lossy(&string)),
				Token::Comment(comment) => {
					flush(&mut text, &top);
					top.append_child(&Node::comment(&String::from_utf8_lossy(&comment)));
				}
				Token::Doctype(_) => trace!("Ignoring doctype in fragment."),
				Token::Error(error) => trace!("Markup parse error (recovered): {:?}", error),
			}
		}
		let top = open.last().cloned().unwrap_or_else(|| fragment.clone());
		flush(&mut text, &top);

		fragment
	}

	fn elements_by_tag_name(&self, root: &Node, tag: &str) -> Vec<Node> {
		let mut found = Vec::new();
		let mut stack: Vec<Node> = root.children().into_iter().rev().collect();
		while let Some(node) = stack.pop() {
			if node.name().map_or(false, |name| name.eq_ignore_ascii_case(tag)) {
				found.push(node.clone());
			}
			stack.extend(node.children().into_iter().rev());
		}
		found
	}

	fn attribute(&self, node: &Node, name: &str) -> Option<String> {
		node.attribute(name).map(ToOwned::to_owned)
	}

	fn replace_with(&self, old: &Node, new: &Node) {
		if old.ptr_eq(new) {
			return;
		}
		if new.is_inclusive_ancestor_of(old) {
			return error!("Failed to replace a node with its own ancestor.");
		}
		new.detach();
		match old.index_in_parent() {
			Some((parent, index)) => {
				old.detach();
				parent.insert_child(index, new);
			}
			None => error!("Could not find parent node of node to replace. Ignoring."),
		}
	}

	fn insert_after(&self, reference: &Node, new: &Node) {
		if reference.ptr_eq(new) {
			return;
		}
		new.detach();
		match reference.index_in_parent() {
			Some((parent, index)) => parent.insert_child(index + 1, new),
			None => error!("Could not find parent node of insertion reference. Ignoring."),
		}
	}

	fn remove(&self, node: &Node) {
		node.detach();
	}

	fn clear_children(&self, node: &Node) {
		let children = std::mem::take(&mut *node.0.children.borrow_mut());
		for child in children {
			*child.0.parent.borrow_mut() = Weak::new();
		}
	}

	fn move_children(&self, from: &Node, to: &Node) {
		for child in from.children() {
			to.append_child(&child);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_nested_elements_and_text() {
		let fragment = MemoryDom.parse_fragment(r#"text <main class="app"><p>a &amp; b<br>c</p></main>tail"#);
		assert_eq!(fragment.child_count(), 3);
		assert_eq!(fragment.child(0).unwrap().kind(), &NodeKind::Text("text ".to_owned()));

		let main = fragment.child(1).unwrap();
		assert_eq!(main.name(), Some("main"));
		assert_eq!(main.attribute("class"), Some("app"));
		assert_eq!(main.text_content(), "a & bc");
		assert_eq!(fragment.inner_html(), r#"text <main class="app"><p>a &amp; b<br>c</p></main>tail"#);
	}

	#[test]
	fn tolerates_stray_and_missing_end_tags() {
		let fragment = MemoryDom.parse_fragment("</b><div><span>open");
		assert_eq!(fragment.inner_html(), "<div><span>open</span></div>");
	}

	#[test]
	fn keeps_raw_text_unparsed() {
		let fragment = MemoryDom.parse_fragment("<script>if (a < b) {}</script>");
		assert_eq!(fragment.child(0).unwrap().text_content(), "if (a < b) {}");
		assert_eq!(fragment.inner_html(), "<script>if (a < b) {}</script>");
	}

	#[test]
	fn finds_elements_in_document_order() {
		let fragment = MemoryDom.parse_fragment("<x id=\"0\"><x id=\"1\"></x></x><y><x id=\"2\"></x></y>");
		let ids: Vec<_> = MemoryDom
			.elements_by_tag_name(&fragment, "x")
			.iter()
			.map(|x| MemoryDom.attribute(x, "id").unwrap())
			.collect();
		assert_eq!(ids, ["0", "1", "2"]);
	}

	#[test]
	fn replace_and_insert_move_nodes() {
		let fragment = MemoryDom.parse_fragment("<a></a><b></b>");
		let a = fragment.child(0).unwrap();
		let b = fragment.child(1).unwrap();

		let elsewhere = Node::element("div");
		let moved = Node::element("i");
		elsewhere.append_child(&moved);

		MemoryDom.replace_with(&a, &moved);
		assert_eq!(fragment.inner_html(), "<i></i><b></b>");
		assert_eq!(elsewhere.child_count(), 0);
		assert!(a.parent().is_none());

		MemoryDom.insert_after(&moved, &a);
		assert_eq!(fragment.inner_html(), "<i></i><a></a><b></b>");

		MemoryDom.insert_after(&b, &moved);
		assert_eq!(fragment.inner_html(), "<a></a><b></b><i></i>");
	}

	#[test]
	fn clear_and_move_children() {
		let from = MemoryDom.parse_fragment("<a></a>b");
		let to = Node::element("div");
		to.append_child(&Node::text("old"));
		let old = to.child(0).unwrap();

		MemoryDom.clear_children(&to);
		assert!(old.parent().is_none());
		MemoryDom.move_children(&from, &to);
		assert_eq!(to.outer_html(), "<div><a></a>b</div>");
		assert_eq!(from.child_count(), 0);
	}

	#[test]
	fn refuses_cycles() {
		let outer = Node::element("div");
		let inner = Node::element("span");
		outer.append_child(&inner);
		inner.append_child(&outer);
		assert!(outer.parent().is_none());
		assert_eq!(outer.outer_html(), "<div><span></span></div>");
	}
}

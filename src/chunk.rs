use crate::{
	markup::{count_placeholders, PLACEHOLDER},
	store::{Downgrade, Identity, Upgrade},
};
use std::{rc::Rc, slice};
use tracing::{error, instrument, trace};

/// Compiled template content: markup with one [`PLACEHOLDER`] per component, in order.
///
/// Chunks are immutable and shared through [`Rc`], which also gives them the identity
/// the lifecycle registries key on.
#[derive(Debug)]
pub struct Chunk<N> {
	markup: String,
	components: Vec<Component<N>>,
}

/// One placeholder's content.
///
/// Text never becomes a component; it is inlined into the markup.
#[derive(Debug)]
pub enum Component<N> {
	Node(N),
	/// A nested chunk, only present before [flattening](`Chunk::flatten`).
	Chunk(Rc<Chunk<N>>),
}

impl<N> Chunk<N> {
	pub(crate) fn new(markup: String, components: Vec<Component<N>>) -> Self {
		let placeholders = count_placeholders(&markup);
		if placeholders != components.len() {
			// Literal segments can spell out the placeholder, which misaligns all later components.
			error!("Markup has {} placeholder(s) for {} component(s).", placeholders, components.len());
		}
		Self { markup, components }
	}

	#[must_use]
	pub fn markup(&self) -> &str {
		&self.markup
	}

	#[must_use]
	pub fn components(&self) -> &[Component<N>] {
		&self.components
	}

	/// Whether this chunk contains no nested chunks.
	#[must_use]
	pub fn is_flat(&self) -> bool {
		self.components.iter().all(|component| matches!(component, Component::Node(_)))
	}

	/// Creates an equivalent chunk in which each nested chunk's placeholder is replaced by its
	/// (recursively flattened) markup, with its components spliced into the component list.
	///
	/// Flattening a flat chunk yields equal content.
	#[must_use]
	#[instrument(skip(self), fields(components = self.components.len()))]
	pub fn flatten(&self) -> Chunk<N>
	where
		N: Clone,
	{
		let mut markup = String::with_capacity(self.markup.len());
		let mut components = Vec::with_capacity(self.components.len());
		let mut pending = self.components.iter();

		let mut rest = self.markup.as_str();
		while let Some(at) = rest.find(PLACEHOLDER) {
			markup.push_str(&rest[..at]);
			rest = &rest[at + PLACEHOLDER.len()..];

			match pending.next() {
				Some(Component::Chunk(nested)) => {
					let Chunk {
						markup: nested_markup,
						components: nested_components,
					} = nested.flatten();
					markup.push_str(&nested_markup);
					components.extend(nested_components);
				}
				Some(node @ Component::Node(_)) => {
					markup.push_str(PLACEHOLDER);
					components.push(node.clone());
				}
				None => error!("Placeholder without component. Dropping it."),
			}
		}
		markup.push_str(rest);

		let unplaced = pending.count();
		if unplaced > 0 {
			error!("{} component(s) without placeholder. Dropping them.", unplaced);
		}

		trace!("Flattened into {} component(s).", components.len());
		Chunk { markup, components }
	}
}

impl<N> Component<N> {
	/// The output nodes this component splices in, in order.
	///
	/// Nested chunks have none of their own; they must be [flattened](`Chunk::flatten`) away first.
	#[must_use]
	pub fn nodes(&self) -> &[N] {
		match self {
			Self::Node(node) => slice::from_ref(node),
			Self::Chunk(_) => &[],
		}
	}
}

impl<N: Clone> Clone for Component<N> {
	fn clone(&self) -> Self {
		match self {
			Self::Node(node) => Self::Node(node.clone()),
			Self::Chunk(chunk) => Self::Chunk(Rc::clone(chunk)),
		}
	}
}

impl<N: Identity> Identity for Component<N> {
	fn same(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Node(a), Self::Node(b)) => a.same(b),
			(Self::Chunk(a), Self::Chunk(b)) => Rc::ptr_eq(a, b),
			_ => false,
		}
	}
}

/// [`Component`] held weakly.
pub enum WeakComponent<N: Downgrade> {
	Node(N::Weak),
	Chunk(std::rc::Weak<Chunk<N>>),
}

impl<N: Downgrade> Upgrade for WeakComponent<N> {
	type Strong = Component<N>;

	fn upgrade(&self) -> Option<Self::Strong> {
		match self {
			Self::Node(node) => node.upgrade().map(Component::Node),
			Self::Chunk(chunk) => chunk.upgrade().map(Component::Chunk),
		}
	}
}

impl<N: Downgrade> Downgrade for Component<N> {
	type Weak = WeakComponent<N>;

	fn downgrade(&self) -> Self::Weak {
		match self {
			Self::Node(node) => WeakComponent::Node(node.downgrade()),
			Self::Chunk(chunk) => WeakComponent::Chunk(Rc::downgrade(chunk)),
		}
	}

	fn address(&self) -> usize {
		match self {
			Self::Node(node) => node.address(),
			Self::Chunk(chunk) => chunk.address(),
		}
	}
}

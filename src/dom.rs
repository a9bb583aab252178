use crate::{
	chunk::{Chunk, Component},
	store::{AssociativeStore, Identity, MembershipStore},
};
use std::{fmt::Debug, rc::Rc};

/// The output tree the renderer writes into.
///
/// Apart from [`parse_fragment`](`Dom::parse_fragment`), these are plain tree edits.
/// Implementations log failing edits and carry on instead of reporting them, since a failed edit
/// can't be undone meaningfully halfway through a render.
pub trait Dom {
	type Node: Identity + Clone + Debug;

	/// Render target → the chunk currently rendered into it.
	type OwnedChunks: AssociativeStore<Self::Node, Rc<Chunk<Self::Node>>>;
	/// Component → the view it was materialized from.
	type Views<V>: AssociativeStore<Component<Self::Node>, V>;
	/// Components already visited during one teardown.
	type Visited: MembershipStore<Component<Self::Node>>;

	/// Parses `markup` into a new detached container node.
	fn parse_fragment(&self, markup: &str) -> Self::Node;

	/// All descendant elements of `root` named `tag`, in document order.
	fn elements_by_tag_name(&self, root: &Self::Node, tag: &str) -> Vec<Self::Node>;

	fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

	/// Puts `new` in `old`'s place, detaching `new` from wherever it was before.
	fn replace_with(&self, old: &Self::Node, new: &Self::Node);

	/// Inserts `new` as `reference`'s next sibling, detaching `new` from wherever it was before.
	fn insert_after(&self, reference: &Self::Node, new: &Self::Node);

	/// Detaches `node` from its parent, if any.
	fn remove(&self, node: &Self::Node);

	fn clear_children(&self, node: &Self::Node);

	/// Appends all of `from`'s children to `to`, in order.
	fn move_children(&self, from: &Self::Node, to: &Self::Node);
}

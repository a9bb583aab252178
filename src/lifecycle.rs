//! Ownership bookkeeping between render targets, chunks and views.
//!
//! The two registries form one ownership graph: a render target owns the chunk last rendered into it,
//! a chunk owns its components, and a component that is a node may itself be a render target.
//! Each component is untracked, tracked (has a view) or disposed, in that order.

use crate::{
	chunk::{Chunk, Component},
	dom::Dom,
	store::{AssociativeStore, MembershipStore},
};
use std::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
	rc::Rc,
};
use tracing::{instrument, trace, warn};

pub struct Tracker<D: Dom, V> {
	owned_chunks: RefCell<D::OwnedChunks>,
	views: RefCell<D::Views<V>>,
}

impl<D: Dom, V> Default for Tracker<D, V> {
	fn default() -> Self {
		Self {
			owned_chunks: RefCell::default(),
			views: RefCell::default(),
		}
	}
}

impl<D: Dom, V> Debug for Tracker<D, V> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Tracker")
			.field("owned_chunks.len()", &self.owned_chunks.borrow().len())
			.field("views.len()", &self.views.borrow().len())
			.finish()
	}
}

impl<D: Dom, V> Tracker<D, V> {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Associates `component` with the view it was materialized from.
	pub fn track(&self, component: Component<D::Node>, view: V) {
		if self.views.borrow_mut().set(component, view).is_some() {
			warn!("A component was materialized by more than one view. The earlier view won't be disposed with it.");
		}
	}

	#[must_use]
	pub fn is_tracked(&self, component: &Component<D::Node>) -> bool {
		self.views.borrow().has(component)
	}

	/// Records `chunk` as rendered into `target`.
	pub fn own(&self, target: D::Node, chunk: Rc<Chunk<D::Node>>) {
		if self.owned_chunks.borrow_mut().set(target, chunk).is_some() {
			warn!("Render target was overwritten without teardown. Its previous views leak.");
		}
	}

	#[must_use]
	pub fn owned_chunk(&self, target: &D::Node) -> Option<Rc<Chunk<D::Node>>> {
		self.owned_chunks.borrow().get(target).cloned()
	}

	/// Disposes all views reachable from the chunk owned by `target` and forgets that chunk.
	///
	/// Returns the number of views disposed.
	#[instrument(skip(self, dispose))]
	pub fn teardown(&self, target: &D::Node, dispose: impl FnMut(V)) -> usize {
		// Bind first so the registry borrow ends before `dispose` can re-enter.
		let owned = self.owned_chunks.borrow_mut().delete(target);
		match owned {
			Some(chunk) => self.cleanup(Component::Chunk(chunk), dispose),
			None => 0,
		}
	}

	/// Disposes all views reachable from `root`, depth-first in document order.
	///
	/// Each view is disposed before anything below it, and is forgotten *before* its disposal so that
	/// a re-entrant teardown can't dispose it again.
	///
	/// Returns the number of views disposed.
	pub fn cleanup(&self, root: Component<D::Node>, mut dispose: impl FnMut(V)) -> usize {
		let mut visited = D::Visited::default();
		let mut pending = vec![root];
		let mut disposed = 0;

		while let Some(component) = pending.pop() {
			if !visited.add(component.clone()) {
				trace!("Skipping component visited before.");
				continue;
			}

			let view = self.views.borrow_mut().delete(&component);
			if let Some(view) = view {
				dispose(view);
				disposed += 1;
			}

			match component {
				Component::Chunk(chunk) => pending.extend(chunk.components().iter().rev().cloned()),
				Component::Node(node) => {
					let owned = self.owned_chunks.borrow_mut().delete(&node);
					if let Some(chunk) = owned {
						trace!("Descending into nested render target.");
						pending.push(Component::Chunk(chunk));
					}
				}
			}
		}

		trace!("Disposed {} view(s).", disposed);
		disposed
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		markup::PLACEHOLDER,
		memory::{MemoryDom, Node},
	};

	fn chunk(components: Vec<Component<Node>>) -> Rc<Chunk<Node>> {
		Rc::new(Chunk::new(PLACEHOLDER.repeat(components.len()), components))
	}

	#[test]
	fn disposes_pre_order_across_nested_targets() {
		let tracker = Tracker::<MemoryDom, &'static str>::new();
		let target = Node::element("main");

		// x renders y into its own node, y's chunk contains z.
		let x = Node::element("x");
		let y = Node::element("y");
		let z = Node::element("z");
		let w = Node::element("w");
		let z_chunk = chunk(vec![Component::Node(z.clone())]);
		tracker.track(Component::Node(x.clone()), "x");
		tracker.track(Component::Node(y.clone()), "y");
		tracker.track(Component::Chunk(Rc::clone(&z_chunk)), "z");
		tracker.track(Component::Node(w.clone()), "w");
		tracker.own(x.clone(), chunk(vec![Component::Node(y.clone()), Component::Chunk(z_chunk)]));
		tracker.own(target.clone(), chunk(vec![Component::Node(x.clone()), Component::Node(w.clone())]));

		let mut order = Vec::new();
		assert_eq!(tracker.teardown(&target, |view| order.push(view)), 4);
		assert_eq!(order, ["x", "y", "z", "w"]);

		assert!(tracker.owned_chunk(&target).is_none());
		assert!(tracker.owned_chunk(&x).is_none());
		assert!(!tracker.is_tracked(&Component::Node(y)));

		assert_eq!(tracker.teardown(&target, |_| panic!("Disposed twice.")), 0);
	}

	#[test]
	fn cyclic_ownership_terminates() {
		let tracker = Tracker::<MemoryDom, ()>::new();
		let target = Node::element("div");
		tracker.track(Component::Node(target.clone()), ());
		tracker.own(target.clone(), chunk(vec![Component::Node(target.clone())]));

		let mut count = 0;
		tracker.teardown(&target, |()| count += 1);
		assert_eq!(count, 1);
	}

	#[test]
	fn shared_components_are_disposed_once() {
		let tracker = Tracker::<MemoryDom, u8>::new();
		let target = Node::element("div");
		let shared = chunk(vec![]);
		tracker.track(Component::Chunk(Rc::clone(&shared)), 1);
		tracker.own(target.clone(), chunk(vec![Component::Chunk(Rc::clone(&shared)), Component::Chunk(shared)]));

		let mut disposed = Vec::new();
		tracker.teardown(&target, |view| disposed.push(view));
		assert_eq!(disposed, [1]);
	}
}

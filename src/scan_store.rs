//! Linear-scan fallbacks for hosts whose node handles can't be held weakly.
//!
//! Every operation is O(n) in the number of entries, and nothing is ever evicted automatically:
//! memory is only reclaimed through [`delete`](`AssociativeStore::delete`) or by dropping the whole store.
//! The renderer deletes entries as it tears targets down, so the stores stay proportional to the
//! number of live render targets and tracked views, as long as render targets aren't abandoned
//! without [`unbind`](`crate::Renderer::unbind`).

use crate::store::{AssociativeStore, Identity, MembershipStore};
use std::fmt::{self, Debug, Formatter};

/// An [`AssociativeStore`] over two parallel sequences.
pub struct ScanMap<K, V> {
	keys: Vec<K>,
	values: Vec<V>,
}

impl<K, V> Default for ScanMap<K, V> {
	fn default() -> Self {
		Self {
			keys: Vec::new(),
			values: Vec::new(),
		}
	}
}

impl<K: Identity, V> ScanMap<K, V> {
	fn position(&self, key: &K) -> Option<usize> {
		self.keys.iter().position(|k| k.same(key))
	}
}

impl<K: Identity, V> AssociativeStore<K, V> for ScanMap<K, V> {
	fn get(&self, key: &K) -> Option<&V> {
		self.position(key).map(|i| &self.values[i])
	}

	fn set(&mut self, key: K, value: V) -> Option<V> {
		match self.position(&key) {
			Some(i) => Some(std::mem::replace(&mut self.values[i], value)),
			None => {
				self.keys.push(key);
				self.values.push(value);
				None
			}
		}
	}

	fn delete(&mut self, key: &K) -> Option<V> {
		let i = self.position(key)?;
		self.keys.remove(i);
		Some(self.values.remove(i))
	}

	fn len(&self) -> usize {
		self.keys.len()
	}
}

impl<K: Debug, V: Debug> Debug for ScanMap<K, V> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_map().entries(self.keys.iter().zip(self.values.iter())).finish()
	}
}

/// A [`MembershipStore`] over one sequence.
pub struct ScanSet<K> {
	keys: Vec<K>,
}

impl<K> Default for ScanSet<K> {
	fn default() -> Self {
		Self { keys: Vec::new() }
	}
}

impl<K: Identity> MembershipStore<K> for ScanSet<K> {
	fn add(&mut self, key: K) -> bool {
		if self.has(&key) {
			return false;
		}
		self.keys.push(key);
		true
	}

	fn has(&self, key: &K) -> bool {
		self.keys.iter().any(|k| k.same(key))
	}

	fn delete(&mut self, key: &K) -> bool {
		match self.keys.iter().position(|k| k.same(key)) {
			Some(i) => {
				self.keys.remove(i);
				true
			}
			None => false,
		}
	}

	fn len(&self) -> usize {
		self.keys.len()
	}
}

impl<K: Debug> Debug for ScanSet<K> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_set().entries(self.keys.iter()).finish()
	}
}

//! Identity-keyed registries whose entries don't keep their keys alive.
//!
//! [`WeakMap`] and [`WeakSet`] hold keys through [`Downgrade::Weak`] handles and evict entries once
//! their key has no strong handles left. Eviction is lazy and amortised over insertions, so a dead
//! entry's value may linger until the next sweep.
//!
//! Hosts that can't hold their nodes weakly use [`ScanMap`](`crate::scan_store::ScanMap`) and
//! [`ScanSet`](`crate::scan_store::ScanSet`) instead, which have the same observable `get`/`set`/`delete`
//! behaviour but never evict on their own.

use hashbrown::HashMap;
use std::{
	fmt::{self, Debug, Formatter},
	rc::{Rc, Weak},
};

/// Identity (not structural) comparison.
pub trait Identity {
	fn same(&self, other: &Self) -> bool;
}

/// A strong handle that can be held weakly.
pub trait Downgrade: Identity + Sized {
	type Weak: Upgrade<Strong = Self>;

	fn downgrade(&self) -> Self::Weak;

	/// An address that identifies the referenced allocation.
	///
	/// It must stay unique for as long as any strong *or weak* handle to the allocation exists.
	fn address(&self) -> usize;
}

pub trait Upgrade {
	type Strong;

	fn upgrade(&self) -> Option<Self::Strong>;
}

impl<T> Identity for Rc<T> {
	fn same(&self, other: &Self) -> bool {
		Rc::ptr_eq(self, other)
	}
}

impl<T> Downgrade for Rc<T> {
	type Weak = Weak<T>;

	fn downgrade(&self) -> Self::Weak {
		Rc::downgrade(self)
	}

	fn address(&self) -> usize {
		Rc::as_ptr(self).cast::<()>() as usize
	}
}

impl<T> Upgrade for Weak<T> {
	type Strong = Rc<T>;

	fn upgrade(&self) -> Option<Self::Strong> {
		Weak::upgrade(self)
	}
}

/// Key → value registry.
pub trait AssociativeStore<K, V>: Default {
	fn get(&self, key: &K) -> Option<&V>;

	/// Returns the value previously associated with `key`, if any.
	fn set(&mut self, key: K, value: V) -> Option<V>;

	fn delete(&mut self, key: &K) -> Option<V>;

	fn has(&self, key: &K) -> bool {
		self.get(key).is_some()
	}

	/// Number of entries with live keys.
	fn len(&self) -> usize;

	fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// Key membership registry.
pub trait MembershipStore<K>: Default {
	/// Returns `false` iff `key` was already present.
	fn add(&mut self, key: K) -> bool;

	fn has(&self, key: &K) -> bool;

	/// Returns `false` iff `key` wasn't present.
	fn delete(&mut self, key: &K) -> bool;

	/// Number of live keys.
	fn len(&self) -> usize;

	fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

const MIN_SWEEP_THRESHOLD: usize = 16;

/// An [`AssociativeStore`] with weakly held keys.
pub struct WeakMap<K: Downgrade, V> {
	entries: HashMap<usize, (K::Weak, V)>,
	sweep_threshold: usize,
}

impl<K: Downgrade, V> Default for WeakMap<K, V> {
	fn default() -> Self {
		Self::new()
	}
}

impl<K: Downgrade, V> WeakMap<K, V> {
	#[must_use]
	pub fn new() -> Self {
		Self {
			entries: HashMap::new(),
			sweep_threshold: MIN_SWEEP_THRESHOLD,
		}
	}

	/// Drops all entries whose key is gone and returns how many there were.
	pub fn sweep(&mut self) -> usize {
		let before = self.entries.len();
		self.entries.retain(|_, (weak, _)| weak.upgrade().is_some());
		let swept = before - self.entries.len();
		if swept > 0 {
			tracing::trace!("Swept {} dead registry entr(y/ies).", swept);
		}
		swept
	}

	/// Number of entries including those whose key is gone but which weren't swept yet.
	#[must_use]
	pub fn capacity_used(&self) -> usize {
		self.entries.len()
	}
}

impl<K: Downgrade, V> AssociativeStore<K, V> for WeakMap<K, V> {
	fn get(&self, key: &K) -> Option<&V> {
		// The stored weak handle pins the allocation, so a live `key` at this address is the same key.
		self.entries.get(&key.address()).map(|(_, value)| value)
	}

	fn set(&mut self, key: K, value: V) -> Option<V> {
		if self.entries.len() >= self.sweep_threshold {
			self.sweep();
			self.sweep_threshold = (self.entries.len() * 2).max(MIN_SWEEP_THRESHOLD);
		}
		self.entries.insert(key.address(), (key.downgrade(), value)).map(|(_, value)| value)
	}

	fn delete(&mut self, key: &K) -> Option<V> {
		self.entries.remove(&key.address()).map(|(_, value)| value)
	}

	/// O(n): every entry is upgraded to check that its key is still alive.
	fn len(&self) -> usize {
		self.entries.values().filter(|(weak, _)| weak.upgrade().is_some()).count()
	}
}

impl<K: Downgrade, V: Debug> Debug for WeakMap<K, V> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_map().entries(self.entries.iter().map(|(address, (_, value))| (address, value))).finish()
	}
}

/// A [`MembershipStore`] with weakly held keys.
pub struct WeakSet<K: Downgrade> {
	entries: HashMap<usize, K::Weak>,
}

impl<K: Downgrade> Default for WeakSet<K> {
	fn default() -> Self {
		Self { entries: HashMap::new() }
	}
}

impl<K: Downgrade> MembershipStore<K> for WeakSet<K> {
	fn add(&mut self, key: K) -> bool {
		let address = key.address();
		if self.entries.contains_key(&address) {
			return false;
		}
		self.entries.insert(address, key.downgrade());
		true
	}

	fn has(&self, key: &K) -> bool {
		self.entries.contains_key(&key.address())
	}

	fn delete(&mut self, key: &K) -> bool {
		self.entries.remove(&key.address()).is_some()
	}

	/// O(n), like [`WeakMap`]'s.
	fn len(&self) -> usize {
		self.entries.values().filter(|weak| weak.upgrade().is_some()).count()
	}
}

impl<K: Downgrade> Debug for WeakSet<K> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_set().entries(self.entries.keys()).finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn get_set_delete() {
		let a = Rc::new("a");
		let b = Rc::new("a");

		let mut map = WeakMap::new();
		assert_eq!(map.set(Rc::clone(&a), 1), None);
		assert_eq!(map.get(&a), Some(&1));
		assert_eq!(map.get(&b), None, "Keys are compared by identity.");

		assert_eq!(map.set(Rc::clone(&a), 2), Some(1));
		assert_eq!(map.len(), 1);

		assert_eq!(map.delete(&a), Some(2));
		assert!(!map.has(&a));
		assert!(map.is_empty());
	}

	#[test]
	fn evicts_dropped_keys() {
		let mut map = WeakMap::new();
		let kept = Rc::new(0);
		map.set(Rc::clone(&kept), "kept");
		for i in 1..=MIN_SWEEP_THRESHOLD {
			map.set(Rc::new(i), "dropped");
		}
		assert_eq!(map.len(), 1);

		// Reaching the threshold swept all but the last dropped key.
		assert_eq!(map.capacity_used(), 2);
		assert_eq!(map.sweep(), 1);
		assert_eq!(map.capacity_used(), 1);
		assert_eq!(map.get(&kept), Some(&"kept"));
	}

	#[test]
	fn set_membership() {
		let a = Rc::new(());
		let mut set = WeakSet::default();
		assert!(set.add(Rc::clone(&a)));
		assert!(!set.add(Rc::clone(&a)));
		assert!(set.has(&a));
		assert_eq!(set.len(), 1);

		drop(a);
		assert_eq!(set.len(), 0);
	}
}

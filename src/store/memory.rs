//! Thread-safe in-memory [`CredentialStore`] for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::{Credential, StorageKey},
	store::{self, CompareAndSwapOutcome, CredentialStore, StoreError, StoreFuture},
};

type StoreMap = Arc<RwLock<HashMap<StorageKey, Credential>>>;

/// Process-local key-value storage bound to one slot.
///
/// Clones and [`scoped`](Self::scoped) views share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
	key: StorageKey,
	map: StoreMap,
}
impl MemoryStore {
	/// Creates an empty store bound to `key`.
	pub fn new(key: StorageKey) -> Self {
		Self { key, map: Default::default() }
	}

	/// Returns a view of the same backing map bound to a different slot.
	pub fn scoped(&self, key: StorageKey) -> Self {
		Self { key, map: self.map.clone() }
	}

	/// Slot this view reads and writes.
	pub fn key(&self) -> &StorageKey {
		&self.key
	}

	/// Synchronous peek at the current value; handy for assertions.
	pub fn snapshot(&self) -> Option<Credential> {
		self.map.read().get(&self.key).cloned()
	}

	fn save_now(map: StoreMap, key: StorageKey, credential: Credential) -> Result<(), StoreError> {
		map.write().insert(key, credential);

		Ok(())
	}

	fn cas_now(
		map: StoreMap,
		key: StorageKey,
		expected: Option<&str>,
		replacement: Credential,
	) -> CompareAndSwapOutcome {
		let mut guard = map.write();

		if store::credential_matches(guard.get(&key), expected) {
			guard.insert(key, replacement);

			CompareAndSwapOutcome::Updated
		} else {
			CompareAndSwapOutcome::Mismatch
		}
	}
}
impl CredentialStore for MemoryStore {
	fn load(&self) -> StoreFuture<'_, Option<Credential>> {
		let value = self.snapshot();

		Box::pin(async move { Ok(value) })
	}

	fn save(&self, credential: Credential) -> StoreFuture<'_, ()> {
		let map = self.map.clone();
		let key = self.key.clone();

		Box::pin(async move { Self::save_now(map, key, credential) })
	}

	fn clear(&self) -> StoreFuture<'_, Option<Credential>> {
		let map = self.map.clone();
		let key = self.key.clone();

		Box::pin(async move { Ok(map.write().remove(&key)) })
	}

	fn compare_and_swap<'a>(
		&'a self,
		expected: Option<&'a str>,
		replacement: Credential,
	) -> StoreFuture<'a, CompareAndSwapOutcome> {
		let map = self.map.clone();
		let key = self.key.clone();

		Box::pin(async move { Ok(Self::cas_now(map, key, expected, replacement)) })
	}
}

//! Thread-safe in-memory [`AccessTokenStore`] for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	store::{AccessTokenStore, StoreFuture, StoreKey},
};

type StoreMap = Arc<RwLock<HashMap<StoreKey, AccessToken>>>;

/// Keeps access tokens in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Number of stored tokens.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Whether the store is empty.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl AccessTokenStore for MemoryStore {
	fn save<'a>(&'a self, key: &'a StoreKey, token: AccessToken) -> StoreFuture<'a, ()> {
		let map = self.0.clone();
		let key = key.to_owned();

		Box::pin(async move {
			map.write().insert(key, token);

			Ok(())
		})
	}

	fn fetch<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<AccessToken>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().get(key).cloned()) })
	}

	fn remove<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<AccessToken>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.write().remove(key)) })
	}
}

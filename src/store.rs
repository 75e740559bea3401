//! Storage contracts and built-in store implementations for access tokens.
//!
//! A stored pair lets a coordinator skip the three-legged flow on the next start
//! ([`AuthorizationCoordinator::restore_access_token`](crate::flows::AuthorizationCoordinator::restore_access_token)).

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, ConsumerKey, ProviderId},
};

/// Boxed future returned by [`AccessTokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract implemented by access-token stores.
pub trait AccessTokenStore
where
	Self: Send + Sync,
{
	/// Persists or replaces the access token for `key`.
	fn save<'a>(&'a self, key: &'a StoreKey, token: AccessToken) -> StoreFuture<'a, ()>;

	/// Fetches the access token for `key`, if present.
	fn fetch<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<AccessToken>>;

	/// Removes and returns the access token for `key`, if present.
	fn remove<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<AccessToken>>;
}

/// Error type produced by [`AccessTokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Unique key identifying a stored access token: one per provider and consumer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreKey {
	/// Provider descriptor identifier.
	pub provider: ProviderId,
	/// Consumer key the token was issued to.
	pub consumer: ConsumerKey,
}
impl StoreKey {
	/// Builds a key for the provider + consumer pair.
	pub fn new(provider: &ProviderId, consumer: &ConsumerKey) -> Self {
		Self { provider: provider.clone(), consumer: consumer.clone() }
	}
}

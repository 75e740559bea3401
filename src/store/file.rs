//! Simple file-backed [`AccessTokenStore`] for CLIs and bots.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	store::{AccessTokenStore, StoreError, StoreFuture, StoreKey},
};

/// Persists access tokens to a JSON file after each mutation.
///
/// Writes go to a sibling `.tmp` file that is renamed over the target, so a crash never leaves a
/// truncated snapshot behind.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<HashMap<StoreKey, AccessToken>>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	/// Location of the JSON snapshot.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<HashMap<StoreKey, AccessToken>, StoreError> {
		if !path.exists() {
			return Ok(HashMap::new());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		if bytes.is_empty() {
			return Ok(HashMap::new());
		}

		let entries: Vec<(StoreKey, AccessToken)> =
			serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
				message: format!("Failed to parse {}: {e}", path.display()),
			})?;

		Ok(entries.into_iter().collect())
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, contents: &HashMap<StoreKey, AccessToken>) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let snapshot: Vec<_> = contents.iter().collect();
		let serialized =
			serde_json::to_vec_pretty(&snapshot).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize store snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl AccessTokenStore for FileStore {
	fn save<'a>(&'a self, key: &'a StoreKey, token: AccessToken) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			guard.insert(key.clone(), token);
			self.persist_locked(&guard)
		})
	}

	fn fetch<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<AccessToken>> {
		Box::pin(async move { Ok(self.inner.read().get(key).cloned()) })
	}

	fn remove<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<AccessToken>> {
		Box::pin(async move {
			let mut guard = self.inner.write();
			let removed = guard.remove(key);

			if removed.is_some() {
				self.persist_locked(&guard)?;
			}

			Ok(removed)
		})
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use tempfile::TempDir;
	use time::macros::datetime;
	// self
	use super::*;
	use crate::auth::{ConsumerKey, ProviderId};

	fn key() -> StoreKey {
		StoreKey::new(
			&ProviderId::new("example").expect("Provider fixture should be valid."),
			&ConsumerKey::new("CK").expect("Consumer fixture should be valid."),
		)
	}

	#[tokio::test]
	async fn save_and_reload_round_trip() {
		let dir = TempDir::new().expect("Temporary directory should be created.");
		let path = dir.path().join("nested").join("tokens.json");
		let store = FileStore::open(&path).expect("Store should open.");
		let key = key();
		let token = AccessToken::new("AT", "ATS").with_obtained_at(datetime!(2026-03-01 12:00 UTC));

		store.save(&key, token.clone()).await.expect("Save should succeed.");
		drop(store);

		assert!(path.exists());
		assert!(!path.with_extension("tmp").exists());

		let reopened = FileStore::open(&path).expect("Store should reopen.");
		let fetched = reopened
			.fetch(&key)
			.await
			.expect("Fetch should succeed.")
			.expect("Token should survive a reopen.");

		assert_eq!(fetched, token);
	}

	#[tokio::test]
	async fn remove_persists() {
		let dir = TempDir::new().expect("Temporary directory should be created.");
		let path = dir.path().join("tokens.json");
		let store = FileStore::open(&path).expect("Store should open.");
		let key = key();

		store.save(&key, AccessToken::new("AT", "ATS")).await.expect("Save should succeed.");
		assert!(store.remove(&key).await.expect("Remove should succeed.").is_some());

		let reopened = FileStore::open(store.path()).expect("Store should reopen.");

		assert_eq!(reopened.fetch(&key).await.expect("Fetch should succeed."), None);
	}

	#[test]
	fn corrupt_snapshots_are_reported() {
		let dir = TempDir::new().expect("Temporary directory should be created.");
		let path = dir.path().join("tokens.json");

		fs::write(&path, b"not json").expect("Fixture should be written.");

		assert!(matches!(FileStore::open(&path), Err(StoreError::Serialization { .. })));

		fs::write(&path, b"").expect("Fixture should be written.");

		FileStore::open(&path).expect("Empty snapshots are treated as empty stores.");
	}
}

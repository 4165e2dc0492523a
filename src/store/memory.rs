//! Thread-safe in-memory [`TokenCacheStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::{CacheEntry, CacheKey, UserId},
	store::{self, StoreError, StoreFuture, StoreKey, TokenCacheStore},
};

type StoreMap = Arc<RwLock<HashMap<StoreKey, CacheEntry>>>;

/// Thread-safe storage backend that keeps entries in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Number of stored entries.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn get_now(map: StoreMap, key: CacheKey, user: Option<UserId>) -> Vec<CacheEntry> {
		store::select(map.read().values(), &key, user.as_ref())
	}

	fn set_now(map: StoreMap, entry: CacheEntry) -> Result<(), StoreError> {
		map.write().insert(StoreKey::of(&entry), entry);

		Ok(())
	}

	fn remove_now(map: StoreMap, key: CacheKey, user: Option<UserId>) -> Option<CacheEntry> {
		map.write().remove(&StoreKey { key, user })
	}
}
impl TokenCacheStore for MemoryStore {
	fn get<'a>(
		&'a self,
		key: &'a CacheKey,
		user: Option<&'a UserId>,
	) -> StoreFuture<'a, Vec<CacheEntry>> {
		let map = self.0.clone();
		let key = key.to_owned();
		let user = user.cloned();

		Box::pin(async move { Ok(Self::get_now(map, key, user)) })
	}

	fn all(&self) -> StoreFuture<'_, Vec<CacheEntry>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().values().cloned().collect()) })
	}

	fn set(&self, entry: CacheEntry) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::set_now(map, entry) })
	}

	fn remove<'a>(
		&'a self,
		key: &'a CacheKey,
		user: Option<&'a UserId>,
	) -> StoreFuture<'a, Option<CacheEntry>> {
		let map = self.0.clone();
		let key = key.to_owned();
		let user = user.cloned();

		Box::pin(async move { Ok(Self::remove_now(map, key, user)) })
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().clear();

			Ok(())
		})
	}
}

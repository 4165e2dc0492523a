//! Storage contracts and built-in cache store implementations.
//!
//! Stores own persisted entries exclusively. The resolution engine only reads snapshots and asks
//! the store to replace or remove whole entries; it never locks across a read-then-write
//! sequence, so backends must provide at least per-slot atomicity. Two concurrent refreshes for
//! the same slot resolve as last-writer-wins.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{CacheEntry, CacheKey, UserId},
};

/// Boxed future returned by [`TokenCacheStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract implemented by token cache stores.
pub trait TokenCacheStore
where
	Self: Send + Sync,
{
	/// Returns every entry stored under `key`, restricted to `user` when one is given.
	fn get<'a>(
		&'a self,
		key: &'a CacheKey,
		user: Option<&'a UserId>,
	) -> StoreFuture<'a, Vec<CacheEntry>>;

	/// Returns every stored entry.
	fn all(&self) -> StoreFuture<'_, Vec<CacheEntry>>;

	/// Inserts or replaces the entry occupying the same `{key, user}` slot.
	fn set(&self, entry: CacheEntry) -> StoreFuture<'_, ()>;

	/// Removes the entry stored under exactly `{key, user}` and returns it.
	fn remove<'a>(
		&'a self,
		key: &'a CacheKey,
		user: Option<&'a UserId>,
	) -> StoreFuture<'a, Option<CacheEntry>>;

	/// Removes every entry.
	fn clear(&self) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`TokenCacheStore`] implementations.
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

/// Unique slot identifying one stored entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreKey {
	/// Credential family.
	pub key: CacheKey,
	/// Owning user, if known.
	pub user: Option<UserId>,
}
impl StoreKey {
	/// Builds the slot for a key + user pair.
	pub fn new(key: &CacheKey, user: Option<&UserId>) -> Self {
		Self { key: key.clone(), user: user.cloned() }
	}

	/// Builds the slot an entry occupies.
	pub fn of(entry: &CacheEntry) -> Self {
		Self::new(&entry.key, entry.user_id.as_ref())
	}
}

pub(crate) fn select<'a>(
	entries: impl Iterator<Item = &'a CacheEntry>,
	key: &CacheKey,
	user: Option<&UserId>,
) -> Vec<CacheEntry> {
	entries
		.filter(|entry| entry.key == *key)
		.filter(|entry| user.is_none_or(|user| entry.user_id.as_ref() == Some(user)))
		.cloned()
		.collect()
}

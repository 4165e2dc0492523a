//! Simple file-backed [`TokenCacheStore`] for lightweight deployments and CLIs.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::{CacheEntry, CacheKey, UserId},
	store::{self, StoreError, StoreFuture, StoreKey, TokenCacheStore},
};

type Snapshot = HashMap<StoreKey, CacheEntry>;

/// Persists cache entries to a JSON file after each mutation.
///
/// Mutations are serialized through an async lock so two writers never interleave their
/// snapshot files; reads are served from the in-memory copy.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<Snapshot>>,
	writer: Arc<AsyncMutex<()>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = if path.exists() { Self::load_snapshot(&path)? } else { HashMap::new() };

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)), writer: Default::default() })
	}

	/// Location of the snapshot file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<Snapshot, StoreError> {
		let metadata = path.metadata().map_err(|e| StoreError::Backend {
			message: format!("Failed to inspect {}: {e}", path.display()),
		})?;

		if metadata.len() == 0 {
			return Ok(HashMap::new());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;
		let entries: Vec<CacheEntry> =
			serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
				message: format!("Failed to parse {}: {e}", path.display()),
			})?;

		Ok(entries.into_iter().map(|entry| (StoreKey::of(&entry), entry)).collect())
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist(&self, contents: &Snapshot) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let snapshot: Vec<_> = contents.values().collect();
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

	async fn mutate<T>(&self, op: impl FnOnce(&mut Snapshot) -> T) -> Result<T, StoreError> {
		let _writer = self.writer.lock().await;
		let mut next = self.inner.read().clone();
		let value = op(&mut next);

		self.persist(&next)?;
		*self.inner.write() = next;

		Ok(value)
	}
}
impl TokenCacheStore for FileStore {
	fn get<'a>(
		&'a self,
		key: &'a CacheKey,
		user: Option<&'a UserId>,
	) -> StoreFuture<'a, Vec<CacheEntry>> {
		Box::pin(async move { Ok(store::select(self.inner.read().values(), key, user)) })
	}

	fn all(&self) -> StoreFuture<'_, Vec<CacheEntry>> {
		Box::pin(async move { Ok(self.inner.read().values().cloned().collect()) })
	}

	fn set(&self, entry: CacheEntry) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.mutate(|map| {
				map.insert(StoreKey::of(&entry), entry);
			})
			.await
		})
	}

	fn remove<'a>(
		&'a self,
		key: &'a CacheKey,
		user: Option<&'a UserId>,
	) -> StoreFuture<'a, Option<CacheEntry>> {
		Box::pin(async move {
			let slot = StoreKey::new(key, user);

			if !self.inner.read().contains_key(&slot) {
				return Ok(None);
			}

			self.mutate(|map| map.remove(&slot)).await
		})
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		Box::pin(async move { self.mutate(HashMap::clear).await })
	}
}

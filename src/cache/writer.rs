//! Cache Update Writer: reconciles an authentication outcome with the store.

// self
use crate::{
	_prelude::*,
	auth::CacheEntry,
	result::{AuthenticationOutcome, AuthenticationResult, FailureKind},
	store::{StoreError, TokenCacheStore},
};

/// Applies authentication outcomes to a [`TokenCacheStore`].
///
/// Every write replaces whole entries; concurrent commits for one slot are last-writer-wins.
#[derive(Clone, Copy)]
pub struct CacheWriter<'a> {
	store: &'a dyn TokenCacheStore,
}
impl<'a> CacheWriter<'a> {
	/// Creates a writer over `store`.
	pub fn new(store: &'a dyn TokenCacheStore) -> Self {
		Self { store }
	}

	/// Commits `result`, produced from `candidate` (the entry whose refresh token was spent, or
	/// `None` for interactive and assertion acquisitions), and returns the result as committed.
	///
	/// Successful results are rewritten to carry the entry actually stored, which keeps a
	/// resource-specific candidate's refresh token when the endpoint issued none.
	pub async fn commit(
		&self,
		result: AuthenticationResult,
		candidate: Option<&CacheEntry>,
	) -> Result<AuthenticationResult, StoreError> {
		match result.outcome {
			AuthenticationOutcome::Succeeded { entry } => {
				let entry = self.write_success(entry, candidate).await?;

				Ok(AuthenticationResult {
					outcome: AuthenticationOutcome::Succeeded { entry },
					..result
				})
			},
			AuthenticationOutcome::Failed { kind: FailureKind::RefreshTokenInvalid, .. } => {
				if let Some(candidate) = candidate {
					self.evict(candidate).await?;
				}

				Ok(result)
			},
			_ => Ok(result),
		}
	}

	async fn write_success(
		&self,
		issued: CacheEntry,
		candidate: Option<&CacheEntry>,
	) -> Result<CacheEntry, StoreError> {
		let issued_refresh = issued.usable_refresh_token().cloned();
		// A multi-resource token is never copied; it stays in one slot so eviction removes it.
		let retained = candidate
			.filter(|candidate| !candidate.is_multi_resource_refresh_token)
			.and_then(CacheEntry::usable_refresh_token);
		let entry = match (&issued_refresh, retained) {
			(None, Some(retained)) => issued
				.to_builder()
				.refresh_secret(Some(retained.clone()))
				.build()
				.map_err(|e| StoreError::Serialization { message: e.to_string() })?,
			_ => issued,
		};

		self.store.set(entry.clone()).await?;

		tracing::debug!(key = %entry.key, user = ?entry.user_id, "stored resource entry");

		if let Some(refresh_token) = issued_refresh.filter(|_| entry.key.resource.is_some()) {
			let multi = CacheEntry::builder(entry.key.without_resource())
				.user_id(entry.user_id.clone())
				.refresh_secret(Some(refresh_token))
				.multi_resource(true)
				.identity_claims(entry.identity_claims.clone())
				.build()
				.map_err(|e| StoreError::Serialization { message: e.to_string() })?;

			self.store.set(multi).await?;

			tracing::debug!(key = %entry.key.without_resource(), "stored multi-resource entry");
		}

		if let Some(stale) = candidate.filter(|c| c.user_id.is_none() && entry.user_id.is_some()) {
			for key in [&entry.key, &stale.key] {
				if self.store.remove(key, None).await?.is_some() {
					tracing::debug!(%key, "removed user-less duplicate");
				}
			}
		}

		Ok(entry)
	}

	async fn evict(&self, candidate: &CacheEntry) -> Result<(), StoreError> {
		let removed = self.store.remove(&candidate.key, candidate.user_id.as_ref()).await?;

		tracing::warn!(
			key = %candidate.key,
			user = ?candidate.user_id,
			removed = removed.is_some(),
			"evicted rejected refresh token"
		);

		Ok(())
	}
}
impl Debug for CacheWriter<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("CacheWriter(..)")
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::{
		auth::{Authority, CacheKey, ClientId, CorrelationId, ResourceId, TokenSecret, UserId},
		store::MemoryStore,
	};

	const NOW: OffsetDateTime = macros::datetime!(2025-03-01 09:00 UTC);

	fn key(resource: &str) -> CacheKey {
		CacheKey::new(
			Authority::new("https://login.example.com/contoso").expect("Authority should parse."),
			ResourceId::new(resource).expect("Resource should be valid."),
			ClientId::new("client").expect("Client should be valid."),
		)
	}

	fn alice() -> UserId {
		UserId::new("alice").expect("User should be valid.")
	}

	fn correlation() -> CorrelationId {
		CorrelationId::new("corr").expect("Correlation id should be valid.")
	}

	fn issued(refresh: Option<&str>, user: Option<UserId>) -> CacheEntry {
		let mut builder = CacheEntry::builder(key("graph"))
			.user_id(user)
			.access_token("at-new")
			.expires_on(NOW + Duration::hours(1));

		if let Some(refresh) = refresh {
			builder = builder.refresh_token(refresh);
		}

		builder.build().expect("Issued entry should build.")
	}

	fn stored(resource: &str, user: Option<UserId>, refresh: &str) -> CacheEntry {
		CacheEntry::builder(key(resource))
			.user_id(user)
			.access_token("at-old")
			.expires_on(NOW - Duration::hours(1))
			.refresh_token(refresh)
			.build()
			.expect("Stored entry should build.")
	}

	fn refresh_of(entry: &CacheEntry) -> Option<&str> {
		entry.refresh_token.as_ref().map(TokenSecret::expose)
	}

	#[tokio::test]
	async fn success_with_refresh_token_writes_both_entries() {
		let store = MemoryStore::default();
		let result = AuthenticationResult::succeeded(issued(Some("rt-new"), Some(alice())), correlation());
		let committed = CacheWriter::new(&store)
			.commit(result, None)
			.await
			.expect("Commit should succeed.");

		assert!(committed.is_success());
		assert_eq!(store.len(), 2);

		let multi = store
			.get(&key("graph").without_resource(), Some(&alice()))
			.await
			.expect("Reading the store should succeed.");

		assert_eq!(multi.len(), 1);
		assert!(multi[0].is_multi_resource_refresh_token);
		assert_eq!(refresh_of(&multi[0]), Some("rt-new"));
	}

	#[tokio::test]
	async fn success_without_refresh_token_retains_candidate_token() {
		let candidate = stored("graph", Some(alice()), "rt-old");
		let store = MemoryStore::default();

		store.set(candidate.clone()).await.expect("Seeding should succeed.");

		let result = AuthenticationResult::succeeded(issued(None, Some(alice())), correlation());
		let committed = CacheWriter::new(&store)
			.commit(result, Some(&candidate))
			.await
			.expect("Commit should succeed.");
		let entry = committed.entry().expect("Committed result should carry the entry.");

		assert_eq!(refresh_of(entry), Some("rt-old"));
		assert_eq!(entry.access_token.as_ref().map(TokenSecret::expose), Some("at-new"));
		assert_eq!(store.len(), 1);
	}

	#[tokio::test]
	async fn multi_resource_token_is_not_copied_into_resource_entry() {
		let candidate = CacheEntry::builder(key("graph").without_resource())
			.user_id(Some(alice()))
			.refresh_token("mrrt")
			.multi_resource(true)
			.build()
			.expect("Multi-resource entry should build.");
		let store = MemoryStore::default();

		store.set(candidate.clone()).await.expect("Seeding should succeed.");

		let result = AuthenticationResult::succeeded(issued(None, Some(alice())), correlation());
		let committed = CacheWriter::new(&store)
			.commit(result, Some(&candidate))
			.await
			.expect("Commit should succeed.");

		assert_eq!(committed.entry().and_then(refresh_of), None);

		let rejected = AuthenticationResult::failed(
			FailureKind::RefreshTokenInvalid,
			"invalid_grant",
			correlation(),
		);

		CacheWriter::new(&store)
			.commit(rejected, Some(&candidate))
			.await
			.expect("Commit should succeed.");

		let entries = store.all().await.expect("Reading the store should succeed.");

		assert_eq!(entries.len(), 1);
		assert!(entries.iter().all(|entry| refresh_of(entry) != Some("mrrt")));
	}

	#[tokio::test]
	async fn revealed_user_replaces_user_less_entry() {
		let candidate = stored("graph", None, "rt-old");
		let store = MemoryStore::default();

		store.set(candidate.clone()).await.expect("Seeding should succeed.");

		let result = AuthenticationResult::succeeded(issued(None, Some(alice())), correlation());

		CacheWriter::new(&store)
			.commit(result, Some(&candidate))
			.await
			.expect("Commit should succeed.");

		let entries = store.all().await.expect("Reading the store should succeed.");

		assert_eq!(entries.len(), 1);
		assert_eq!(entries[0].user_id, Some(alice()));
	}

	#[tokio::test]
	async fn rejected_refresh_token_evicts_only_its_entry() {
		let spent = stored("graph", Some(alice()), "rt-graph");
		let sibling = stored("mail", Some(alice()), "rt-mail");
		let store = MemoryStore::default();

		store.set(spent.clone()).await.expect("Seeding should succeed.");
		store.set(sibling.clone()).await.expect("Seeding should succeed.");

		let result = AuthenticationResult::failed(
			FailureKind::RefreshTokenInvalid,
			"invalid_grant",
			correlation(),
		);

		CacheWriter::new(&store)
			.commit(result, Some(&spent))
			.await
			.expect("Commit should succeed.");

		let entries = store.all().await.expect("Reading the store should succeed.");

		assert_eq!(entries.len(), 1);
		assert!(entries[0].same_slot(&sibling));
	}

	#[tokio::test]
	async fn other_failures_leave_store_untouched() {
		let candidate = stored("graph", Some(alice()), "rt");
		let store = MemoryStore::default();

		store.set(candidate.clone()).await.expect("Seeding should succeed.");

		for result in [
			AuthenticationResult::failed(FailureKind::ProtocolError, "invalid_client", correlation()),
			AuthenticationResult::failed(FailureKind::TransportFailure, "reset", correlation()),
			AuthenticationResult::no_candidate(correlation()),
		] {
			CacheWriter::new(&store)
				.commit(result, Some(&candidate))
				.await
				.expect("Commit should succeed.");
		}

		assert_eq!(store.len(), 1);
	}
}

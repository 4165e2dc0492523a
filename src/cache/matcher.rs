//! Cache Key Matcher: resolves a request to the entries that may satisfy it.

// std
use std::collections::BTreeSet;
// self
use crate::{
	_prelude::*,
	auth::{CacheEntry, CacheKey, UserId},
	store::{StoreError, TokenCacheStore},
};

/// Errors raised while matching a request against the store.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum MatchError {
	/// Entries for several users matched a request that named no user.
	#[error("Cached credentials exist for {users} users; a user id is required.")]
	AmbiguousUser {
		/// Number of distinct users among the matches.
		users: usize,
	},
	/// A resource-less request matched several resource-specific entries.
	#[error("Cached credentials exist for {resources} resources; a resource is required.")]
	AmbiguousResource {
		/// Number of resource-specific entries among the matches.
		resources: usize,
	},
	/// The store failed while reading.
	#[error(transparent)]
	Store(#[from] StoreError),
}

/// Entries selected for a single user.
///
/// The resource-specific entry, when present, is preferred over the multi-resource one.
#[derive(Clone, Debug)]
pub struct CacheCandidates {
	/// User every candidate belongs to.
	pub user_id: Option<UserId>,
	/// Entry stored under a resource-specific key.
	pub resource_entry: Option<CacheEntry>,
	/// Multi-resource refresh token entry for the same authority + client + user.
	pub multi_resource_entry: Option<CacheEntry>,
}

/// Looks up every entry that could satisfy `key` for `user`.
///
/// Returns `Ok(None)` when nothing matches. Identifiers compare case-sensitively; authorities
/// are already normalized by [`crate::auth::Authority`].
pub async fn find_candidates(
	store: &dyn TokenCacheStore,
	key: &CacheKey,
	user: Option<&UserId>,
) -> Result<Option<CacheCandidates>, MatchError> {
	let matches = if key.resource.is_some() {
		let mut specific = store.get(key, user).await?;

		specific.extend(
			store
				.get(&key.without_resource(), user)
				.await?
				.into_iter()
				.filter(|entry| entry.is_multi_resource_refresh_token),
		);

		specific
	} else {
		store
			.all()
			.await?
			.into_iter()
			.filter(|entry| entry.key.same_family(key))
			.filter(|entry| user.is_none_or(|user| entry.user_id.as_ref() == Some(user)))
			.collect()
	};

	select_candidates(matches)
}

fn select_candidates(matches: Vec<CacheEntry>) -> Result<Option<CacheCandidates>, MatchError> {
	let users = matches.iter().map(|entry| entry.user_id.as_ref()).collect::<BTreeSet<_>>();

	if users.len() > 1 {
		return Err(MatchError::AmbiguousUser { users: users.len() });
	}

	let Some(user_id) = users.into_iter().next().map(|user| user.cloned()) else {
		return Ok(None);
	};
	let (multi, mut specific): (Vec<_>, Vec<_>) =
		matches.into_iter().partition(|entry| entry.is_multi_resource_refresh_token);

	if specific.len() > 1 {
		return Err(MatchError::AmbiguousResource { resources: specific.len() });
	}

	Ok(Some(CacheCandidates {
		user_id,
		resource_entry: specific.pop(),
		multi_resource_entry: multi.into_iter().next(),
	}))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		auth::{Authority, ClientId, ResourceId},
		store::MemoryStore,
	};

	fn key(resource: &str) -> CacheKey {
		CacheKey::new(
			Authority::new("https://login.example.com/contoso").expect("Authority should parse."),
			ResourceId::new(resource).expect("Resource should be valid."),
			ClientId::new("client").expect("Client should be valid."),
		)
	}

	fn user(value: &str) -> UserId {
		UserId::new(value).expect("User should be valid.")
	}

	fn specific(resource: &str, user_id: Option<&str>) -> CacheEntry {
		CacheEntry::builder(key(resource))
			.user_id(user_id.map(user))
			.refresh_token("rt")
			.build()
			.expect("Resource entry should build.")
	}

	fn multi(user_id: &str) -> CacheEntry {
		CacheEntry::builder(key("unused").without_resource())
			.user_id(Some(user(user_id)))
			.refresh_token("mrrt")
			.multi_resource(true)
			.build()
			.expect("Multi-resource entry should build.")
	}

	async fn seeded(entries: impl IntoIterator<Item = CacheEntry>) -> MemoryStore {
		let store = MemoryStore::default();

		for entry in entries {
			store.set(entry).await.expect("Seeding the memory store should succeed.");
		}

		store
	}

	#[tokio::test]
	async fn empty_store_has_no_candidate() {
		let store = MemoryStore::default();
		let found = find_candidates(&store, &key("graph"), None)
			.await
			.expect("Matching an empty store should succeed.");

		assert!(found.is_none());
	}

	#[tokio::test]
	async fn multi_resource_entry_matches_any_resource() {
		let store = seeded([multi("alice")]).await;
		let found = find_candidates(&store, &key("mail"), None)
			.await
			.expect("Matching should succeed.")
			.expect("The multi-resource entry should match.");

		assert!(found.resource_entry.is_none());
		assert!(found.multi_resource_entry.is_some());
		assert_eq!(found.user_id, Some(user("alice")));
	}

	#[tokio::test]
	async fn two_users_without_user_id_is_ambiguous() {
		let store = seeded([specific("graph", Some("alice")), specific("graph", Some("bob"))]).await;
		let err = find_candidates(&store, &key("graph"), None)
			.await
			.expect_err("Two users must not be narrowed silently.");

		assert_eq!(err, MatchError::AmbiguousUser { users: 2 });

		let found = find_candidates(&store, &key("graph"), Some(&user("bob")))
			.await
			.expect("Naming the user should disambiguate.")
			.expect("Bob's entry should match.");

		assert_eq!(found.user_id, Some(user("bob")));
	}

	#[tokio::test]
	async fn resource_less_request_spans_resources() {
		let store = seeded([specific("graph", Some("alice")), multi("alice")]).await;
		let request = key("graph").without_resource();
		let found = find_candidates(&store, &request, None)
			.await
			.expect("Matching should succeed.")
			.expect("Alice's entries should match.");

		assert!(found.resource_entry.is_some());
		assert!(found.multi_resource_entry.is_some());

		store.set(specific("mail", Some("alice"))).await.expect("Seeding should succeed.");

		assert_eq!(
			find_candidates(&store, &request, None)
				.await
				.expect_err("Two resources must not be narrowed silently."),
			MatchError::AmbiguousResource { resources: 2 }
		);
	}

	#[tokio::test]
	async fn other_clients_are_ignored() {
		let foreign = CacheEntry::builder(CacheKey::new(
			Authority::new("https://login.example.com/contoso").expect("Authority should parse."),
			ResourceId::new("graph").expect("Resource should be valid."),
			ClientId::new("other-client").expect("Client should be valid."),
		))
		.user_id(Some(user("bob")))
		.refresh_token("rt")
		.build()
		.expect("Foreign entry should build.");
		let store = seeded([specific("graph", Some("alice")), foreign]).await;
		let found = find_candidates(&store, &key("graph"), None)
			.await
			.expect("Foreign clients must not cause ambiguity.")
			.expect("Alice's entry should match.");

		assert_eq!(found.user_id, Some(user("alice")));
	}
}

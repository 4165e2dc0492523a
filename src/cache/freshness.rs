//! Token Freshness Evaluator: decides how matched candidates can satisfy a request.

// self
use crate::{
	_prelude::*,
	auth::{CacheEntry, CacheKey, ResourceId, TokenSecret},
	cache::CacheCandidates,
};

/// Knobs that influence classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FreshnessPolicy {
	/// Tolerance subtracted from every access token expiry.
	pub clock_skew: Duration,
	/// When `false`, valid access tokens are ignored and a refresh is forced.
	pub use_access_token: bool,
}
impl Default for FreshnessPolicy {
	fn default() -> Self {
		Self { clock_skew: Duration::minutes(5), use_access_token: true }
	}
}

/// Refresh token picked for a silent exchange.
#[derive(Clone, Debug)]
pub struct RefreshCandidate {
	/// Entry whose refresh token will be spent; evicted if the server rejects it.
	pub entry: CacheEntry,
	/// Refresh token to submit.
	pub refresh_token: TokenSecret,
	/// Resource the new access token should target.
	pub resource: ResourceId,
}
impl RefreshCandidate {
	/// Returns the resource-specific key the refreshed entry is stored under.
	pub fn target_key(&self) -> CacheKey {
		self.entry.key.with_resource(self.resource.clone())
	}

	/// Returns `true` when the refresh token comes from a multi-resource entry.
	pub fn is_multi_resource(&self) -> bool {
		self.entry.is_multi_resource_refresh_token
	}
}

/// Classification of a request against its candidates.
#[derive(Clone, Debug)]
pub enum Freshness {
	/// The resource-specific access token can be returned as-is.
	DirectlyUsable(CacheEntry),
	/// A silent refresh can produce a new access token.
	Refreshable(RefreshCandidate),
	/// Nothing cached helps; the caller must fall back.
	Unusable,
}
impl Freshness {
	/// Short label for logs.
	pub const fn label(&self) -> &'static str {
		match self {
			Freshness::DirectlyUsable(_) => "directly_usable",
			Freshness::Refreshable(_) => "refreshable",
			Freshness::Unusable => "unusable",
		}
	}
}

/// Classifies `candidates` for a request targeting `requested` (or any resource when `None`).
///
/// When the request names no resource the target resource is taken from the resource-specific
/// candidate; a lone multi-resource entry then has nothing to refresh for and is unusable.
pub fn evaluate(
	candidates: Option<&CacheCandidates>,
	requested: Option<&ResourceId>,
	now: OffsetDateTime,
	policy: FreshnessPolicy,
) -> Freshness {
	let Some(candidates) = candidates else {
		return Freshness::Unusable;
	};
	let specific = candidates.resource_entry.as_ref();

	if let Some(entry) = specific.filter(|entry| {
		policy.use_access_token && entry.is_access_token_usable_at(now, policy.clock_skew)
	}) {
		return Freshness::DirectlyUsable(entry.clone());
	}

	let Some(resource) =
		requested.or_else(|| specific.and_then(|entry| entry.key.resource.as_ref())).cloned()
	else {
		return Freshness::Unusable;
	};
	let source = specific
		.filter(|entry| entry.usable_refresh_token().is_some())
		.or(candidates.multi_resource_entry.as_ref());

	match source.and_then(|entry| Some((entry, entry.usable_refresh_token()?.clone()))) {
		Some((entry, refresh_token)) =>
			Freshness::Refreshable(RefreshCandidate { entry: entry.clone(), refresh_token, resource }),
		None => Freshness::Unusable,
	}
}

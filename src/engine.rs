//! Resolution driver tying the cache components to a token endpoint.
//!
//! [`TokenCacheEngine::resolve`] runs the matcher, freshness evaluator, at most one exchange,
//! the response interpreter, and the cache writer in strict sequence. Every path ends in a single
//! [`AuthenticationResult`]; nothing is returned as an error across the asynchronous boundary.
//! Concurrent resolutions for the same key and user are not deduplicated.

mod config;
mod metrics;
mod refresh;
mod request;

pub use config::EngineConfig;
pub use self::metrics::ResolutionMetrics;
pub use request::RequestDescriptor;

// self
use crate::{
	_prelude::*,
	auth::{CacheEntry, CorrelationId},
	cache::{self, CacheWriter, Freshness, MatchError},
	error::ExchangeError,
	exchange::TokenEndpoint,
	result::{AuthenticationResult, FailureKind},
	store::{StoreError, TokenCacheStore},
};
#[cfg(feature = "reqwest")] use crate::exchange::ReqwestTokenEndpoint;

#[cfg(feature = "reqwest")]
/// Engine specialized for the crate's default reqwest-backed token endpoint.
pub type ReqwestTokenCacheEngine = TokenCacheEngine<ReqwestTokenEndpoint>;

/// Resolves token requests against a shared cache store.
pub struct TokenCacheEngine<E = dyn TokenEndpoint>
where
	E: ?Sized + TokenEndpoint,
{
	/// Store shared with every other resolution.
	pub store: Arc<dyn TokenCacheStore>,
	/// Token endpoint used for silent exchanges.
	pub endpoint: Arc<E>,
	/// Engine settings.
	pub config: EngineConfig,
	/// Shared counters for resolution outcomes.
	pub metrics: Arc<ResolutionMetrics>,
}
impl<E> TokenCacheEngine<E>
where
	E: ?Sized + TokenEndpoint,
{
	/// Creates an engine that reuses the caller-provided endpoint.
	pub fn with_endpoint(store: Arc<dyn TokenCacheStore>, endpoint: impl Into<Arc<E>>) -> Self {
		Self {
			store,
			endpoint: endpoint.into(),
			config: Default::default(),
			metrics: Default::default(),
		}
	}

	/// Replaces the engine settings.
	pub fn with_config(mut self, config: EngineConfig) -> Self {
		self.config = config;

		self
	}

	/// Matches `request` against the store and classifies the candidates.
	///
	/// Issues no exchange. Ambiguous matches and store failures are returned as [`MatchError`].
	pub async fn classify(&self, request: &RequestDescriptor) -> Result<Freshness, MatchError> {
		let candidates =
			cache::find_candidates(self.store.as_ref(), &request.key, request.user_id.as_ref())
				.await?;

		Ok(cache::evaluate(
			candidates.as_ref(),
			request.key.resource.as_ref(),
			OffsetDateTime::now_utc(),
			self.config.freshness_policy(request.use_access_token),
		))
	}

	/// Commits a result obtained outside the engine, such as the caller's interactive fallback.
	///
	/// `candidate` is the entry whose refresh token produced the result, if any.
	pub async fn update_cache(
		&self,
		result: AuthenticationResult,
		candidate: Option<&CacheEntry>,
	) -> Result<AuthenticationResult> {
		Ok(self.write(result, candidate).await?)
	}

	async fn write(
		&self,
		result: AuthenticationResult,
		candidate: Option<&CacheEntry>,
	) -> Result<AuthenticationResult, StoreError> {
		let evicting =
			candidate.is_some() && result.failure_kind() == Some(FailureKind::RefreshTokenInvalid);
		let committed = CacheWriter::new(self.store.as_ref()).commit(result, candidate).await?;

		if evicting {
			self.metrics.record_eviction();
		}

		Ok(committed)
	}
}
#[cfg(feature = "reqwest")]
impl TokenCacheEngine<ReqwestTokenEndpoint> {
	/// Creates an engine that talks to token endpoints through a default reqwest client.
	pub fn new(store: Arc<dyn TokenCacheStore>) -> Self {
		Self::with_endpoint(store, ReqwestTokenEndpoint::new())
	}
}
impl<E> Clone for TokenCacheEngine<E>
where
	E: ?Sized + TokenEndpoint,
{
	fn clone(&self) -> Self {
		Self {
			store: self.store.clone(),
			endpoint: self.endpoint.clone(),
			config: self.config,
			metrics: self.metrics.clone(),
		}
	}
}
impl<E> Debug for TokenCacheEngine<E>
where
	E: ?Sized + TokenEndpoint,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenCacheEngine")
			.field("config", &self.config)
			.field("metrics", &self.metrics)
			.finish()
	}
}

fn match_failure(error: MatchError, correlation_id: CorrelationId) -> AuthenticationResult {
	let kind = match &error {
		MatchError::AmbiguousUser { .. } => FailureKind::AmbiguousUser,
		MatchError::AmbiguousResource { .. } => FailureKind::AmbiguousResource,
		MatchError::Store(_) => FailureKind::StoreFailure,
	};

	AuthenticationResult::failed(kind, error.to_string(), correlation_id)
}

fn exchange_failure(error: ExchangeError, correlation_id: CorrelationId) -> AuthenticationResult {
	let kind = match &error {
		ExchangeError::Transport(e) if e.is_timeout() => FailureKind::Timeout,
		ExchangeError::Transport(_) => FailureKind::TransportFailure,
		ExchangeError::UnparseableBody { .. } => FailureKind::MalformedResponse,
	};

	tracing::warn!(error = %error, kind = kind.as_str(), "token exchange failed");

	AuthenticationResult::failed(kind, error.to_string(), correlation_id)
}

//! Refresh orchestration: one exchange per resolution, interpreted and committed in order.
//!
//! A resolution either returns a directly usable cached token, spends exactly one credential
//! (a cached refresh token or a caller-supplied SAML assertion) at the token endpoint, or
//! reports that the cache had nothing. There is no retry: transport failures leave the store
//! untouched, and a rejected refresh token is evicted without falling back to another one.

// crates.io
use tokio::{runtime::Handle, task::JoinHandle};
// self
use crate::{
	_prelude::*,
	auth::{CacheEntry, CacheKey, UserId},
	cache::Freshness,
	engine::{RequestDescriptor, TokenCacheEngine, exchange_failure, match_failure},
	error::{ExchangeError, TransportError},
	exchange::{AssertionType, CredentialSource, TokenEndpoint, TokenExchangeRequest},
	obs::{self, ResolutionOutcome, ResolutionPath, ResolutionSpan},
	response::{self, InterpretContext, RawTokenResponse},
	result::{AuthenticationOutcome, AuthenticationResult, FailureKind},
};

impl<E> TokenCacheEngine<E>
where
	E: ?Sized + TokenEndpoint,
{
	/// Resolves `request` from the cache, refreshing silently when needed.
	///
	/// An empty or unusable cache yields
	/// [`InteractionSource::NoCachedCredential`](crate::result::InteractionSource::NoCachedCredential);
	/// the caller is responsible for the interactive fallback.
	pub async fn resolve(&self, request: RequestDescriptor) -> AuthenticationResult {
		self.observe(ResolutionPath::Cache, "resolve", self.run(&request, None)).await
	}

	/// Resolves `request` from the cache and, only when nothing cached is usable, exchanges a
	/// SAML assertion for a new token and stores it.
	pub async fn acquire_with_assertion(
		&self,
		request: RequestDescriptor,
		assertion: impl Into<String>,
		assertion_type: AssertionType,
	) -> AuthenticationResult {
		let source = CredentialSource::saml(assertion, assertion_type);

		self.observe(
			ResolutionPath::Assertion,
			"acquire_with_assertion",
			self.run(&request, Some(source)),
		)
		.await
	}

	/// Runs [`resolve`](Self::resolve) on `runtime` and hands the result to `completion`.
	///
	/// `completion` is invoked exactly once from the spawned task and never synchronously within
	/// this call. On a multi-thread runtime it may run before this method returns.
	pub fn spawn_resolve<F>(
		&self,
		runtime: &Handle,
		request: RequestDescriptor,
		completion: F,
	) -> JoinHandle<()>
	where
		E: 'static,
		F: 'static + Send + FnOnce(AuthenticationResult),
	{
		let engine = self.clone();

		runtime.spawn(async move {
			let result = engine.resolve(request).await;

			completion(result);
		})
	}

	async fn observe(
		&self,
		path: ResolutionPath,
		stage: &'static str,
		resolution: impl Future<Output = AuthenticationResult>,
	) -> AuthenticationResult {
		let span = ResolutionSpan::new(path, stage);

		obs::record_resolution(path, ResolutionOutcome::Attempt);
		self.metrics.record_attempt();

		let result = span.instrument(resolution).await;
		let outcome = match &result.outcome {
			AuthenticationOutcome::Succeeded { .. } => {
				self.metrics.record_success();

				ResolutionOutcome::Success
			},
			AuthenticationOutcome::Failed { .. } => {
				self.metrics.record_failure();

				ResolutionOutcome::Failure
			},
			AuthenticationOutcome::InteractionRequired { .. } => ResolutionOutcome::InteractionRequired,
		};

		obs::record_resolution(path, outcome);

		tracing::debug!(
			%path,
			outcome = result.label(),
			correlation_id = %result.correlation_id,
			"resolution finished"
		);

		result
	}

	async fn run(
		&self,
		request: &RequestDescriptor,
		assertion: Option<CredentialSource>,
	) -> AuthenticationResult {
		let correlation_id = request.correlation_id.clone();
		let freshness = match self.classify(request).await {
			Ok(freshness) => freshness,
			Err(e) => return match_failure(e, correlation_id),
		};

		tracing::debug!(
			key = %request.key,
			classification = freshness.label(),
			correlation_id = %correlation_id,
			"classified request"
		);

		match freshness {
			Freshness::DirectlyUsable(entry) => {
				self.metrics.record_cache_hit();

				AuthenticationResult::succeeded(entry, correlation_id)
			},
			Freshness::Refreshable(candidate) => {
				let key = candidate.target_key();
				let exchange = TokenExchangeRequest {
					authority: key.authority.clone(),
					source: CredentialSource::RefreshToken(candidate.refresh_token.clone()),
					resource: candidate.resource.clone(),
					client_id: key.client_id.clone(),
					redirect_uri: request.redirect_uri.clone(),
					correlation_id,
				};
				let fallback_user = candidate.entry.user_id.as_ref().or(request.user_id.as_ref());

				tracing::debug!(
					multi_resource = candidate.is_multi_resource(),
					fingerprint = %candidate.refresh_token.fingerprint(),
					"refreshing cached credential"
				);

				self.exchange_and_commit(&exchange, &key, fallback_user, Some(&candidate.entry))
					.await
			},
			Freshness::Unusable => match (assertion, &request.key.resource) {
				(Some(source), Some(resource)) => {
					let exchange = TokenExchangeRequest {
						authority: request.key.authority.clone(),
						source,
						resource: resource.clone(),
						client_id: request.key.client_id.clone(),
						redirect_uri: request.redirect_uri.clone(),
						correlation_id,
					};

					self.exchange_and_commit(&exchange, &request.key, request.user_id.as_ref(), None)
						.await
				},
				_ => AuthenticationResult::no_candidate(correlation_id),
			},
		}
	}

	async fn exchange_and_commit(
		&self,
		exchange: &TokenExchangeRequest,
		key: &CacheKey,
		fallback_user: Option<&UserId>,
		candidate: Option<&CacheEntry>,
	) -> AuthenticationResult {
		let raw = match self.exchange(exchange).await {
			Ok(raw) => raw,
			Err(e) => return exchange_failure(e, exchange.correlation_id.clone()),
		};
		let result = response::interpret(
			&raw,
			&InterpretContext {
				key,
				fallback_user,
				from_refresh: exchange.source.is_refresh_token(),
				correlation_id: &exchange.correlation_id,
				now: OffsetDateTime::now_utc(),
			},
		);
		let correlation_id = result.correlation_id.clone();
		let server_correlation_id = result.server_correlation_id.clone();

		match self.write(result, candidate).await {
			Ok(committed) => committed,
			Err(e) => {
				tracing::warn!(error = %e, "cache commit failed");

				AuthenticationResult::failed(FailureKind::StoreFailure, e.to_string(), correlation_id)
					.with_server_correlation_id(server_correlation_id)
			},
		}
	}

	async fn exchange(
		&self,
		request: &TokenExchangeRequest,
	) -> Result<RawTokenResponse, ExchangeError> {
		self.metrics.record_exchange();

		let exchange = self.endpoint.exchange(request);

		match self.config.exchange_timeout {
			Some(limit) => tokio::time::timeout(limit.try_into().unwrap_or_default(), exchange)
				.await
				.map_err(|_| ExchangeError::from(TransportError::Timeout))?,
			None => exchange.await,
		}
	}
}

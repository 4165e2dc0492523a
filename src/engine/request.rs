// self
use crate::{
	_prelude::*,
	auth::{Authority, CacheKey, ClientId, CorrelationId, ResourceId, UserId},
};

/// Input to a resolution.
#[derive(Clone, Debug)]
pub struct RequestDescriptor {
	/// Credential family being requested; a `None` resource accepts any single cached resource.
	pub key: CacheKey,
	/// Requested user; `None` means "the only user present", failing when several are.
	pub user_id: Option<UserId>,
	/// When `false`, cached access tokens are ignored and a refresh is forced.
	pub use_access_token: bool,
	/// Opaque id threaded into the exchange and the result.
	pub correlation_id: CorrelationId,
	/// Redirect URI forwarded to the token endpoint.
	pub redirect_uri: Option<Url>,
}
impl RequestDescriptor {
	/// Creates a request for `key` with a random correlation id.
	pub fn new(key: CacheKey) -> Self {
		Self {
			key,
			user_id: None,
			use_access_token: true,
			correlation_id: CorrelationId::random(),
			redirect_uri: None,
		}
	}

	/// Creates a request for one resource.
	pub fn for_resource(authority: Authority, resource: ResourceId, client_id: ClientId) -> Self {
		Self::new(CacheKey::new(authority, resource, client_id))
	}

	/// Restricts the request to `user_id`.
	pub fn with_user(mut self, user_id: UserId) -> Self {
		self.user_id = Some(user_id);

		self
	}

	/// Uses the caller's correlation id instead of a random one.
	pub fn with_correlation_id(mut self, correlation_id: CorrelationId) -> Self {
		self.correlation_id = correlation_id;

		self
	}

	/// Sets the redirect URI sent with exchanges.
	pub fn with_redirect_uri(mut self, redirect_uri: Url) -> Self {
		self.redirect_uri = Some(redirect_uri);

		self
	}

	/// Skips valid access tokens and refreshes.
	pub fn force_refresh(self) -> Self {
		self.with_use_access_token(false)
	}

	/// Overrides the use-access-token flag.
	pub fn with_use_access_token(mut self, use_access_token: bool) -> Self {
		self.use_access_token = use_access_token;

		self
	}
}

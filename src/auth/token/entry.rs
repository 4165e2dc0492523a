//! Immutable cache entries and their builder.

// self
use crate::{
	_prelude::*,
	auth::{
		IdentityClaims, UserId,
		token::{key::CacheKey, secret::TokenSecret},
	},
};

/// Errors produced by [`CacheEntryBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CacheEntryBuilderError {
	/// Multi-resource entries carry only a refresh token.
	#[error("Multi-resource entries cannot carry an access token or expiry.")]
	MultiResourceWithAccessToken,
	/// Multi-resource entries live under a resource-less key.
	#[error("Multi-resource entries must use a resource-less key.")]
	MultiResourceWithResource,
	/// Multi-resource entries exist only to seed refreshes.
	#[error("Multi-resource entries require a refresh token.")]
	MultiResourceWithoutRefreshToken,
	/// Resource-less keys are reserved for multi-resource entries.
	#[error("Resource-specific entries require a resource.")]
	MissingResource,
	/// The entry holds neither an access token nor a refresh token.
	#[error("Entry must hold an access token or a refresh token.")]
	NoCredential,
	/// `issued_at + lifetime` is not a representable instant.
	#[error("Access token expiry is out of range.")]
	ExpiryOutOfRange,
}

/// One stored credential.
///
/// Entries are never mutated once stored; producing an updated credential means building a new
/// entry (see [`CacheEntry::to_builder`]) and replacing the old one in the store.
#[derive(Clone, Serialize, Deserialize)]
pub struct CacheEntry {
	/// Credential family this entry belongs to.
	pub key: CacheKey,
	/// User the credential was issued to, when known.
	pub user_id: Option<UserId>,
	/// Access token; callers must avoid logging it.
	pub access_token: Option<TokenSecret>,
	/// Access token type reported by the endpoint (usually `Bearer`).
	pub access_token_type: Option<String>,
	/// Access token expiry instant.
	pub expires_on: Option<OffsetDateTime>,
	/// Refresh token; it never expires locally.
	pub refresh_token: Option<TokenSecret>,
	/// Whether this entry seeds refreshes for any resource under the same authority + client.
	pub is_multi_resource_refresh_token: bool,
	/// Claims decoded from the `id_token`, if one was issued.
	pub identity_claims: Option<IdentityClaims>,
}
impl CacheEntry {
	/// Returns a builder for a resource-specific or multi-resource entry under `key`.
	pub fn builder(key: CacheKey) -> CacheEntryBuilder {
		CacheEntryBuilder::new(key)
	}

	/// Returns a builder pre-populated with this entry's values.
	pub fn to_builder(&self) -> CacheEntryBuilder {
		CacheEntryBuilder {
			key: self.key.clone(),
			user_id: self.user_id.clone(),
			access_token: self.access_token.clone(),
			access_token_type: self.access_token_type.clone(),
			expires_on: self.expires_on,
			expires_in: None,
			refresh_token: self.refresh_token.clone(),
			multi_resource: self.is_multi_resource_refresh_token,
			identity_claims: self.identity_claims.clone(),
		}
	}

	/// Returns `true` if the access token is non-empty and stays valid past `now + skew`.
	pub fn is_access_token_usable_at(&self, now: OffsetDateTime, skew: Duration) -> bool {
		let has_token = self.access_token.as_ref().is_some_and(|token| !token.is_empty());

		match (has_token, self.expires_on) {
			(true, Some(expires_on)) =>
				expires_on.checked_sub(skew).is_some_and(|deadline| now < deadline),
			_ => false,
		}
	}

	/// Returns the refresh token if it is present and non-empty.
	pub fn usable_refresh_token(&self) -> Option<&TokenSecret> {
		self.refresh_token.as_ref().filter(|token| !token.is_empty())
	}

	/// Returns `true` when both entries occupy the same store slot.
	pub fn same_slot(&self, other: &Self) -> bool {
		self.key == other.key && self.user_id == other.user_id
	}
}
impl Debug for CacheEntry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CacheEntry")
			.field("key", &self.key)
			.field("user_id", &self.user_id)
			.field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
			.field("access_token_type", &self.access_token_type)
			.field("expires_on", &self.expires_on)
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("is_multi_resource_refresh_token", &self.is_multi_resource_refresh_token)
			.finish()
	}
}

/// Builder for [`CacheEntry`].
#[derive(Clone, Debug)]
pub struct CacheEntryBuilder {
	key: CacheKey,
	user_id: Option<UserId>,
	access_token: Option<TokenSecret>,
	access_token_type: Option<String>,
	expires_on: Option<OffsetDateTime>,
	expires_in: Option<(OffsetDateTime, Duration)>,
	refresh_token: Option<TokenSecret>,
	multi_resource: bool,
	identity_claims: Option<IdentityClaims>,
}
impl CacheEntryBuilder {
	fn new(key: CacheKey) -> Self {
		Self {
			key,
			user_id: None,
			access_token: None,
			access_token_type: None,
			expires_on: None,
			expires_in: None,
			refresh_token: None,
			multi_resource: false,
			identity_claims: None,
		}
	}

	/// Replaces the key.
	pub fn key(mut self, key: CacheKey) -> Self {
		self.key = key;

		self
	}

	/// Sets (or clears) the user id.
	pub fn user_id(mut self, user_id: Option<UserId>) -> Self {
		self.user_id = user_id;

		self
	}

	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Sets the access token type.
	pub fn access_token_type(mut self, token_type: impl Into<String>) -> Self {
		self.access_token_type = Some(token_type.into());

		self
	}

	/// Sets an absolute access token expiry.
	pub fn expires_on(mut self, instant: OffsetDateTime) -> Self {
		self.expires_on = Some(instant);
		self.expires_in = None;

		self
	}

	/// Sets a relative access token expiry measured from `issued_at`.
	pub fn expires_in(mut self, issued_at: OffsetDateTime, lifetime: Duration) -> Self {
		self.expires_in = Some((issued_at, lifetime));

		self
	}

	/// Provides the refresh token value.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Sets (or clears) the refresh token secret.
	pub fn refresh_secret(mut self, secret: Option<TokenSecret>) -> Self {
		self.refresh_token = secret;

		self
	}

	/// Marks the entry as a multi-resource refresh token.
	pub fn multi_resource(mut self, multi_resource: bool) -> Self {
		self.multi_resource = multi_resource;

		self
	}

	/// Attaches identity claims.
	pub fn identity_claims(mut self, claims: Option<IdentityClaims>) -> Self {
		self.identity_claims = claims;

		self
	}

	/// Drops any access token, type, and expiry.
	pub fn clear_access_token(mut self) -> Self {
		self.access_token = None;
		self.access_token_type = None;
		self.expires_on = None;
		self.expires_in = None;

		self
	}

	/// Consumes the builder and produces a [`CacheEntry`].
	pub fn build(self) -> Result<CacheEntry, CacheEntryBuilderError> {
		let expires_on = match self.expires_in {
			Some((issued_at, lifetime)) => Some(
				issued_at.checked_add(lifetime).ok_or(CacheEntryBuilderError::ExpiryOutOfRange)?,
			),
			None => self.expires_on,
		};

		if self.multi_resource {
			if self.access_token.is_some() || expires_on.is_some() {
				return Err(CacheEntryBuilderError::MultiResourceWithAccessToken);
			}
			if self.key.resource.is_some() {
				return Err(CacheEntryBuilderError::MultiResourceWithResource);
			}
			if self.refresh_token.as_ref().is_none_or(TokenSecret::is_empty) {
				return Err(CacheEntryBuilderError::MultiResourceWithoutRefreshToken);
			}
		} else {
			if self.key.resource.is_none() {
				return Err(CacheEntryBuilderError::MissingResource);
			}
			if self.access_token.is_none() && self.refresh_token.is_none() {
				return Err(CacheEntryBuilderError::NoCredential);
			}
		}

		Ok(CacheEntry {
			key: self.key,
			user_id: self.user_id,
			access_token: self.access_token,
			access_token_type: self.access_token_type,
			expires_on,
			refresh_token: self.refresh_token,
			is_multi_resource_refresh_token: self.multi_resource,
			identity_claims: self.identity_claims,
		})
	}
}

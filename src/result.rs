//! Typed outcome of a resolution attempt, delivered exactly once to the caller.

// self
use crate::{
	_prelude::*,
	auth::{CacheEntry, CorrelationId, TokenSecret, UserId},
};

/// Failure categories surfaced through [`AuthenticationOutcome::Failed`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
	/// Entries for more than one user matched a request that named no user.
	AmbiguousUser,
	/// A resource-less request matched several resource-specific entries for one user.
	AmbiguousResource,
	/// The server rejected the submitted refresh token; the entry was evicted.
	RefreshTokenInvalid,
	/// The server returned any other OAuth error.
	ProtocolError,
	/// The response carried neither the required success fields nor an error code.
	MalformedResponse,
	/// The exchange did not complete before the configured deadline.
	Timeout,
	/// The exchange failed below the protocol layer.
	TransportFailure,
	/// The cache store failed while resolving or committing.
	StoreFailure,
}
impl FailureKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FailureKind::AmbiguousUser => "ambiguous_user",
			FailureKind::AmbiguousResource => "ambiguous_resource",
			FailureKind::RefreshTokenInvalid => "refresh_token_invalid",
			FailureKind::ProtocolError => "protocol_error",
			FailureKind::MalformedResponse => "malformed_response",
			FailureKind::Timeout => "timeout",
			FailureKind::TransportFailure => "transport_failure",
			FailureKind::StoreFailure => "store_failure",
		}
	}
}
impl Display for FailureKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Why the caller has to fall back to an interactive or assertion flow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InteractionSource {
	/// The cache had nothing usable for the request.
	NoCachedCredential,
	/// The token endpoint explicitly demanded fresh user interaction.
	Server {
		/// OAuth `error` code.
		error: String,
		/// OAuth `error_description`, when supplied.
		description: Option<String>,
	},
}

/// Outcome variants of a resolution attempt.
#[derive(Clone, Debug)]
pub enum AuthenticationOutcome {
	/// A usable access token is available.
	Succeeded {
		/// Entry holding the token, as committed to the store.
		entry: CacheEntry,
	},
	/// The attempt failed.
	Failed {
		/// Failure category.
		kind: FailureKind,
		/// Human-readable detail.
		message: String,
	},
	/// Interactive acquisition is required.
	InteractionRequired {
		/// Whether the cache or the server triggered the requirement.
		source: InteractionSource,
	},
}

/// Result of one resolution attempt.
#[derive(Clone, Debug)]
pub struct AuthenticationResult {
	/// Outcome of the attempt.
	pub outcome: AuthenticationOutcome,
	/// Correlation id of the request that produced this result.
	pub correlation_id: CorrelationId,
	/// Correlation id echoed by the token endpoint, if any.
	pub server_correlation_id: Option<String>,
}
impl AuthenticationResult {
	/// Builds a successful result.
	pub fn succeeded(entry: CacheEntry, correlation_id: CorrelationId) -> Self {
		Self::new(AuthenticationOutcome::Succeeded { entry }, correlation_id)
	}

	/// Builds a failed result.
	pub fn failed(
		kind: FailureKind,
		message: impl Into<String>,
		correlation_id: CorrelationId,
	) -> Self {
		Self::new(AuthenticationOutcome::Failed { kind, message: message.into() }, correlation_id)
	}

	/// Builds an interaction-required result.
	pub fn interaction_required(source: InteractionSource, correlation_id: CorrelationId) -> Self {
		Self::new(AuthenticationOutcome::InteractionRequired { source }, correlation_id)
	}

	/// Builds the "cache had nothing" result.
	pub fn no_candidate(correlation_id: CorrelationId) -> Self {
		Self::interaction_required(InteractionSource::NoCachedCredential, correlation_id)
	}

	fn new(outcome: AuthenticationOutcome, correlation_id: CorrelationId) -> Self {
		Self { outcome, correlation_id, server_correlation_id: None }
	}

	/// Attaches the correlation id echoed by the server.
	pub fn with_server_correlation_id(mut self, value: Option<String>) -> Self {
		self.server_correlation_id = value;

		self
	}

	/// Returns `true` for [`AuthenticationOutcome::Succeeded`].
	pub fn is_success(&self) -> bool {
		matches!(self.outcome, AuthenticationOutcome::Succeeded { .. })
	}

	/// Returns `true` for [`AuthenticationOutcome::InteractionRequired`].
	pub fn requires_interaction(&self) -> bool {
		matches!(self.outcome, AuthenticationOutcome::InteractionRequired { .. })
	}

	/// Entry carried by a successful result.
	pub fn entry(&self) -> Option<&CacheEntry> {
		match &self.outcome {
			AuthenticationOutcome::Succeeded { entry } => Some(entry),
			_ => None,
		}
	}

	/// Access token carried by a successful result.
	pub fn access_token(&self) -> Option<&TokenSecret> {
		self.entry().and_then(|entry| entry.access_token.as_ref())
	}

	/// Access token expiry carried by a successful result.
	pub fn expires_on(&self) -> Option<OffsetDateTime> {
		self.entry().and_then(|entry| entry.expires_on)
	}

	/// User the successful result belongs to.
	pub fn user_id(&self) -> Option<&UserId> {
		self.entry().and_then(|entry| entry.user_id.as_ref())
	}

	/// Failure category, if the attempt failed.
	pub fn failure_kind(&self) -> Option<FailureKind> {
		match &self.outcome {
			AuthenticationOutcome::Failed { kind, .. } => Some(*kind),
			_ => None,
		}
	}

	/// Short label for logs and metrics.
	pub fn label(&self) -> &'static str {
		match &self.outcome {
			AuthenticationOutcome::Succeeded { .. } => "succeeded",
			AuthenticationOutcome::Failed { kind, .. } => kind.as_str(),
			AuthenticationOutcome::InteractionRequired { .. } => "interaction_required",
		}
	}
}

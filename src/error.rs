//! Crate-level error types shared by stores, transports, and the resolution engine.
//!
//! Resolution itself never surfaces these across the asynchronous boundary: the engine folds
//! them into an [`AuthenticationResult`](crate::result::AuthenticationResult). They are returned
//! directly only by synchronous helpers (identifier parsing, entry building, cache commits).

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Authority cannot be parsed or uses an unsupported scheme.
	#[error(transparent)]
	InvalidAuthority(#[from] crate::auth::AuthorityError),
	/// Identifier failed validation.
	#[error(transparent)]
	InvalidIdentifier(#[from] crate::auth::IdentifierError),
	/// Cache entry builder validation failed.
	#[error("Unable to build cache entry.")]
	EntryBuild(#[from] crate::auth::CacheEntryBuilderError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, deadlines).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] std::io::Error),
	/// The token endpoint did not answer before the deadline.
	#[error("Token endpoint did not respond in time.")]
	Timeout,
	/// The outbound HTTP request could not be assembled.
	#[error(transparent)]
	Request(#[from] oauth2::http::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Returns `true` when the failure is a missed deadline.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Self::Timeout)
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::Timeout } else { Self::network(e) }
	}
}

/// Failures a [`TokenEndpoint`](crate::exchange::TokenEndpoint) reports instead of a response
/// mapping.
#[derive(Debug, ThisError)]
pub enum ExchangeError {
	/// The request never produced a usable HTTP response.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The endpoint answered with a body that is not a JSON object.
	#[error("Token endpoint returned an unparseable body.")]
	UnparseableBody {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn transport_timeout_is_detected() {
		assert!(TransportError::Timeout.is_timeout());
		assert!(!TransportError::Io(std::io::Error::other("boom")).is_timeout());
	}

	#[test]
	fn config_errors_wrap_identifier_failures() {
		let err: Error = ConfigError::from(crate::auth::IdentifierError::Empty { kind: "User" })
			.into();

		assert!(matches!(err, Error::Config(ConfigError::InvalidIdentifier(_))));
		assert_eq!(err.to_string(), "User identifier cannot be empty.");
	}
}

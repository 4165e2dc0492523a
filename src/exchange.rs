//! Token endpoint exchange contract.
//!
//! The engine performs at most one exchange per resolution attempt. The credential it spends is
//! a tagged [`CredentialSource`], so refresh-token and SAML-assertion acquisitions share one
//! request type and feed the same response interpreter.

pub mod endpoint;

pub use endpoint::*;

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::{Authority, ClientId, CorrelationId, ResourceId, TokenSecret},
	error::ExchangeError,
	response::RawTokenResponse,
};

/// Boxed future returned by [`TokenEndpoint::exchange`].
pub type ExchangeFuture<'a> =
	Pin<Box<dyn Future<Output = Result<RawTokenResponse, ExchangeError>> + 'a + Send>>;

/// Token endpoint collaborator consumed by the engine.
pub trait TokenEndpoint
where
	Self: Send + Sync,
{
	/// Performs one exchange and returns the raw protocol mapping.
	///
	/// OAuth error responses are *not* errors at this layer: they come back as a mapping with
	/// an `error` field. Only transport failures and unparseable bodies are reported as
	/// [`ExchangeError`].
	fn exchange<'a>(&'a self, request: &'a TokenExchangeRequest) -> ExchangeFuture<'a>;
}

/// SAML assertion flavors accepted by the token endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssertionType {
	/// SAML 1.1 bearer assertion.
	Saml1_1,
	/// SAML 2.0 bearer assertion.
	Saml2,
}
impl AssertionType {
	/// Returns the RFC 7522 grant type identifier.
	pub const fn grant_type(self) -> &'static str {
		match self {
			AssertionType::Saml1_1 => "urn:ietf:params:oauth:grant-type:saml1_1-bearer",
			AssertionType::Saml2 => "urn:ietf:params:oauth:grant-type:saml2-bearer",
		}
	}
}

/// Credential spent by an exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CredentialSource {
	/// A cached refresh token.
	RefreshToken(TokenSecret),
	/// A SAML assertion supplied by the caller.
	SamlAssertion {
		/// Raw assertion XML.
		assertion: TokenSecret,
		/// Assertion flavor.
		assertion_type: AssertionType,
	},
}
impl CredentialSource {
	/// Wraps a SAML assertion.
	pub fn saml(assertion: impl Into<String>, assertion_type: AssertionType) -> Self {
		Self::SamlAssertion { assertion: TokenSecret::new(assertion), assertion_type }
	}

	/// Returns `true` when a refresh token is spent.
	pub fn is_refresh_token(&self) -> bool {
		matches!(self, Self::RefreshToken(_))
	}

	/// Returns the OAuth `grant_type` for this source.
	pub fn grant_type(&self) -> &'static str {
		match self {
			Self::RefreshToken(_) => "refresh_token",
			Self::SamlAssertion { assertion_type, .. } => assertion_type.grant_type(),
		}
	}
}

/// Everything the token endpoint needs for one exchange.
#[derive(Clone, Debug)]
pub struct TokenExchangeRequest {
	/// Authority hosting the token endpoint.
	pub authority: Authority,
	/// Credential being exchanged.
	pub source: CredentialSource,
	/// Resource the new access token should target.
	pub resource: ResourceId,
	/// Requesting client.
	pub client_id: ClientId,
	/// Redirect URI registered for the client, if the caller supplied one.
	pub redirect_uri: Option<Url>,
	/// Correlation id threaded unchanged from the originating request.
	pub correlation_id: CorrelationId,
}
impl TokenExchangeRequest {
	/// Encodes the request as an `application/x-www-form-urlencoded` body.
	pub fn form_body(&self) -> String {
		let mut form = form_urlencoded::Serializer::new(String::new());

		form.append_pair("grant_type", self.source.grant_type());

		match &self.source {
			CredentialSource::RefreshToken(token) => {
				form.append_pair("refresh_token", token.expose());
			},
			CredentialSource::SamlAssertion { assertion, .. } => {
				form.append_pair("assertion", &URL_SAFE_NO_PAD.encode(assertion.expose()));
			},
		}

		form.append_pair("resource", &self.resource);
		form.append_pair("client_id", &self.client_id);

		if let Some(redirect_uri) = &self.redirect_uri {
			form.append_pair("redirect_uri", redirect_uri.as_str());
		}

		form.finish()
	}
}

//! HTTP-backed [`TokenEndpoint`] posting form requests to `{authority}/oauth2/token`.

// crates.io
use oauth2::{
	AsyncHttpClient,
	http::{
		Method, Request,
		header::{ACCEPT, CONTENT_TYPE},
	},
};
// self
use crate::{
	_prelude::*,
	error::{ExchangeError, TransportError},
	exchange::{ExchangeFuture, TokenEndpoint, TokenExchangeRequest},
	http::{CLIENT_REQUEST_ID_HEADER, ResponseMetadataSlot, TokenHttpClient, TransportErrorMapper},
	response::RawTokenResponse,
};
#[cfg(feature = "reqwest")]
use crate::{
	error::ConfigError,
	http::{ReqwestHttpClient, ReqwestTransportErrorMapper},
};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const RETURN_CLIENT_REQUEST_ID_HEADER: &str = "return-client-request-id";

#[cfg(feature = "reqwest")]
/// Endpoint specialized for the crate's default reqwest transport stack.
pub type ReqwestTokenEndpoint = HttpTokenEndpoint<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Token endpoint that speaks the form-encoded OAuth 2.0 protocol over a [`TokenHttpClient`].
pub struct HttpTokenEndpoint<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client used for every outbound request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors.
	pub transport_mapper: Arc<M>,
}
impl<C, M> HttpTokenEndpoint<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates an endpoint that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(http_client: impl Into<Arc<C>>, mapper: impl Into<Arc<M>>) -> Self {
		Self { http_client: http_client.into(), transport_mapper: mapper.into() }
	}

	fn build_request(request: &TokenExchangeRequest) -> Result<oauth2::HttpRequest, TransportError> {
		let url = request.authority.token_endpoint().map_err(TransportError::network)?;

		Ok(Request::builder()
			.method(Method::POST)
			.uri(url.as_str())
			.header(CONTENT_TYPE, FORM_CONTENT_TYPE)
			.header(ACCEPT, "application/json")
			.header(CLIENT_REQUEST_ID_HEADER, request.correlation_id.as_ref())
			.header(RETURN_CLIENT_REQUEST_ID_HEADER, "true")
			.body(request.form_body().into_bytes())?)
	}
}
#[cfg(feature = "reqwest")]
impl HttpTokenEndpoint<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates an endpoint backed by a default reqwest client.
	pub fn new() -> Self {
		Self::with_http_client(ReqwestHttpClient::default(), ReqwestTransportErrorMapper)
	}

	/// Creates an endpoint whose client gives up on requests after `timeout`.
	///
	/// Redirects are never followed. Requests that exceed the deadline resolve as
	/// [`TransportError::Timeout`].
	pub fn with_request_timeout(timeout: std::time::Duration) -> Result<Self> {
		let client = ReqwestClient::builder()
			.timeout(timeout)
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.map_err(ConfigError::from)?;

		Ok(Self::with_http_client(
			ReqwestHttpClient::with_client(client),
			ReqwestTransportErrorMapper,
		))
	}
}
#[cfg(feature = "reqwest")]
impl Default for HttpTokenEndpoint<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	fn default() -> Self {
		Self::new()
	}
}
impl<C, M> Clone for HttpTokenEndpoint<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			transport_mapper: self.transport_mapper.clone(),
		}
	}
}
impl<C, M> Debug for HttpTokenEndpoint<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("HttpTokenEndpoint(..)")
	}
}
impl<C, M> TokenEndpoint for HttpTokenEndpoint<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn exchange<'a>(&'a self, request: &'a TokenExchangeRequest) -> ExchangeFuture<'a> {
		let slot = ResponseMetadataSlot::default();

		Box::pin(async move {
			let http_request = Self::build_request(request)?;
			let handle = self.http_client.with_metadata(slot.clone());
			let response = handle.call(http_request).await.map_err(|err| {
				self.transport_mapper.map_transport_error(slot.take().as_ref(), err)
			})?;
			let status = response.status().as_u16();
			let mut raw = RawTokenResponse::from_json_slice(response.body())
				.map_err(|source| ExchangeError::UnparseableBody { source, status: Some(status) })?;

			if let Some(echoed) = response
				.headers()
				.get(CLIENT_REQUEST_ID_HEADER)
				.and_then(|value| value.to_str().ok())
				.filter(|value| !value.is_empty())
			{
				raw.insert_if_absent("correlation_id", echoed);
			}

			tracing::debug!(
				status,
				grant_type = request.source.grant_type(),
				correlation_id = %request.correlation_id,
				"token endpoint answered"
			);

			Ok(raw)
		})
	}
}

mod common;

// std
use std::{
	fmt::{Display, Formatter, Result as FmtResult},
	pin::Pin,
	sync::Arc,
};
// crates.io
use parking_lot::Mutex;
use time::Duration;
// self
use common::*;
use token_cache_resolver::{
	FailureKind,
	auth::TokenSecret,
	error::{ExchangeError, TransportError},
	exchange::{CredentialSource, HttpTokenEndpoint, TokenEndpoint, TokenExchangeRequest},
	http::{
		ResponseMetadata, ResponseMetadataSlot, TokenHttpClient, TransportErrorMapper,
		map_http_client_error,
		oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse},
	},
	store::TokenCacheStore,
};

#[derive(Debug)]
enum FakeTransportError {
	Stalled,
}
impl Display for FakeTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Stalled => write!(f, "Transport stalled."),
		}
	}
}
impl std::error::Error for FakeTransportError {}

/// Canned transport: answers with `body`, or fails when `body` is `None`.
#[derive(Clone, Default)]
struct FakeHttpClient {
	body: Option<&'static str>,
	sent: Arc<Mutex<Vec<HttpRequest>>>,
}
impl TokenHttpClient for FakeHttpClient {
	type Handle = FakeHttpHandle;
	type TransportError = FakeTransportError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		FakeHttpHandle { slot, client: self.clone() }
	}
}

struct FakeHttpHandle {
	slot: ResponseMetadataSlot,
	client: FakeHttpClient,
}
impl<'a> AsyncHttpClient<'a> for FakeHttpHandle {
	type Error = HttpClientError<FakeTransportError>;
	type Future = Pin<
		Box<dyn std::future::Future<Output = Result<HttpResponse, Self::Error>> + 'a + Send + Sync>,
	>;

	fn call(&'a self, request: HttpRequest) -> Self::Future {
		Box::pin(async move {
			assert!(
				self.slot.take().is_none(),
				"ResponseMetadataSlot must be clear before dispatching a request."
			);

			self.client.sent.lock().push(request);

			match self.client.body {
				Some(body) => {
					self.slot.store(ResponseMetadata {
						status: Some(200),
						client_request_id: Some("server-echo".into()),
					});

					let mut response = HttpResponse::new(body.as_bytes().to_vec());

					response.headers_mut().insert(
						"client-request-id",
						"server-echo".parse().expect("Header value should parse."),
					);

					Ok(response)
				},
				None => {
					self.slot.store(ResponseMetadata { status: Some(504), client_request_id: None });

					Err(HttpClientError::Reqwest(Box::new(FakeTransportError::Stalled)))
				},
			}
		})
	}
}

#[derive(Clone, Default)]
struct RecordingTransportErrorMapper {
	metadata: Arc<Mutex<Vec<Option<ResponseMetadata>>>>,
}
impl TransportErrorMapper<FakeTransportError> for RecordingTransportErrorMapper {
	fn map_transport_error(
		&self,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<FakeTransportError>,
	) -> TransportError {
		self.metadata.lock().push(meta.cloned());

		map_http_client_error(err, |inner| match *inner {
			FakeTransportError::Stalled => TransportError::Timeout,
		})
	}
}

fn exchange_request() -> TokenExchangeRequest {
	TokenExchangeRequest {
		authority: authority(),
		source: CredentialSource::RefreshToken(TokenSecret::new("rt-custom")),
		resource: resource("graph"),
		client_id: client(),
		redirect_uri: None,
		correlation_id: correlation(),
	}
}

#[tokio::test]
async fn custom_transport_receives_token_endpoint_request() {
	let client = FakeHttpClient {
		body: Some("{\"access_token\":\"at-custom\",\"expires_in\":600}"),
		..Default::default()
	};
	let endpoint = HttpTokenEndpoint::<FakeHttpClient, RecordingTransportErrorMapper>::with_http_client(
		client.clone(),
		RecordingTransportErrorMapper::default(),
	);
	let raw = endpoint.exchange(&exchange_request()).await.expect("Exchange should succeed.");
	let sent = client.sent.lock();

	assert_eq!(raw.get_str("access_token"), Some("at-custom"));
	assert_eq!(raw.get_str("correlation_id"), Some("server-echo"));
	assert_eq!(sent.len(), 1);
	assert_eq!(sent[0].uri().to_string(), "https://login.example.com/contoso/oauth2/token");
	assert_eq!(
		sent[0].headers().get("client-request-id").and_then(|value| value.to_str().ok()),
		Some(CORRELATION_ID)
	);

	let body = String::from_utf8(sent[0].body().clone()).expect("Form body should be UTF-8.");

	assert!(body.contains("grant_type=refresh_token"));
	assert!(body.contains("refresh_token=rt-custom"));
}

#[tokio::test]
async fn custom_mapper_sees_metadata_and_classifies_failures() {
	let mapper = RecordingTransportErrorMapper::default();
	let endpoint = HttpTokenEndpoint::<FakeHttpClient, RecordingTransportErrorMapper>::with_http_client(
		FakeHttpClient::default(),
		mapper.clone(),
	);
	let err = endpoint.exchange(&exchange_request()).await.expect_err("Exchange should fail.");

	assert!(matches!(err, ExchangeError::Transport(TransportError::Timeout)));

	let recorded = mapper.metadata.lock().clone();

	assert_eq!(recorded.len(), 1);
	assert_eq!(recorded[0].as_ref().and_then(|meta| meta.status), Some(504));
}

#[tokio::test]
async fn engine_surfaces_custom_transport_timeouts() {
	let store =
		seeded([resource_entry("graph", Some("alice"), -Duration::hours(1), Some("rt"))]).await;
	let endpoint: Arc<dyn TokenEndpoint> = Arc::new(HttpTokenEndpoint::<
		FakeHttpClient,
		RecordingTransportErrorMapper,
	>::with_http_client(
		FakeHttpClient::default(),
		RecordingTransportErrorMapper::default(),
	));
	let engine = token_cache_resolver::TokenCacheEngine::<dyn TokenEndpoint>::with_endpoint(
		store.clone(),
		endpoint,
	);
	let result = engine.resolve(request("graph")).await;

	assert_eq!(result.failure_kind(), Some(FailureKind::Timeout));
	assert_eq!(store.all().await.expect("Reading the store should succeed.").len(), 1);
}

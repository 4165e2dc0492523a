//! Shared fixtures for integration tests: identifiers, seeded stores, and a scripted endpoint.

#![allow(dead_code)]

// std
use std::{collections::VecDeque, sync::Arc};
// crates.io
use parking_lot::Mutex;
use serde_json::{Value, json};
use time::{Duration, OffsetDateTime};
// self
use token_cache_resolver::{
	RequestDescriptor, TokenCacheEngine,
	auth::{Authority, CacheEntry, CacheKey, ClientId, CorrelationId, ResourceId, UserId},
	error::TransportError,
	exchange::{ExchangeFuture, TokenEndpoint, TokenExchangeRequest},
	response::RawTokenResponse,
	store::{MemoryStore, TokenCacheStore},
};

pub const AUTHORITY: &str = "https://login.example.com/contoso";
pub const CLIENT_ID: &str = "client-it";
pub const CORRELATION_ID: &str = "corr-it";

/// One scripted answer from the token endpoint.
#[derive(Clone, Debug)]
pub enum Reply {
	/// JSON object returned as the raw response mapping.
	Json(Value),
	/// Transport deadline exceeded.
	Timeout,
	/// Transport-level failure.
	Network,
	/// Never answers.
	Stall,
}

/// Token endpoint that replays scripted replies and records every request.
#[derive(Debug, Default)]
pub struct ScriptedEndpoint {
	replies: Mutex<VecDeque<Reply>>,
	requests: Mutex<Vec<TokenExchangeRequest>>,
}
impl ScriptedEndpoint {
	pub fn new(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
		Arc::new(Self { replies: Mutex::new(replies.into_iter().collect()), ..Default::default() })
	}

	pub fn calls(&self) -> usize {
		self.requests.lock().len()
	}

	pub fn requests(&self) -> Vec<TokenExchangeRequest> {
		self.requests.lock().clone()
	}
}
impl TokenEndpoint for ScriptedEndpoint {
	fn exchange<'a>(&'a self, request: &'a TokenExchangeRequest) -> ExchangeFuture<'a> {
		self.requests.lock().push(request.clone());

		let reply = self.replies.lock().pop_front();

		Box::pin(async move {
			match reply {
				Some(Reply::Json(value)) => Ok(serde_json::from_value::<RawTokenResponse>(value)
					.expect("Scripted replies should be JSON objects.")),
				Some(Reply::Timeout) => Err(TransportError::Timeout.into()),
				Some(Reply::Network) | None => Err(TransportError::network(
					std::io::Error::other("connection reset by scripted endpoint"),
				)
				.into()),
				Some(Reply::Stall) => std::future::pending().await,
			}
		})
	}
}

pub fn success(access_token: &str, expires_in: i64, refresh_token: Option<&str>) -> Reply {
	let mut body = json!({
		"access_token": access_token,
		"token_type": "Bearer",
		"expires_in": expires_in,
		"correlation_id": CORRELATION_ID,
	});

	if let Some(refresh_token) = refresh_token {
		body["refresh_token"] = json!(refresh_token);
	}

	Reply::Json(body)
}

pub fn oauth_error(code: &str) -> Reply {
	Reply::Json(json!({ "error": code, "error_description": format!("{code} from test") }))
}

pub fn authority() -> Authority {
	Authority::new(AUTHORITY).expect("Authority fixture should parse.")
}

pub fn client() -> ClientId {
	ClientId::new(CLIENT_ID).expect("Client fixture should be valid.")
}

pub fn resource(value: &str) -> ResourceId {
	ResourceId::new(value).expect("Resource fixture should be valid.")
}

pub fn user(value: &str) -> UserId {
	UserId::new(value).expect("User fixture should be valid.")
}

pub fn correlation() -> CorrelationId {
	CorrelationId::new(CORRELATION_ID).expect("Correlation id fixture should be valid.")
}

pub fn key(resource_name: &str) -> CacheKey {
	CacheKey::new(authority(), resource(resource_name), client())
}

pub fn request(resource_name: &str) -> RequestDescriptor {
	RequestDescriptor::new(key(resource_name)).with_correlation_id(correlation())
}

/// Resource-specific entry whose access token expires `expires_in` from now.
pub fn resource_entry(
	resource_name: &str,
	user_id: Option<&str>,
	expires_in: Duration,
	refresh_token: Option<&str>,
) -> CacheEntry {
	let mut builder = CacheEntry::builder(key(resource_name))
		.user_id(user_id.map(user))
		.access_token(format!("at-{resource_name}"))
		.access_token_type("Bearer")
		.expires_on(OffsetDateTime::now_utc() + expires_in);

	if let Some(refresh_token) = refresh_token {
		builder = builder.refresh_token(refresh_token);
	}

	builder.build().expect("Resource entry fixture should build.")
}

pub fn multi_resource_entry(user_id: &str, refresh_token: &str) -> CacheEntry {
	CacheEntry::builder(CacheKey::multi_resource(authority(), client()))
		.user_id(Some(user(user_id)))
		.refresh_token(refresh_token)
		.multi_resource(true)
		.build()
		.expect("Multi-resource entry fixture should build.")
}

pub async fn seeded(entries: impl IntoIterator<Item = CacheEntry>) -> Arc<MemoryStore> {
	let store = Arc::new(MemoryStore::default());

	for entry in entries {
		store.set(entry).await.expect("Seeding the memory store should succeed.");
	}

	store
}

pub fn engine(
	store: &Arc<MemoryStore>,
	endpoint: &Arc<ScriptedEndpoint>,
) -> TokenCacheEngine<ScriptedEndpoint> {
	let _ = tracing_subscriber::fmt::try_init();

	TokenCacheEngine::with_endpoint(store.clone(), endpoint.clone())
}

pub async fn stored(store: &MemoryStore, key: &CacheKey, user_id: Option<&str>) -> Option<CacheEntry> {
	let user_id = user_id.map(user);

	store
		.get(key, user_id.as_ref())
		.await
		.expect("Reading the memory store should succeed.")
		.into_iter()
		.find(|entry| entry.user_id == user_id)
}

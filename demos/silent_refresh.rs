//! Seeds an in-memory cache with an expired access token, then lets the engine refresh it
//! silently and reuse the returned multi-resource refresh token for a second resource.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use time::{Duration, OffsetDateTime};
// self
use token_cache_resolver::{
	RequestDescriptor,
	auth::{Authority, CacheEntry, CacheKey, ClientId, ResourceId, UserId},
	engine::ReqwestTokenCacheEngine,
	store::{MemoryStore, TokenCacheStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::new("token_cache_resolver=debug"))
		.init();

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/contoso/oauth2/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"Bearer\",\"expires_in\":3600,\"refresh_token\":\"demo-mrrt\"}",
			);
		})
		.await;
	let authority = Authority::new(server.url("/contoso"))?;
	let client_id = ClientId::new("demo-client")?;
	let graph = CacheKey::new(authority.clone(), ResourceId::new("graph")?, client_id.clone());
	let store = Arc::new(MemoryStore::default());

	store
		.set(
			CacheEntry::builder(graph.clone())
				.user_id(Some(UserId::new("alice@contoso.com")?))
				.access_token("expired-access")
				.expires_on(OffsetDateTime::now_utc() - Duration::minutes(10))
				.refresh_token("demo-refresh")
				.build()?,
		)
		.await?;

	let engine = ReqwestTokenCacheEngine::new(store.clone());
	let first = engine.resolve(RequestDescriptor::new(graph)).await;

	println!("graph: {} (server correlation {:?})", first.label(), first.server_correlation_id);

	let mail = RequestDescriptor::for_resource(authority, ResourceId::new("mail")?, client_id);
	let second = engine.resolve(mail).await;

	println!("mail: {} via multi-resource refresh token", second.label());
	println!(
		"exchanges: {}, cached entries: {}",
		engine.metrics.exchanges(),
		store.len()
	);

	token_mock.assert_calls_async(2).await;

	Ok(())
}

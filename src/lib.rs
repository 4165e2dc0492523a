//! Async OAuth 2.0 token-cache resolution engine: decide whether a cached credential can be used
//! directly, must be silently refreshed, or requires the caller's interactive fallback, then
//! reconcile the token endpoint's answer back into the store.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod cache;
pub mod engine;
pub mod error;
pub mod exchange;
pub mod http;
pub mod obs;
pub mod response;
pub mod result;
pub mod store;

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap, HashSet},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tracing_subscriber as _};

pub use crate::{
	engine::{EngineConfig, RequestDescriptor, TokenCacheEngine},
	result::{AuthenticationOutcome, AuthenticationResult, FailureKind},
};

//! Identity claims decoded from an `id_token`.
//!
//! Claims are informational: the signature is not validated here, they only name the user a
//! cache entry belongs to.

// crates.io
use base64::{
	Engine as _,
	engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD},
};
use serde_json::{Map, Value};
// self
use crate::{_prelude::*, auth::UserId};

const USER_ID_CLAIMS: [&str; 4] = ["upn", "email", "unique_name", "sub"];

/// Errors raised while decoding an `id_token`.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ClaimsError {
	/// The token does not have the `header.payload.signature` shape.
	#[error("Identity token is not a compact JWT.")]
	NotCompact,
	/// The payload segment is not valid base64url.
	#[error("Identity token payload is not valid base64url.")]
	Encoding,
	/// The payload is not a JSON object.
	#[error("Identity token payload is not a JSON object.")]
	Payload,
}

/// Claims carried by an `id_token`, kept alongside cache entries.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentityClaims {
	/// User id picked from `upn`, `email`, `unique_name`, or `sub`, in that order.
	pub user_id: Option<UserId>,
	/// Tenant (`tid`) the user signed in to.
	pub tenant_id: Option<String>,
	/// Every claim exactly as received.
	pub raw: Map<String, Value>,
}
impl IdentityClaims {
	/// Decodes the payload of a compact JWT.
	pub fn from_id_token(id_token: &str) -> Result<Self, ClaimsError> {
		let mut segments = id_token.split('.');
		let payload = match (segments.next(), segments.next()) {
			(Some(_), Some(payload)) if !payload.is_empty() => payload,
			_ => return Err(ClaimsError::NotCompact),
		};
		let bytes = URL_SAFE_NO_PAD
			.decode(payload)
			.or_else(|_| URL_SAFE.decode(payload))
			.map_err(|_| ClaimsError::Encoding)?;
		let raw = match serde_json::from_slice::<Value>(&bytes) {
			Ok(Value::Object(map)) => map,
			_ => return Err(ClaimsError::Payload),
		};

		Ok(Self::from_map(raw))
	}

	/// Builds claims from an already-decoded claim map.
	pub fn from_map(raw: Map<String, Value>) -> Self {
		let user_id = USER_ID_CLAIMS
			.iter()
			.filter_map(|claim| raw.get(*claim).and_then(Value::as_str))
			.find_map(|value| UserId::new(value).ok());
		let tenant_id = raw.get("tid").and_then(Value::as_str).map(ToOwned::to_owned);

		Self { user_id, tenant_id, raw }
	}
}

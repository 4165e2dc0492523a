//! Response interpretation: raw token endpoint mappings in, typed results out.
//!
//! Interpretation depends on whether the exchange spent a refresh token (so that
//! `invalid_grant` can be told apart from other protocol errors) but not on which cache entry
//! supplied it; that distinction only matters to the cache writer.

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::{CacheEntry, CacheKey, CorrelationId, IdentityClaims, UserId},
	result::{AuthenticationResult, FailureKind, InteractionSource},
};

const FIELD_ERROR: &str = "error";
const FIELD_ERROR_DESCRIPTION: &str = "error_description";
const FIELD_CORRELATION_ID: &str = "correlation_id";
const INTERACTION_ERRORS: [&str; 3] = ["interaction_required", "login_required", "consent_required"];
const REFRESH_REJECTED_ERRORS: [&str; 2] = ["invalid_grant", "invalid_token"];

/// String-keyed mapping of protocol fields returned by the token endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawTokenResponse(BTreeMap<String, Value>);
impl RawTokenResponse {
	/// Wraps an existing mapping.
	pub fn new(fields: BTreeMap<String, Value>) -> Self {
		Self(fields)
	}

	/// Parses a JSON object body.
	pub fn from_json_slice(
		body: &[u8],
	) -> Result<Self, serde_path_to_error::Error<serde_json::Error>> {
		let mut de = serde_json::Deserializer::from_slice(body);

		serde_path_to_error::deserialize(&mut de)
	}

	/// Returns a field as a string, if it is one.
	pub fn get_str(&self, field: &str) -> Option<&str> {
		self.0.get(field).and_then(Value::as_str)
	}

	/// Inserts a field unless it is already present.
	pub fn insert_if_absent(&mut self, field: impl Into<String>, value: impl Into<Value>) {
		self.0.entry(field.into()).or_insert_with(|| value.into());
	}

	/// Returns the underlying mapping.
	pub fn fields(&self) -> &BTreeMap<String, Value> {
		&self.0
	}

	/// Returns `true` when the mapping carries no fields.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl FromIterator<(String, Value)> for RawTokenResponse {
	fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
		Self(iter.into_iter().collect())
	}
}

/// Request-side facts the interpreter needs.
#[derive(Clone, Debug)]
pub struct InterpretContext<'a> {
	/// Resource-specific key the resulting entry is stored under.
	pub key: &'a CacheKey,
	/// User to assume when the response carries no identity claims.
	pub fallback_user: Option<&'a UserId>,
	/// Whether the exchange spent a refresh token.
	pub from_refresh: bool,
	/// Correlation id of the originating request.
	pub correlation_id: &'a CorrelationId,
	/// Instant used to turn relative lifetimes into expiry instants.
	pub now: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
struct SuccessFields {
	access_token: Option<String>,
	token_type: Option<String>,
	expires_in: Option<Seconds>,
	expires_on: Option<Seconds>,
	refresh_token: Option<String>,
	id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Seconds {
	Number(i64),
	Text(String),
}
impl Seconds {
	fn value(&self) -> Option<i64> {
		match self {
			Seconds::Number(value) => Some(*value),
			Seconds::Text(text) => text.trim().parse().ok(),
		}
	}
}

/// Turns a raw response into an [`AuthenticationResult`].
pub fn interpret(response: &RawTokenResponse, ctx: &InterpretContext) -> AuthenticationResult {
	let server_correlation_id = response.get_str(FIELD_CORRELATION_ID).map(ToOwned::to_owned);

	if let Some(server) =
		server_correlation_id.as_deref().filter(|server| *server != ctx.correlation_id.as_ref())
	{
		tracing::warn!(
			request = %ctx.correlation_id,
			server,
			"token endpoint echoed a different correlation id"
		);
	}

	let result = match response.fields().get(FIELD_ERROR) {
		Some(Value::String(code)) => interpret_error(response, code, ctx),
		Some(_) => AuthenticationResult::failed(
			FailureKind::MalformedResponse,
			"Token endpoint returned a non-string error field.",
			ctx.correlation_id.clone(),
		),
		None => interpret_success(response, ctx),
	};

	result.with_server_correlation_id(server_correlation_id)
}

fn interpret_error(
	response: &RawTokenResponse,
	code: &str,
	ctx: &InterpretContext,
) -> AuthenticationResult {
	let description = response.get_str(FIELD_ERROR_DESCRIPTION).map(ToOwned::to_owned);
	let correlation_id = ctx.correlation_id.clone();

	if INTERACTION_ERRORS.iter().any(|known| code.eq_ignore_ascii_case(known)) {
		return AuthenticationResult::interaction_required(
			InteractionSource::Server { error: code.to_owned(), description },
			correlation_id,
		);
	}

	let message = match &description {
		Some(description) => format!("Token endpoint returned `{code}`: {description}."),
		None => format!("Token endpoint returned `{code}`."),
	};
	let kind = if ctx.from_refresh
		&& REFRESH_REJECTED_ERRORS.iter().any(|known| code.eq_ignore_ascii_case(known))
	{
		FailureKind::RefreshTokenInvalid
	} else {
		FailureKind::ProtocolError
	};

	AuthenticationResult::failed(kind, message, correlation_id)
}

fn interpret_success(response: &RawTokenResponse, ctx: &InterpretContext) -> AuthenticationResult {
	let malformed = |message: String| {
		AuthenticationResult::failed(
			FailureKind::MalformedResponse,
			message,
			ctx.correlation_id.clone(),
		)
	};

	if response.is_empty() {
		return malformed("Token endpoint returned an empty response.".into());
	}

	let object = Value::Object(response.fields().clone().into_iter().collect());
	let fields: SuccessFields = match serde_path_to_error::deserialize(object) {
		Ok(fields) => fields,
		Err(e) => return malformed(format!("Token endpoint field `{}` is invalid.", e.path())),
	};
	let Some(access_token) = fields.access_token.filter(|token| !token.is_empty()) else {
		return malformed("Token endpoint response is missing access_token.".into());
	};
	let expires_on = match (
		fields.expires_in.as_ref().and_then(Seconds::value),
		fields.expires_on.as_ref().and_then(Seconds::value),
	) {
		(Some(secs), _) if secs > 0 => match ctx.now.checked_add(Duration::seconds(secs)) {
			Some(instant) => instant,
			None => return malformed("Token endpoint returned an out-of-range expires_in.".into()),
		},
		(None, Some(unix)) => match OffsetDateTime::from_unix_timestamp(unix) {
			Ok(instant) if instant > ctx.now => instant,
			_ => return malformed("Token endpoint returned an unusable expires_on.".into()),
		},
		_ => return malformed("Token endpoint response lacks a positive expires_in.".into()),
	};
	let claims = fields.id_token.as_deref().and_then(|id_token| {
		IdentityClaims::from_id_token(id_token)
			.inspect_err(|e| tracing::debug!(error = %e, "ignoring undecodable id_token"))
			.ok()
	});
	let user_id =
		claims.as_ref().and_then(|claims| claims.user_id.clone()).or(ctx.fallback_user.cloned());
	let mut builder = CacheEntry::builder(ctx.key.clone())
		.user_id(user_id)
		.access_token(access_token)
		.access_token_type(fields.token_type.unwrap_or_else(|| "Bearer".into()))
		.expires_on(expires_on)
		.identity_claims(claims);

	if let Some(refresh) = fields.refresh_token.filter(|token| !token.is_empty()) {
		builder = builder.refresh_token(refresh);
	}

	match builder.build() {
		Ok(entry) => AuthenticationResult::succeeded(entry, ctx.correlation_id.clone()),
		Err(e) => malformed(format!("Token endpoint response cannot be cached: {e}")),
	}
}

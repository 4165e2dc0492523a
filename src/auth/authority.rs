//! Normalized authority URLs.
//!
//! Two spellings of the same authority must land on the same cache key, so the stored form
//! lower-cases the scheme and host (via [`Url`]) and drops trailing slashes. The path keeps its
//! original case.

// self
use crate::_prelude::*;

const TOKEN_ENDPOINT_SUFFIX: &str = "/oauth2/token";

/// Errors raised while parsing an authority.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum AuthorityError {
	/// The authority is not a valid absolute URL.
	#[error("Authority `{value}` is not a valid URL.")]
	Unparseable {
		/// Raw authority string.
		value: String,
	},
	/// The authority uses a scheme other than HTTP(S).
	#[error("Authority scheme `{scheme}` is not supported.")]
	UnsupportedScheme {
		/// Offending scheme.
		scheme: String,
	},
	/// The authority carries a query string or fragment.
	#[error("Authority `{value}` must not carry a query or fragment.")]
	UnexpectedComponents {
		/// Raw authority string.
		value: String,
	},
}

/// Authority that issues tokens (for example `https://login.example.com/tenant`).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Authority(String);
impl Authority {
	/// Parses and normalizes an authority.
	pub fn new(value: impl AsRef<str>) -> Result<Self, AuthorityError> {
		let raw = value.as_ref().trim();
		let url = Url::parse(raw)
			.map_err(|_| AuthorityError::Unparseable { value: raw.to_owned() })?;

		if !matches!(url.scheme(), "https" | "http") {
			return Err(AuthorityError::UnsupportedScheme { scheme: url.scheme().to_owned() });
		}
		if url.query().is_some() || url.fragment().is_some() {
			return Err(AuthorityError::UnexpectedComponents { value: raw.to_owned() });
		}

		Ok(Self(url.as_str().trim_end_matches('/').to_owned()))
	}

	/// Returns the normalized authority string.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Token endpoint hosted under this authority.
	pub fn token_endpoint(&self) -> Result<Url, AuthorityError> {
		let value = format!("{}{TOKEN_ENDPOINT_SUFFIX}", self.0);

		Url::parse(&value).map_err(|_| AuthorityError::Unparseable { value })
	}
}
impl AsRef<str> for Authority {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl From<Authority> for String {
	fn from(value: Authority) -> Self {
		value.0
	}
}
impl TryFrom<String> for Authority {
	type Error = AuthorityError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl FromStr for Authority {
	type Err = AuthorityError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
impl Debug for Authority {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Authority({})", self.0)
	}
}
impl Display for Authority {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

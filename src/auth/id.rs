//! Strongly typed identifiers used by cache keys and requests.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				validate_view($kind, view)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				validate_view($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

const IDENTIFIER_MAX_LEN: usize = 1024;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (client, resource, user, correlation).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (client, resource, user, correlation).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (client, resource, user, correlation).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
}

def_id! { ClientId, "OAuth client identifier registered with the authority.", "Client" }
def_id! { ResourceId, "Resource (audience) an access token is issued for.", "Resource" }
def_id! { UserId, "User identifier as reported by the identity claims.", "User" }
def_id! { CorrelationId, "Opaque identifier threaded through a request for diagnostics.", "Correlation" }
impl CorrelationId {
	/// Generates a random UUIDv4-formatted correlation id.
	pub fn random() -> Self {
		let mut bytes: [u8; 16] = rand::random();

		bytes[6] = (bytes[6] & 0x0f) | 0x40;
		bytes[8] = (bytes[8] & 0x3f) | 0x80;

		let hex = bytes.iter().map(|b| format!("{b:02x}")).collect::<String>();

		Self(format!(
			"{}-{}-{}-{}-{}",
			&hex[0..8],
			&hex[8..12],
			&hex[12..16],
			&hex[16..20],
			&hex[20..32]
		))
	}
}
impl Default for CorrelationId {
	fn default() -> Self {
		Self::random()
	}
}

fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn identifiers_reject_whitespace_and_empty_values() {
		assert!(UserId::new(" alice@contoso.com").is_err(), "Leading whitespace must be rejected.");
		assert!(ResourceId::new("").is_err());
		assert!(ClientId::new("with space").is_err());

		let user = UserId::new("alice@contoso.com").expect("User fixture should be valid.");

		assert_eq!(user.as_ref(), "alice@contoso.com");
	}

	#[test]
	fn identifiers_are_case_sensitive() {
		let lower = UserId::new("alice@contoso.com").expect("Lowercase user should be valid.");
		let upper = UserId::new("Alice@contoso.com").expect("Mixed-case user should be valid.");

		assert_ne!(lower, upper);
	}

	#[test]
	fn serde_round_trip_enforces_validation() {
		let resource: ResourceId = serde_json::from_str("\"https://graph.example.com\"")
			.expect("Resource should deserialize successfully.");

		assert_eq!(resource.as_ref(), "https://graph.example.com");
		assert!(serde_json::from_str::<ResourceId>("\"with space\"").is_err());
	}

	#[test]
	fn random_correlation_ids_look_like_uuids() {
		let first = CorrelationId::random();
		let second = CorrelationId::random();

		assert_ne!(first, second);
		assert_eq!(first.len(), 36);
		assert_eq!(first.as_bytes()[14], b'4');
		assert_eq!(first.matches('-').count(), 4);
	}

	#[test]
	fn borrow_supports_fast_lookup() {
		let map: HashMap<UserId, u8> = HashMap::from_iter([(
			UserId::new("bob@contoso.com").expect("User used for lookup should be valid."),
			7_u8,
		)]);

		assert_eq!(map.get("bob@contoso.com"), Some(&7));
	}
}

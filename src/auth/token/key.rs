//! Cache keys identifying a credential family independent of the user.

// self
use crate::{
	_prelude::*,
	auth::{Authority, ClientId, ResourceId},
};

/// Immutable `{authority, resource, client}` tuple.
///
/// A key without a resource addresses the multi-resource refresh token slot for the
/// authority + client pair.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CacheKey {
	/// Normalized authority that issued the credential.
	pub authority: Authority,
	/// Resource the access token targets; `None` for multi-resource refresh entries.
	pub resource: Option<ResourceId>,
	/// Client the credential was issued to.
	pub client_id: ClientId,
}
impl CacheKey {
	/// Creates a key scoped to a single resource.
	pub fn new(authority: Authority, resource: ResourceId, client_id: ClientId) -> Self {
		Self { authority, resource: Some(resource), client_id }
	}

	/// Creates the resource-less key used by multi-resource refresh entries.
	pub fn multi_resource(authority: Authority, client_id: ClientId) -> Self {
		Self { authority, resource: None, client_id }
	}

	/// Returns the multi-resource sibling of this key.
	pub fn without_resource(&self) -> Self {
		Self::multi_resource(self.authority.clone(), self.client_id.clone())
	}

	/// Returns a copy of this key scoped to `resource`.
	pub fn with_resource(&self, resource: ResourceId) -> Self {
		Self::new(self.authority.clone(), resource, self.client_id.clone())
	}

	/// Returns `true` when both keys share authority and client.
	pub fn same_family(&self, other: &Self) -> bool {
		self.authority == other.authority && self.client_id == other.client_id
	}
}
impl Display for CacheKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match &self.resource {
			Some(resource) => write!(f, "{}|{}|{}", self.authority, resource, self.client_id),
			None => write!(f, "{}|*|{}", self.authority, self.client_id),
		}
	}
}

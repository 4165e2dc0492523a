//! Auth-domain identifiers, authorities, identity claims, and cache entry models.

pub mod authority;
pub mod claims;
pub mod id;
pub mod token;

pub use authority::*;
pub use claims::*;
pub use id::*;
pub use token::{entry::*, key::*, secret::*};

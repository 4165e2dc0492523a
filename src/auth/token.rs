//! Cache keys, cache entries, and the secret wrapper they carry.

pub mod entry;
pub mod key;
pub mod secret;

//! Observability helpers for resolutions.
//!
//! Every resolution runs inside a `tracing` span named `token_cache.resolve` carrying the
//! `path` (how the request is being satisfied) and `stage` (call site) fields. Enable the
//! `metrics` feature to increment the `token_cache_resolution_total` counter for every
//! attempt/success/failure, labeled by `path` + `outcome`.

mod metrics;
mod tracing;

pub use self::metrics::*;
pub use self::tracing::*;

// self
use crate::_prelude::*;

/// Ways a resolution can be satisfied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResolutionPath {
	/// Cache lookup (and, when needed, a silent refresh).
	Cache,
	/// Cache lookup followed by a SAML assertion exchange.
	Assertion,
}
impl ResolutionPath {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ResolutionPath::Cache => "cache",
			ResolutionPath::Assertion => "assertion",
		}
	}
}
impl Display for ResolutionPath {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResolutionOutcome {
	/// Entry to a resolution.
	Attempt,
	/// A usable access token was produced.
	Success,
	/// The caller must fall back to interactive acquisition.
	InteractionRequired,
	/// Failure delivered to the caller.
	Failure,
}
impl ResolutionOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ResolutionOutcome::Attempt => "attempt",
			ResolutionOutcome::Success => "success",
			ResolutionOutcome::InteractionRequired => "interaction_required",
			ResolutionOutcome::Failure => "failure",
		}
	}
}
impl Display for ResolutionOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

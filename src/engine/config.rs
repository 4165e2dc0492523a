// self
use crate::{_prelude::*, cache::FreshnessPolicy};

/// Engine-wide settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineConfig {
	/// Tolerance subtracted from access token expiries before they count as usable.
	pub clock_skew: Duration,
	/// Deadline for a single token endpoint exchange; `None` waits indefinitely.
	pub exchange_timeout: Option<Duration>,
}
impl EngineConfig {
	/// Default clock-skew tolerance.
	pub const DEFAULT_CLOCK_SKEW: Duration = Duration::minutes(5);

	/// Overrides the clock-skew tolerance; negative values are treated as zero.
	pub fn with_clock_skew(mut self, skew: Duration) -> Self {
		self.clock_skew = if skew.is_negative() { Duration::ZERO } else { skew };

		self
	}

	/// Bounds every exchange by `timeout`; negative values are treated as zero.
	pub fn with_exchange_timeout(mut self, timeout: Duration) -> Self {
		self.exchange_timeout = Some(if timeout.is_negative() { Duration::ZERO } else { timeout });

		self
	}

	pub(crate) fn freshness_policy(&self, use_access_token: bool) -> FreshnessPolicy {
		FreshnessPolicy { clock_skew: self.clock_skew, use_access_token }
	}
}
impl Default for EngineConfig {
	fn default() -> Self {
		Self { clock_skew: Self::DEFAULT_CLOCK_SKEW, exchange_timeout: None }
	}
}

// self
use crate::obs::{ResolutionOutcome, ResolutionPath};

/// Records a resolution outcome via the global metrics recorder (when enabled).
pub fn record_resolution(path: ResolutionPath, outcome: ResolutionOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"token_cache_resolution_total",
			"path" => path.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (path, outcome);
	}
}

// crates.io
use tracing::{Span, instrument::Instrumented};
// self
use crate::{_prelude::*, obs::ResolutionPath};

/// A span builder used by resolutions.
#[derive(Clone, Debug)]
pub struct ResolutionSpan {
	span: Span,
}
impl ResolutionSpan {
	/// Creates a new span tagged with the provided path + stage.
	pub fn new(path: ResolutionPath, stage: &'static str) -> Self {
		Self { span: tracing::info_span!("token_cache.resolve", path = path.as_str(), stage) }
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		use tracing::Instrument;

		fut.instrument(self.span.clone())
	}
}

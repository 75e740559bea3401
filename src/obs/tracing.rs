// self
use crate::{_prelude::*, obs::FlowStage};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by broker flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided stage + call site.
	pub fn new(stage: FlowStage, call_site: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::info_span!("oauth1_broker.flow", stage = stage.as_str(), call_site);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (stage, call_site);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs a transient transport failure that is about to be retried.
pub fn trace_retry(stage: FlowStage, attempt: u32, budget: u32, error: &dyn StdError) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(stage = stage.as_str(), attempt, budget, %error, "retrying provider call");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (stage, attempt, budget, error);
	}
}

/// Logs a failure that is surfaced to the caller.
pub fn trace_failure(stage: FlowStage, error: &dyn StdError) {
	#[cfg(feature = "tracing")]
	{
		tracing::error!(stage = stage.as_str(), %error, "flow stage failed");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (stage, error);
	}
}

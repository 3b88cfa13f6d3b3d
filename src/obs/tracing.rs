// self
use crate::{_prelude::*, obs::Operation};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOperation<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOperation<F> = F;

/// A span wrapping one provider operation or the bootstrap run.
#[derive(Clone, Debug)]
pub struct OperationSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OperationSpan {
	/// Creates a new span tagged with the operation and call-site stage.
	pub fn new(operation: Operation, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"identity_broker.operation",
				operation = operation.as_str(),
				stage
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (operation, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOperation<Fut>
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

/// Logs a bootstrap state transition.
pub fn record_transition(from: &'static str, to: &'static str, detail: &str) {
	#[cfg(feature = "tracing")]
	{
		tracing::info!(from, to, detail, "bootstrap transition");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (from, to, detail);
	}
}

/// Logs a failure the bootstrap recovered from or is about to abort on.
pub fn record_bootstrap_warning(state: &'static str, error: &dyn StdError) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(state, error = %error, "bootstrap step failed");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (state, error);
	}
}

/// Logs a scheduled retry of a setup-time admin API call.
pub fn record_retry(url: &str, attempt: u32, delay: StdDuration) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(url, attempt, delay_ms = delay.as_millis() as u64, "retrying request");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (url, attempt, delay);
	}
}

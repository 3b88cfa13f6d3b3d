//! Optional observability helpers for provider operations and the admin bootstrap.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `identity_broker.operation` with the
//!   `operation` and `stage` fields, plus events for retries and bootstrap transitions.
//! - Enable `metrics` to increment the `identity_broker_operation_total` counter for every
//!   attempt/success/failure, labeled by `operation` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
	/// Authorization-code exchange plus userinfo lookup.
	Exchange,
	/// Token introspection.
	Introspect,
	/// Refresh-token grant.
	Refresh,
	/// Administrator bootstrap.
	Bootstrap,
}
impl Operation {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Operation::Exchange => "exchange",
			Operation::Introspect => "introspect",
			Operation::Refresh => "refresh",
			Operation::Bootstrap => "bootstrap",
		}
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OperationOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationOutcome::Attempt => "attempt",
			OperationOutcome::Success => "success",
			OperationOutcome::Failure => "failure",
		}
	}

	/// Picks [`Success`](Self::Success) or [`Failure`](Self::Failure) for `result`.
	pub fn of<T, E>(result: &Result<T, E>) -> Self {
		if result.is_ok() { Self::Success } else { Self::Failure }
	}
}
impl Display for OperationOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn labels_are_stable() {
		assert_eq!(Operation::Introspect.to_string(), "introspect");
		assert_eq!(OperationOutcome::of::<(), ()>(&Ok(())), OperationOutcome::Success);
		assert_eq!(OperationOutcome::of::<(), ()>(&Err(())).as_str(), "failure");
	}
}

// self
use crate::obs::{CallKind, CallOutcome};

/// Records a call outcome via the global metrics recorder (when enabled).
pub fn record_call_outcome(kind: CallKind, outcome: CallOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"auth_gateway_call_total",
			"call" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Counts dispatch state-machine transitions, labeled by phase.
///
/// `retried` against `dispatched` gives the share of calls that needed a refresh; `logged_out`
/// counts forced session endings.
pub fn count_dispatch_phase(phase: &'static str) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("auth_gateway_dispatch_phase_total", "phase" => phase).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = phase;
	}
}

/// Counts queued requests that skipped the refresh call because another request already
/// rotated the credential.
pub fn count_refresh_reuse() {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("auth_gateway_refresh_reuse_total").increment(1);
	}
}

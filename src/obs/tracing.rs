// self
use crate::{_prelude::*, obs::CallKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// A span builder used by gateway calls.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Creates a new span tagged with the provided call kind + stage.
	pub fn new(kind: CallKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("auth_gateway.call", call = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
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

/// Emits a debug event for a dispatch state-machine transition. Only the path is logged; the
/// query string and fragment are dropped.
pub fn record_phase(method: &str, path: &str, phase: &'static str) {
	#[cfg(feature = "tracing")]
	{
		let path = path_without_query(path);

		tracing::debug!(method, path, phase, "Dispatch phase reached.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (method, path, phase);
	}
}

/// Emits a debug event when a waiting request reuses a credential another request refreshed.
pub fn record_refresh_reuse(fingerprint: &str) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(credential = fingerprint, "Reusing credential refreshed by another request.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = fingerprint;
	}
}

/// Emits a debug event when a queued request finds its session already ended.
pub fn record_session_already_ended() {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!("Session ended while the request was in flight; skipping refresh.");
	}
}

/// Emits a warning when a refresh fails and the session ends.
pub fn warn_refresh_failure(error: &dyn StdError, stale_fingerprint: Option<&str>) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(
			error = %error,
			credential = stale_fingerprint.unwrap_or("none"),
			"Credential refresh failed; ending session."
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (error, stale_fingerprint);
	}
}

/// Emits a warning when the store cannot be cleared while ending a session.
pub fn warn_session_clear_failure(error: &dyn StdError) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(error = %error, "Failed to clear stored credential.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = error;
	}
}

/// Strips the query string and fragment from a request path or absolute URL.
pub fn path_without_query(path: &str) -> &str {
	path.split(['?', '#']).next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn event_helpers_without_subscriber_are_noops() {
		record_phase("GET", "/clients/5", "dispatched");
		record_refresh_reuse("abc");
		record_session_already_ended();
		warn_session_clear_failure(&std::io::Error::other("read-only"));
	}

	#[test]
	fn logged_paths_drop_query_and_fragment() {
		assert_eq!(path_without_query("/clients?search=ada&token=t0k"), "/clients");
		assert_eq!(path_without_query("/clients/5#notes"), "/clients/5");
		assert_eq!(
			path_without_query("https://api.example.com/clients?page=2"),
			"https://api.example.com/clients"
		);
		assert_eq!(path_without_query("/clients/5"), "/clients/5");
	}

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = CallSpan::new(CallKind::Refresh, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}

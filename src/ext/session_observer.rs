//! Session lifecycle notifications handed to the application layer.

// self
use crate::_prelude::*;

/// Why a session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEndReason {
	/// The backend rejected the credential and the refresh attempt failed.
	RefreshFailed,
	/// The application logged out explicitly.
	Logout,
}
impl SessionEndReason {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			SessionEndReason::RefreshFailed => "refresh_failed",
			SessionEndReason::Logout => "logout",
		}
	}
}
impl Display for SessionEndReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Event emitted once the stored credential has been cleared.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionExpired {
	/// Why the session ended.
	pub reason: SessionEndReason,
	/// Entry surface the application should navigate to.
	pub redirect_to: String,
	/// When the gateway ended the session.
	pub at: OffsetDateTime,
}
impl SessionExpired {
	/// Creates an event stamped with the current UTC instant.
	pub fn new(reason: SessionEndReason, redirect_to: impl Into<String>) -> Self {
		Self { reason, redirect_to: redirect_to.into(), at: OffsetDateTime::now_utc() }
	}
}

/// Receives session-ended notifications; typically a router or UI controller.
///
/// Called on the task that observed the failure, after the credential was cleared and before
/// the failing call returns. Implementations should not block.
pub trait SessionObserver
where
	Self: Send + Sync,
{
	/// Handles the end of a session.
	fn session_expired(&self, event: &SessionExpired);
}

/// Observer that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;
impl SessionObserver for NoopObserver {
	fn session_expired(&self, _event: &SessionExpired) {}
}

/// Observer that keeps every event in memory; clones share the same log.
#[derive(Clone, Debug, Default)]
pub struct RecordingObserver(Arc<Mutex<Vec<SessionExpired>>>);
impl RecordingObserver {
	/// Returns a copy of the recorded events, oldest first.
	pub fn events(&self) -> Vec<SessionExpired> {
		self.0.lock().clone()
	}

	/// Number of recorded events.
	pub fn len(&self) -> usize {
		self.0.lock().len()
	}

	/// Returns `true` when nothing has been recorded.
	pub fn is_empty(&self) -> bool {
		self.0.lock().is_empty()
	}
}
impl SessionObserver for RecordingObserver {
	fn session_expired(&self, event: &SessionExpired) {
		self.0.lock().push(event.clone());
	}
}

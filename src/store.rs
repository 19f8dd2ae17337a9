//! Storage contracts and built-in store implementations for the bearer credential.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::Credential};

/// Boxed future returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract for the single credential slot a gateway reads and rotates.
///
/// Each store instance is bound to one [`StorageKey`](crate::auth::StorageKey); several
/// instances may share a backing map, the way several browser tabs share `localStorage`.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Returns the stored credential, if any.
	fn load(&self) -> StoreFuture<'_, Option<Credential>>;

	/// Persists or replaces the credential.
	fn save(&self, credential: Credential) -> StoreFuture<'_, ()>;

	/// Removes the credential, returning the value that was stored.
	fn clear(&self) -> StoreFuture<'_, Option<Credential>>;

	/// Atomically replaces the credential if the current value matches `expected`
	/// (`None` meaning "no credential stored").
	fn compare_and_swap<'a>(
		&'a self,
		expected: Option<&'a str>,
		replacement: Credential,
	) -> StoreFuture<'a, CompareAndSwapOutcome>;
}

/// Result of a credential compare-and-swap attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareAndSwapOutcome {
	/// The stored value matched the expectation and was replaced.
	Updated,
	/// Another writer changed the slot first; nothing was written.
	Mismatch,
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

pub(crate) fn credential_matches(current: Option<&Credential>, expected: Option<&str>) -> bool {
	match (current.map(Credential::expose), expected) {
		(None, None) => true,
		(Some(cur), Some(exp)) => cur == exp,
		_ => false,
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as StdError;
	// self
	use super::*;
	use crate::error::Error;

	#[test]
	fn store_error_converts_into_gateway_error_with_source() {
		let store_error = StoreError::Backend { message: "disk unavailable".into() };
		let gateway_error: Error = store_error.clone().into();

		assert!(matches!(gateway_error, Error::Storage(_)));
		assert!(gateway_error.to_string().contains("disk unavailable"));

		let source = StdError::source(&gateway_error)
			.expect("Gateway error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn credential_matching_treats_absence_as_a_value() {
		let abc = Credential::new("abc");

		assert!(credential_matches(None, None));
		assert!(credential_matches(Some(&abc), Some("abc")));
		assert!(!credential_matches(Some(&abc), Some("xyz")));
		assert!(!credential_matches(Some(&abc), None));
		assert!(!credential_matches(None, Some("abc")));
	}
}

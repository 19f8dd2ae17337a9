//! Validated name of the storage slot that holds the bearer credential.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

const STORAGE_KEY_MAX_LEN: usize = 128;
const DEFAULT_STORAGE_KEY: &str = "accessToken";

/// Error returned when storage key validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum StorageKeyError {
	/// The key was empty.
	#[error("Storage key cannot be empty.")]
	Empty,
	/// The key contains whitespace characters.
	#[error("Storage key contains whitespace.")]
	ContainsWhitespace,
	/// The key exceeded the allowed character count.
	#[error("Storage key exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted character count.
		max: usize,
	},
}

/// Name of the key-value slot the credential is persisted under.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StorageKey(String);
impl StorageKey {
	/// Creates a new key after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, StorageKeyError> {
		let view = value.as_ref();

		validate_view(view)?;

		Ok(Self(view.to_owned()))
	}
}
impl Default for StorageKey {
	fn default() -> Self {
		Self(DEFAULT_STORAGE_KEY.to_owned())
	}
}
impl Deref for StorageKey {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for StorageKey {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for StorageKey {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl From<StorageKey> for String {
	fn from(value: StorageKey) -> Self {
		value.0
	}
}
impl TryFrom<String> for StorageKey {
	type Error = StorageKeyError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_view(&value)?;

		Ok(Self(value))
	}
}
impl FromStr for StorageKey {
	type Err = StorageKeyError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
impl Debug for StorageKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "StorageKey({})", self.0)
	}
}
impl Display for StorageKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

fn validate_view(view: &str) -> Result<(), StorageKeyError> {
	if view.is_empty() {
		return Err(StorageKeyError::Empty);
	}
	if view.chars().any(char::is_whitespace) {
		return Err(StorageKeyError::ContainsWhitespace);
	}
	if view.chars().count() > STORAGE_KEY_MAX_LEN {
		return Err(StorageKeyError::TooLong { max: STORAGE_KEY_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn default_key_matches_browser_slot() {
		assert_eq!(StorageKey::default().as_ref(), "accessToken");
	}

	#[test]
	fn rejects_invalid_keys() {
		assert_eq!(StorageKey::new(""), Err(StorageKeyError::Empty));
		assert_eq!(StorageKey::new("access token"), Err(StorageKeyError::ContainsWhitespace));
		assert_eq!(
			StorageKey::new("k".repeat(STORAGE_KEY_MAX_LEN + 1)),
			Err(StorageKeyError::TooLong { max: STORAGE_KEY_MAX_LEN })
		);
	}

	#[test]
	fn serde_round_trip_validates() {
		let key: StorageKey =
			serde_json::from_str("\"crm.token\"").expect("Valid key should deserialize.");

		assert_eq!(key.as_ref(), "crm.token");
		assert!(serde_json::from_str::<StorageKey>("\"bad key\"").is_err());
	}
}

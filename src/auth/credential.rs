//! Bearer credential wrapper that redacts sensitive material.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use http::HeaderValue;
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, error::ConfigError};

const FINGERPRINT_LEN: usize = 12;

/// Opaque bearer credential; callers must avoid logging [`Credential::expose`].
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);
impl Credential {
	/// Wraps a new credential string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Accepts a credential issued by the backend.
	///
	/// Blank values (which servers use to signal "no credential") and values that cannot be sent
	/// back as an `Authorization` header are rejected, so nothing unusable reaches the store.
	pub fn issued(value: impl Into<String>) -> Option<Self> {
		let value = value.into();

		if value.trim().is_empty() {
			return None;
		}

		Some(Self(value)).filter(|credential| credential.bearer_header().is_ok())
	}

	/// Returns the inner credential value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Short, non-reversible fingerprint that is safe to put in logs.
	pub fn fingerprint(&self) -> String {
		let digest = Sha256::digest(self.0.as_bytes());
		let mut encoded = STANDARD_NO_PAD.encode(digest);

		encoded.truncate(FINGERPRINT_LEN);

		encoded
	}

	/// Builds the `Authorization: Bearer <credential>` header value, marked sensitive.
	pub fn bearer_header(&self) -> Result<HeaderValue, ConfigError> {
		let mut value = HeaderValue::from_str(&format!("Bearer {}", self.0))
			.map_err(ConfigError::InvalidCredentialHeader)?;

		value.set_sensitive(true);

		Ok(value)
	}
}
impl AsRef<str> for Credential {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("Credential").field(&"<redacted>").finish()
	}
}
impl Display for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

//! Wire payloads for the login and refresh endpoints.

// self
use crate::{_prelude::*, auth::Credential};

/// Body posted to the login endpoint.
#[derive(Clone, Serialize)]
pub struct LoginRequest {
	/// Account email.
	pub email: String,
	/// Account password; never logged.
	pub password: String,
}
impl Debug for LoginRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LoginRequest")
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.finish()
	}
}

/// Success shape of the login endpoint: `{ accessToken, user }`.
#[derive(Clone, Debug, Deserialize)]
pub struct LoginResponse {
	/// Issued bearer credential.
	#[serde(rename = "accessToken", default)]
	pub access_token: Option<String>,
	/// Backend user profile, kept opaque.
	#[serde(default)]
	pub user: serde_json::Value,
}

/// Success shape of the refresh endpoint: `{ accessToken }`.
#[derive(Clone, Debug, Deserialize)]
pub struct RefreshResponse {
	/// Renewed bearer credential.
	#[serde(rename = "accessToken", default)]
	pub access_token: Option<String>,
}
impl RefreshResponse {
	/// Returns the renewed credential if the endpoint actually yielded one.
	pub fn into_credential(self) -> Option<Credential> {
		self.access_token.and_then(Credential::issued)
	}
}

/// Established session returned by a successful login.
#[derive(Clone, Debug)]
pub struct LoginSession {
	/// Credential that is now persisted in the store.
	pub credential: Credential,
	/// User profile returned by the backend.
	pub user: serde_json::Value,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn login_request_uses_backend_field_names_and_redacts_password() {
		let request = LoginRequest { email: "ops@example.com".into(), password: "hunter2".into() };
		let body = serde_json::to_value(&request).expect("Login request should serialize.");

		assert_eq!(body, serde_json::json!({ "email": "ops@example.com", "password": "hunter2" }));
		assert!(!format!("{request:?}").contains("hunter2"));
	}

	#[test]
	fn refresh_response_without_token_yields_nothing() {
		let missing: RefreshResponse =
			serde_json::from_str("{}").expect("Empty object should deserialize.");
		let null: RefreshResponse =
			serde_json::from_str("{\"accessToken\":null}").expect("Null token should deserialize.");
		let blank: RefreshResponse =
			serde_json::from_str("{\"accessToken\":\"\"}").expect("Blank token should deserialize.");
		let multiline: RefreshResponse = serde_json::from_str("{\"accessToken\":\"x\\ny\"}")
			.expect("Multiline token should deserialize.");

		assert!(missing.into_credential().is_none());
		assert!(null.into_credential().is_none());
		assert!(blank.into_credential().is_none());
		assert!(multiline.into_credential().is_none());
	}

	#[test]
	fn login_response_keeps_user_payload() {
		let response: LoginResponse = serde_json::from_str(
			"{\"accessToken\":\"abc\",\"user\":{\"id\":7,\"roleId\":2}}",
		)
		.expect("Login response should deserialize.");

		assert_eq!(response.access_token.as_deref(), Some("abc"));
		assert_eq!(response.user["roleId"], 2);
	}
}

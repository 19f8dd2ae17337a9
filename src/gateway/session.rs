//! Session lifecycle: login creates the credential, logout and failed refreshes delete it.

// self
use crate::{
	_prelude::*,
	auth::{Credential, LoginRequest, LoginResponse, LoginSession},
	ext::{SessionEndReason, SessionExpired},
	gateway::Gateway,
	obs::{self, CallKind, CallOutcome, CallSpan},
	store::StoreError,
	transport::{ApiRequest, HttpTransport},
};

impl<T> Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	/// Exchanges email + password for a credential and persists it.
	///
	/// The login call carries no bearer header and never enters the refresh path; a rejected
	/// login surfaces as [`Error::Status`].
	pub async fn login(
		&self,
		email: impl Into<String>,
		password: impl Into<String>,
	) -> Result<LoginSession> {
		const KIND: CallKind = CallKind::Login;

		let span = CallSpan::new(KIND, "login");
		let body = LoginRequest { email: email.into(), password: password.into() };

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span
			.instrument(async move {
				let mut request = ApiRequest::post(&self.config.login_path).json(&body)?;

				self.apply_request_interceptors(&mut request)?;

				let response = self.send_once(&request).await?;

				if !response.is_success() {
					return Err(Error::status(response));
				}

				let payload = response.json::<LoginResponse>()?;
				let credential = payload.access_token.and_then(Credential::issued).ok_or_else(
					|| Error::InvalidLogin {
						reason: "login response did not include a usable access token".into(),
					},
				)?;

				self.store.save(credential.clone()).await?;

				Ok(LoginSession { credential, user: payload.user })
			})
			.await;

		obs::record_call_outcome(KIND, CallOutcome::of(&result));

		result
	}

	/// Deletes the stored credential and notifies the session observer.
	pub async fn logout(&self) -> Result<()> {
		const KIND: CallKind = CallKind::Logout;

		let span = CallSpan::new(KIND, "logout");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span
			.instrument(async move {
				self.end_session(SessionEndReason::Logout).await?;

				Ok(())
			})
			.await;

		obs::record_call_outcome(KIND, CallOutcome::of(&result));

		result
	}

	/// Returns the currently stored credential, if any.
	pub async fn credential(&self) -> Result<Option<Credential>> {
		Ok(self.store.load().await?)
	}

	/// Clears the stored credential and tells the observer where to send the user. The observer
	/// is notified even if clearing fails.
	pub(crate) async fn end_session(&self, reason: SessionEndReason) -> Result<(), StoreError> {
		self.advance_session_epoch();

		let cleared = self.store.clear().await;

		self.observer.session_expired(&SessionExpired::new(reason, self.config.redirect_to.clone()));

		cleared.map(|_| ())
	}
}

//! Request dispatch with bearer injection and a single refresh-and-replay cycle.
//!
//! Every call walks a fresh state machine:
//!
//! ```text
//! DISPATCHED ─┬─ 2xx / non-401 ───────────────────────────────► DONE
//!             └─ 401 ─► REFRESHING ─┬─ refreshed ─► RETRIED ───► DONE
//!                                   └─ failed ────► LOGGED_OUT
//! ```
//!
//! The replay goes straight to the transport, so a second `401` is surfaced to the caller
//! instead of triggering another refresh.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::Credential,
	gateway::Gateway,
	obs::{self, CallKind, CallOutcome, CallSpan},
	transport::{ApiRequest, ApiResponse, HttpTransport},
};

/// States of the per-request dispatch machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DispatchPhase {
	/// Request sent with the stored credential (if any).
	Dispatched,
	/// Server answered `401`; the credential is being refreshed.
	Refreshing,
	/// Request replayed once with the refreshed credential.
	Retried,
	/// Refresh failed; the credential was cleared and the session ended.
	LoggedOut,
	/// Outcome handed back to the caller.
	Done,
}
impl DispatchPhase {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			DispatchPhase::Dispatched => "dispatched",
			DispatchPhase::Refreshing => "refreshing",
			DispatchPhase::Retried => "retried",
			DispatchPhase::LoggedOut => "logged_out",
			DispatchPhase::Done => "done",
		}
	}

	/// Returns `true` for states that end the machine.
	pub const fn is_terminal(self) -> bool {
		matches!(self, DispatchPhase::Done | DispatchPhase::LoggedOut)
	}
}
impl Display for DispatchPhase {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

impl<T> Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	/// Sends `request` with the stored credential attached, refreshing and replaying it once if
	/// the server answers `401`.
	///
	/// - 2xx responses resolve to `Ok`.
	/// - Other statuses resolve to [`Error::Status`] with the response untouched.
	/// - If the refresh fails, the stored credential is cleared, the session observer is
	///   notified, and the call resolves to [`Error::Unauthenticated`] carrying the original
	///   `401` response.
	/// - If the replay fails, its own failure is returned as-is.
	pub async fn dispatch(&self, request: ApiRequest) -> Result<ApiResponse> {
		const KIND: CallKind = CallKind::Dispatch;

		let span = CallSpan::new(KIND, "dispatch");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span.instrument(self.dispatch_inner(request)).await;

		obs::record_call_outcome(KIND, CallOutcome::of(&result));

		result
	}

	/// Dispatches `request` and decodes a successful body as JSON.
	pub async fn dispatch_json<R>(&self, request: ApiRequest) -> Result<R>
	where
		R: DeserializeOwned,
	{
		Ok(self.dispatch(request).await?.json()?)
	}

	/// `GET path`.
	pub async fn get(&self, path: impl Into<String>) -> Result<ApiResponse> {
		self.dispatch(ApiRequest::get(path)).await
	}

	/// `POST path` with a JSON body.
	pub async fn post<B>(&self, path: impl Into<String>, body: &B) -> Result<ApiResponse>
	where
		B: ?Sized + Serialize,
	{
		self.dispatch(ApiRequest::post(path).json(body)?).await
	}

	/// `PUT path` with a JSON body.
	pub async fn put<B>(&self, path: impl Into<String>, body: &B) -> Result<ApiResponse>
	where
		B: ?Sized + Serialize,
	{
		self.dispatch(ApiRequest::put(path).json(body)?).await
	}

	/// `PATCH path` with a JSON body.
	pub async fn patch<B>(&self, path: impl Into<String>, body: &B) -> Result<ApiResponse>
	where
		B: ?Sized + Serialize,
	{
		self.dispatch(ApiRequest::patch(path).json(body)?).await
	}

	/// `DELETE path`.
	pub async fn delete(&self, path: impl Into<String>) -> Result<ApiResponse> {
		self.dispatch(ApiRequest::delete(path)).await
	}

	async fn dispatch_inner(&self, mut request: ApiRequest) -> Result<ApiResponse> {
		self.apply_request_interceptors(&mut request)?;

		let epoch = self.session_epoch();
		let credential = self.store.load().await?;

		if let Some(credential) = credential.as_ref() {
			request.set_bearer(credential)?;
		}

		self.enter(&request, DispatchPhase::Dispatched);

		let response = self.send_once(&request).await?;

		if !response.is_unauthorized() {
			self.enter(&request, DispatchPhase::Done);

			return into_result(response);
		}

		self.enter(&request, DispatchPhase::Refreshing);

		match self.refresh_since(credential.as_ref(), epoch).await {
			Ok(fresh) => self.replay(request, &fresh).await,
			Err(reason) => {
				self.enter(&request, DispatchPhase::LoggedOut);

				Err(Error::Unauthenticated { response: Box::new(response), reason })
			},
		}
	}

	async fn replay(&self, mut request: ApiRequest, credential: &Credential) -> Result<ApiResponse> {
		request.set_bearer(credential)?;
		self.enter(&request, DispatchPhase::Retried);

		let response = self.send_once(&request).await?;

		self.enter(&request, DispatchPhase::Done);

		into_result(response)
	}

	/// Resolves the URL, sends through the transport, and runs response interceptors. Never
	/// refreshes.
	pub(crate) async fn send_once(&self, request: &ApiRequest) -> Result<ApiResponse> {
		let url = self.config.endpoint(&request.path)?;
		let response = self.transport.send(url, request.clone()).await?;

		for interceptor in &self.response_interceptors {
			interceptor.observe(request, &response);
		}

		Ok(response)
	}

	pub(crate) fn apply_request_interceptors(&self, request: &mut ApiRequest) -> Result<()> {
		for interceptor in &self.request_interceptors {
			interceptor.intercept(request)?;
		}

		Ok(())
	}

	fn enter(&self, request: &ApiRequest, phase: DispatchPhase) {
		obs::record_phase(request.method.as_str(), &request.path, phase.as_str());
		obs::count_dispatch_phase(phase.as_str());
	}
}

fn into_result(response: ApiResponse) -> Result<ApiResponse> {
	if response.is_success() { Ok(response) } else { Err(Error::status(response)) }
}

//! Credential refresh with a single-flight guard and compare-and-swap rotation.
//!
//! Dispatch renews the credential here after a `401`. Callers queue on one
//! guard per gateway; whoever gets it first calls the cookie-authenticated refresh endpoint,
//! and everyone queued behind it finds a credential that differs from the one their request
//! was rejected with and reuses it. A failed refresh clears the stored credential and
//! notifies the session observer once; requests queued behind it fail without calling the
//! endpoint again.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::{Credential, RefreshResponse},
	error::RefreshFailure,
	ext::SessionEndReason,
	gateway::Gateway,
	obs::{self, CallKind, CallOutcome, CallSpan},
	store::CompareAndSwapOutcome,
	transport::{ApiRequest, HttpTransport},
};

impl<T> Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	/// Obtains a credential newer than `stale`, calling the refresh endpoint only when no other
	/// request already rotated it.
	///
	/// On failure the stored credential is cleared and the session observer is notified before
	/// the error is returned.
	pub async fn refresh_credential(
		&self,
		stale: Option<&Credential>,
	) -> Result<Credential, RefreshFailure> {
		self.refresh_since(stale, self.session_epoch()).await
	}

	/// Refresh on behalf of a request sent while the session epoch was `epoch`.
	///
	/// If the session ended since then, the waiter gets [`RefreshFailure::SessionEnded`] without
	/// another refresh call or observer notification, unless a new credential was stored in the
	/// meantime (a fresh login), which is reused.
	pub(crate) async fn refresh_since(
		&self,
		stale: Option<&Credential>,
		epoch: u64,
	) -> Result<Credential, RefreshFailure> {
		const KIND: CallKind = CallKind::Refresh;

		let span = CallSpan::new(KIND, "refresh_credential");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span
			.instrument(async move {
				let _singleflight = self.refresh_guard.lock().await;
				let current = match self.store.load().await {
					Ok(current) => current,
					Err(err) => return Err(self.fail_refresh(err.into(), stale).await),
				};

				if let Some(current) = current.as_ref().filter(|current| stale != Some(*current)) {
					self.refresh_metrics.record_reuse();
					obs::record_refresh_reuse(&current.fingerprint());
					obs::count_refresh_reuse();

					return Ok(current.clone());
				}
				if self.session_epoch() != epoch {
					obs::record_session_already_ended();

					return Err(RefreshFailure::SessionEnded);
				}

				self.refresh_metrics.record_attempt();

				let fresh = match self.request_refresh().await {
					Ok(fresh) => fresh,
					Err(err) => return Err(self.fail_refresh(err, stale).await),
				};

				// A logout landed while the refresh call was in flight.
				if self.session_epoch() != epoch {
					obs::record_session_already_ended();

					return Err(RefreshFailure::SessionEnded);
				}

				match self.rotate(current.as_ref(), fresh).await {
					Ok(rotated) => {
						self.refresh_metrics.record_success();

						Ok(rotated)
					},
					Err(err) => Err(self.fail_refresh(err, stale).await),
				}
			})
			.await;

		obs::record_call_outcome(KIND, CallOutcome::of(&result));

		result
	}

	async fn request_refresh(&self) -> Result<Credential, RefreshFailure> {
		let url = self.config.refresh_url()?;
		let response = self.transport.send(url, ApiRequest::post(&self.config.refresh_path)).await?;

		if !response.is_success() {
			return Err(RefreshFailure::Rejected { status: response.status().as_u16() });
		}

		response.json::<RefreshResponse>()?.into_credential().ok_or(RefreshFailure::MissingToken)
	}

	async fn rotate(
		&self,
		observed: Option<&Credential>,
		fresh: Credential,
	) -> Result<Credential, RefreshFailure> {
		let outcome = self
			.store
			.compare_and_swap(observed.map(Credential::expose), fresh.clone())
			.await?;

		match outcome {
			CompareAndSwapOutcome::Updated => Ok(fresh),
			// Another writer sharing the store (a login elsewhere) got there first.
			CompareAndSwapOutcome::Mismatch => match self.store.load().await? {
				Some(existing) => Ok(existing),
				None => {
					self.store.save(fresh.clone()).await?;

					Ok(fresh)
				},
			},
		}
	}

	async fn fail_refresh(
		&self,
		failure: RefreshFailure,
		stale: Option<&Credential>,
	) -> RefreshFailure {
		self.refresh_metrics.record_failure();
		obs::warn_refresh_failure(&failure, stale.map(Credential::fingerprint).as_deref());

		if let Err(err) = self.end_session(SessionEndReason::RefreshFailed).await {
			obs::warn_session_clear_failure(&err);
		}

		failure
	}
}

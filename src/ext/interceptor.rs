//! Interceptor contracts applied around every transport call.

// crates.io
use http::HeaderMap;
// self
use crate::{
	_prelude::*,
	transport::{ApiRequest, ApiResponse},
};

/// Hook that may rewrite an outbound request before the gateway attaches the credential.
///
/// Interceptors run in registration order. Returning an error aborts the call; the error is
/// surfaced to the caller unchanged.
pub trait RequestInterceptor
where
	Self: Send + Sync,
{
	/// Mutates `request` in place.
	fn intercept(&self, request: &mut ApiRequest) -> Result<()>;
}

/// Hook that observes every response the transport produced, including `401`s that trigger a
/// refresh and the replayed request's response.
pub trait ResponseInterceptor
where
	Self: Send + Sync,
{
	/// Inspects `response` for the request that produced it.
	fn observe(&self, request: &ApiRequest, response: &ApiResponse);
}

/// Adds fixed headers to every request that does not already carry them.
#[derive(Clone, Debug, Default)]
pub struct DefaultHeaders(pub HeaderMap);
impl DefaultHeaders {
	/// Wraps the provided header map.
	pub fn new(headers: HeaderMap) -> Self {
		Self(headers)
	}
}
impl RequestInterceptor for DefaultHeaders {
	fn intercept(&self, request: &mut ApiRequest) -> Result<()> {
		for (name, value) in self.0.iter() {
			if !request.headers.contains_key(name) {
				request.headers.insert(name.clone(), value.clone());
			}
		}

		Ok(())
	}
}

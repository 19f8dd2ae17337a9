//! Transport primitives for gateway calls.
//!
//! The module exposes [`HttpTransport`], the gateway's only dependency on an HTTP stack,
//! together with the [`ApiRequest`] descriptor callers build and the [`ApiResponse`] they
//! receive back. The default [`ReqwestTransport`] keeps a cookie jar so the refresh cookie
//! set at login rides along on the refresh call without the gateway ever touching it.

// crates.io
use http::{
	HeaderMap, HeaderName, HeaderValue, Method, StatusCode,
	header::{AUTHORIZATION, CONTENT_TYPE},
};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::Credential,
	error::{ConfigError, DecodeError, TransportError},
};
#[cfg(feature = "reqwest")] use crate::config::GatewayConfig;

/// Boxed future returned by [`HttpTransport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing gateway requests.
///
/// Implementations resolve with an [`ApiResponse`] for every response the server produced,
/// whatever its status; only failures that yield no response at all (DNS, TCP, TLS,
/// timeouts) map to [`TransportError`]. Status interpretation is the gateway's job.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` to the already-resolved `url`.
	fn send(&self, url: Url, request: ApiRequest) -> TransportFuture<'_>;
}

/// Outbound request descriptor: method, path, headers, and body.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Path relative to the gateway base URL, or an absolute URL.
	pub path: String,
	/// Request headers.
	pub headers: HeaderMap,
	/// Raw request body.
	pub body: Option<Vec<u8>>,
}
impl ApiRequest {
	/// Creates a request without headers or body.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self { method, path: path.into(), headers: HeaderMap::new(), body: None }
	}

	/// `GET` request.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::GET, path)
	}

	/// `POST` request.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::POST, path)
	}

	/// `PUT` request.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::PUT, path)
	}

	/// `PATCH` request.
	pub fn patch(path: impl Into<String>) -> Self {
		Self::new(Method::PATCH, path)
	}

	/// `DELETE` request.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::DELETE, path)
	}

	/// Sets or replaces a header.
	pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Sets a raw body.
	pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// Serializes `body` as JSON and sets the `content-type` header.
	pub fn json<T>(mut self, body: &T) -> Result<Self, ConfigError>
	where
		T: ?Sized + Serialize,
	{
		self.body = Some(serde_json::to_vec(body).map_err(ConfigError::RequestBody)?);
		self.headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

		Ok(self)
	}

	/// Sets `Authorization: Bearer <credential>`, replacing any previous value.
	pub fn set_bearer(&mut self, credential: &Credential) -> Result<(), ConfigError> {
		self.headers.insert(AUTHORIZATION, credential.bearer_header()?);

		Ok(())
	}

	/// Returns the `Authorization` header, if set.
	pub fn authorization(&self) -> Option<&HeaderValue> {
		self.headers.get(AUTHORIZATION)
	}
}

/// Response as received from the transport.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	status: StatusCode,
	headers: HeaderMap,
	body: Vec<u8>,
}
impl ApiResponse {
	/// Assembles a response from its parts.
	pub fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
		Self { status, headers, body }
	}

	/// HTTP status.
	pub fn status(&self) -> StatusCode {
		self.status
	}

	/// Response headers.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	/// Raw response body.
	pub fn body(&self) -> &[u8] {
		&self.body
	}

	/// Consumes the response, returning the raw body.
	pub fn into_body(self) -> Vec<u8> {
		self.body
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		self.status.is_success()
	}

	/// Returns `true` for `401 Unauthorized`, the sole refresh trigger.
	pub fn is_unauthorized(&self) -> bool {
		self.status == StatusCode::UNAUTHORIZED
	}

	/// Body decoded as UTF-8, replacing invalid sequences.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	/// Decodes the body as JSON, reporting the path where decoding failed.
	pub fn json<T>(&self) -> Result<T, DecodeError>
	where
		T: DeserializeOwned,
	{
		let de = &mut serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(de).map_err(|source| DecodeError::Json {
			path: source.path().to_string(),
			source,
			status: self.status.as_u16(),
		})
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Build it with [`ReqwestTransport::from_config`] to get a cookie jar and the configured
/// timeout. A client passed to [`ReqwestTransport::with_client`] must enable its cookie store
/// itself, otherwise the refresh endpoint never sees the refresh cookie.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client with a cookie jar and the configured request timeout. Redirects are not
	/// followed so a `401` is never masked by a login page.
	pub fn from_config(config: &GatewayConfig) -> Result<Self, ConfigError> {
		let mut builder =
			ReqwestClient::builder().cookie_store(true).redirect(reqwest::redirect::Policy::none());

		if let Some(timeout) = config.request_timeout {
			builder = builder.timeout(timeout.unsigned_abs());
		}

		Ok(Self(builder.build()?))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn send(&self, url: Url, request: ApiRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let ApiRequest { method, headers, body, .. } = request;
			let mut builder = client.request(method, url).headers(headers);

			if let Some(body) = body {
				builder = builder.body(body);
			}

			let response = builder.send().await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let body = response.bytes().await?.to_vec();

			Ok::<_, TransportError>(ApiResponse::new(status, headers, body))
		})
	}
}

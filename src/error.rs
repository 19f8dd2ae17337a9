//! Gateway-level error types shared across dispatch, refresh, sessions, and stores.

// crates.io
use http::StatusCode;
// self
use crate::{_prelude::*, config::GatewayConfigError, transport::ApiResponse};

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical gateway error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout); the request produced no response.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Response body could not be decoded into the requested shape.
	#[error(transparent)]
	Decode(#[from] DecodeError),

	/// Server answered with a non-success status; the response is passed through verbatim.
	#[error("Request failed with status {status}.")]
	Status {
		/// HTTP status returned by the server.
		status: StatusCode,
		/// Full response as received.
		response: Box<ApiResponse>,
	},
	/// Server rejected the credential and the session could not be refreshed.
	///
	/// Carries the original `401` response; the stored credential has already been cleared and
	/// the session observer notified.
	#[error("Session expired and could not be refreshed.")]
	Unauthenticated {
		/// Original `401` response that triggered the refresh attempt.
		response: Box<ApiResponse>,
		/// Why the refresh attempt failed.
		#[source]
		reason: RefreshFailure,
	},
	/// Login endpoint answered successfully but without a usable credential.
	#[error("Login failed: {reason}.")]
	InvalidLogin {
		/// Gateway-supplied reason string.
		reason: String,
	},
	/// A request interceptor refused to let the request proceed.
	#[error("Request interceptor rejected the request: {message}.")]
	Interceptor {
		/// Interceptor-supplied message.
		message: String,
	},
}
impl Error {
	/// Wraps a non-success response.
	pub fn status(response: ApiResponse) -> Self {
		Self::Status { status: response.status(), response: Box::new(response) }
	}

	/// Returns the HTTP status attached to the error, if the server produced a response.
	pub fn http_status(&self) -> Option<StatusCode> {
		self.response().map(ApiResponse::status)
	}

	/// Returns the server response carried by the error, if any.
	pub fn response(&self) -> Option<&ApiResponse> {
		match self {
			Self::Status { response, .. } | Self::Unauthenticated { response, .. } =>
				Some(response.as_ref()),
			_ => None,
		}
	}

	/// Returns `true` when the error means the caller must authenticate again.
	pub fn is_unauthenticated(&self) -> bool {
		matches!(self, Self::Unauthenticated { .. })
	}
}

/// Configuration and validation failures raised by the gateway.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Gateway configuration failed validation.
	#[error(transparent)]
	Gateway(#[from] GatewayConfigError),
	/// Request path could not be resolved against the base URL.
	#[error("Request path `{path}` does not resolve to a valid URL.")]
	InvalidUrl {
		/// Path (or absolute URL) supplied by the caller.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Stored credential contains bytes that are not allowed in an HTTP header.
	#[error("Stored credential cannot be encoded as an Authorization header.")]
	InvalidCredentialHeader(#[source] http::header::InvalidHeaderValue),
	/// Request body could not be serialized to JSON.
	#[error("Request body could not be serialized to JSON.")]
	RequestBody(#[source] serde_json::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the backend.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The transport gave up waiting for a response.
	#[error("Request timed out while calling the backend.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the backend.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}

/// Response decoding failures.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Body is not JSON or does not match the expected shape.
	#[error("Response body does not match the expected JSON shape at `{path}`.")]
	Json {
		/// JSON path where decoding stopped.
		path: String,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status of the decoded response.
		status: u16,
	},
}

/// Reasons a credential refresh can fail. Every variant ends the session.
#[derive(Debug, ThisError)]
pub enum RefreshFailure {
	/// Refresh endpoint could not be reached.
	#[error("Refresh endpoint could not be reached.")]
	Transport(#[from] TransportError),
	/// Refresh endpoint answered with a non-success status.
	#[error("Refresh endpoint rejected the session with status {status}.")]
	Rejected {
		/// HTTP status returned by the refresh endpoint.
		status: u16,
	},
	/// Refresh endpoint succeeded but did not return a usable access token.
	#[error("Refresh endpoint response did not include a usable access token.")]
	MissingToken,
	/// Refresh endpoint returned a body that is not the expected JSON.
	#[error("Refresh endpoint returned malformed JSON.")]
	Malformed(#[from] DecodeError),
	/// Credential store failed while reading or rotating the credential.
	#[error("Credential store failed during refresh.")]
	Storage(#[from] crate::store::StoreError),
	/// Refresh endpoint could not be resolved.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The session ended (failed refresh or logout) after this request was sent; the refresh
	/// endpoint was not called and the observer was not notified again.
	#[error("Session already ended while the request was in flight.")]
	SessionEnded,
}

//! The authenticated request gateway.

pub mod dispatch;
pub mod refresh;
pub mod session;

pub use dispatch::*;
pub use refresh::*;

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{
	_prelude::*,
	config::GatewayConfig,
	ext::{NoopObserver, RequestInterceptor, ResponseInterceptor, SessionObserver},
	store::CredentialStore,
	transport::HttpTransport,
};
#[cfg(feature = "reqwest")]
use crate::{error::ConfigError, store::MemoryStore, transport::ReqwestTransport};

#[cfg(feature = "reqwest")]
/// Gateway specialized for the crate's default reqwest transport.
pub type ReqwestGateway = Gateway<ReqwestTransport>;

/// Uniform call surface that hides credential attachment and renewal.
///
/// The gateway owns the transport, the credential store, and the session observer so every
/// request shares one refresh guard: concurrent `401`s collapse into a single refresh call.
/// Cloning is cheap and clones share all of that state.
pub struct Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	/// Transport used for every outbound request.
	pub transport: Arc<T>,
	/// Credential store holding the bearer credential.
	pub store: Arc<dyn CredentialStore>,
	/// Endpoint and storage configuration.
	pub config: GatewayConfig,
	/// Receives session-ended notifications.
	pub observer: Arc<dyn SessionObserver>,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	request_interceptors: Vec<Arc<dyn RequestInterceptor>>,
	response_interceptors: Vec<Arc<dyn ResponseInterceptor>>,
	refresh_guard: Arc<AsyncMutex<()>>,
	session_epoch: Arc<AtomicU64>,
}
impl<T> Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a gateway over a caller-provided transport and store.
	pub fn with_transport(
		config: GatewayConfig,
		store: Arc<dyn CredentialStore>,
		transport: impl Into<Arc<T>>,
	) -> Self {
		Self {
			transport: transport.into(),
			store,
			config,
			observer: Arc::new(NoopObserver),
			refresh_metrics: Default::default(),
			request_interceptors: Vec::new(),
			response_interceptors: Vec::new(),
			refresh_guard: Default::default(),
			session_epoch: Default::default(),
		}
	}

	/// Sets the observer notified when a session ends.
	pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
		self.observer = observer;

		self
	}

	/// Appends a request interceptor; interceptors run in registration order.
	pub fn with_request_interceptor(mut self, interceptor: Arc<dyn RequestInterceptor>) -> Self {
		self.request_interceptors.push(interceptor);

		self
	}

	/// Appends a response interceptor.
	pub fn with_response_interceptor(mut self, interceptor: Arc<dyn ResponseInterceptor>) -> Self {
		self.response_interceptors.push(interceptor);

		self
	}

	/// Counter bumped every time a session ends; a request remembers the value it was sent
	/// under so a late `401` cannot revive a session that already ended.
	pub(crate) fn session_epoch(&self) -> u64 {
		self.session_epoch.load(Ordering::Acquire)
	}

	pub(crate) fn advance_session_epoch(&self) {
		self.session_epoch.fetch_add(1, Ordering::AcqRel);
	}
}
#[cfg(feature = "reqwest")]
impl Gateway<ReqwestTransport> {
	/// Creates a gateway with a cookie-enabled reqwest transport and an in-memory store bound
	/// to the configured storage key.
	pub fn new(config: GatewayConfig) -> Result<Self, ConfigError> {
		let transport = ReqwestTransport::from_config(&config)?;
		let store: Arc<dyn CredentialStore> =
			Arc::new(MemoryStore::new(config.storage_key.clone()));

		Ok(Self::with_transport(config, store, transport))
	}
}
impl<T> Clone for Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			store: self.store.clone(),
			config: self.config.clone(),
			observer: self.observer.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
			request_interceptors: self.request_interceptors.clone(),
			response_interceptors: self.response_interceptors.clone(),
			refresh_guard: self.refresh_guard.clone(),
			session_epoch: self.session_epoch.clone(),
		}
	}
}
impl<T> Debug for Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gateway")
			.field("config", &self.config)
			.field("request_interceptors", &self.request_interceptors.len())
			.field("response_interceptors", &self.response_interceptors.len())
			.finish()
	}
}

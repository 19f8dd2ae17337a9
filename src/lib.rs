//! Bearer-token request gateway: inject the stored credential, refresh it once on `401`, replay
//! the call, and hand session expiry back to the application instead of navigating for it.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod ext;
pub mod gateway;
pub mod obs;
pub mod store;
pub mod transport;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::GatewayConfig,
		ext::{RecordingObserver, SessionObserver},
		gateway::Gateway,
		store::{CredentialStore, MemoryStore},
		transport::ReqwestTransport,
	};

	/// Gateway type alias used by reqwest-backed integration tests.
	pub type ReqwestTestGateway = Gateway<ReqwestTransport>;

	/// Builds a reqwest transport with a cookie jar that also accepts the self-signed
	/// certificates produced by `httpmock` during tests.
	pub fn test_reqwest_transport() -> ReqwestTransport {
		let client = ReqwestClient::builder()
			.cookie_store(true)
			.redirect(reqwest::redirect::Policy::none())
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestTransport::with_client(client)
	}

	/// Builds a gateway configuration rooted at `base_url` with default endpoint paths.
	pub fn test_config(base_url: &str) -> GatewayConfig {
		GatewayConfig::builder(Url::parse(base_url).expect("Test base URL should parse."))
			.build()
			.expect("Test gateway configuration should be valid.")
	}

	/// Constructs a [`Gateway`] backed by an in-memory store, a recording session observer,
	/// and the reqwest transport used across integration tests.
	pub fn build_reqwest_test_gateway(
		base_url: &str,
	) -> (ReqwestTestGateway, Arc<MemoryStore>, RecordingObserver) {
		let config = test_config(base_url);
		let store_backend = Arc::new(MemoryStore::new(config.storage_key.clone()));
		let store: Arc<dyn CredentialStore> = store_backend.clone();
		let observer = RecordingObserver::default();
		let session_observer: Arc<dyn SessionObserver> = Arc::new(observer.clone());
		let gateway = Gateway::with_transport(config, store, test_reqwest_transport())
			.with_observer(session_observer);

		(gateway, store_backend, observer)
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use http;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {auth_gateway as _, color_eyre as _, httpmock as _};

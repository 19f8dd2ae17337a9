//! Gateway configuration: backend base URL, auth endpoint paths, storage slot, and redirect
//! target.
//!
//! Values are assembled through [`GatewayConfigBuilder`] or loaded from JSON with
//! [`GatewayConfig::from_json_slice`]; both paths run the same validation so a
//! [`GatewayConfig`] in hand is always usable.

// self
use crate::{_prelude::*, auth::StorageKey, error::ConfigError};

const DEFAULT_REFRESH_PATH: &str = "/users/auth/refresh";
const DEFAULT_LOGIN_PATH: &str = "/users/login";
const DEFAULT_REDIRECT_TO: &str = "/";

/// Errors raised while constructing or validating a configuration.
#[derive(Debug, ThisError)]
pub enum GatewayConfigError {
	/// Base URL must be an absolute http(s) URL.
	#[error("Base URL must use http or https: {url}.")]
	UnsupportedScheme {
		/// Base URL that failed validation.
		url: String,
	},
	/// Base URL cannot carry a query string or fragment.
	#[error("Base URL must not contain a query or fragment: {url}.")]
	BaseUrlHasQuery {
		/// Base URL that failed validation.
		url: String,
	},
	/// Endpoint paths and the redirect target must be absolute.
	#[error("The {field} must start with `/`: {value}.")]
	RelativePath {
		/// Which field failed validation.
		field: &'static str,
		/// Value that failed validation.
		value: String,
	},
	/// Request timeout must be positive when set.
	#[error("Request timeout must be positive.")]
	NonPositiveTimeout,
	/// JSON configuration could not be parsed.
	#[error("Gateway configuration is malformed at `{path}`.")]
	Parse {
		/// JSON path where parsing stopped.
		path: String,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

/// Immutable gateway configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
	/// Backend base URL every request path is appended to.
	pub base_url: Url,
	/// Path of the cookie-authenticated refresh endpoint.
	#[serde(default = "default_refresh_path")]
	pub refresh_path: String,
	/// Path of the login endpoint.
	#[serde(default = "default_login_path")]
	pub login_path: String,
	/// Storage slot holding the bearer credential.
	#[serde(default)]
	pub storage_key: StorageKey,
	/// Entry surface the application should navigate to when a session ends.
	#[serde(default = "default_redirect_to")]
	pub redirect_to: String,
	/// Optional per-request timeout; the transport default applies when unset.
	#[serde(default, rename = "request_timeout_secs", with = "timeout_secs")]
	pub request_timeout: Option<Duration>,
}
impl GatewayConfig {
	/// Creates a new builder for the provided base URL.
	pub fn builder(base_url: Url) -> GatewayConfigBuilder {
		GatewayConfigBuilder::new(base_url)
	}

	/// Parses and validates a JSON configuration document.
	pub fn from_json_slice(bytes: &[u8]) -> Result<Self, GatewayConfigError> {
		let de = &mut serde_json::Deserializer::from_slice(bytes);
		let config: Self = serde_path_to_error::deserialize(de).map_err(|source| {
			GatewayConfigError::Parse { path: source.path().to_string(), source }
		})?;

		config.validate()?;

		Ok(config)
	}

	/// Resolves a request path against the base URL.
	///
	/// Paths are appended to the base URL (so a base of `https://host/api` plus `/clients/5`
	/// yields `https://host/api/clients/5`); absolute http(s) URLs are used as-is.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		let resolved = if path.starts_with("http://") || path.starts_with("https://") {
			Url::parse(path)
		} else {
			let base = self.base_url.as_str().trim_end_matches('/');

			if path.starts_with('/') {
				Url::parse(&format!("{base}{path}"))
			} else {
				Url::parse(&format!("{base}/{path}"))
			}
		};

		resolved.map_err(|source| ConfigError::InvalidUrl { path: path.to_owned(), source })
	}

	/// Absolute URL of the refresh endpoint.
	pub fn refresh_url(&self) -> Result<Url, ConfigError> {
		self.endpoint(&self.refresh_path)
	}

	/// Absolute URL of the login endpoint.
	pub fn login_url(&self) -> Result<Url, ConfigError> {
		self.endpoint(&self.login_path)
	}

	fn validate(&self) -> Result<(), GatewayConfigError> {
		if !matches!(self.base_url.scheme(), "http" | "https") || self.base_url.cannot_be_a_base()
		{
			return Err(GatewayConfigError::UnsupportedScheme { url: self.base_url.to_string() });
		}
		if self.base_url.query().is_some() || self.base_url.fragment().is_some() {
			return Err(GatewayConfigError::BaseUrlHasQuery { url: self.base_url.to_string() });
		}

		validate_absolute("refresh path", &self.refresh_path)?;
		validate_absolute("login path", &self.login_path)?;
		validate_absolute("redirect target", &self.redirect_to)?;

		if self.request_timeout.is_some_and(|timeout| !timeout.is_positive()) {
			return Err(GatewayConfigError::NonPositiveTimeout);
		}

		Ok(())
	}
}

/// Builder for [`GatewayConfig`] values.
#[derive(Debug)]
pub struct GatewayConfigBuilder {
	config: GatewayConfig,
}
impl GatewayConfigBuilder {
	/// Creates a new builder seeded with defaults for everything but the base URL.
	pub fn new(base_url: Url) -> Self {
		Self {
			config: GatewayConfig {
				base_url,
				refresh_path: default_refresh_path(),
				login_path: default_login_path(),
				storage_key: StorageKey::default(),
				redirect_to: default_redirect_to(),
				request_timeout: None,
			},
		}
	}

	/// Overrides the refresh endpoint path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.config.refresh_path = path.into();

		self
	}

	/// Overrides the login endpoint path.
	pub fn login_path(mut self, path: impl Into<String>) -> Self {
		self.config.login_path = path.into();

		self
	}

	/// Overrides the credential storage slot.
	pub fn storage_key(mut self, key: StorageKey) -> Self {
		self.config.storage_key = key;

		self
	}

	/// Overrides the entry surface reported when a session ends.
	pub fn redirect_to(mut self, target: impl Into<String>) -> Self {
		self.config.redirect_to = target.into();

		self
	}

	/// Sets a per-request timeout.
	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.config.request_timeout = Some(timeout);

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<GatewayConfig, GatewayConfigError> {
		self.config.validate()?;

		Ok(self.config)
	}
}

fn default_refresh_path() -> String {
	DEFAULT_REFRESH_PATH.into()
}

fn default_login_path() -> String {
	DEFAULT_LOGIN_PATH.into()
}

fn default_redirect_to() -> String {
	DEFAULT_REDIRECT_TO.into()
}

fn validate_absolute(field: &'static str, value: &str) -> Result<(), GatewayConfigError> {
	if value.starts_with('/') {
		Ok(())
	} else {
		Err(GatewayConfigError::RelativePath { field, value: value.to_owned() })
	}
}

mod timeout_secs {
	// crates.io
	use serde::{Deserializer, Serializer};
	// self
	use crate::_prelude::*;

	pub(super) fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match value {
			Some(timeout) => serializer.serialize_some(&timeout.as_seconds_f64()),
			None => serializer.serialize_none(),
		}
	}

	pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
	where
		D: Deserializer<'de>,
	{
		Ok(<Option<f64>>::deserialize(deserializer)?.map(Duration::seconds_f64))
	}
}

// self
use crate::{
	_prelude::*,
	auth::Secret,
	config::{self, DEFAULT_CALL_TIMEOUT, DEFAULT_SCOPES, ProviderConfig, ProviderEndpoints},
	error::ConfigError,
};

/// Builder for [`ProviderConfig`] values.
///
/// Fields mirror the startup configuration surface, so the builder can be deserialized
/// straight from whatever the process loads its settings from.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ProviderConfigBuilder {
	/// Provider base URL.
	pub base_url: String,
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret.
	pub client_secret: Secret,
	/// OAuth callback URL; empty leaves it unset.
	pub redirect_url: String,
	/// CSRF state token.
	pub state: String,
	/// Provider admin API key.
	pub api_key: Secret,
	/// UI destination after a successful login.
	pub ui_redirect_url: String,
	/// UI destination after a failed login.
	pub ui_error_url: String,
	/// Ceiling for every outbound provider call.
	#[serde(skip)]
	pub call_timeout: StdDuration,
}
impl ProviderConfigBuilder {
	const DEFAULT_BASE_URL: &'static str = "http://localhost:4433";
	const DEFAULT_UI_ERROR_URL: &'static str = "http://localhost:9095/error";
	const DEFAULT_UI_REDIRECT_URL: &'static str = "http://localhost:9095/domains";

	/// Creates a builder seeded with `base_url` and default UI URLs.
	pub fn new(base_url: impl Into<String>) -> Self {
		Self { base_url: base_url.into(), ..Default::default() }
	}

	/// Sets the OAuth client credentials.
	pub fn client(mut self, id: impl Into<String>, secret: impl Into<Secret>) -> Self {
		self.client_id = id.into();
		self.client_secret = secret.into();

		self
	}

	/// Sets the OAuth callback URL.
	pub fn redirect_url(mut self, url: impl Into<String>) -> Self {
		self.redirect_url = url.into();

		self
	}

	/// Sets the CSRF state token.
	pub fn state(mut self, state: impl Into<String>) -> Self {
		self.state = state.into();

		self
	}

	/// Sets the provider admin API key.
	pub fn api_key(mut self, key: impl Into<Secret>) -> Self {
		self.api_key = key.into();

		self
	}

	/// Sets the UI redirect and error URLs.
	pub fn ui_urls(mut self, redirect: impl Into<String>, error: impl Into<String>) -> Self {
		self.ui_redirect_url = redirect.into();
		self.ui_error_url = error.into();

		self
	}

	/// Overrides the outbound call timeout.
	pub fn call_timeout(mut self, timeout: StdDuration) -> Self {
		self.call_timeout = timeout;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ProviderConfig, ConfigError> {
		if self.base_url.is_empty() {
			return Err(ConfigError::MissingField { field: "base_url" });
		}

		let endpoints = ProviderEndpoints::from_base(&self.base_url)?;
		let redirect_url = if self.redirect_url.is_empty() {
			None
		} else {
			Some(config::parse_url("redirect", &self.redirect_url)?)
		};
		let call_timeout =
			if self.call_timeout.is_zero() { DEFAULT_CALL_TIMEOUT } else { self.call_timeout };

		Ok(ProviderConfig {
			client_id: self.client_id,
			client_secret: self.client_secret,
			redirect_url,
			state: self.state,
			scopes: DEFAULT_SCOPES.iter().map(|scope| (*scope).to_owned()).collect(),
			endpoints,
			api_key: self.api_key,
			ui_redirect_url: config::parse_url("ui redirect", &self.ui_redirect_url)?,
			ui_error_url: config::parse_url("ui error", &self.ui_error_url)?,
			call_timeout,
		})
	}
}
impl Default for ProviderConfigBuilder {
	fn default() -> Self {
		Self {
			base_url: Self::DEFAULT_BASE_URL.into(),
			client_id: String::new(),
			client_secret: Secret::default(),
			redirect_url: String::new(),
			state: String::new(),
			api_key: Secret::default(),
			ui_redirect_url: Self::DEFAULT_UI_REDIRECT_URL.into(),
			ui_error_url: Self::DEFAULT_UI_ERROR_URL.into(),
			call_timeout: DEFAULT_CALL_TIMEOUT,
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn enabled_requires_both_client_credentials() {
		let missing_secret = ProviderConfig::builder("http://localhost:4433")
			.client("client-id", "")
			.build()
			.expect("Config without secret should still build.");

		assert!(!missing_secret.is_enabled());

		let missing_id = ProviderConfig::builder("http://localhost:4433")
			.client("", "secret")
			.build()
			.expect("Config without id should still build.");

		assert!(!missing_id.is_enabled());

		let complete = ProviderConfig::builder("http://localhost:4433")
			.client("client-id", "secret")
			.build()
			.expect("Complete config should build.");

		assert!(complete.is_enabled());
	}

	#[test]
	fn defaults_fill_in_scopes_timeout_and_ui_urls() {
		let config = ProviderConfig::builder("http://localhost:4433")
			.call_timeout(StdDuration::ZERO)
			.build()
			.expect("Default config should build.");

		assert_eq!(config.scope_string(), "email profile offline_access");
		assert_eq!(config.call_timeout, DEFAULT_CALL_TIMEOUT);
		assert_eq!(config.ui_redirect_url.as_str(), "http://localhost:9095/domains");
		assert_eq!(config.ui_error_url.as_str(), "http://localhost:9095/error");
		assert!(config.redirect_url.is_none());
	}

	#[test]
	fn deserialized_builder_validates_urls() {
		let builder: ProviderConfigBuilder = serde_json::from_str(
			r#"{"base_url":"http://kratos:4433","client_id":"id","client_secret":"secret","redirect_url":"http://localhost/oauth/callback/kratos","state":"csrf"}"#,
		)
		.expect("Builder should deserialize.");
		let config = builder.build().expect("Deserialized builder should build.");

		assert_eq!(config.state, "csrf");
		assert_eq!(
			config.redirect_url.as_ref().map(Url::as_str),
			Some("http://localhost/oauth/callback/kratos")
		);
		assert_eq!(config.call_timeout, DEFAULT_CALL_TIMEOUT);

		let err = ProviderConfig::builder("http://localhost:4433")
			.redirect_url("::not-a-url")
			.build()
			.expect_err("Invalid redirect must be rejected.");

		assert!(matches!(err, ConfigError::InvalidUrl { field: "redirect", .. }));
	}
}

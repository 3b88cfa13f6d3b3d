//! Startup configuration consumed by the provider and the bootstrap orchestrator.
//!
//! Loading values from the environment is the caller's job; these types only validate
//! what they are handed. [`ProviderConfigBuilder`] and [`BootstrapConfig`] implement
//! `Deserialize` so any loader (env, file, CLI) can feed them directly.

mod builder;

pub use builder::*;

// crates.io
use regex::Regex;
// self
use crate::{
	_prelude::*,
	auth::{AccountIdentity, Secret},
	error::ConfigError,
};

/// Scopes requested at login and echoed verbatim on refresh.
pub const DEFAULT_SCOPES: [&str; 3] = ["email", "profile", "offline_access"];
/// Default ceiling applied to every outbound provider call.
pub const DEFAULT_CALL_TIMEOUT: StdDuration = StdDuration::from_secs(60);
/// Default administrator identity.
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";
/// Default administrator password.
pub const DEFAULT_ADMIN_PASSWORD: &str = "12345678";
/// Default password policy: at least eight characters.
pub const DEFAULT_PASSWORD_POLICY: &str = "^.{8,}$";
/// Default authorization object representing the whole platform.
pub const DEFAULT_PLATFORM_OBJECT: &str = "platform";

/// Endpoint set derived from the provider base URL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProviderEndpoints {
	/// Provider base URL every endpoint hangs off.
	pub base: Url,
	/// Authorization endpoint (`/oauth2/auth`).
	pub authorization: Url,
	/// Token endpoint (`/oauth2/token`).
	pub token: Url,
	/// Userinfo endpoint (`/userinfo`).
	pub userinfo: Url,
	/// Token introspection endpoint (`/admin/oauth2/introspect`).
	pub introspection: Url,
}
impl ProviderEndpoints {
	const AUTHORIZATION_PATH: &'static str = "/oauth2/auth";
	const INTROSPECTION_PATH: &'static str = "/admin/oauth2/introspect";
	const TOKEN_PATH: &'static str = "/oauth2/token";
	const USERINFO_PATH: &'static str = "/userinfo";

	/// Derives all endpoints from `base`.
	pub fn from_base(base: &str) -> Result<Self, ConfigError> {
		let trimmed = base.trim_end_matches('/');

		Ok(Self {
			base: parse_url("provider base", trimmed)?,
			authorization: join("authorization", trimmed, Self::AUTHORIZATION_PATH)?,
			token: join("token", trimmed, Self::TOKEN_PATH)?,
			userinfo: join("userinfo", trimmed, Self::USERINFO_PATH)?,
			introspection: join("introspection", trimmed, Self::INTROSPECTION_PATH)?,
		})
	}
}

/// Immutable provider configuration shared by every request.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret.
	pub client_secret: Secret,
	/// OAuth redirect (callback) URL registered with the provider.
	pub redirect_url: Option<Url>,
	/// CSRF state token echoed through the authorization redirect.
	pub state: String,
	/// Fixed scope set.
	pub scopes: Vec<String>,
	/// Provider endpoints.
	pub endpoints: ProviderEndpoints,
	/// Bearer credential for the provider admin API (introspection).
	pub api_key: Secret,
	/// UI destination after a successful login.
	pub ui_redirect_url: Url,
	/// UI destination after a failed login.
	pub ui_error_url: Url,
	/// Ceiling applied to every outbound provider call.
	pub call_timeout: StdDuration,
}
impl ProviderConfig {
	/// Creates a new builder for the provided base URL.
	pub fn builder(base_url: impl Into<String>) -> ProviderConfigBuilder {
		ProviderConfigBuilder::new(base_url)
	}

	/// The provider is usable only when both client credentials are configured.
	pub fn is_enabled(&self) -> bool {
		!self.client_id.is_empty() && !self.client_secret.is_empty()
	}

	/// Scopes joined with the provider delimiter (a single space).
	pub fn scope_string(&self) -> String {
		self.scopes.join(" ")
	}
}

/// Regular-expression password policy.
#[derive(Clone, Debug)]
pub struct PasswordPolicy(Regex);
impl PasswordPolicy {
	/// Compiles a policy from `pattern`.
	pub fn new(pattern: &str) -> Result<Self, ConfigError> {
		Ok(Self(Regex::new(pattern)?))
	}

	/// Returns `true` when `password` satisfies the policy.
	pub fn allows(&self, password: &Secret) -> bool {
		self.0.is_match(password.expose())
	}

	/// Source pattern.
	pub fn pattern(&self) -> &str {
		self.0.as_str()
	}
}
impl Serialize for PasswordPolicy {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.serialize_str(self.pattern())
	}
}
impl<'de> Deserialize<'de> for PasswordPolicy {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		let pattern = String::deserialize(deserializer)?;

		Self::new(&pattern).map_err(serde::de::Error::custom)
	}
}

/// Inputs for the administrator bootstrap.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BootstrapConfig {
	/// Administrator login identity.
	pub admin_email: AccountIdentity,
	/// Administrator password.
	pub admin_password: Secret,
	/// Policy the administrator password must satisfy.
	pub password_policy: PasswordPolicy,
	/// Authorization object the administrator relation is granted on.
	#[serde(default = "default_platform_object")]
	pub platform_object: String,
}
impl BootstrapConfig {
	/// Builds a configuration with the default password policy and platform object.
	pub fn new(admin_email: &str, admin_password: impl Into<Secret>) -> Result<Self, ConfigError> {
		Ok(Self {
			admin_email: AccountIdentity::new(admin_email)?,
			admin_password: admin_password.into(),
			password_policy: PasswordPolicy::new(DEFAULT_PASSWORD_POLICY)?,
			platform_object: default_platform_object(),
		})
	}

	/// Replaces the password policy.
	pub fn with_password_policy(mut self, policy: PasswordPolicy) -> Self {
		self.password_policy = policy;

		self
	}

	/// Replaces the platform object name.
	pub fn with_platform_object(mut self, object: impl Into<String>) -> Self {
		self.platform_object = object.into();

		self
	}

	/// Checks the administrator password against the policy.
	pub fn validate_password(&self) -> Result<(), ConfigError> {
		if self.password_policy.allows(&self.admin_password) {
			Ok(())
		} else {
			Err(ConfigError::WeakAdminPassword {
				pattern: self.password_policy.pattern().to_owned(),
			})
		}
	}
}

fn default_platform_object() -> String {
	DEFAULT_PLATFORM_OBJECT.into()
}

pub(crate) fn parse_url(field: &'static str, value: &str) -> Result<Url, ConfigError> {
	Url::parse(value).map_err(|source| ConfigError::InvalidUrl {
		field,
		value: value.to_owned(),
		source,
	})
}

fn join(field: &'static str, base: &str, path: &str) -> Result<Url, ConfigError> {
	parse_url(field, &format!("{base}{path}"))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn endpoints_hang_off_the_base_path() {
		let endpoints = ProviderEndpoints::from_base("http://localhost:4433/")
			.expect("Base URL fixture should parse.");

		assert_eq!(endpoints.authorization.as_str(), "http://localhost:4433/oauth2/auth");
		assert_eq!(endpoints.token.as_str(), "http://localhost:4433/oauth2/token");
		assert_eq!(endpoints.userinfo.as_str(), "http://localhost:4433/userinfo");
		assert_eq!(
			endpoints.introspection.as_str(),
			"http://localhost:4433/admin/oauth2/introspect"
		);

		let prefixed = ProviderEndpoints::from_base("https://idp.example.com/ory")
			.expect("Prefixed base URL should parse.");

		assert_eq!(prefixed.token.as_str(), "https://idp.example.com/ory/oauth2/token");
	}

	#[test]
	fn invalid_base_is_reported_by_field() {
		let err = ProviderEndpoints::from_base("not a url").expect_err("Garbage must not parse.");

		assert!(matches!(err, ConfigError::InvalidUrl { field: "provider base", .. }));
	}

	#[test]
	fn default_policy_requires_eight_characters() {
		let config = BootstrapConfig::new(DEFAULT_ADMIN_EMAIL, DEFAULT_ADMIN_PASSWORD)
			.expect("Default bootstrap config should build.");

		assert!(config.validate_password().is_ok());
		assert_eq!(config.platform_object, DEFAULT_PLATFORM_OBJECT);

		let weak = BootstrapConfig::new(DEFAULT_ADMIN_EMAIL, "1234567")
			.expect("Weak password still builds a config.");

		assert!(matches!(weak.validate_password(), Err(ConfigError::WeakAdminPassword { .. })));
	}

	#[test]
	fn bootstrap_config_deserializes_with_validation() {
		let config: BootstrapConfig = serde_json::from_str(
			r#"{"admin_email":"root@example.com","admin_password":"correct horse","password_policy":"^.{12,}$"}"#,
		)
		.expect("Bootstrap config should deserialize.");

		assert_eq!(config.admin_email.as_ref(), "root@example.com");
		assert_eq!(config.password_policy.pattern(), "^.{12,}$");
		assert_eq!(config.platform_object, DEFAULT_PLATFORM_OBJECT);
		assert!(config.validate_password().is_ok());
		assert!(
			serde_json::from_str::<BootstrapConfig>(
				r#"{"admin_email":"root@example.com","admin_password":"x","password_policy":"("}"#,
			)
			.is_err()
		);
	}
}

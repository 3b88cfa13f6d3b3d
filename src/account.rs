//! Internal account records and their derivation from provider identities.

// self
use crate::{
	_prelude::*,
	auth::{AccountId, AccountIdentity, Secret},
};

/// Free-form account metadata.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Metadata key recording which provider federated an account.
pub const OAUTH_PROVIDER_KEY: &str = "oauth_provider";

/// Platform role held by an account.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
	#[default]
	/// Regular user.
	User,
	/// Platform administrator.
	Admin,
}

/// Lifecycle status of an account.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
	#[default]
	/// Account may log in.
	Enabled,
	/// Account is blocked.
	Disabled,
}

/// Login credentials attached to an account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
	/// Login identity (email).
	pub identity: AccountIdentity,
	/// Password; empty for federated accounts.
	#[serde(default)]
	pub secret: Secret,
}

/// Internal account record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
	/// Account identifier.
	pub id: AccountId,
	/// Display name.
	pub name: String,
	/// Login credentials.
	pub credentials: Credentials,
	/// Free-form metadata.
	#[serde(default)]
	pub metadata: Metadata,
	/// Platform role.
	#[serde(default)]
	pub role: Role,
	/// Lifecycle status.
	#[serde(default)]
	pub status: Status,
	/// Creation instant.
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	/// Last update instant.
	#[serde(with = "time::serde::rfc3339")]
	pub updated_at: OffsetDateTime,
}
impl Account {
	/// Display name given to the bootstrap administrator.
	pub const ADMIN_NAME: &'static str = "admin-client";

	/// Derives the account record for a federated login.
	///
	/// The record is keyed by the provider subject, uses the email as identity, and is
	/// tagged with the originating provider. Any empty attribute rejects the identity with
	/// an authentication error; a partially populated record is never produced.
	pub fn from_external(identity: ExternalIdentity, provider: &str) -> Result<Self> {
		if identity.subject.is_empty() || identity.name.is_empty() || identity.email.is_empty() {
			return Err(Error::authentication("identity provider returned an incomplete identity"));
		}

		let id = AccountId::new(&identity.subject).map_err(Error::authentication)?;
		let email = AccountIdentity::new(&identity.email).map_err(Error::authentication)?;
		let mut metadata = Metadata::new();

		metadata.insert(OAUTH_PROVIDER_KEY.into(), provider.into());

		let now = OffsetDateTime::now_utc();

		Ok(Self {
			id,
			name: identity.name,
			credentials: Credentials { identity: email, secret: Secret::default() },
			metadata,
			role: Role::User,
			status: Status::Enabled,
			created_at: now,
			updated_at: now,
		})
	}

	/// Builds the administrator account created during bootstrap.
	pub fn admin(id: AccountId, identity: AccountIdentity, password: Secret) -> Self {
		let mut metadata = Metadata::new();

		metadata.insert("role".into(), "admin".into());

		let now = OffsetDateTime::now_utc();

		Self {
			id,
			name: Self::ADMIN_NAME.into(),
			credentials: Credentials { identity, secret: password },
			metadata,
			role: Role::Admin,
			status: Status::Enabled,
			created_at: now,
			updated_at: now,
		}
	}

	/// Returns the provider that federated this account, if any.
	pub fn oauth_provider(&self) -> Option<&str> {
		self.metadata.get(OAUTH_PROVIDER_KEY).and_then(serde_json::Value::as_str)
	}
}

/// Identity attributes reported by the provider's userinfo endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIdentity {
	/// Provider subject identifier.
	#[serde(rename = "sub", default)]
	pub subject: String,
	/// Preferred display name.
	#[serde(rename = "preferred_username", default)]
	pub name: String,
	/// Email address.
	#[serde(default)]
	pub email: String,
}

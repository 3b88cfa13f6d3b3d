//! Startup bootstrap of the platform administrator and its authorization policy.
//!
//! [`AdminBootstrap`] consumes three collaborators, each behind an object-safe trait so
//! the process can plug in its database repository, its credential service, and its
//! policy engine client:
//!
//! - [`AccountRepository`] looks accounts up by identity and persists new ones.
//! - [`CredentialIssuer`] issues a token for the freshly created administrator, proving
//!   its credentials are usable.
//! - [`AuthorizationService`] checks and adds policy tuples.
//!
//! In-process implementations live in [`memory`].

pub mod memory;
pub mod orchestrator;

pub use memory::*;
pub use orchestrator::*;

// self
use crate::{
	_prelude::*,
	account::Account,
	auth::{AccountId, AccountIdentity, Secret, Token},
};

/// Boxed future returned by bootstrap collaborators.
pub type CollaboratorFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + 'a + Send>>;

/// Account persistence consumed by the bootstrap.
pub trait AccountRepository
where
	Self: Send + Sync,
{
	/// Looks up the account holding `identity`.
	fn retrieve_by_identity<'a>(
		&'a self,
		identity: &'a AccountIdentity,
	) -> CollaboratorFuture<'a, Option<Account>, RepositoryError>;

	/// Persists `account`, returning the stored identifier.
	///
	/// Must report [`RepositoryError::Conflict`] when the identity is already taken.
	fn save(&self, account: Account) -> CollaboratorFuture<'_, AccountId, RepositoryError>;
}

/// Error type produced by [`AccountRepository`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum RepositoryError {
	/// The identity is already held by another account.
	#[error("An account with identity {identity} already exists.")]
	Conflict {
		/// Conflicting identity.
		identity: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Account repository failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Credential service consumed by the bootstrap.
pub trait CredentialIssuer
where
	Self: Send + Sync,
{
	/// Issues a token for `identity` authenticated by `secret`, scoped to `scope`
	/// (empty for platform-wide).
	fn issue_token<'a>(
		&'a self,
		identity: &'a AccountIdentity,
		secret: &'a Secret,
		scope: &'a str,
	) -> CollaboratorFuture<'a, Token, CredentialError>;
}

/// Error type produced by [`CredentialIssuer`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CredentialError {
	/// Identity or secret did not match a known account.
	#[error("Credentials for {identity} were rejected.")]
	Rejected {
		/// Identity that failed to authenticate.
		identity: String,
	},
	/// Backend-level failure for the credential service.
	#[error("Credential service failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Policy engine consumed by the bootstrap.
pub trait AuthorizationService
where
	Self: Send + Sync,
{
	/// Returns whether the tuple in `request` currently holds.
	fn authorize<'a>(
		&'a self,
		request: &'a PolicyRequest,
	) -> CollaboratorFuture<'a, bool, AuthorizationError>;

	/// Adds the tuple in `request`, returning whether it was added.
	fn add_policy<'a>(
		&'a self,
		request: &'a PolicyRequest,
	) -> CollaboratorFuture<'a, bool, AuthorizationError>;
}

/// Error type produced by [`AuthorizationService`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum AuthorizationError {
	/// Backend-level failure for the policy engine.
	#[error("Authorization service failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Relationship tuple checked and granted by the bootstrap.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyRequest {
	/// Subject type (`user`).
	pub subject_type: String,
	/// Subject identifier.
	pub subject: String,
	/// Relation (or permission, when checking).
	pub relation: String,
	/// Object identifier.
	pub object: String,
	/// Object type (`platform`).
	pub object_type: String,
}
impl PolicyRequest {
	/// Relation granting full control over the platform.
	pub const ADMINISTRATOR_RELATION: &'static str = "administrator";
	/// Object type of the platform object.
	pub const PLATFORM_OBJECT_TYPE: &'static str = "platform";
	/// Subject type of user accounts.
	pub const USER_SUBJECT_TYPE: &'static str = "user";

	/// Tuple making `subject` administrator of the platform `object`.
	pub fn administrator(subject: &AccountId, object: &str) -> Self {
		Self {
			subject_type: Self::USER_SUBJECT_TYPE.into(),
			subject: subject.to_string(),
			relation: Self::ADMINISTRATOR_RELATION.into(),
			object: object.into(),
			object_type: Self::PLATFORM_OBJECT_TYPE.into(),
		}
	}
}

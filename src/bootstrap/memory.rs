//! Thread-safe in-memory collaborators for local development and tests.
//!
//! Each implementation counts its calls so callers can assert how much work a bootstrap
//! run performed.

// std
use std::{
	collections::HashSet,
	sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};
// crates.io
use uuid::Uuid;
// self
use crate::{
	_prelude::*,
	account::Account,
	auth::{AccountId, AccountIdentity, Secret, Token},
	bootstrap::{
		AccountRepository, AuthorizationError, AuthorizationService, CollaboratorFuture,
		CredentialError, CredentialIssuer, PolicyRequest, RepositoryError,
	},
};

type AccountMap = Arc<RwLock<HashMap<AccountIdentity, Account>>>;

/// Account repository keyed by identity.
#[derive(Debug, Default)]
pub struct MemoryAccountRepository {
	accounts: AccountMap,
	reads: AtomicUsize,
	saves: AtomicUsize,
}
impl MemoryAccountRepository {
	/// Inserts `account` directly, bypassing the conflict check and call counters.
	pub fn seed(&self, account: Account) {
		self.accounts.write().insert(account.credentials.identity.clone(), account);
	}

	/// Returns the stored account for `identity`.
	pub fn get(&self, identity: &AccountIdentity) -> Option<Account> {
		self.accounts.read().get(identity).cloned()
	}

	/// Number of stored accounts.
	pub fn len(&self) -> usize {
		self.accounts.read().len()
	}

	/// Returns `true` when no account is stored.
	pub fn is_empty(&self) -> bool {
		self.accounts.read().is_empty()
	}

	/// Calls made to [`AccountRepository::retrieve_by_identity`].
	pub fn reads(&self) -> usize {
		self.reads.load(Ordering::SeqCst)
	}

	/// Calls made to [`AccountRepository::save`].
	pub fn saves(&self) -> usize {
		self.saves.load(Ordering::SeqCst)
	}

	fn save_now(map: &AccountMap, account: Account) -> Result<AccountId, RepositoryError> {
		let mut guard = map.write();

		if guard.contains_key(&account.credentials.identity) {
			return Err(RepositoryError::Conflict {
				identity: account.credentials.identity.to_string(),
			});
		}

		let id = account.id.clone();

		guard.insert(account.credentials.identity.clone(), account);

		Ok(id)
	}
}
impl AccountRepository for MemoryAccountRepository {
	fn retrieve_by_identity<'a>(
		&'a self,
		identity: &'a AccountIdentity,
	) -> CollaboratorFuture<'a, Option<Account>, RepositoryError> {
		self.reads.fetch_add(1, Ordering::SeqCst);

		let found = self.get(identity);

		Box::pin(async move { Ok(found) })
	}

	fn save(&self, account: Account) -> CollaboratorFuture<'_, AccountId, RepositoryError> {
		self.saves.fetch_add(1, Ordering::SeqCst);

		let map = self.accounts.clone();

		Box::pin(async move { Self::save_now(&map, account) })
	}
}

/// Credential issuer that checks secrets against a [`MemoryAccountRepository`].
#[derive(Debug)]
pub struct MemoryCredentialIssuer {
	accounts: Arc<MemoryAccountRepository>,
	issued: AtomicUsize,
}
impl MemoryCredentialIssuer {
	/// Authenticates against `accounts`.
	pub fn new(accounts: Arc<MemoryAccountRepository>) -> Self {
		Self { accounts, issued: AtomicUsize::new(0) }
	}

	/// Tokens issued so far.
	pub fn issued(&self) -> usize {
		self.issued.load(Ordering::SeqCst)
	}
}
impl CredentialIssuer for MemoryCredentialIssuer {
	fn issue_token<'a>(
		&'a self,
		identity: &'a AccountIdentity,
		secret: &'a Secret,
		_scope: &'a str,
	) -> CollaboratorFuture<'a, Token, CredentialError> {
		Box::pin(async move {
			let account = self
				.accounts
				.get(identity)
				.filter(|account| account.credentials.secret == *secret)
				.ok_or_else(|| CredentialError::Rejected { identity: identity.to_string() })?;

			self.issued.fetch_add(1, Ordering::SeqCst);

			Ok(Token {
				access_token: Secret::new(format!("{}.{}", account.id, Uuid::new_v4())),
				refresh_token: Some(Secret::new(Uuid::new_v4().to_string())),
				token_type: "bearer".into(),
				expires_at: OffsetDateTime::now_utc().checked_add(Duration::hours(1)),
			})
		})
	}
}

/// Policy engine holding tuples in a set.
#[derive(Debug, Default)]
pub struct MemoryAuthorizationService {
	policies: RwLock<HashSet<PolicyRequest>>,
	reject_grants: AtomicBool,
	unavailable: AtomicBool,
	authorize_calls: AtomicUsize,
	add_policy_calls: AtomicUsize,
}
impl MemoryAuthorizationService {
	/// Makes [`AuthorizationService::add_policy`] report `added = false`.
	pub fn reject_grants(&self, reject: bool) {
		self.reject_grants.store(reject, Ordering::SeqCst);
	}

	/// Makes every call fail with a backend error.
	pub fn set_unavailable(&self, unavailable: bool) {
		self.unavailable.store(unavailable, Ordering::SeqCst);
	}

	/// Returns `true` when `request` is stored.
	pub fn contains(&self, request: &PolicyRequest) -> bool {
		self.policies.read().contains(request)
	}

	/// Calls made to [`AuthorizationService::authorize`].
	pub fn authorize_calls(&self) -> usize {
		self.authorize_calls.load(Ordering::SeqCst)
	}

	/// Calls made to [`AuthorizationService::add_policy`].
	pub fn add_policy_calls(&self) -> usize {
		self.add_policy_calls.load(Ordering::SeqCst)
	}

	fn ensure_available(&self) -> Result<(), AuthorizationError> {
		if self.unavailable.load(Ordering::SeqCst) {
			Err(AuthorizationError::Backend { message: "policy engine unavailable".into() })
		} else {
			Ok(())
		}
	}
}
impl AuthorizationService for MemoryAuthorizationService {
	fn authorize<'a>(
		&'a self,
		request: &'a PolicyRequest,
	) -> CollaboratorFuture<'a, bool, AuthorizationError> {
		self.authorize_calls.fetch_add(1, Ordering::SeqCst);

		Box::pin(async move {
			self.ensure_available()?;

			Ok(self.contains(request))
		})
	}

	fn add_policy<'a>(
		&'a self,
		request: &'a PolicyRequest,
	) -> CollaboratorFuture<'a, bool, AuthorizationError> {
		self.add_policy_calls.fetch_add(1, Ordering::SeqCst);

		Box::pin(async move {
			self.ensure_available()?;

			if self.reject_grants.load(Ordering::SeqCst) {
				return Ok(false);
			}

			self.policies.write().insert(request.clone());

			Ok(true)
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn account(identity: &str, secret: &str) -> Account {
		Account::admin(
			AccountId::new("acc-1").expect("Account id fixture should be valid."),
			AccountIdentity::new(identity).expect("Identity fixture should be valid."),
			Secret::from(secret),
		)
	}

	#[tokio::test]
	async fn save_rejects_duplicate_identity() {
		let repository = MemoryAccountRepository::default();
		let id = repository
			.save(account("admin@example.com", "12345678"))
			.await
			.expect("First save should succeed.");

		assert_eq!(id.as_ref(), "acc-1");

		let err = repository
			.save(account("admin@example.com", "other-password"))
			.await
			.expect_err("Second save must conflict.");

		assert!(matches!(err, RepositoryError::Conflict { .. }));
		assert_eq!(repository.len(), 1);
		assert_eq!(repository.saves(), 2);
	}

	#[tokio::test]
	async fn issuer_checks_secret() {
		let repository = Arc::new(MemoryAccountRepository::default());

		repository.seed(account("admin@example.com", "12345678"));

		let issuer = MemoryCredentialIssuer::new(repository);
		let identity =
			AccountIdentity::new("admin@example.com").expect("Identity fixture should be valid.");
		let token = issuer
			.issue_token(&identity, &Secret::from("12345678"), "")
			.await
			.expect("Matching secret should issue a token.");

		assert!(token.has_refresh_token());
		assert!(token.access_token.expose().starts_with("acc-1."));
		assert!(matches!(
			issuer.issue_token(&identity, &Secret::from("wrong"), "").await,
			Err(CredentialError::Rejected { .. })
		));
		assert_eq!(issuer.issued(), 1);
	}

	#[tokio::test]
	async fn authorization_tracks_policies() {
		let service = MemoryAuthorizationService::default();
		let id = AccountId::new("acc-1").expect("Account id fixture should be valid.");
		let request = PolicyRequest::administrator(&id, "platform");

		assert!(!service.authorize(&request).await.expect("Check should succeed."));
		assert!(service.add_policy(&request).await.expect("Grant should succeed."));
		assert!(service.authorize(&request).await.expect("Check should succeed."));

		service.set_unavailable(true);

		assert!(service.authorize(&request).await.is_err());
		assert_eq!(service.authorize_calls(), 3);
		assert_eq!(service.add_policy_calls(), 1);
	}
}

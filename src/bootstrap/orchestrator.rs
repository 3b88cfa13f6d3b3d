//! Administrator bootstrap state machine.

// crates.io
use uuid::Uuid;
// self
use crate::{
	_prelude::*,
	account::Account,
	auth::AccountId,
	bootstrap::{
		AccountRepository, AuthorizationService, CredentialIssuer, PolicyRequest, RepositoryError,
	},
	config::BootstrapConfig,
	error::ConfigError,
	obs::{self, Operation, OperationOutcome, OperationSpan},
};

/// Position of the bootstrap in its state machine.
///
/// Failures leave the machine through an error instead of a state; logs label that exit
/// `fatal`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BootstrapState {
	/// Looking the administrator up by identity.
	Check,
	/// Creating the administrator account.
	Create,
	/// Checking the administrator relation for the account.
	AuthorizedCheck(AccountId),
	/// Adding the administrator relation.
	Grant(AccountId),
	/// Administrator exists and holds the relation.
	Done(AccountId),
}
impl BootstrapState {
	/// Stable label used in transition logs.
	pub const fn label(&self) -> &'static str {
		match self {
			Self::Check => "check",
			Self::Create => "create",
			Self::AuthorizedCheck(_) => "authorized_check",
			Self::Grant(_) => "grant",
			Self::Done(_) => "done",
		}
	}
}

/// Ensures the administrator account exists and holds the platform administrator relation.
///
/// Safe to run on every start: against an already bootstrapped deployment it performs one
/// repository read and one authorization check, and mutates nothing.
pub struct AdminBootstrap {
	config: BootstrapConfig,
	accounts: Arc<dyn AccountRepository>,
	credentials: Arc<dyn CredentialIssuer>,
	authorization: Arc<dyn AuthorizationService>,
}
impl AdminBootstrap {
	const FATAL: &'static str = "fatal";

	/// Wires the bootstrap to its collaborators.
	pub fn new(
		config: BootstrapConfig,
		accounts: Arc<dyn AccountRepository>,
		credentials: Arc<dyn CredentialIssuer>,
		authorization: Arc<dyn AuthorizationService>,
	) -> Self {
		Self { config, accounts, credentials, authorization }
	}

	/// Bootstrap configuration.
	pub fn config(&self) -> &BootstrapConfig {
		&self.config
	}

	/// Runs the state machine to completion and returns the administrator's id.
	pub async fn run(&self) -> Result<AccountId> {
		let span = OperationSpan::new(Operation::Bootstrap, "run");

		obs::record_operation_outcome(Operation::Bootstrap, OperationOutcome::Attempt);

		let result = span.instrument(self.drive()).await;

		obs::record_operation_outcome(Operation::Bootstrap, OperationOutcome::of(&result));

		result
	}

	async fn drive(&self) -> Result<AccountId> {
		let mut state = BootstrapState::Check;

		loop {
			let from = state.label();
			let next = match self.step(state).await {
				Ok(next) => next,
				Err(err) => {
					obs::record_transition(from, Self::FATAL, &err.to_string());

					return Err(err);
				},
			};

			match next {
				BootstrapState::Done(id) => {
					obs::record_transition(from, "done", &id);

					return Ok(id);
				},
				next => {
					obs::record_transition(from, next.label(), "");

					state = next;
				},
			}
		}
	}

	async fn step(&self, state: BootstrapState) -> Result<BootstrapState> {
		match state {
			BootstrapState::Check => self.check().await,
			BootstrapState::Create => self.create().await,
			BootstrapState::AuthorizedCheck(id) => Ok(self.authorized_check(id).await),
			BootstrapState::Grant(id) => self.grant(id).await,
			BootstrapState::Done(id) => Ok(BootstrapState::Done(id)),
		}
	}

	async fn check(&self) -> Result<BootstrapState> {
		let existing = self.accounts.retrieve_by_identity(&self.config.admin_email).await?;

		Ok(match existing {
			Some(account) => BootstrapState::AuthorizedCheck(account.id),
			None => BootstrapState::Create,
		})
	}

	async fn create(&self) -> Result<BootstrapState> {
		self.config.validate_password()?;

		let id = AccountId::new(Uuid::new_v4().to_string()).map_err(ConfigError::from)?;
		let account = Account::admin(
			id,
			self.config.admin_email.clone(),
			self.config.admin_password.clone(),
		);
		let id = match self.accounts.save(account).await {
			Ok(id) => id,
			// Another replica won the race; adopt its account.
			Err(err @ RepositoryError::Conflict { .. }) => {
				obs::record_bootstrap_warning("create", &err);

				return self.adopt_existing().await;
			},
			Err(err) => return Err(err.into()),
		};

		self.credentials
			.issue_token(&self.config.admin_email, &self.config.admin_password, "")
			.await?;

		Ok(BootstrapState::AuthorizedCheck(id))
	}

	async fn adopt_existing(&self) -> Result<BootstrapState> {
		let account =
			self.accounts.retrieve_by_identity(&self.config.admin_email).await?.ok_or_else(|| {
				RepositoryError::Backend {
					message: format!(
						"account {} reported as conflicting but not found",
						self.config.admin_email
					),
				}
			})?;

		Ok(BootstrapState::AuthorizedCheck(account.id))
	}

	async fn authorized_check(&self, id: AccountId) -> BootstrapState {
		let request = PolicyRequest::administrator(&id, &self.config.platform_object);

		match self.authorization.authorize(&request).await {
			Ok(true) => BootstrapState::Done(id),
			Ok(false) => BootstrapState::Grant(id),
			Err(err) => {
				obs::record_bootstrap_warning("authorized_check", &err);

				BootstrapState::Grant(id)
			},
		}
	}

	async fn grant(&self, id: AccountId) -> Result<BootstrapState> {
		let request = PolicyRequest::administrator(&id, &self.config.platform_object);

		match self.authorization.add_policy(&request).await {
			Ok(true) => Ok(BootstrapState::Done(id)),
			Ok(false) => Err(Error::authorization(format!(
				"the administrator relation for {id} was not added"
			))),
			Err(err) => Err(Error::authorization(err)),
		}
	}
}
impl Debug for AdminBootstrap {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AdminBootstrap")
			.field("admin_email", &self.config.admin_email)
			.field("platform_object", &self.config.platform_object)
			.finish_non_exhaustive()
	}
}

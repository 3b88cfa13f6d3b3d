//! Identity-provider capability contract and its Ory Kratos/Hydra implementation.
//!
//! The HTTP layer holds an `Arc<dyn IdentityProvider>` and never branches on a provider
//! name; a new backend is a new implementation of [`IdentityProvider`].

pub mod kratos;

pub use kratos::*;

// self
use crate::{_prelude::*, account::Account, auth::Token};

/// Boxed future returned by [`IdentityProvider`] operations.
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Capabilities every identity-provider integration exposes to the HTTP layer.
pub trait IdentityProvider
where
	Self: Send + Sync,
{
	/// Stable provider name, recorded on federated accounts.
	fn name(&self) -> &str;

	/// CSRF state token echoed through the authorization redirect.
	fn state(&self) -> &str;

	/// UI destination after a successful login.
	fn redirect_url(&self) -> &Url;

	/// UI destination after a failed login.
	fn error_url(&self) -> &Url;

	/// Whether client credentials are configured.
	fn is_enabled(&self) -> bool;

	/// Authorization redirect the browser is sent to.
	fn authorization_url(&self) -> Url;

	/// Exchanges an authorization `code` and resolves the caller's account.
	fn user_details<'a>(&'a self, code: &'a str) -> ProviderFuture<'a, (Account, Token)>;

	/// Succeeds only when the provider reports `token` as active.
	fn validate<'a>(&'a self, token: &'a str) -> ProviderFuture<'a, ()>;

	/// Trades `refresh_token` for a new token.
	fn refresh<'a>(&'a self, refresh_token: &'a str) -> ProviderFuture<'a, Token>;
}

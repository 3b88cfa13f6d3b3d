//! Ory Kratos/Hydra integration.

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
// self
use crate::{
	_prelude::*,
	account::{Account, ExternalIdentity},
	auth::{Secret, Token, TokenResponseBody},
	config::ProviderConfig,
	error::ConfigError,
	http::{FormBody, ReqwestHttpClient},
	normalize,
	oauth::CodeExchange,
	obs::{self, Operation, OperationOutcome, OperationSpan},
	provider::{IdentityProvider, ProviderFuture},
};

const USERINFO: &str = "userinfo";
const INTROSPECT: &str = "introspect";
const REFRESH: &str = "refresh";

#[derive(Debug, Deserialize)]
struct IntrospectionBody {
	active: bool,
}

/// [`IdentityProvider`] backed by an Ory deployment.
pub struct KratosProvider {
	config: Arc<ProviderConfig>,
	http_client: ReqwestHttpClient,
	exchange: CodeExchange,
}
impl KratosProvider {
	/// Name recorded in the `oauth_provider` metadata of federated accounts.
	pub const NAME: &'static str = "kratos";

	/// Builds a provider with a fresh HTTP client bounded by the configured call timeout.
	pub fn new(config: ProviderConfig) -> Result<Self, ConfigError> {
		let http_client = ReqwestHttpClient::new(config.call_timeout)?;

		Self::with_http_client(Arc::new(config), http_client)
	}

	/// Builds a provider that shares an existing HTTP client.
	pub fn with_http_client(
		config: Arc<ProviderConfig>,
		http_client: ReqwestHttpClient,
	) -> Result<Self, ConfigError> {
		let exchange = CodeExchange::from_config(&config, http_client.clone())?;

		Ok(Self { config, http_client, exchange })
	}

	/// Shared configuration.
	pub fn config(&self) -> &ProviderConfig {
		&self.config
	}

	async fn user_details_now(&self, code: &str) -> Result<(Account, Token)> {
		let token = self.exchange.exchange(code).await?;

		if !token.has_refresh_token() {
			return Err(Error::authentication("the token endpoint issued no refresh token"));
		}

		let identity = self.fetch_identity(&token.access_token).await?;
		let account = Account::from_external(identity, Self::NAME)?;

		Ok((account, token))
	}

	async fn fetch_identity(&self, access_token: &Secret) -> Result<ExternalIdentity> {
		let mut url = self.config.endpoints.userinfo.clone();

		url.query_pairs_mut().append_pair("access_token", access_token.expose());

		let request = self.http_client.get(url).header(ACCEPT, "application/json");
		let response = self.http_client.send(USERINFO, request).await?;

		if !response.is_success() {
			return Err(normalize::rejection(USERINFO, response.status_code(), &response.body));
		}

		Ok(normalize::decode(USERINFO, Some(response.status_code()), &response.body)?)
	}

	async fn validate_now(&self, token: &str) -> Result<()> {
		let body = FormBody::default().append("token", token).finish();
		let mut request = self
			.http_client
			.post(self.config.endpoints.introspection.clone())
			.header(CONTENT_TYPE, FormBody::CONTENT_TYPE)
			.header(ACCEPT, "application/json")
			.body(body);

		if !self.config.api_key.is_empty() {
			request = request.bearer_auth(self.config.api_key.expose());
		}

		let response = self.http_client.send(INTROSPECT, request).await?;

		if !response.is_success() {
			return Err(normalize::error_response(
				INTROSPECT,
				response.status_code(),
				&response.body,
			));
		}

		let introspection: IntrospectionBody =
			normalize::decode(INTROSPECT, Some(response.status_code()), &response.body)?;

		if introspection.active { Ok(()) } else { Err(Error::authentication("token is inactive")) }
	}

	async fn refresh_now(&self, refresh_token: &str) -> Result<Token> {
		let body = FormBody::default()
			.append("grant_type", "refresh_token")
			.append("refresh_token", refresh_token)
			.append("scope", &self.config.scope_string())
			.finish();
		let request = self
			.http_client
			.post(self.config.endpoints.token.clone())
			.header(AUTHORIZATION, self.basic_credentials())
			.header(CONTENT_TYPE, FormBody::CONTENT_TYPE)
			.header(ACCEPT, "application/json")
			.body(body);
		let issued_at = OffsetDateTime::now_utc();
		let response = self.http_client.send(REFRESH, request).await?;

		if !response.is_success() {
			return Err(normalize::rejection(REFRESH, response.status_code(), &response.body));
		}

		let body: TokenResponseBody =
			normalize::decode(REFRESH, Some(response.status_code()), &response.body)?;

		Ok(body.into_token(REFRESH, issued_at)?)
	}

	fn basic_credentials(&self) -> String {
		let pair = format!("{}:{}", self.config.client_id, self.config.client_secret.expose());

		format!("Basic {}", STANDARD.encode(pair))
	}
}
impl IdentityProvider for KratosProvider {
	fn name(&self) -> &str {
		Self::NAME
	}

	fn state(&self) -> &str {
		&self.config.state
	}

	fn redirect_url(&self) -> &Url {
		&self.config.ui_redirect_url
	}

	fn error_url(&self) -> &Url {
		&self.config.ui_error_url
	}

	fn is_enabled(&self) -> bool {
		self.config.is_enabled()
	}

	fn authorization_url(&self) -> Url {
		self.exchange.authorization_url(&self.config.scopes, &self.config.state)
	}

	fn user_details<'a>(&'a self, code: &'a str) -> ProviderFuture<'a, (Account, Token)> {
		Box::pin(observe(Operation::Exchange, "user_details", self.user_details_now(code)))
	}

	fn validate<'a>(&'a self, token: &'a str) -> ProviderFuture<'a, ()> {
		Box::pin(observe(Operation::Introspect, "validate", self.validate_now(token)))
	}

	fn refresh<'a>(&'a self, refresh_token: &'a str) -> ProviderFuture<'a, Token> {
		Box::pin(observe(Operation::Refresh, "refresh", self.refresh_now(refresh_token)))
	}
}
impl Debug for KratosProvider {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("KratosProvider")
			.field("base", &self.config.endpoints.base.as_str())
			.field("client_id", &self.config.client_id)
			.finish_non_exhaustive()
	}
}

async fn observe<T, Fut>(operation: Operation, stage: &'static str, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	let span = OperationSpan::new(operation, stage);

	obs::record_operation_outcome(operation, OperationOutcome::Attempt);

	let result = span.instrument(fut).await;

	obs::record_operation_outcome(operation, OperationOutcome::of(&result));

	result
}

//! Authorization-code plumbing built on the `oauth2` crate.

pub use oauth2;

// crates.io
use oauth2::{
	AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
	RedirectUrl, Scope, TokenResponse, TokenUrl, basic::BasicClient,
};
// self
use crate::{
	_prelude::*,
	auth::{Token, TokenResponseBody},
	config::ProviderConfig,
	error::ConfigError,
	http::{ReqwestHttpClient, ResponseMetadataSlot},
	normalize,
};

type ConfiguredBasicClient =
	BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;
type FacadeTokenResponse = oauth2::basic::BasicTokenResponse;

const OPERATION: &str = "exchange";

/// Standard authorization-code grant against the provider token endpoint.
///
/// Client credentials travel in an HTTP Basic header, the `oauth2` default.
pub(crate) struct CodeExchange {
	oauth_client: ConfiguredBasicClient,
	http_client: ReqwestHttpClient,
}
impl CodeExchange {
	pub(crate) fn from_config(
		config: &ProviderConfig,
		http_client: ReqwestHttpClient,
	) -> Result<Self, ConfigError> {
		let endpoints = &config.endpoints;
		let auth_url = AuthUrl::new(endpoints.authorization.to_string()).map_err(|source| {
			ConfigError::InvalidUrl {
				field: "authorization",
				value: endpoints.authorization.to_string(),
				source,
			}
		})?;
		let token_url = TokenUrl::new(endpoints.token.to_string()).map_err(|source| {
			ConfigError::InvalidUrl { field: "token", value: endpoints.token.to_string(), source }
		})?;
		let mut oauth_client = BasicClient::new(ClientId::new(config.client_id.clone()))
			.set_client_secret(ClientSecret::new(config.client_secret.expose().to_owned()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url);

		if let Some(redirect) = &config.redirect_url {
			let redirect_url = RedirectUrl::new(redirect.to_string()).map_err(|source| {
				ConfigError::InvalidUrl { field: "redirect", value: redirect.to_string(), source }
			})?;

			oauth_client = oauth_client.set_redirect_uri(redirect_url);
		}

		Ok(Self { oauth_client, http_client })
	}

	/// Authorize redirect carrying the client id, redirect URI, scopes, and `state`.
	pub(crate) fn authorization_url(&self, scopes: &[String], state: &str) -> Url {
		let state = state.to_owned();
		let (url, _csrf) = self
			.oauth_client
			.authorize_url(move || CsrfToken::new(state))
			.add_scopes(scopes.iter().cloned().map(Scope::new))
			.url();

		url
	}

	/// Trades `code` for a token.
	pub(crate) async fn exchange(&self, code: &str) -> Result<Token> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.instrumented(meta.clone());
		let response = self
			.oauth_client
			.exchange_code(AuthorizationCode::new(code.to_owned()))
			.request_async(&instrumented)
			.await
			.map_err(|err| normalize::map_request_token_error(OPERATION, meta.take(), err))?;

		map_token_response(response)
	}
}

fn map_token_response(response: FacadeTokenResponse) -> Result<Token> {
	let body = TokenResponseBody {
		access_token: response.access_token().secret().to_owned(),
		refresh_token: response.refresh_token().map(|token| token.secret().to_owned()),
		token_type: Some(response.token_type().as_ref().to_owned()),
		expires_in: response.expires_in().and_then(|ttl| i64::try_from(ttl.as_secs()).ok()),
	};

	Ok(body.into_token(OPERATION, OffsetDateTime::now_utc())?)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn exchange() -> CodeExchange {
		let config = ProviderConfig::builder("http://localhost:4433")
			.client("client-a", "secret-a")
			.redirect_url("http://localhost:8080/callback")
			.state("csrf-state")
			.build()
			.expect("Provider config fixture should build.");
		let http_client = ReqwestHttpClient::new(config.call_timeout)
			.expect("HTTP client should build with default settings.");

		CodeExchange::from_config(&config, http_client).expect("Facade should build.")
	}

	#[test]
	fn authorization_url_carries_client_scopes_and_state() {
		let url = exchange().authorization_url(
			&["email".into(), "profile".into(), "offline_access".into()],
			"csrf-state",
		);
		let pairs: HashMap<_, _> = url.query_pairs().into_owned().collect();

		assert_eq!(url.path(), "/oauth2/auth");
		assert_eq!(pairs.get("response_type").map(String::as_str), Some("code"));
		assert_eq!(pairs.get("client_id").map(String::as_str), Some("client-a"));
		assert_eq!(pairs.get("state").map(String::as_str), Some("csrf-state"));
		assert_eq!(pairs.get("scope").map(String::as_str), Some("email profile offline_access"));
		assert_eq!(
			pairs.get("redirect_uri").map(String::as_str),
			Some("http://localhost:8080/callback")
		);
	}
}

//! OAuth token values handed back to callers.

// self
use crate::{_prelude::*, auth::Secret, error::DecodeError};

/// Token pair issued by the identity provider.
///
/// Callers own the value once it is returned; nothing in this crate persists it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
	/// Bearer access token.
	pub access_token: Secret,
	/// Refresh token, when the provider issued one.
	pub refresh_token: Option<Secret>,
	/// Token type reported by the provider (usually `bearer`).
	pub token_type: String,
	/// Absolute expiry derived from `expires_in`, when reported.
	#[serde(with = "time::serde::rfc3339::option")]
	pub expires_at: Option<OffsetDateTime>,
}
impl Token {
	/// Returns `true` when a non-empty refresh token is present.
	pub fn has_refresh_token(&self) -> bool {
		self.refresh_token.as_ref().is_some_and(|secret| !secret.is_empty())
	}

	/// Returns `true` when the token carries an expiry at or before `instant`.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expires_at| instant >= expires_at)
	}
}

/// RFC 6749 §5.1 token response body.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponseBody {
	pub(crate) access_token: String,
	#[serde(default)]
	pub(crate) refresh_token: Option<String>,
	#[serde(default)]
	pub(crate) token_type: Option<String>,
	#[serde(default)]
	pub(crate) expires_in: Option<i64>,
}
impl TokenResponseBody {
	/// Converts the wire body into a [`Token`], rejecting an empty access token.
	pub(crate) fn into_token(
		self,
		operation: &'static str,
		issued_at: OffsetDateTime,
	) -> Result<Token, DecodeError> {
		if self.access_token.is_empty() {
			return Err(DecodeError::MissingValue { operation, field: "access_token" });
		}

		let expires_at = self
			.expires_in
			.filter(|secs| *secs > 0)
			.and_then(|secs| issued_at.checked_add(Duration::seconds(secs)));

		Ok(Token {
			access_token: Secret::new(self.access_token),
			refresh_token: self.refresh_token.filter(|value| !value.is_empty()).map(Secret::new),
			token_type: self.token_type.unwrap_or_else(|| "bearer".into()),
			expires_at,
		})
	}
}

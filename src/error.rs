//! Crate-level error types shared by the provider, transport, and bootstrap layers.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// Provider calls only ever surface the first four variants; the remaining ones are
/// raised while building configuration or by bootstrap collaborators.
#[derive(Debug, ThisError)]
pub enum Error {
	/// The provider refused the caller's credentials or token.
	#[error("Authentication failed: {reason}.")]
	Authentication {
		/// Provider- or crate-supplied reason string.
		reason: String,
	},
	/// A policy check or grant request was rejected.
	#[error("Authorization failed: {reason}.")]
	Authorization {
		/// Provider- or crate-supplied reason string.
		reason: String,
	},
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Response body could not be decoded.
	#[error(transparent)]
	Decode(#[from] DecodeError),

	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Account repository failure.
	#[error("{0}")]
	Repository(
		#[from]
		#[source]
		crate::bootstrap::RepositoryError,
	),
	/// Credential issuance failure.
	#[error("{0}")]
	Credentials(
		#[from]
		#[source]
		crate::bootstrap::CredentialError,
	),
}
impl Error {
	/// Builds an [`Error::Authentication`] from any displayable reason.
	pub fn authentication(reason: impl Display) -> Self {
		Self::Authentication { reason: reason.to_string() }
	}

	/// Builds an [`Error::Authorization`] from any displayable reason.
	pub fn authorization(reason: impl Display) -> Self {
		Self::Authorization { reason: reason.to_string() }
	}

	/// Returns the closed error kind for this error.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Authentication { .. } => ErrorKind::Authentication,
			Self::Authorization { .. } => ErrorKind::Authorization,
			Self::Transport(_) => ErrorKind::Transport,
			Self::Decode(_) => ErrorKind::Decode,
			Self::Config(_) => ErrorKind::Config,
			Self::Repository(_) | Self::Credentials(_) => ErrorKind::Collaborator,
		}
	}
}

/// Coarse classification of [`Error`] values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// See [`Error::Authentication`].
	Authentication,
	/// See [`Error::Authorization`].
	Authorization,
	/// See [`Error::Transport`].
	Transport,
	/// See [`Error::Decode`].
	Decode,
	/// See [`Error::Config`].
	Config,
	/// Repository or credential issuer failure.
	Collaborator,
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A configured URL cannot be parsed.
	#[error("The {field} URL is invalid: {value}.")]
	InvalidUrl {
		/// Configuration field name.
		field: &'static str,
		/// Offending value.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A required field was left empty.
	#[error("The {field} field must not be empty.")]
	MissingField {
		/// Configuration field name.
		field: &'static str,
	},
	/// Password policy pattern does not compile.
	#[error("Password policy pattern is invalid.")]
	InvalidPasswordPolicy(#[from] regex::Error),
	/// Configured administrator password violates the password policy.
	#[error("Administrator password does not satisfy the password policy `{pattern}`.")]
	WeakAdminPassword {
		/// Policy pattern the password was checked against.
		pattern: String,
	},
	/// Administrator identity is not a valid identifier.
	#[error("Administrator identity is invalid.")]
	InvalidAdminIdentity(#[from] crate::auth::IdentifierError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Transport-level failures (network, IO, timeouts).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the {operation} endpoint.")]
	Network {
		/// Operation label (`exchange`, `userinfo`, `introspect`, `refresh`).
		operation: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request exceeded the configured call timeout.
	#[error("Request to the {operation} endpoint timed out.")]
	Timeout {
		/// Operation label.
		operation: &'static str,
	},
	/// Request could not be assembled.
	#[error("Request to the {operation} endpoint could not be built: {message}.")]
	Request {
		/// Operation label.
		operation: &'static str,
		/// Human-readable failure description.
		message: String,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the identity provider.")]
	Io(#[from] std::io::Error),
	/// Retry budget exhausted without a usable response.
	#[error("Giving up on {url} after {attempts} attempts.")]
	RetriesExhausted {
		/// Target URL.
		url: String,
		/// Number of attempts made.
		attempts: u32,
		/// Last observed HTTP status, when a response was received.
		last_status: Option<u16>,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		operation: &'static str,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { operation, source: Box::new(src) }
	}
}

/// Malformed response bodies.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Body is not the JSON document the endpoint promises.
	#[error("The {operation} endpoint returned malformed JSON.")]
	Json {
		/// Operation label.
		operation: &'static str,
		/// Structured parsing failure, including the JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Body decoded but is missing a mandatory value.
	#[error("The {operation} endpoint returned a response without {field}.")]
	MissingValue {
		/// Operation label.
		operation: &'static str,
		/// Missing field.
		field: &'static str,
	},
	/// Response was not what the endpoint promises (wrong content type, odd shape).
	#[error("The {operation} endpoint returned an unexpected response: {message}.")]
	Unexpected {
		/// Operation label.
		operation: &'static str,
		/// Human-readable failure description.
		message: String,
	},
	/// Provider failure body did not match the structured error shape.
	#[error("The {operation} endpoint failed with HTTP {status} and an unrecognized error body.")]
	UnrecognizedErrorBody {
		/// Operation label.
		operation: &'static str,
		/// HTTP status code.
		status: u16,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn kinds_cover_provider_variants() {
		assert_eq!(Error::authentication("expired").kind(), ErrorKind::Authentication);
		assert_eq!(Error::authorization("denied").kind(), ErrorKind::Authorization);
		assert_eq!(
			Error::from(TransportError::Timeout { operation: "refresh" }).kind(),
			ErrorKind::Transport
		);
		assert_eq!(
			Error::from(DecodeError::MissingValue { operation: "refresh", field: "access_token" })
				.kind(),
			ErrorKind::Decode
		);
	}

	#[test]
	fn messages_read_as_sentences() {
		let err = Error::authentication("token is inactive");

		assert_eq!(err.to_string(), "Authentication failed: token is inactive.");

		let err = Error::from(TransportError::Timeout { operation: "introspect" });

		assert_eq!(err.to_string(), "Request to the introspect endpoint timed out.");
	}
}

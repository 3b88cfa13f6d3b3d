//! Maps provider and transport failures into the crate's closed error taxonomy.
//!
//! Every outward call (exchange, userinfo, introspection, refresh) funnels its failures
//! through this module so diagnostics read the same regardless of which endpoint
//! produced them. Provider failure bodies shaped like
//! `{"error": {"message": "...", "reason": "..."}}` are flattened into a single
//! `error: <message>, reason: <reason>` string.

// crates.io
use oauth2::{
	HttpClientError, RequestTokenError,
	basic::{BasicErrorResponse, BasicRequestTokenError},
};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	error::{DecodeError, TransportError},
	http::ResponseMetadata,
};

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
	error: ProviderErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDetail {
	message: String,
	#[serde(default)]
	reason: Option<String>,
}

/// Extracts the combined diagnostic from a structured provider error body.
pub fn diagnostic(
	operation: &'static str,
	status: Option<u16>,
	body: &[u8],
) -> Result<String, DecodeError> {
	let parsed: ProviderErrorBody = decode(operation, status, body)?;
	let ProviderErrorDetail { message, reason } = parsed.error;

	Ok(match reason {
		Some(reason) if !reason.is_empty() => format!("error: {message}, reason: {reason}"),
		_ => format!("error: {message}"),
	})
}

/// Normalizes a failed response strictly.
///
/// A structured body yields an authentication error carrying the diagnostic; anything
/// else is a decoding error.
pub fn error_response(operation: &'static str, status: u16, body: &[u8]) -> Error {
	match diagnostic(operation, Some(status), body) {
		Ok(reason) => Error::Authentication { reason },
		Err(_) => DecodeError::UnrecognizedErrorBody { operation, status }.into(),
	}
}

/// Normalizes a response the provider used to reject the caller.
///
/// Always an authentication error; the diagnostic is attached when the body carries one.
pub fn rejection(operation: &'static str, status: u16, body: &[u8]) -> Error {
	match diagnostic(operation, Some(status), body) {
		Ok(reason) => Error::Authentication { reason },
		Err(_) => Error::Authentication {
			reason: format!("the {operation} endpoint answered HTTP {status}"),
		},
	}
}

/// Decodes a JSON body, keeping the failing path for diagnostics.
pub fn decode<T>(operation: &'static str, status: Option<u16>, body: &[u8]) -> Result<T, DecodeError>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| DecodeError::Json { operation, source, status })
}

/// Maps a reqwest failure raised while calling `operation`.
pub fn map_reqwest_error(operation: &'static str, err: ReqwestError) -> Error {
	if err.is_timeout() {
		return TransportError::Timeout { operation }.into();
	}
	if err.is_builder() {
		return TransportError::Request { operation, message: err.to_string() }.into();
	}
	if err.is_decode() {
		return DecodeError::Unexpected { operation, message: err.to_string() }.into();
	}

	TransportError::network(operation, err).into()
}

/// Maps an `oauth2` request-token failure from the code exchange.
pub(crate) fn map_request_token_error(
	operation: &'static str,
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<ReqwestError>>,
) -> Error {
	let status = meta.and_then(|value| value.status);

	match err {
		RequestTokenError::ServerResponse(response) => server_response(response),
		RequestTokenError::Request(error) => map_http_client_error(operation, error),
		RequestTokenError::Parse(_, _) if status.is_some_and(|code| code >= 400) =>
			Error::Authentication {
				reason: format!(
					"the {operation} endpoint answered HTTP {}",
					status.unwrap_or_default()
				),
			},
		RequestTokenError::Parse(source, _body) =>
			DecodeError::Json { operation, source, status }.into(),
		RequestTokenError::Other(message) => DecodeError::Unexpected { operation, message }.into(),
	}
}

fn server_response(response: BasicErrorResponse) -> Error {
	let code = response.error().as_ref();
	let reason = match response.error_description() {
		Some(description) => format!("error: {code}, reason: {description}"),
		None => format!("error: {code}"),
	};

	Error::Authentication { reason }
}

fn map_http_client_error(operation: &'static str, err: HttpClientError<ReqwestError>) -> Error {
	match err {
		HttpClientError::Reqwest(inner) => map_reqwest_error(operation, *inner),
		HttpClientError::Http(inner) =>
			TransportError::Request { operation, message: inner.to_string() }.into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) => TransportError::Request { operation, message }.into(),
		_ => TransportError::Request {
			operation,
			message: "unrecognized HTTP client failure".into(),
		}
		.into(),
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use oauth2::{StandardErrorResponse, basic::BasicErrorResponseType};
	// self
	use super::*;

	#[test]
	fn structured_body_combines_message_and_reason() {
		let body = br#"{"error":{"message":"invalid_token","reason":"expired"}}"#;
		let message = diagnostic("introspect", Some(401), body)
			.expect("Structured body should produce a diagnostic.");

		assert!(message.contains("invalid_token"));
		assert!(message.contains("expired"));
		assert_eq!(message, "error: invalid_token, reason: expired");
	}

	#[test]
	fn missing_reason_keeps_message() {
		let message = diagnostic("introspect", Some(500), br#"{"error":{"message":"boom"}}"#)
			.expect("Body without reason should still produce a diagnostic.");

		assert_eq!(message, "error: boom");
	}

	#[test]
	fn strict_normalization_flags_unparseable_bodies() {
		let err = error_response("introspect", 502, b"<html>bad gateway</html>");

		assert!(matches!(
			err,
			Error::Decode(DecodeError::UnrecognizedErrorBody { operation: "introspect", status: 502 })
		));

		let err = error_response("introspect", 401, b"");

		assert!(matches!(err, Error::Decode(_)));

		let err = error_response(
			"introspect",
			401,
			br#"{"error":{"message":"invalid_token","reason":"expired"}}"#,
		);

		assert!(matches!(err, Error::Authentication { ref reason } if reason.contains("expired")));
	}

	#[test]
	fn rejection_is_always_authentication() {
		let err = rejection("userinfo", 403, b"forbidden");

		assert!(
			matches!(err, Error::Authentication { ref reason } if reason.contains("HTTP 403"))
		);

		let err = rejection("refresh", 400, br#"{"error":{"message":"invalid_grant"}}"#);

		assert!(
			matches!(err, Error::Authentication { ref reason } if reason == "error: invalid_grant")
		);
	}

	#[test]
	fn decode_reports_json_path() {
		#[derive(Debug, Deserialize)]
		struct Introspection {
			#[allow(dead_code)]
			active: bool,
		}

		let err = decode::<Introspection>("introspect", Some(200), br#"{"active":"yes"}"#)
			.expect_err("String is not a boolean.");
		let DecodeError::Json { source, .. } = err else {
			panic!("Expected a JSON decode error.");
		};

		assert_eq!(source.path().to_string(), "active");
	}

	#[test]
	fn oauth_server_errors_become_authentication_errors() {
		let response = StandardErrorResponse::new(
			BasicErrorResponseType::InvalidGrant,
			Some("code expired".into()),
			None,
		);
		let err = map_request_token_error(
			"exchange",
			Some(ResponseMetadata { status: Some(400), retry_after: None }),
			RequestTokenError::ServerResponse(response),
		);

		assert!(matches!(
			err,
			Error::Authentication { ref reason } if reason == "error: invalid_grant, reason: code expired"
		));
	}

	#[test]
	fn unexpected_exchange_responses_are_decode_errors() {
		let err = map_request_token_error(
			"exchange",
			None,
			RequestTokenError::Other("unexpected content type".into()),
		);

		assert!(matches!(err, Error::Decode(DecodeError::Unexpected { .. })));
	}
}

//! Transport primitives for calls to the identity provider.
//!
//! [`ReqwestHttpClient`] is the single outbound path for exchange, userinfo,
//! introspection, and refresh. It applies the configured call timeout to every request,
//! so no call can block longer than that ceiling regardless of the caller's own deadline.
//! Dropping a returned future cancels the request and releases its connection.
//!
//! The `oauth2` crate drives the authorization-code exchange through
//! [`InstrumentedHandle`], which records the response status in a
//! [`ResponseMetadataSlot`] so the error normalizer can classify failures.

pub mod retry;

pub use retry::*;

// std
use std::ops::Deref;
// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
use reqwest::{
	RequestBuilder, StatusCode,
	header::{HeaderMap, RETRY_AFTER},
	redirect::Policy,
};
use time::format_description::well_known::Rfc2822;
use url::form_urlencoded;
// self
use crate::{_prelude::*, error::ConfigError, normalize};

/// Metadata from the most recent HTTP response, used for error mapping.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status code, if a response arrived.
	pub status: Option<u16>,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
}

/// Thread-safe slot for sharing [`ResponseMetadata`] between transport and error layers.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Stores new metadata for the current request.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, if any, consuming it from the slot.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// Fully buffered provider response.
#[derive(Clone, Debug)]
pub struct ProviderResponse {
	/// HTTP status.
	pub status: StatusCode,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl ProviderResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		self.status.is_success()
	}

	/// Numeric status code.
	pub fn status_code(&self) -> u16 {
		self.status.as_u16()
	}
}

/// Thin wrapper around [`ReqwestClient`] that owns the call timeout.
///
/// Redirects are never followed: token, userinfo, and introspection endpoints answer
/// directly.
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient {
	client: ReqwestClient,
	timeout: StdDuration,
}
impl ReqwestHttpClient {
	/// Builds a client that applies `timeout` to every request.
	pub fn new(timeout: StdDuration) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.redirect(Policy::none())
			.build()
			.map_err(ConfigError::http_client_build)?;

		Ok(Self { client, timeout })
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient, timeout: StdDuration) -> Self {
		Self { client, timeout }
	}

	/// Ceiling applied to every request.
	pub fn timeout(&self) -> StdDuration {
		self.timeout
	}

	/// Sends `request`, buffering the body, and maps transport failures for `operation`.
	pub async fn send(
		&self,
		operation: &'static str,
		request: RequestBuilder,
	) -> Result<ProviderResponse> {
		let response = request
			.timeout(self.timeout)
			.send()
			.await
			.map_err(|err| normalize::map_reqwest_error(operation, err))?;
		let status = response.status();
		let body = response
			.bytes()
			.await
			.map_err(|err| normalize::map_reqwest_error(operation, err))?
			.to_vec();

		Ok(ProviderResponse { status, body })
	}

	/// Builds an `oauth2` client handle that records outcomes in `slot`.
	pub(crate) fn instrumented(&self, slot: ResponseMetadataSlot) -> InstrumentedHandle {
		InstrumentedHandle(Arc::new(InstrumentedHttpClient {
			client: self.client.clone(),
			timeout: self.timeout,
			slot,
		}))
	}
}
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.client
	}
}
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.client
	}
}

struct InstrumentedHttpClient {
	client: ReqwestClient,
	timeout: StdDuration,
	slot: ResponseMetadataSlot,
}

/// [`AsyncHttpClient`] handle used by the `oauth2` code exchange.
#[derive(Clone)]
pub(crate) struct InstrumentedHandle(Arc<InstrumentedHttpClient>);
impl<'c> AsyncHttpClient<'c> for InstrumentedHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = Arc::clone(&self.0);

		Box::pin(async move {
			client.slot.take();

			let mut request: reqwest::Request = request.try_into().map_err(Box::new)?;

			*request.timeout_mut() = Some(client.timeout);

			let response = client.client.execute(request).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let retry_after = parse_retry_after(&headers);

			client.slot.store(ResponseMetadata { status: Some(status.as_u16()), retry_after });

			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

/// Structured `application/x-www-form-urlencoded` body builder.
///
/// Spaces encode as `%20` rather than `+`; the token endpoint contract spells the scope
/// delimiter that way.
#[derive(Clone, Debug, Default)]
pub struct FormBody(String);
impl FormBody {
	/// Content type for the encoded body.
	pub const CONTENT_TYPE: &'static str = "application/x-www-form-urlencoded";

	/// Appends one `key=value` pair.
	pub fn append(mut self, key: &str, value: &str) -> Self {
		if !self.0.is_empty() {
			self.0.push('&');
		}

		self.0.push_str(&encode_component(key));
		self.0.push('=');
		self.0.push_str(&encode_component(value));

		self
	}

	/// Returns the encoded body.
	pub fn finish(self) -> String {
		self.0
	}
}

fn encode_component(value: &str) -> String {
	// `byte_serialize` emits `+` only for spaces; a literal plus becomes `%2B`.
	form_urlencoded::byte_serialize(value.as_bytes()).collect::<String>().replace('+', "%20")
}

pub(crate) fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return i64::try_from(secs).ok().map(Duration::seconds);
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// crates.io
	use reqwest::header::HeaderValue;
	// self
	use super::*;

	#[test]
	fn form_body_encodes_spaces_as_percent_twenty() {
		let body = FormBody::default()
			.append("grant_type", "refresh_token")
			.append("refresh_token", "a+b/c=")
			.append("scope", "email profile offline_access")
			.finish();

		assert_eq!(
			body,
			"grant_type=refresh_token&refresh_token=a%2Bb%2Fc%3D&scope=email%20profile%20offline_access"
		);
	}

	#[test]
	fn retry_after_accepts_seconds() {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));

		assert_eq!(parse_retry_after(&headers), Some(Duration::seconds(7)));

		headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));

		assert_eq!(parse_retry_after(&headers), None);
	}

	#[test]
	fn retry_after_beyond_signed_range_is_ignored() {
		let mut headers = HeaderMap::new();
		let huge = HeaderValue::from_str(&u64::MAX.to_string())
			.expect("A decimal header value should be valid.");

		headers.insert(RETRY_AFTER, huge);

		assert_eq!(parse_retry_after(&headers), None);
	}

	#[test]
	fn metadata_slot_is_consumed_once() {
		let slot = ResponseMetadataSlot::default();

		slot.store(ResponseMetadata { status: Some(503), retry_after: None });

		assert_eq!(slot.take().and_then(|meta| meta.status), Some(503));
		assert!(slot.take().is_none());
	}

	#[test]
	fn client_keeps_configured_timeout() {
		let client = ReqwestHttpClient::new(StdDuration::from_secs(5))
			.expect("HTTP client should build with default settings.");

		assert_eq!(client.timeout(), StdDuration::from_secs(5));
	}
}

//! Identity-provider integration for Ory Kratos/Hydra deployments: authorization-code exchange,
//! token introspection and refresh behind one provider trait, a closed error taxonomy, and an
//! idempotent administrator bootstrap that runs before the service takes traffic.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod account;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod http;
pub mod normalize;
pub mod oauth;
pub mod obs;
pub mod provider;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests.

	pub use crate::_prelude::*;

	// self
	use crate::{config::ProviderConfig, provider::KratosProvider};

	/// Client identifier used by test providers.
	pub const TEST_CLIENT_ID: &str = "client-a";
	/// Client secret used by test providers.
	pub const TEST_CLIENT_SECRET: &str = "secret-a";
	/// Admin API key used by test providers.
	pub const TEST_API_KEY: &str = "api-key";
	/// CSRF state used by test providers.
	pub const TEST_STATE: &str = "csrf-state";

	/// Provider configuration pointing every endpoint at `base_url` (an `httpmock` server).
	pub fn test_provider_config(base_url: &str) -> ProviderConfig {
		ProviderConfig::builder(base_url)
			.client(TEST_CLIENT_ID, TEST_CLIENT_SECRET)
			.redirect_url("http://localhost:9090/oauth/callback/kratos")
			.state(TEST_STATE)
			.api_key(TEST_API_KEY)
			.call_timeout(StdDuration::from_secs(5))
			.build()
			.expect("Test provider configuration should build.")
	}

	/// Builds a [`KratosProvider`] backed by [`test_provider_config`].
	pub fn build_test_provider(base_url: &str) -> KratosProvider {
		KratosProvider::new(test_provider_config(base_url))
			.expect("Test provider should build with default transport settings.")
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};

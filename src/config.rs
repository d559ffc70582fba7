//! Process-level configuration for the data API endpoint.

// std
use std::env;
// self
use crate::{_prelude::*, error::ConfigError};

/// Environment variable supplying the data API base URL.
pub const DATA_API_URL_VAR: &str = "TALLY_DATA_API_URL";

/// Validated configuration for the data API client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
	/// Base URL of the REST data API.
	pub data_api_url: Url,
}
impl Config {
	/// Reads the configuration from the process environment.
	///
	/// A missing variable is a startup-time configuration error surfaced as a
	/// value so the caller can render it; it never panics.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_env_var(DATA_API_URL_VAR)
	}

	/// Reads the configuration from the named environment variable.
	pub fn from_env_var(var: &'static str) -> Result<Self, ConfigError> {
		let raw = env::var(var)
			.ok()
			.filter(|value| !value.trim().is_empty())
			.ok_or(ConfigError::MissingBaseUrl { var })?;

		Self::from_base_url(&raw)
	}

	/// Validates a raw base URL string.
	///
	/// The URL must be able to carry additional path segments, since table
	/// resources are appended to it.
	pub fn from_base_url(raw: &str) -> Result<Self, ConfigError> {
		let url = Url::parse(raw).map_err(|source| ConfigError::InvalidBaseUrl { source })?;

		if url.cannot_be_a_base() {
			return Err(ConfigError::CannotBeABase { url: url.into() });
		}

		Ok(Self { data_api_url: url })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn missing_variable_is_an_error_not_a_panic() {
		let err = Config::from_env_var("TALLY_TEST_SURELY_UNSET_DATA_API_URL")
			.expect_err("Unset variable should yield a configuration error.");

		assert!(matches!(err, ConfigError::MissingBaseUrl { .. }));
		assert!(err.to_string().contains("TALLY_TEST_SURELY_UNSET_DATA_API_URL"));
	}

	#[test]
	fn malformed_base_url_is_rejected() {
		let err = Config::from_base_url("not a url")
			.expect_err("Malformed URL should yield a configuration error.");

		assert!(matches!(err, ConfigError::InvalidBaseUrl { .. }));
	}

	#[test]
	fn cannot_be_a_base_url_is_rejected() {
		let err = Config::from_base_url("mailto:someone@example.com")
			.expect_err("Opaque URL should yield a configuration error.");

		assert!(matches!(err, ConfigError::CannotBeABase { .. }));
	}

	#[test]
	fn valid_base_url_round_trips() {
		let config = Config::from_base_url("https://data.example.com/rest/v1")
			.expect("Valid base URL should be accepted.");

		assert_eq!(config.data_api_url.as_str(), "https://data.example.com/rest/v1");
	}
}

//! Error taxonomy shared across configuration, sessions, clients, and flows.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem; fatal for the dependent component.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Session or token guard failure raised before any HTTP request.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// Data-API operation failure (query, insert, delete).
	#[error(transparent)]
	Store(#[from] StoreError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
}

/// Configuration and validation failures raised at startup.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// The environment variable supplying the data API base URL is unset or empty.
	#[error("Environment variable `{var}` supplying the data API base URL is not set.")]
	MissingBaseUrl {
		/// Name of the missing variable.
		var: &'static str,
	},
	/// The data API base URL cannot be parsed.
	#[error("Data API base URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The data API base URL cannot carry additional path segments.
	#[error("Data API base URL cannot be used as a base: {url}.")]
	CannotBeABase {
		/// The offending URL.
		url: String,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<reqwest::Error> for ConfigError {
	fn from(e: reqwest::Error) -> Self {
		Self::http_client_build(e)
	}
}

/// Guard failures raised from the client-factory call path.
///
/// Both variants fire before any HTTP request is issued.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
pub enum AuthError {
	/// No authenticated session exists.
	#[error("No authenticated session is available; sign in first.")]
	SessionRequired,
	/// The session exists but yielded no access token.
	#[error("The session did not yield an access token.")]
	TokenUnavailable,
}

/// Data-API operation failures surfaced to asynchronous callers.
///
/// Nothing in this crate retries; callers decide what to do with a failed
/// query or mutation.
#[derive(Debug, ThisError)]
pub enum StoreError {
	/// The data API rejected the request.
	#[error("Data API returned {status}: {message}.")]
	Api {
		/// HTTP status code of the rejection.
		status: u16,
		/// Error message extracted from the response body.
		message: String,
		/// Machine-readable error code, when the body carried one.
		code: Option<String>,
	},
	/// A successful response carried a malformed JSON body.
	#[error("Data API returned a malformed response body.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: Option<u16>,
	},
	/// An exact row count was requested but the response carried none.
	#[error("Data API response is missing the exact row count.")]
	MissingExactCount,
	/// An insert requested a representation but the response carried no rows.
	#[error("Data API returned no representation for the inserted row.")]
	MissingRepresentation,
	/// The request payload could not be serialized.
	#[error("Request payload could not be serialized: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// A delete was executed without any row filter.
	#[error("Refusing to delete without a row filter.")]
	UnfilteredDelete,
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the data API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the data API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<reqwest::Error> for TransportError {
	fn from(e: reqwest::Error) -> Self {
		Self::network(e)
	}
}

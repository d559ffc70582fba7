//! Token-scoped data-API client for a PostgREST-style backend: a session seam
//! with cached token resolution, memoized bearer clients, an explicit query
//! cache, and the shared-counter read/write flows built on top.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod counter;
pub mod error;
pub mod obs;
pub mod rest;
pub mod session;
pub mod view;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and fixtures for tests; enabled via `cfg(test)` or the `test` crate
	//! feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::UserId, client::ClientFactory, config::Config, counter::CounterFlows,
		session::MemorySession,
	};

	/// Default user identifier used by test fixtures.
	pub const TEST_USER: &str = "user-prime";

	/// Builds a validated config pointing at a mock data API.
	pub fn test_config(base_url: &str) -> Config {
		Config::from_base_url(base_url).expect("Test base URL should be valid.")
	}

	/// Builds a signed-in in-memory session holding the provided token.
	pub fn signed_in_session(user: &str, token: &str) -> Arc<MemorySession> {
		let user = UserId::new(user).expect("Test user identifier should be valid.");

		Arc::new(MemorySession::signed_in(user, token))
	}

	/// Builds a client factory bound to the mock data API.
	pub fn test_factory(base_url: &str) -> ClientFactory {
		ClientFactory::new(&test_config(base_url))
			.expect("Test client factory should build successfully.")
	}

	/// Builds counter flows over the provided session and mock data API.
	pub fn build_test_flows(session: Arc<MemorySession>, base_url: &str) -> CounterFlows {
		CounterFlows::new(session, test_factory(base_url))
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::Client as ReqwestClient;
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};

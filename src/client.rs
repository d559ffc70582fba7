//! Token-scoped data client construction and memoization.

// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	config::Config,
	error::{AuthError, ConfigError},
	rest::TableRequest,
	session::{SessionProvider, TokenCache},
};

/// REST data client bound to a base URL and a bearer token.
///
/// Value equality covers the `(base_url, token)` pair; clients handed out by
/// [`ClientFactory`] are additionally pointer-stable while the token is
/// unchanged.
pub struct DataClient {
	http: ReqwestClient,
	base_url: Url,
	token: AccessToken,
}
impl DataClient {
	pub(crate) fn new(http: ReqwestClient, base_url: Url, token: AccessToken) -> Self {
		Self { http, base_url, token }
	}

	/// Base URL requests are issued against.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Token attached to every outgoing request.
	pub fn token(&self) -> &AccessToken {
		&self.token
	}

	/// Starts a request builder against the named table resource.
	pub fn table(self: &Arc<Self>, name: impl Into<String>) -> TableRequest {
		TableRequest::new(self.clone(), name.into())
	}

	pub(crate) fn http(&self) -> &ReqwestClient {
		&self.http
	}

	pub(crate) fn endpoint(&self, table: &str) -> Result<Url, ConfigError> {
		let mut url = self.base_url.clone();

		url.path_segments_mut()
			.map_err(|()| ConfigError::CannotBeABase { url: self.base_url.to_string() })?
			.push(table);

		Ok(url)
	}
}
impl PartialEq for DataClient {
	fn eq(&self, other: &Self) -> bool {
		self.base_url == other.base_url && self.token == other.token
	}
}
impl Eq for DataClient {}
impl Debug for DataClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("DataClient")
			.field("base_url", &self.base_url.as_str())
			.field("token", &self.token)
			.finish()
	}
}

struct ClientMemo {
	token: AccessToken,
	client: Arc<DataClient>,
}

/// Builds and memoizes token-scoped [`DataClient`]s.
///
/// The client is reconstructed only when the resolved token changes, so
/// downstream consumers relying on client identity for memoized queries never
/// see spurious invalidation.
pub struct ClientFactory {
	base_url: Url,
	http: ReqwestClient,
	token_cache: TokenCache,
	memo: RwLock<Option<ClientMemo>>,
}
impl ClientFactory {
	/// Creates a factory for the configured base URL with a default transport.
	pub fn new(config: &Config) -> Result<Self, ConfigError> {
		let http = ReqwestClient::builder().build().map_err(ConfigError::from)?;

		Ok(Self::with_http_client(config, http))
	}

	/// Creates a factory that reuses a caller-provided reqwest client.
	pub fn with_http_client(config: &Config, http: ReqwestClient) -> Self {
		Self {
			base_url: config.data_api_url.clone(),
			http,
			token_cache: TokenCache::new(),
			memo: RwLock::new(None),
		}
	}

	/// Replaces the token cache; mainly used to shrink freshness in tests.
	pub fn with_token_cache(mut self, cache: TokenCache) -> Self {
		self.token_cache = cache;

		self
	}

	/// Base URL requests are issued against.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Token cache backing [`Self::authenticated`].
	pub fn token_cache(&self) -> &TokenCache {
		&self.token_cache
	}

	/// Returns the memoized client for `token`, rebuilding only on change.
	pub fn client_for(&self, token: &AccessToken) -> Arc<DataClient> {
		{
			let memo = self.memo.read();

			if let Some(memo) = memo.as_ref()
				&& memo.token == *token
			{
				return memo.client.clone();
			}
		}

		let mut slot = self.memo.write();

		// Another caller may have rebuilt while this one upgraded the lock.
		if let Some(memo) = slot.as_ref()
			&& memo.token == *token
		{
			return memo.client.clone();
		}

		let client =
			Arc::new(DataClient::new(self.http.clone(), self.base_url.clone(), token.clone()));

		*slot = Some(ClientMemo { token: token.clone(), client: client.clone() });

		client
	}

	/// Resolves the session token and returns the memoized client.
	///
	/// Fails with [`AuthError::SessionRequired`] when no user is signed in and
	/// with [`AuthError::TokenUnavailable`] when the session yields no token;
	/// neither failure issues an HTTP request. Token resolution goes through
	/// the 60-second [`TokenCache`], suspending the caller while a stale
	/// lookup resolves.
	pub async fn authenticated(&self, session: &dyn SessionProvider) -> Result<Arc<DataClient>> {
		let user = session.current_user().ok_or(AuthError::SessionRequired)?;
		let token = self.token_cache.resolve(session, &user, OffsetDateTime::now_utc()).await?;

		Ok(self.client_for(&token))
	}
}
impl Debug for ClientFactory {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientFactory")
			.field("base_url", &self.base_url.as_str())
			.field("memoized", &self.memo.read().is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::*;

	#[test]
	fn memoization_is_pointer_stable_per_token() {
		let factory = test_factory("https://data.example.com/rest/v1");
		let t1 = AccessToken::new("t1");
		let t2 = AccessToken::new("t2");
		let first = factory.client_for(&t1);
		let second = factory.client_for(&t1);

		assert!(Arc::ptr_eq(&first, &second));

		let third = factory.client_for(&t2);

		assert!(!Arc::ptr_eq(&second, &third));
		assert_ne!(*second, *third);
	}

	#[test]
	fn rebuilt_clients_stay_value_equal_for_the_same_pair() {
		let factory = test_factory("https://data.example.com/rest/v1");
		let t1 = AccessToken::new("t1");
		let first = factory.client_for(&t1);

		factory.client_for(&AccessToken::new("t2"));

		let again = factory.client_for(&t1);

		assert!(!Arc::ptr_eq(&first, &again));
		assert_eq!(*first, *again);
	}

	#[test]
	fn endpoint_appends_the_table_segment() {
		let factory = test_factory("https://data.example.com/rest/v1");
		let client = factory.client_for(&AccessToken::new("t"));
		let url = client.endpoint("shared_counter").expect("Endpoint should build.");

		assert_eq!(url.as_str(), "https://data.example.com/rest/v1/shared_counter");
	}
}

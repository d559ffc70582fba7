//! Cached asynchronous token lookups with a fixed freshness window.

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, UserId},
	error::AuthError,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	session::SessionProvider,
};

/// Freshness window after which a cached token lookup is re-issued.
pub const TOKEN_FRESHNESS: Duration = Duration::seconds(60);

#[derive(Clone, Debug)]
struct CachedToken {
	token: AccessToken,
	fetched_at: OffsetDateTime,
}

/// Per-user token cache with singleflight re-fetching.
///
/// A fresh entry is returned without touching the provider. A stale or missing
/// entry suspends the caller while the lookup resolves; concurrent callers for
/// the same user await the same fetch instead of issuing their own.
#[derive(Debug)]
pub struct TokenCache {
	entries: RwLock<HashMap<UserId, CachedToken>>,
	guards: Mutex<HashMap<UserId, Arc<AsyncMutex<()>>>>,
	freshness: Duration,
}
impl TokenCache {
	/// Creates a cache with the default 60-second freshness window.
	pub fn new() -> Self {
		Self::with_freshness(TOKEN_FRESHNESS)
	}

	/// Creates a cache with a caller-chosen freshness window.
	pub fn with_freshness(freshness: Duration) -> Self {
		Self { entries: Default::default(), guards: Default::default(), freshness }
	}

	/// Freshness window applied to cached tokens.
	pub fn freshness(&self) -> Duration {
		self.freshness
	}

	/// Resolves a token for `user`, re-fetching when the cached one is stale.
	///
	/// A provider that yields no token maps to [`AuthError::TokenUnavailable`]
	/// and nothing is cached, so the next resolution retries.
	pub async fn resolve(
		&self,
		provider: &dyn SessionProvider,
		user: &UserId,
		now: OffsetDateTime,
	) -> Result<AccessToken, AuthError> {
		if let Some(token) = self.fresh(user, now) {
			return Ok(token);
		}

		let guard = self.guard(user);
		let _singleflight = guard.lock().await;

		// Another caller may have refreshed while this one awaited the guard.
		if let Some(token) = self.fresh(user, now) {
			return Ok(token);
		}

		let span = FlowSpan::new(FlowKind::TokenFetch, "resolve");

		obs::record_flow_outcome(FlowKind::TokenFetch, FlowOutcome::Attempt);

		let Some(token) = span.instrument(provider.fetch_token(user)).await else {
			obs::record_flow_outcome(FlowKind::TokenFetch, FlowOutcome::Failure);

			return Err(AuthError::TokenUnavailable);
		};

		obs::record_flow_outcome(FlowKind::TokenFetch, FlowOutcome::Success);
		self.entries
			.write()
			.insert(user.clone(), CachedToken { token: token.clone(), fetched_at: now });

		Ok(token)
	}

	/// Drops the cached token for `user` so the next resolution re-fetches.
	pub fn invalidate(&self, user: &UserId) {
		self.entries.write().remove(user);
	}

	fn fresh(&self, user: &UserId, now: OffsetDateTime) -> Option<AccessToken> {
		let entries = self.entries.read();
		let cached = entries.get(user)?;

		if now - cached.fetched_at < self.freshness { Some(cached.token.clone()) } else { None }
	}

	fn guard(&self, user: &UserId) -> Arc<AsyncMutex<()>> {
		self.guards
			.lock()
			.entry(user.clone())
			.or_insert_with(|| Arc::new(AsyncMutex::new(())))
			.clone()
	}
}
impl Default for TokenCache {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::session::MemorySession;

	fn user() -> UserId {
		UserId::new("user-cache").expect("User fixture should be valid.")
	}

	#[tokio::test]
	async fn fresh_token_skips_the_provider() {
		let session = MemorySession::signed_in(user(), "token-1");
		let cache = TokenCache::new();
		let t0 = macros::datetime!(2026-08-20 10:00 UTC);
		let first = cache
			.resolve(&session, &user(), t0)
			.await
			.expect("Cold resolution should fetch a token.");

		assert_eq!(first.expose(), "token-1");
		assert_eq!(session.token_fetches(), 1);

		let within = cache
			.resolve(&session, &user(), t0 + Duration::seconds(59))
			.await
			.expect("Resolution inside the window should serve the cache.");

		assert_eq!(within.expose(), "token-1");
		assert_eq!(session.token_fetches(), 1);
	}

	#[tokio::test]
	async fn stale_token_is_refetched() {
		let session = MemorySession::signed_in(user(), "token-1");
		let cache = TokenCache::new();
		let t0 = macros::datetime!(2026-08-20 10:00 UTC);

		cache.resolve(&session, &user(), t0).await.expect("Cold resolution should succeed.");
		session.set_token("token-2");

		let after = cache
			.resolve(&session, &user(), t0 + Duration::seconds(60))
			.await
			.expect("Resolution at the window edge should re-fetch.");

		assert_eq!(after.expose(), "token-2");
		assert_eq!(session.token_fetches(), 2);
	}

	#[tokio::test]
	async fn missing_token_is_not_cached() {
		let session = MemorySession::default();
		let cache = TokenCache::new();
		let t0 = macros::datetime!(2026-08-20 10:00 UTC);

		session.sign_in(user());

		let err = cache
			.resolve(&session, &user(), t0)
			.await
			.expect_err("A session without a token should fail to resolve.");

		assert_eq!(err, AuthError::TokenUnavailable);

		session.set_token("token-late");

		let token = cache
			.resolve(&session, &user(), t0)
			.await
			.expect("A later resolution should pick up the new token.");

		assert_eq!(token.expose(), "token-late");
	}

	#[tokio::test]
	async fn invalidate_forces_a_refetch() {
		let session = MemorySession::signed_in(user(), "token-1");
		let cache = TokenCache::new();
		let t0 = macros::datetime!(2026-08-20 10:00 UTC);

		cache.resolve(&session, &user(), t0).await.expect("Cold resolution should succeed.");
		cache.invalidate(&user());
		cache.resolve(&session, &user(), t0).await.expect("Post-invalidation should re-fetch.");

		assert_eq!(session.token_fetches(), 2);
	}
}

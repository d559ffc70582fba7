//! Process-wide query cache keyed by `{entity, user}` tuples.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, auth::UserId};

/// Cache key for a query over one entity, optionally scoped to a user.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryKey {
	/// Logical entity (table) the query reads.
	pub entity: String,
	/// User the query is scoped to, when user-scoped.
	pub user: Option<UserId>,
}
impl QueryKey {
	/// Builds a key for an entity with no user scoping.
	pub fn entity(entity: impl Into<String>) -> Self {
		Self { entity: entity.into(), user: None }
	}

	/// Builds a user-scoped key.
	pub fn for_user(entity: impl Into<String>, user: UserId) -> Self {
		Self { entity: entity.into(), user: Some(user) }
	}

	/// Stable fingerprint of the normalized tuple.
	///
	/// Base64 (no padding) SHA-256 over the entity and user id separated by a
	/// newline, so distinct tuples cannot collide textually. Cache slots are
	/// partitioned by this fingerprint.
	pub fn fingerprint(&self) -> String {
		let mut hasher = Sha256::new();

		hasher.update(self.entity.as_bytes());
		hasher.update([b'\n']);

		if let Some(user) = &self.user {
			hasher.update(user.as_bytes());
		}

		STANDARD_NO_PAD.encode(hasher.finalize())
	}
}

#[derive(Clone, Debug)]
struct CacheSlot<T> {
	value: T,
	fetched_at: OffsetDateTime,
}

/// Process-wide keyed cache with manual invalidation and a staleness window.
///
/// Reads inside the window are served from the cache; a stale or missing entry
/// runs the caller's fetch under a per-key singleflight guard. Mutation
/// exclusivity per key is NOT enforced: concurrent mutations may interleave
/// their invalidations with in-flight reads.
#[derive(Debug)]
pub struct QueryCache<T> {
	entries: RwLock<HashMap<String, CacheSlot<T>>>,
	guards: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
	staleness: Duration,
}
impl<T> QueryCache<T>
where
	T: Clone,
{
	/// Creates a cache whose entries stay fresh for `staleness`.
	pub fn new(staleness: Duration) -> Self {
		Self { entries: Default::default(), guards: Default::default(), staleness }
	}

	/// Staleness window applied to cached values.
	pub fn staleness(&self) -> Duration {
		self.staleness
	}

	/// Returns the cached value without fetching, fresh or not.
	pub fn peek(&self, key: &QueryKey) -> Option<T> {
		self.entries.read().get(&key.fingerprint()).map(|slot| slot.value.clone())
	}

	/// Returns `true` when a cached value exists and is still fresh at `now`.
	pub fn is_fresh(&self, key: &QueryKey, now: OffsetDateTime) -> bool {
		self.fresh(&key.fingerprint(), now).is_some()
	}

	/// Returns the cached value when fresh, otherwise runs `fetch` under a
	/// per-key singleflight guard and caches the result stamped with `now`.
	///
	/// Fetch failures propagate and cache nothing; the next read retries.
	pub async fn get_or_fetch<F, Fut, E>(
		&self,
		key: &QueryKey,
		now: OffsetDateTime,
		fetch: F,
	) -> Result<T, E>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<T, E>>,
	{
		let slot_key = key.fingerprint();

		if let Some(value) = self.fresh(&slot_key, now) {
			return Ok(value);
		}

		let guard = self.guard(&slot_key);
		let _singleflight = guard.lock().await;

		// Another caller may have fetched while this one awaited the guard.
		if let Some(value) = self.fresh(&slot_key, now) {
			return Ok(value);
		}

		let value = fetch().await?;

		self.entries.write().insert(slot_key, CacheSlot { value: value.clone(), fetched_at: now });

		Ok(value)
	}

	/// Drops the cached value so the next read re-fetches.
	pub fn invalidate(&self, key: &QueryKey) {
		self.entries.write().remove(&key.fingerprint());
	}

	fn fresh(&self, slot_key: &str, now: OffsetDateTime) -> Option<T> {
		let entries = self.entries.read();
		let slot = entries.get(slot_key)?;

		if now - slot.fetched_at < self.staleness { Some(slot.value.clone()) } else { None }
	}

	fn guard(&self, slot_key: &str) -> Arc<AsyncMutex<()>> {
		self.guards
			.lock()
			.entry(slot_key.to_owned())
			.or_insert_with(|| Arc::new(AsyncMutex::new(())))
			.clone()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicU64, Ordering};
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn key() -> QueryKey {
		QueryKey::entity("shared_counter")
	}

	fn user_key(user: &str) -> QueryKey {
		QueryKey::for_user(
			"shared_counter",
			UserId::new(user).expect("User fixture should be valid."),
		)
	}

	#[test]
	fn fingerprints_distinguish_entity_and_user() {
		assert_eq!(key().fingerprint(), key().fingerprint());
		assert_ne!(key().fingerprint(), user_key("user-1").fingerprint());
		assert_ne!(user_key("user-1").fingerprint(), user_key("user-2").fingerprint());
		assert_ne!(key().fingerprint(), QueryKey::entity("other_table").fingerprint());
	}

	#[tokio::test]
	async fn fresh_reads_are_served_from_the_cache() {
		let cache = QueryCache::new(Duration::minutes(5));
		let fetches = AtomicU64::new(0);
		let t0 = macros::datetime!(2026-08-20 10:00 UTC);
		let fetch = || {
			fetches.fetch_add(1, Ordering::Relaxed);

			async { Ok::<_, ()>(7_u64) }
		};

		assert_eq!(cache.get_or_fetch(&key(), t0, fetch).await, Ok(7));
		assert_eq!(cache.get_or_fetch(&key(), t0 + Duration::minutes(4), fetch).await, Ok(7));
		assert_eq!(fetches.load(Ordering::Relaxed), 1);
		assert!(cache.is_fresh(&key(), t0 + Duration::minutes(4)));

		// At the window edge the next read re-fetches.
		assert_eq!(cache.get_or_fetch(&key(), t0 + Duration::minutes(5), fetch).await, Ok(7));
		assert_eq!(fetches.load(Ordering::Relaxed), 2);
	}

	#[tokio::test]
	async fn invalidation_forces_a_refetch() {
		let cache = QueryCache::new(Duration::minutes(5));
		let fetches = AtomicU64::new(0);
		let t0 = macros::datetime!(2026-08-20 10:00 UTC);
		let fetch = || {
			fetches.fetch_add(1, Ordering::Relaxed);

			async { Ok::<_, ()>("rows") }
		};

		cache.get_or_fetch(&key(), t0, fetch).await.expect("Cold fetch should succeed.");
		cache.invalidate(&key());

		assert_eq!(cache.peek(&key()), None);

		cache.get_or_fetch(&key(), t0, fetch).await.expect("Post-invalidation should re-fetch.");

		assert_eq!(fetches.load(Ordering::Relaxed), 2);
	}

	#[tokio::test]
	async fn failures_cache_nothing() {
		let cache = QueryCache::<u64>::new(Duration::minutes(5));
		let t0 = macros::datetime!(2026-08-20 10:00 UTC);
		let failed = cache.get_or_fetch(&key(), t0, || async { Err("boom") }).await;

		assert_eq!(failed, Err("boom"));
		assert_eq!(cache.peek(&key()), None);

		let recovered = cache.get_or_fetch(&key(), t0, || async { Ok::<_, &str>(1) }).await;

		assert_eq!(recovered, Ok(1));
	}

	#[tokio::test]
	async fn concurrent_cold_reads_fetch_once() {
		let cache = Arc::new(QueryCache::new(Duration::minutes(5)));
		let fetches = Arc::new(AtomicU64::new(0));
		let t0 = macros::datetime!(2026-08-20 10:00 UTC);
		let fetch = || {
			let fetches = fetches.clone();

			async move {
				fetches.fetch_add(1, Ordering::SeqCst);
				tokio::time::sleep(std::time::Duration::from_millis(25)).await;

				Ok::<_, ()>(11_u64)
			}
		};
		let key = key();
		let (a, b) = tokio::join!(
			cache.get_or_fetch(&key, t0, fetch),
			cache.get_or_fetch(&key, t0, fetch),
		);

		assert_eq!(a, Ok(11));
		assert_eq!(b, Ok(11));
		assert_eq!(fetches.load(Ordering::SeqCst), 1);
	}
}

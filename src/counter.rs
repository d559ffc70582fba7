//! Shared-counter flows: cached reads, increments, and guarded deletes.
//!
//! [`CounterFlows`] orchestrates the read/write flow over a session provider
//! and a client factory. Reads go through a 5-minute [`QueryCache`] keyed by
//! `{shared_counter, user}`; mutations invalidate that key on success and
//! propagate store errors untouched (no retries). Deletes run a local
//! ownership guard first and refuse foreign entries without any network call.

mod metrics;

pub use metrics::FlowMetrics;

// self
use crate::{
	_prelude::*,
	auth::{EntryId, UserId},
	cache::{QueryCache, QueryKey},
	client::ClientFactory,
	error::{AuthError, StoreError},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	rest::Order,
	session::SessionProvider,
};

/// Name of the shared counter table resource.
pub const COUNTER_TABLE: &str = "shared_counter";
/// Staleness window for the cached counter query.
pub const COUNTER_STALENESS: Duration = Duration::minutes(5);

/// One row of the shared counter table.
///
/// Rows are insert-only: the server assigns `id` and `added_at`, and nothing
/// updates an entry in place.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterEntry {
	/// Server-assigned primary key.
	pub id: EntryId,
	/// User that inserted the entry.
	pub user_id: UserId,
	/// Server-assigned insertion instant.
	#[serde(with = "time::serde::rfc3339")]
	pub added_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
struct NewCounterEntry<'a> {
	user_id: &'a UserId,
}

/// Cached result of the counter read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CounterSnapshot {
	/// Entries ordered by `added_at` descending (ties unordered).
	pub entries: Vec<CounterEntry>,
	/// Exact total row count reported by the data API.
	pub total: u64,
}

/// Outcome of a delete request after the local ownership guard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
	/// The entry was deleted and the cached query invalidated.
	Deleted,
	/// The entry belongs to another user; no network call was made.
	Refused {
		/// Warning to surface to the user.
		warning: String,
	},
}

/// Orchestrates the counter read/write flow over a session and client factory.
pub struct CounterFlows {
	session: Arc<dyn SessionProvider>,
	factory: ClientFactory,
	cache: QueryCache<CounterSnapshot>,
	metrics: FlowMetrics,
}
impl CounterFlows {
	/// Creates flows with the default 5-minute query staleness.
	pub fn new(session: Arc<dyn SessionProvider>, factory: ClientFactory) -> Self {
		Self::with_staleness(session, factory, COUNTER_STALENESS)
	}

	/// Creates flows with a caller-chosen query staleness window.
	pub fn with_staleness(
		session: Arc<dyn SessionProvider>,
		factory: ClientFactory,
		staleness: Duration,
	) -> Self {
		Self {
			session,
			factory,
			cache: QueryCache::new(staleness),
			metrics: FlowMetrics::default(),
		}
	}

	/// Flow activity counters.
	pub fn metrics(&self) -> &FlowMetrics {
		&self.metrics
	}

	/// Query cache backing [`Self::snapshot`].
	pub fn cache(&self) -> &QueryCache<CounterSnapshot> {
		&self.cache
	}

	/// Cache key for the current user's counter query.
	pub fn query_key(&self) -> QueryKey {
		QueryKey { entity: COUNTER_TABLE.into(), user: self.session.current_user() }
	}

	/// Reads the counter dataset through the query cache.
	///
	/// Entries are presented newest-first by `added_at`; nothing is guaranteed
	/// about the order among entries with identical timestamps.
	pub async fn snapshot(&self) -> Result<CounterSnapshot> {
		const KIND: FlowKind = FlowKind::Read;

		let span = FlowSpan::new(KIND, "snapshot");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.metrics.record_read();

		let key = self.query_key();
		let now = OffsetDateTime::now_utc();

		if self.cache.is_fresh(&key, now) {
			self.metrics.record_cache_hit();
		}

		let result = span
			.instrument(self.cache.get_or_fetch(&key, now, || async {
				let client = self.factory.authenticated(self.session.as_ref()).await?;
				let page = client
					.table(COUNTER_TABLE)
					.select()
					.order("added_at", Order::Descending)
					.count_exact()
					.fetch::<CounterEntry>()
					.await?;
				let total =
					page.total.ok_or_else(|| Error::Store(StoreError::MissingExactCount))?;

				Ok(CounterSnapshot { entries: page.rows, total })
			}))
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => {
				self.metrics.record_failure();
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			},
		}

		result
	}

	/// Inserts one entry for the current user and invalidates the cached
	/// query, forcing a re-read on the next access.
	///
	/// Failures propagate the store's error to the caller; there is no local
	/// retry.
	pub async fn increment(&self) -> Result<CounterEntry> {
		const KIND: FlowKind = FlowKind::Increment;

		let span = FlowSpan::new(KIND, "increment");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async {
				let user = self.session.current_user().ok_or(AuthError::SessionRequired)?;
				let client = self.factory.authenticated(self.session.as_ref()).await?;
				let mut created = client
					.table(COUNTER_TABLE)
					.insert(&NewCounterEntry { user_id: &user })?
					.returning::<CounterEntry>()
					.await?;

				created.pop().ok_or_else(|| Error::Store(StoreError::MissingRepresentation))
			})
			.await;

		match result {
			Ok(entry) => {
				// Invalidation is sequenced strictly after the mutation's response.
				self.cache.invalidate(&self.query_key());
				self.metrics.record_increment();
				obs::record_flow_outcome(KIND, FlowOutcome::Success);

				Ok(entry)
			},
			Err(err) => {
				self.metrics.record_failure();
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);

				Err(err)
			},
		}
	}

	/// Deletes an entry owned by the current user and invalidates the cached
	/// query.
	///
	/// The ownership check is local and advisory: a foreign entry yields
	/// [`DeleteOutcome::Refused`] with zero network calls and an untouched
	/// cache. The data API is not known to mirror this rule server-side, so
	/// the guard is a UX courtesy rather than a security boundary.
	pub async fn delete(&self, entry: &CounterEntry) -> Result<DeleteOutcome> {
		const KIND: FlowKind = FlowKind::Delete;

		let user = self.session.current_user().ok_or(AuthError::SessionRequired)?;

		if entry.user_id != user {
			self.metrics.record_refusal();

			return Ok(DeleteOutcome::Refused {
				warning: format!(
					"Entries added by other users cannot be deleted (entry {}).",
					entry.id
				),
			});
		}

		let span = FlowSpan::new(KIND, "delete");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async {
				let client = self.factory.authenticated(self.session.as_ref()).await?;

				client.table(COUNTER_TABLE).delete().eq("id", &entry.id).execute().await
			})
			.await;

		match result {
			Ok(()) => {
				self.cache.invalidate(&self.query_key());
				self.metrics.record_delete();
				obs::record_flow_outcome(KIND, FlowOutcome::Success);

				Ok(DeleteOutcome::Deleted)
			},
			Err(err) => {
				self.metrics.record_failure();
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);

				Err(err)
			},
		}
	}
}
impl Debug for CounterFlows {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CounterFlows")
			.field("factory", &self.factory)
			.field("staleness", &self.cache.staleness())
			.finish()
	}
}

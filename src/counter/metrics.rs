// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for counter-flow activity.
#[derive(Debug, Default)]
pub struct FlowMetrics {
	reads: AtomicU64,
	cache_hits: AtomicU64,
	increments: AtomicU64,
	deletes: AtomicU64,
	refusals: AtomicU64,
	failures: AtomicU64,
}
impl FlowMetrics {
	/// Total snapshot reads, cached or not.
	pub fn reads(&self) -> u64 {
		self.reads.load(Ordering::Relaxed)
	}

	/// Reads served from a fresh cache entry.
	pub fn cache_hits(&self) -> u64 {
		self.cache_hits.load(Ordering::Relaxed)
	}

	/// Successful increments.
	pub fn increments(&self) -> u64 {
		self.increments.load(Ordering::Relaxed)
	}

	/// Successful deletes.
	pub fn deletes(&self) -> u64 {
		self.deletes.load(Ordering::Relaxed)
	}

	/// Deletes refused by the local ownership guard.
	pub fn refusals(&self) -> u64 {
		self.refusals.load(Ordering::Relaxed)
	}

	/// Failed flows of any kind.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_read(&self) {
		self.reads.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_cache_hit(&self) {
		self.cache_hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_increment(&self) {
		self.increments.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_delete(&self) {
		self.deletes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refusal(&self) {
		self.refusals.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}
}

//! Session provider seam and the token freshness cache.
//!
//! The identity provider is an external collaborator: this crate only reads
//! the session (current user, short-lived token). [`SessionProvider`] is the
//! crate's sole dependency on an identity stack; [`MemorySession`] backs demos
//! and tests, and [`TokenCache`] keeps token lookups fresh without hammering
//! the provider.

pub mod cache;
pub mod memory;

pub use cache::TokenCache;
pub use memory::MemorySession;

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, UserId},
};

/// Boxed future returned by session token lookups.
pub type SessionFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a + Send>>;

/// External identity provider seam.
///
/// Implementations wrap the hosted identity SDK. The session is owned by the
/// provider (created on sign-in, refreshed on its own schedule, destroyed on
/// sign-out); this crate never mutates it.
pub trait SessionProvider
where
	Self: Send + Sync,
{
	/// Identifier of the signed-in user, when a session exists.
	fn current_user(&self) -> Option<UserId>;

	/// Resolves the short-lived access token for the given user.
	///
	/// `None` means the session exists but cannot produce a token right now;
	/// callers map that to [`AuthError::TokenUnavailable`](crate::error::AuthError).
	fn fetch_token<'a>(&'a self, user: &'a UserId) -> SessionFuture<'a, Option<AccessToken>>;
}

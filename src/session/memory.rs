//! In-process [`SessionProvider`] implementation for demos and tests.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, UserId},
	session::{SessionFuture, SessionProvider},
};

/// In-memory session with settable user and token state.
///
/// Token fetches are counted so tests can assert how often the provider was
/// actually consulted.
#[derive(Debug, Default)]
pub struct MemorySession {
	user: RwLock<Option<UserId>>,
	token: RwLock<Option<AccessToken>>,
	fetches: AtomicU64,
}
impl MemorySession {
	/// Creates a signed-in session holding the provided token.
	pub fn signed_in(user: UserId, token: impl Into<String>) -> Self {
		Self {
			user: RwLock::new(Some(user)),
			token: RwLock::new(Some(AccessToken::new(token))),
			fetches: AtomicU64::new(0),
		}
	}

	/// Signs a user in, replacing any previous session.
	pub fn sign_in(&self, user: UserId) {
		*self.user.write() = Some(user);
	}

	/// Signs out, destroying the session and its token.
	pub fn sign_out(&self) {
		*self.user.write() = None;
		*self.token.write() = None;
	}

	/// Replaces the access token the provider hands out.
	pub fn set_token(&self, token: impl Into<String>) {
		*self.token.write() = Some(AccessToken::new(token));
	}

	/// Clears the token while keeping the session signed in.
	pub fn clear_token(&self) {
		*self.token.write() = None;
	}

	/// Number of token fetches issued against this provider.
	pub fn token_fetches(&self) -> u64 {
		self.fetches.load(Ordering::Relaxed)
	}
}
impl SessionProvider for MemorySession {
	fn current_user(&self) -> Option<UserId> {
		self.user.read().clone()
	}

	fn fetch_token<'a>(&'a self, _user: &'a UserId) -> SessionFuture<'a, Option<AccessToken>> {
		self.fetches.fetch_add(1, Ordering::Relaxed);

		let token = self.token.read().clone();

		Box::pin(async move { token })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn sign_in_and_out_drive_the_session() {
		let session = MemorySession::default();

		assert_eq!(session.current_user(), None);

		let user = UserId::new("user-1").expect("User fixture should be valid.");

		session.sign_in(user.clone());
		session.set_token("token-1");

		assert_eq!(session.current_user(), Some(user.clone()));

		let token = session.fetch_token(&user).await.expect("Token should be available.");

		assert_eq!(token.expose(), "token-1");
		assert_eq!(session.token_fetches(), 1);

		session.sign_out();

		assert_eq!(session.current_user(), None);
		assert!(session.fetch_token(&user).await.is_none());
	}
}

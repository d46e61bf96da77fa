//! Single-flight guard around token refresh.
//!
//! Refresh tokens are single use: two concurrent refreshes with the same
//! token would make the second one fail and sign the user out. The gate
//! serializes refreshes and remembers which token the last successful
//! refresh consumed, so callers that queued behind it get that result
//! instead of spending the token again. The lock is released when the
//! refresh completes, not after a fixed delay.

use std::future::Future;

use estate_protocol::Session;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::Result;

#[derive(Debug)]
struct Completed {
	consumed: String,
	session: Session,
}

#[derive(Debug, Default)]
pub struct RefreshGate {
	last: Mutex<Option<Completed>>,
}

impl RefreshGate {
	pub fn new() -> Self {
		Self::default()
	}

	/// Runs `refresh` with `refresh_token` unless a refresh of that same token already succeeded.
	pub async fn refresh<F, Fut>(&self, refresh_token: &str, refresh: F) -> Result<Session>
	where
		F: FnOnce(String) -> Fut,
		Fut: Future<Output = Result<Session>>,
	{
		let mut last = self.last.lock().await;

		if let Some(done) = last.as_ref() {
			if done.consumed == refresh_token {
				debug!(target = "estate.session", "refresh token already exchanged; reusing result");
				return Ok(done.session.clone());
			}
		}

		let session = refresh(refresh_token.to_string()).await?;
		*last = Some(Completed {
			consumed: refresh_token.to_string(),
			session: session.clone(),
		});
		Ok(session)
	}

	/// Returns `true` while a refresh holds the gate.
	pub fn is_refreshing(&self) -> bool {
		self.last.try_lock().is_err()
	}
}

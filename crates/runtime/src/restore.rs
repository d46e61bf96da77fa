//! Session restoration from persisted storage.

use chrono::TimeDelta;
use estate_protocol::Session;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::CancellationToken;
use crate::context::SessionContext;
use crate::error::{Error, Result};
use crate::events::{RemovalReason, SessionEvent, UpdateSource};

/// Result of [`SessionRestorer::restore`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "session", rename_all = "snake_case")]
pub enum RestoreOutcome {
	/// Nothing persisted.
	NoSession,
	/// Persisted session is usable as stored.
	Valid(Session),
	/// Persisted session was near expiry and has been exchanged for a new one.
	Refreshed(Session),
	/// The auth service rejected the persisted session; it has been discarded.
	Removed,
}

impl RestoreOutcome {
	pub fn into_session(self) -> Option<Session> {
		match self {
			RestoreOutcome::Valid(session) | RestoreOutcome::Refreshed(session) => Some(session),
			RestoreOutcome::NoSession | RestoreOutcome::Removed => None,
		}
	}

	pub fn label(&self) -> &'static str {
		match self {
			RestoreOutcome::NoSession => "no_session",
			RestoreOutcome::Valid(_) => "valid",
			RestoreOutcome::Refreshed(_) => "refreshed",
			RestoreOutcome::Removed => "removed",
		}
	}
}

/// Recovers the persisted session and refreshes it when close to expiry.
pub struct SessionRestorer<'a> {
	ctx: &'a SessionContext,
}

impl<'a> SessionRestorer<'a> {
	pub fn new(ctx: &'a SessionContext) -> Self {
		Self { ctx }
	}

	pub async fn restore(&self, cancel: &CancellationToken) -> Result<RestoreOutcome> {
		let Some(stored) = self.ctx.current()? else {
			debug!(target = "estate.session", "no persisted session");
			return Ok(RestoreOutcome::NoSession);
		};

		let margin = TimeDelta::from_std(self.ctx.config().refresh_margin).unwrap_or(TimeDelta::MAX);
		if !stored.expires_within(self.ctx.clock().now(), margin) {
			debug!(target = "estate.session", user = %stored.user.id, "persisted session still valid");
			self.ctx.events().publish(SessionEvent::Updated {
				session: stored.clone(),
				source: UpdateSource::Restored,
			});
			return Ok(RestoreOutcome::Valid(stored));
		}

		match self.refresh_with_retry(&stored, cancel).await {
			Ok(session) => {
				info!(target = "estate.session", user = %session.user.id, "session restored by refresh");
				Ok(RestoreOutcome::Refreshed(session))
			}
			Err(err) if err.is_rejection() => {
				warn!(target = "estate.session", error = %err, "persisted session rejected; signing out");
				self.ctx.discard(RemovalReason::Rejected)?;
				Ok(RestoreOutcome::Removed)
			}
			Err(Error::Cancelled) => Err(Error::Cancelled),
			Err(err) if !stored.is_expired(self.ctx.clock().now()) => {
				warn!(
					target = "estate.session",
					error = %err,
					"refresh failed; keeping persisted session until it expires"
				);
				self.ctx.events().publish(SessionEvent::Updated {
					session: stored.clone(),
					source: UpdateSource::Restored,
				});
				Ok(RestoreOutcome::Valid(stored))
			}
			Err(err) => Err(err),
		}
	}

	/// Refreshes `current`, retrying transient failures with jittered exponential backoff.
	pub async fn refresh_with_retry(&self, current: &Session, cancel: &CancellationToken) -> Result<Session> {
		let policy = &self.ctx.config().retry;
		let max_attempts = policy.max_attempts.max(1);
		let mut attempt = 0;

		loop {
			let result = tokio::select! {
				biased;
				_ = cancel.cancelled() => return Err(Error::Cancelled),
				result = self.ctx.refresh_once(&current.refresh_token) => result,
			};

			let err = match result {
				Ok(session) => return Ok(session),
				Err(err) => err,
			};

			attempt += 1;
			if !err.is_transient() {
				return Err(err);
			}
			if attempt >= max_attempts {
				return Err(Error::RetriesExhausted {
					attempts: attempt,
					last: Box::new(err),
				});
			}

			let delay = policy.delay(attempt - 1);
			warn!(
				target = "estate.session",
				attempt,
				max_attempts,
				delay_ms = delay.as_millis() as u64,
				error = %err,
				"session refresh failed; retrying"
			);
			tokio::select! {
				biased;
				_ = cancel.cancelled() => return Err(Error::Cancelled),
				_ = tokio::time::sleep(delay) => {}
			}
		}
	}
}

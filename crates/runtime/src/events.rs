//! Session event bus.
//!
//! Decouples whoever changes the session (sign-in, restoration, refresh,
//! sign-out) from whoever reacts to it (route guards, UI state, loggers).
//! Built on a broadcast channel: publishing with no subscribers is fine, and
//! a subscriber that falls behind skips the events it missed.

use estate_protocol::Session;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

/// Default number of buffered events per subscriber.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// How the current session came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateSource {
	SignedIn,
	Restored,
	Refreshed,
}

/// Why the session went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
	SignedOut,
	/// The auth service refused the stored refresh token.
	Rejected,
	/// Verification of the access token failed.
	Expired,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
	Updated { session: Session, source: UpdateSource },
	Removed { reason: RemovalReason },
}

impl SessionEvent {
	pub fn name(&self) -> &'static str {
		match self {
			SessionEvent::Updated { .. } => "session-updated",
			SessionEvent::Removed { .. } => "session-removed",
		}
	}
}

#[derive(Debug, Clone)]
pub struct SessionEvents {
	tx: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
	pub fn new(capacity: usize) -> Self {
		let (tx, _) = broadcast::channel(capacity.max(1));
		Self { tx }
	}

	/// Broadcasts `event`, returning how many subscribers will see it.
	pub fn publish(&self, event: SessionEvent) -> usize {
		let name = event.name();
		let delivered = self.tx.send(event).unwrap_or(0);
		debug!(target = "estate.session", event = name, delivered, "session event published");
		delivered
	}

	pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
		self.tx.subscribe()
	}

	pub fn subscriber_count(&self) -> usize {
		self.tx.receiver_count()
	}
}

impl Default for SessionEvents {
	fn default() -> Self {
		Self::new(DEFAULT_EVENT_CAPACITY)
	}
}

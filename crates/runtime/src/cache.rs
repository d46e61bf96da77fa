//! Route-keyed cache of the last verified session.
//!
//! A route guard marks a route verified after it has checked the session
//! against the auth service. Subsequent checks for the same route within the
//! TTL skip the round trip. There is a single verification timestamp for the
//! whole cache (no per-route TTL), and losing the session wipes every route.
//! A miss is always safe: it only costs a re-verification.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use estate_protocol::Session;
use parking_lot::Mutex;
use tracing::trace;

use crate::clock::Clock;

/// Default verification TTL (5 minutes).
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Default)]
struct CacheState {
	session: Option<Session>,
	verified_at: Option<DateTime<Utc>>,
	routes: HashSet<String>,
}

#[derive(Debug)]
pub struct SessionCache {
	ttl: TimeDelta,
	clock: Arc<dyn Clock>,
	state: Mutex<CacheState>,
}

impl SessionCache {
	pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
		Self {
			ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
			clock,
			state: Mutex::new(CacheState::default()),
		}
	}

	pub fn ttl(&self) -> Duration {
		self.ttl.to_std().unwrap_or(Duration::MAX)
	}

	/// Records a verified session for `route`, or invalidates every route when `session` is `None`.
	pub fn update(&self, session: Option<&Session>, route: &str) {
		let mut state = self.state.lock();
		match session {
			Some(session) => {
				state.session = Some(session.clone());
				state.verified_at = Some(self.clock.now());
				state.routes.insert(route.to_string());
				trace!(target = "estate.session", route, "session cache updated");
			}
			None => {
				*state = CacheState::default();
				trace!(target = "estate.session", route, "session cache invalidated");
			}
		}
	}

	/// Returns `true` when `route` was verified and the last verification is younger than the TTL.
	pub fn has_valid_cache(&self, route: &str) -> bool {
		let state = self.state.lock();
		self.is_fresh(&state) && state.routes.contains(route)
	}

	/// Cached session for `route` on a hit.
	pub fn cached(&self, route: &str) -> Option<Session> {
		let state = self.state.lock();
		if self.is_fresh(&state) && state.routes.contains(route) {
			state.session.clone()
		} else {
			None
		}
	}

	/// Swaps in a refreshed session for the same user, keeping verified routes and their timestamp.
	///
	/// A session for a different user wipes the cache instead.
	pub fn replace_session(&self, session: &Session) {
		let mut state = self.state.lock();
		match &state.session {
			Some(cached) if cached.user.id == session.user.id => {
				state.session = Some(Session {
					user: cached.user.clone(),
					..session.clone()
				});
				trace!(target = "estate.session", "cached session replaced");
			}
			Some(_) => {
				*state = CacheState::default();
				trace!(target = "estate.session", "session cache invalidated for new user");
			}
			None => {}
		}
	}

	pub fn clear(&self) {
		*self.state.lock() = CacheState::default();
	}

	fn is_fresh(&self, state: &CacheState) -> bool {
		state
			.verified_at
			.is_some_and(|at| self.clock.now().signed_duration_since(at) < self.ttl)
	}
}

//! Time source used for session expiry and cache TTL checks.

use std::fmt::Debug;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

pub trait Clock: Send + Sync + Debug {
	fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> DateTime<Utc> {
		Utc::now()
	}
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
	now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
	pub fn new(start: DateTime<Utc>) -> Self {
		Self { now: Mutex::new(start) }
	}

	/// Starts at the given unix timestamp (seconds).
	pub fn at_unix(secs: i64) -> Self {
		Self::new(DateTime::from_timestamp(secs, 0).unwrap_or_default())
	}

	pub fn advance(&self, by: std::time::Duration) {
		let delta = chrono::Duration::from_std(by).unwrap_or(chrono::Duration::MAX);
		let mut now = self.now.lock();
		*now = now.checked_add_signed(delta).unwrap_or(*now);
	}

	pub fn set(&self, to: DateTime<Utc>) {
		*self.now.lock() = to;
	}
}

impl Clock for ManualClock {
	fn now(&self) -> DateTime<Utc> {
		*self.now.lock()
	}
}

//! Exponential backoff with full jitter for session refresh retries.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryPolicy {
	/// Total attempts, including the first one.
	pub max_attempts: u32,
	#[serde(with = "millis")]
	pub base_delay: Duration,
	#[serde(with = "millis")]
	pub max_delay: Duration,
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			base_delay: Duration::from_millis(500),
			max_delay: Duration::from_secs(8),
		}
	}
}

impl RetryPolicy {
	/// Upper bound of the delay after failed attempt `attempt` (0-based): `min(max, base * 2^attempt)`.
	pub fn ceiling(&self, attempt: u32) -> Duration {
		let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
		self.base_delay.checked_mul(factor).unwrap_or(Duration::MAX).min(self.max_delay)
	}

	/// Random delay in `[0, ceiling(attempt)]`.
	pub fn delay(&self, attempt: u32) -> Duration {
		let ceiling = self.ceiling(attempt).as_millis().min(u64::MAX as u128) as u64;
		if ceiling == 0 {
			return Duration::ZERO;
		}
		Duration::from_millis(rand::rng().random_range(0..=ceiling))
	}
}

mod millis {
	use std::time::Duration;

	use serde::{Deserialize, Deserializer, Serializer};

	pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_u64(value.as_millis() as u64)
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
		u64::deserialize(deserializer).map(Duration::from_millis)
	}
}

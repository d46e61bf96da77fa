//! Explicitly constructed owner of all session state.

use std::sync::Arc;
use std::time::Duration;

use estate_protocol::{Session, SignUpRequest, SignUpResponse};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::auth::AuthApi;
use crate::backoff::RetryPolicy;
use crate::cache::{DEFAULT_SESSION_TTL, SessionCache};
use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::events::{DEFAULT_EVENT_CAPACITY, RemovalReason, SessionEvent, SessionEvents, UpdateSource};
use crate::gate::RefreshGate;
use crate::guard::{RouteGuard, RoutePolicy};
use crate::restore::{RestoreOutcome, SessionRestorer};
use crate::storage::SessionStorage;
use crate::CancellationToken;

/// Tunables for cache, restoration and events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
	#[serde(with = "secs")]
	pub cache_ttl: Duration,
	/// Sessions expiring within this window are refreshed on restore.
	#[serde(with = "secs")]
	pub refresh_margin: Duration,
	pub retry: RetryPolicy,
	pub event_capacity: usize,
}

impl Default for SessionConfig {
	fn default() -> Self {
		Self {
			cache_ttl: DEFAULT_SESSION_TTL,
			refresh_margin: Duration::from_secs(90),
			retry: RetryPolicy::default(),
			event_capacity: DEFAULT_EVENT_CAPACITY,
		}
	}
}

mod secs {
	use std::time::Duration;

	use serde::{Deserialize, Deserializer, Serializer};

	pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_u64(value.as_secs())
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
		u64::deserialize(deserializer).map(Duration::from_secs)
	}
}

/// Session state for one signed-in client.
///
/// Create one per application (or per test) and pass it to whatever needs
/// the session; the cache, event bus and refresh gate live and die with it.
pub struct SessionContext {
	auth: Arc<dyn AuthApi>,
	storage: Arc<dyn SessionStorage>,
	clock: Arc<dyn Clock>,
	cache: SessionCache,
	events: SessionEvents,
	gate: RefreshGate,
	policy: RoutePolicy,
	config: SessionConfig,
}

impl SessionContext {
	pub fn new(auth: Arc<dyn AuthApi>, storage: Arc<dyn SessionStorage>, config: SessionConfig) -> Self {
		Self::with_clock(auth, storage, config, Arc::new(SystemClock))
	}

	pub fn with_clock(auth: Arc<dyn AuthApi>, storage: Arc<dyn SessionStorage>, config: SessionConfig, clock: Arc<dyn Clock>) -> Self {
		Self {
			cache: SessionCache::new(config.cache_ttl, Arc::clone(&clock)),
			events: SessionEvents::new(config.event_capacity),
			gate: RefreshGate::new(),
			policy: RoutePolicy::default(),
			auth,
			storage,
			clock,
			config,
		}
	}

	pub fn with_route_policy(mut self, policy: RoutePolicy) -> Self {
		self.policy = policy;
		self
	}

	pub fn auth(&self) -> &dyn AuthApi {
		self.auth.as_ref()
	}

	pub fn cache(&self) -> &SessionCache {
		&self.cache
	}

	pub fn events(&self) -> &SessionEvents {
		&self.events
	}

	pub fn clock(&self) -> &dyn Clock {
		self.clock.as_ref()
	}

	pub fn config(&self) -> &SessionConfig {
		&self.config
	}

	pub fn route_policy(&self) -> &RoutePolicy {
		&self.policy
	}

	pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
		self.events.subscribe()
	}

	pub fn restorer(&self) -> SessionRestorer<'_> {
		SessionRestorer::new(self)
	}

	pub fn guard(&self) -> RouteGuard<'_> {
		RouteGuard::new(self)
	}

	/// Persisted session as-is, without expiry checks.
	pub fn current(&self) -> Result<Option<Session>> {
		self.storage.load()
	}

	pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
		let session = self.auth.sign_in_with_password(email, password).await?;
		let session = self.adopt(session, UpdateSource::SignedIn)?;
		info!(target = "estate.auth", user = %session.user.id, role = %session.role(), "signed in");
		Ok(session)
	}

	pub async fn sign_up(&self, request: SignUpRequest) -> Result<SignUpResponse> {
		match self.auth.sign_up(request).await? {
			SignUpResponse::Session(session) => {
				let session = self.adopt(session, UpdateSource::SignedIn)?;
				info!(target = "estate.auth", user = %session.user.id, "signed up");
				Ok(SignUpResponse::Session(session))
			}
			SignUpResponse::PendingConfirmation(user) => {
				info!(target = "estate.auth", user = %user.id, "sign-up awaiting email confirmation");
				Ok(SignUpResponse::PendingConfirmation(user))
			}
		}
	}

	/// Revokes the session remotely (best effort) and always forgets it locally.
	pub async fn sign_out(&self) -> Result<bool> {
		let stored = self.storage.load()?;
		if let Some(session) = &stored {
			if let Err(err) = self.auth.sign_out(&session.access_token).await {
				warn!(target = "estate.auth", error = %err, "remote sign-out failed; clearing local session anyway");
			}
		}
		self.discard(RemovalReason::SignedOut)?;
		Ok(stored.is_some())
	}

	pub async fn restore(&self, cancel: &CancellationToken) -> Result<RestoreOutcome> {
		self.restorer().restore(cancel).await
	}

	/// Usable session, refreshing it first when it is close to expiry.
	pub async fn session(&self, cancel: &CancellationToken) -> Result<Option<Session>> {
		Ok(self.restore(cancel).await?.into_session())
	}

	/// Forces a refresh of the stored session.
	pub async fn refresh(&self, cancel: &CancellationToken) -> Result<Session> {
		let stored = self.storage.load()?.ok_or(crate::Error::NoSession)?;
		self.restorer().refresh_with_retry(&stored, cancel).await
	}

	/// Exchanges `refresh_token` through the single-flight gate and persists the result.
	pub(crate) async fn refresh_once(&self, refresh_token: &str) -> Result<Session> {
		self.gate
			.refresh(refresh_token, |token| async move {
				let session = self.auth.refresh(&token).await?;
				self.adopt(session, UpdateSource::Refreshed)
			})
			.await
	}

	pub(crate) fn adopt(&self, mut session: Session, source: UpdateSource) -> Result<Session> {
		session.stamp_expiry(self.clock.now());
		self.storage.save(&session)?;
		match source {
			UpdateSource::Refreshed | UpdateSource::Restored => self.cache.replace_session(&session),
			UpdateSource::SignedIn => self.cache.clear(),
		}
		self.events.publish(SessionEvent::Updated {
			session: session.clone(),
			source,
		});
		Ok(session)
	}

	pub(crate) fn discard(&self, reason: RemovalReason) -> Result<()> {
		self.storage.clear()?;
		self.cache.clear();
		self.events.publish(SessionEvent::Removed { reason });
		Ok(())
	}

	pub fn is_refreshing(&self) -> bool {
		self.gate.is_refreshing()
	}
}

impl std::fmt::Debug for SessionContext {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SessionContext")
			.field("config", &self.config)
			.field("refreshing", &self.is_refreshing())
			.finish()
	}
}

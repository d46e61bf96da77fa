use std::sync::Arc;
use std::time::Duration;

use estate_protocol::{Role, SignUpRequest, SignUpResponse};
use estate_runtime::fake::FakeAuth;
use estate_runtime::{
	Access, CancellationToken, Error, ManualClock, MemorySessionStorage, RemovalReason, RestoreOutcome, RetryPolicy, SessionConfig, SessionContext, SessionEvent,
	SessionStorage, UpdateSource,
};
use serde_json::json;

const START: i64 = 1_800_000_000;

struct Harness {
	auth: Arc<FakeAuth>,
	storage: Arc<MemorySessionStorage>,
	clock: Arc<ManualClock>,
	ctx: SessionContext,
}

fn harness_with(config: SessionConfig) -> Harness {
	let auth = Arc::new(
		FakeAuth::new()
			.with_user("admin@example.com", "admin-pass", Role::Admin)
			.with_user("broker@example.com", "broker-pass", Role::Broker)
			.with_user("client@example.com", "client-pass", Role::Client),
	);
	let storage = Arc::new(MemorySessionStorage::new());
	let clock = Arc::new(ManualClock::at_unix(START));
	let ctx = SessionContext::with_clock(auth.clone(), storage.clone(), config, clock.clone());
	Harness { auth, storage, clock, ctx }
}

fn harness() -> Harness {
	harness_with(SessionConfig {
		retry: RetryPolicy {
			max_attempts: 3,
			base_delay: Duration::from_millis(100),
			max_delay: Duration::from_secs(1),
		},
		..Default::default()
	})
}

fn transient() -> Error {
	Error::Backend {
		status: 503,
		message: "upstream unavailable".into(),
	}
}

#[tokio::test]
async fn sign_in_persists_and_publishes() {
	let h = harness();
	let mut events = h.ctx.subscribe();

	let session = h.ctx.sign_in("broker@example.com", "broker-pass").await.unwrap();

	assert_eq!(session.role(), Role::Broker);
	assert_eq!(session.expires_at, Some(START + 3600));
	assert_eq!(h.storage.load().unwrap(), Some(session.clone()));
	assert_eq!(
		events.recv().await.unwrap(),
		SessionEvent::Updated {
			session,
			source: UpdateSource::SignedIn
		}
	);
}

#[tokio::test]
async fn bad_credentials_are_rejections() {
	let h = harness();
	let err = h.ctx.sign_in("broker@example.com", "wrong").await.unwrap_err();
	assert!(err.is_rejection());
	assert!(h.storage.load().unwrap().is_none());
}

#[tokio::test]
async fn sign_up_with_confirmation_keeps_no_session() {
	let auth = Arc::new(FakeAuth::new().requiring_confirmation());
	let storage = Arc::new(MemorySessionStorage::new());
	let ctx = SessionContext::new(auth, storage.clone(), SessionConfig::default());

	let response = ctx
		.sign_up(SignUpRequest {
			email: "new@example.com".into(),
			password: "pw".into(),
			data: json!({ "role": "broker" }),
		})
		.await
		.unwrap();

	assert!(matches!(response, SignUpResponse::PendingConfirmation(ref user) if user.role() == Role::Broker));
	assert!(storage.load().unwrap().is_none());
}

#[tokio::test]
async fn restore_without_session_reports_none() {
	let h = harness();
	let outcome = h.ctx.restore(&CancellationToken::new()).await.unwrap();
	assert_eq!(outcome, RestoreOutcome::NoSession);
}

#[tokio::test]
async fn restore_keeps_fresh_session_without_refreshing() {
	let h = harness();
	let session = h.ctx.sign_in("client@example.com", "client-pass").await.unwrap();
	h.clock.advance(Duration::from_secs(30 * 60));

	let outcome = h.ctx.restore(&CancellationToken::new()).await.unwrap();

	assert_eq!(outcome, RestoreOutcome::Valid(session));
	assert_eq!(h.auth.refresh_calls(), 0);
}

#[tokio::test]
async fn restore_refreshes_near_expiry() {
	let h = harness();
	let original = h.ctx.sign_in("client@example.com", "client-pass").await.unwrap();
	h.clock.advance(Duration::from_secs(3600 - 60));
	let mut events = h.ctx.subscribe();

	let outcome = h.ctx.restore(&CancellationToken::new()).await.unwrap();

	let RestoreOutcome::Refreshed(session) = outcome else {
		panic!("expected refresh, got {outcome:?}");
	};
	assert_ne!(session.refresh_token, original.refresh_token);
	assert_eq!(h.storage.load().unwrap(), Some(session.clone()));
	assert_eq!(
		events.recv().await.unwrap(),
		SessionEvent::Updated {
			session,
			source: UpdateSource::Refreshed
		}
	);
}

#[tokio::test(start_paused = true)]
async fn restore_retries_transient_failures() {
	let h = harness();
	h.ctx.sign_in("client@example.com", "client-pass").await.unwrap();
	h.clock.advance(Duration::from_secs(3600));
	h.auth.fail_next_refresh(transient());
	h.auth.fail_next_refresh(Error::Transport("connection reset".into()));

	let outcome = h.ctx.restore(&CancellationToken::new()).await.unwrap();

	assert_eq!(outcome.label(), "refreshed");
	assert_eq!(h.auth.refresh_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_on_expired_session_fail() {
	let h = harness();
	h.ctx.sign_in("client@example.com", "client-pass").await.unwrap();
	h.clock.advance(Duration::from_secs(2 * 3600));
	for _ in 0..3 {
		h.auth.fail_next_refresh(transient());
	}

	let err = h.ctx.restore(&CancellationToken::new()).await.unwrap_err();

	assert!(matches!(err, Error::RetriesExhausted { attempts: 3, .. }));
	assert_eq!(h.auth.refresh_calls(), 3);
	assert!(h.storage.load().unwrap().is_some(), "transient failures must not sign the user out");
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_keep_unexpired_session() {
	let h = harness();
	let session = h.ctx.sign_in("client@example.com", "client-pass").await.unwrap();
	h.clock.advance(Duration::from_secs(3600 - 30));
	for _ in 0..3 {
		h.auth.fail_next_refresh(transient());
	}

	let outcome = h.ctx.restore(&CancellationToken::new()).await.unwrap();

	assert_eq!(outcome, RestoreOutcome::Valid(session));
}

#[tokio::test]
async fn rejected_refresh_is_not_retried_and_signs_out() {
	let h = harness();
	h.ctx.sign_in("admin@example.com", "admin-pass").await.unwrap();
	h.clock.advance(Duration::from_secs(3600));
	h.ctx.cache().update(h.storage.load().unwrap().as_ref(), "/admin/brokers");
	assert!(h.ctx.cache().has_valid_cache("/admin/brokers"));
	h.auth.fail_next_refresh(Error::Backend {
		status: 400,
		message: "Invalid Refresh Token".into(),
	});
	let mut events = h.ctx.subscribe();

	let outcome = h.ctx.restore(&CancellationToken::new()).await.unwrap();

	assert_eq!(outcome, RestoreOutcome::Removed);
	assert_eq!(h.auth.refresh_calls(), 1);
	assert!(h.storage.load().unwrap().is_none());
	assert!(!h.ctx.cache().has_valid_cache("/admin/brokers"));
	assert_eq!(
		events.recv().await.unwrap(),
		SessionEvent::Removed {
			reason: RemovalReason::Rejected
		}
	);
}

#[tokio::test]
async fn cancelled_restore_stops_before_refreshing() {
	let h = harness();
	h.ctx.sign_in("client@example.com", "client-pass").await.unwrap();
	h.clock.advance(Duration::from_secs(3600));
	let cancel = CancellationToken::new();
	cancel.cancel();

	let err = h.ctx.restore(&cancel).await.unwrap_err();

	assert!(matches!(err, Error::Cancelled));
	assert_eq!(h.auth.refresh_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_backoff() {
	let h = harness_with(SessionConfig {
		retry: RetryPolicy {
			max_attempts: 5,
			base_delay: Duration::from_secs(60),
			max_delay: Duration::from_secs(60),
		},
		..Default::default()
	});
	h.ctx.sign_in("client@example.com", "client-pass").await.unwrap();
	h.clock.advance(Duration::from_secs(3600));
	for _ in 0..5 {
		h.auth.fail_next_refresh(transient());
	}

	let cancel = CancellationToken::new();
	let trigger = cancel.clone();
	tokio::spawn(async move {
		tokio::time::sleep(Duration::from_millis(10)).await;
		trigger.cancel();
	});

	let err = h.ctx.restore(&cancel).await.unwrap_err();

	assert!(matches!(err, Error::Cancelled));
	assert!(h.auth.refresh_calls() <= 2);
}

#[tokio::test(start_paused = true)]
async fn concurrent_refreshes_spend_the_token_once() {
	let h = Arc::new(harness());
	h.ctx.sign_in("broker@example.com", "broker-pass").await.unwrap();
	h.auth.set_refresh_delay(Duration::from_millis(250));

	let mut tasks = Vec::new();
	for _ in 0..8 {
		let h = Arc::clone(&h);
		tasks.push(tokio::spawn(async move { h.ctx.refresh(&CancellationToken::new()).await }));
	}

	let mut tokens = Vec::new();
	for task in tasks {
		tokens.push(task.await.unwrap().unwrap().refresh_token);
	}

	assert_eq!(h.auth.refresh_calls(), 1);
	assert!(tokens.windows(2).all(|pair| pair[0] == pair[1]));
}

#[tokio::test]
async fn guard_grants_then_serves_from_cache() {
	let h = harness();
	h.ctx.sign_in("admin@example.com", "admin-pass").await.unwrap();
	let guard = h.ctx.guard();
	let cancel = CancellationToken::new();

	let first = guard.authorize("/admin/brokers", &cancel).await.unwrap();
	let second = guard.authorize("/admin/brokers", &cancel).await.unwrap();

	assert!(matches!(first, Access::Granted { cached: false, .. }));
	assert!(matches!(second, Access::Granted { cached: true, .. }));
	assert_eq!(h.auth.get_user_calls(), 1);
}

#[tokio::test]
async fn guard_reverifies_after_ttl() {
	let h = harness();
	h.ctx.sign_in("admin@example.com", "admin-pass").await.unwrap();
	let cancel = CancellationToken::new();

	h.ctx.guard().authorize("/admin/leads", &cancel).await.unwrap();
	h.clock.advance(Duration::from_secs(5 * 60 + 1));
	let again = h.ctx.guard().authorize("/admin/leads", &cancel).await.unwrap();

	assert!(matches!(again, Access::Granted { cached: false, .. }));
	assert_eq!(h.auth.get_user_calls(), 2);
}

#[tokio::test]
async fn guard_forbids_wrong_role() {
	let h = harness();
	h.ctx.sign_in("client@example.com", "client-pass").await.unwrap();

	let access = h.ctx.guard().authorize("/broker/leads", &CancellationToken::new()).await.unwrap();

	assert_eq!(
		access,
		Access::Forbidden {
			required: vec![Role::Broker, Role::Admin],
			actual: Role::Client,
		}
	);
	assert!(!h.ctx.cache().has_valid_cache("/broker/leads"));
}

#[tokio::test]
async fn guard_without_session_is_unauthenticated() {
	let h = harness();
	let access = h.ctx.guard().authorize("/client/saved", &CancellationToken::new()).await.unwrap();
	assert_eq!(access, Access::Unauthenticated);
}

#[tokio::test]
async fn guard_discards_revoked_access_token() {
	let h = harness();
	let session = h.ctx.sign_in("broker@example.com", "broker-pass").await.unwrap();
	h.auth.revoke(&session.access_token);

	let access = h.ctx.guard().authorize("/broker", &CancellationToken::new()).await.unwrap();

	assert_eq!(access, Access::Unauthenticated);
	assert!(h.storage.load().unwrap().is_none());
}

#[tokio::test]
async fn sign_out_invalidates_every_cached_route() {
	let h = harness();
	h.ctx.sign_in("admin@example.com", "admin-pass").await.unwrap();
	let cancel = CancellationToken::new();
	h.ctx.guard().authorize("/admin/brokers", &cancel).await.unwrap();
	h.ctx.guard().authorize("/admin/leads", &cancel).await.unwrap();
	let mut events = h.ctx.subscribe();

	assert!(h.ctx.sign_out().await.unwrap());

	assert!(!h.ctx.cache().has_valid_cache("/admin/brokers"));
	assert!(!h.ctx.cache().has_valid_cache("/admin/leads"));
	assert_eq!(h.auth.sign_out_calls(), 1);
	assert_eq!(
		events.recv().await.unwrap(),
		SessionEvent::Removed {
			reason: RemovalReason::SignedOut
		}
	);
	assert_eq!(
		h.ctx.guard().authorize("/admin/brokers", &cancel).await.unwrap(),
		Access::Unauthenticated
	);
}

#[tokio::test]
async fn switching_users_drops_cached_grants() {
	let h = harness();
	let cancel = CancellationToken::new();
	h.ctx.sign_in("admin@example.com", "admin-pass").await.unwrap();
	assert!(h.ctx.guard().authorize("/admin/brokers", &cancel).await.unwrap().is_granted());

	h.ctx.sign_in("client@example.com", "client-pass").await.unwrap();

	assert!(!h.ctx.cache().has_valid_cache("/admin/brokers"));
	let access = h.ctx.guard().authorize("/admin/brokers", &cancel).await.unwrap();
	assert_eq!(
		access,
		Access::Forbidden {
			required: vec![Role::Admin],
			actual: Role::Client,
		}
	);
}

#[tokio::test]
async fn guard_serves_refreshed_token_from_cache() {
	let h = harness();
	let cancel = CancellationToken::new();
	let original = h.ctx.sign_in("broker@example.com", "broker-pass").await.unwrap();
	h.ctx.guard().authorize("/broker/leads", &cancel).await.unwrap();

	let refreshed = h.ctx.refresh(&cancel).await.unwrap();
	assert_ne!(refreshed.access_token, original.access_token);

	let Access::Granted { session, cached } = h.ctx.guard().authorize("/broker/leads", &cancel).await.unwrap() else {
		panic!("expected grant after refresh");
	};
	assert!(cached);
	assert_eq!(session.access_token, refreshed.access_token);
	assert_eq!(session.user.id, original.user.id);
}

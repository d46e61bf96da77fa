//! In-memory auth service for exercising the session runtime without a backend.
//!
//! # Example
//!
//! ```ignore
//! let auth = Arc::new(FakeAuth::new().with_user("broker@example.com", "secret", Role::Broker));
//! let ctx = SessionContext::new(auth.clone(), Arc::new(MemorySessionStorage::new()), SessionConfig::default());
//! ctx.sign_in("broker@example.com", "secret").await?;
//! auth.fail_next_refresh(Error::Transport("connection reset".into()));
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use estate_protocol::{Role, Session, SignUpRequest, SignUpResponse, User};
use parking_lot::Mutex;
use serde_json::json;

use crate::auth::AuthApi;
use crate::error::{Error, Result};

const FAKE_TOKEN_LIFETIME_SECS: i64 = 3600;

#[derive(Default)]
struct FakeState {
	accounts: HashMap<String, (String, User)>,
	access_tokens: HashMap<String, User>,
	refresh_tokens: HashMap<String, User>,
	revoked: HashSet<String>,
	refresh_failures: VecDeque<Error>,
	issued: u32,
	refresh_calls: u32,
	sign_out_calls: u32,
	get_user_calls: u32,
	confirm_sign_ups: bool,
}

/// Scriptable [`AuthApi`] that issues opaque `access-N` / `refresh-N` tokens.
#[derive(Default)]
pub struct FakeAuth {
	state: Mutex<FakeState>,
	refresh_delay: Mutex<Option<Duration>>,
}

impl FakeAuth {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_user(self, email: &str, password: &str, role: Role) -> Self {
		let user = fake_user(email, role);
		self.state
			.lock()
			.accounts
			.insert(email.to_string(), (password.to_string(), user));
		self
	}

	/// Sign-ups return a pending user instead of a session.
	pub fn requiring_confirmation(self) -> Self {
		self.state.lock().confirm_sign_ups = true;
		self
	}

	/// Issues a session for a registered account without going through sign-in.
	pub fn issue_for(&self, email: &str) -> Option<Session> {
		let mut state = self.state.lock();
		let user = state.accounts.get(email).map(|(_, user)| user.clone())?;
		Some(issue(&mut state, user))
	}

	/// Queues an error for the next refresh call.
	pub fn fail_next_refresh(&self, err: Error) {
		self.state.lock().refresh_failures.push_back(err);
	}

	/// Makes every refresh take `delay` before answering.
	pub fn set_refresh_delay(&self, delay: Duration) {
		*self.refresh_delay.lock() = Some(delay);
	}

	/// Invalidates an access token so `get_user` rejects it.
	pub fn revoke(&self, access_token: &str) {
		self.state.lock().revoked.insert(access_token.to_string());
	}

	pub fn refresh_calls(&self) -> u32 {
		self.state.lock().refresh_calls
	}

	pub fn sign_out_calls(&self) -> u32 {
		self.state.lock().sign_out_calls
	}

	pub fn get_user_calls(&self) -> u32 {
		self.state.lock().get_user_calls
	}
}

fn fake_user(email: &str, role: Role) -> User {
	User {
		id: format!("user-{}", email.split('@').next().unwrap_or(email)),
		email: Some(email.to_string()),
		user_metadata: json!({ "role": role.as_str() }),
		created_at: None,
	}
}

fn issue(state: &mut FakeState, user: User) -> Session {
	state.issued += 1;
	let n = state.issued;
	let session = Session {
		access_token: format!("access-{n}"),
		refresh_token: format!("refresh-{n}"),
		token_type: "bearer".into(),
		expires_in: Some(FAKE_TOKEN_LIFETIME_SECS),
		expires_at: None,
		user: user.clone(),
	};
	state.access_tokens.insert(session.access_token.clone(), user.clone());
	state.refresh_tokens.insert(session.refresh_token.clone(), user);
	session
}

fn rejected(message: &str) -> Error {
	Error::Backend {
		status: 400,
		message: message.to_string(),
	}
}

#[async_trait]
impl AuthApi for FakeAuth {
	async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
		let mut state = self.state.lock();
		let user = match state.accounts.get(email) {
			Some((expected, user)) if expected == password => user.clone(),
			_ => return Err(rejected("Invalid login credentials")),
		};
		Ok(issue(&mut state, user))
	}

	async fn sign_up(&self, request: SignUpRequest) -> Result<SignUpResponse> {
		let mut state = self.state.lock();
		if state.accounts.contains_key(&request.email) {
			return Err(Error::Backend {
				status: 422,
				message: "User already registered".into(),
			});
		}
		let role = request
			.data
			.get("role")
			.and_then(|r| r.as_str())
			.and_then(|r| r.parse().ok())
			.unwrap_or_default();
		let user = fake_user(&request.email, role);
		state
			.accounts
			.insert(request.email.clone(), (request.password.clone(), user.clone()));

		if state.confirm_sign_ups {
			Ok(SignUpResponse::PendingConfirmation(user))
		} else {
			Ok(SignUpResponse::Session(issue(&mut state, user)))
		}
	}

	async fn refresh(&self, refresh_token: &str) -> Result<Session> {
		let delay = *self.refresh_delay.lock();
		if let Some(delay) = delay {
			tokio::time::sleep(delay).await;
		}

		let mut state = self.state.lock();
		state.refresh_calls += 1;
		if let Some(err) = state.refresh_failures.pop_front() {
			return Err(err);
		}
		let Some(user) = state.refresh_tokens.remove(refresh_token) else {
			return Err(rejected("Invalid Refresh Token: Refresh Token Not Found"));
		};
		Ok(issue(&mut state, user))
	}

	async fn get_user(&self, access_token: &str) -> Result<User> {
		let mut state = self.state.lock();
		state.get_user_calls += 1;
		if state.revoked.contains(access_token) {
			return Err(Error::Backend {
				status: 401,
				message: "invalid JWT".into(),
			});
		}
		state.access_tokens.get(access_token).cloned().ok_or(Error::Backend {
			status: 401,
			message: "invalid JWT".into(),
		})
	}

	async fn sign_out(&self, access_token: &str) -> Result<()> {
		let mut state = self.state.lock();
		state.sign_out_calls += 1;
		state.revoked.insert(access_token.to_string());
		Ok(())
	}
}

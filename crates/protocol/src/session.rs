//! Auth session and user shapes issued by the hosted auth service.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Dashboard role attached to a user through its metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	Admin,
	Broker,
	#[default]
	Client,
}

impl Role {
	pub fn as_str(self) -> &'static str {
		match self {
			Role::Admin => "admin",
			Role::Broker => "broker",
			Role::Client => "client",
		}
	}
}

impl std::fmt::Display for Role {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

impl std::str::FromStr for Role {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"admin" => Ok(Role::Admin),
			"broker" => Ok(Role::Broker),
			"client" => Ok(Role::Client),
			_ => Err(format!("unknown role: {s}")),
		}
	}
}

/// Authenticated user record as returned by `GET /auth/v1/user`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
	pub id: String,
	#[serde(default)]
	pub email: Option<String>,
	#[serde(default)]
	pub user_metadata: Value,
	#[serde(default)]
	pub created_at: Option<DateTime<Utc>>,
}

impl User {
	/// Role stored under `user_metadata.role`; unknown or missing values map to [`Role::Client`].
	pub fn role(&self) -> Role {
		self.user_metadata
			.get("role")
			.and_then(Value::as_str)
			.and_then(|raw| raw.parse().ok())
			.unwrap_or_default()
	}

	pub fn display_name(&self) -> Option<&str> {
		self.user_metadata.get("full_name").and_then(Value::as_str)
	}
}

/// Token grant returned by sign-in and refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
	pub access_token: String,
	pub refresh_token: String,
	#[serde(default = "default_token_type")]
	pub token_type: String,
	#[serde(default)]
	pub expires_in: Option<i64>,
	/// Absolute expiry in unix seconds.
	#[serde(default)]
	pub expires_at: Option<i64>,
	pub user: User,
}

fn default_token_type() -> String {
	"bearer".to_string()
}

impl Session {
	/// Absolute expiry, taken from `expires_at` or the access token's `exp` claim.
	pub fn expires_at(&self) -> Option<DateTime<Utc>> {
		let secs = self.expires_at.or_else(|| token_expiry(&self.access_token))?;
		DateTime::from_timestamp(secs, 0)
	}

	/// Returns `true` when the session is expired or expires within `margin` of `now`.
	///
	/// Sessions without any known expiry are treated as needing a refresh.
	pub fn expires_within(&self, now: DateTime<Utc>, margin: Duration) -> bool {
		match self.expires_at() {
			Some(at) => at - now <= margin,
			None => true,
		}
	}

	pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
		self.expires_within(now, Duration::zero())
	}

	pub fn role(&self) -> Role {
		self.user.role()
	}

	/// Fills `expires_at` from `expires_in` when the backend only sent the relative value.
	pub fn stamp_expiry(&mut self, now: DateTime<Utc>) {
		if self.expires_at.is_none() {
			if let Some(expires_in) = self.expires_in {
				self.expires_at = Some(now.timestamp() + expires_in);
			}
		}
	}
}

/// Decodes the `exp` claim of a JWT without verifying its signature.
pub fn token_expiry(token: &str) -> Option<i64> {
	let payload = token.split('.').nth(1)?;
	let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
	let claims: Value = serde_json::from_slice(&bytes).ok()?;
	claims.get("exp").and_then(Value::as_i64)
}

/// Body sent to the password and refresh-token grants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenGrant {
	Password { email: String, password: String },
	RefreshToken { refresh_token: String },
}

/// Body sent to `POST /auth/v1/signup`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUpRequest {
	pub email: String,
	pub password: String,
	#[serde(default)]
	pub data: Value,
}

/// Sign-up yields a session when email confirmation is off, otherwise only the pending user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignUpResponse {
	Session(Session),
	PendingConfirmation(User),
}

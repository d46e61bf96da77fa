//! Sign-in, sign-out and session inspection.

use chrono::{DateTime, Utc};
use estate_protocol::{Role, Session, SignUpRequest, SignUpResponse};
use estate_runtime::RestoreOutcome;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::context::CommandContext;
use crate::error::Result;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
	pub signed_in: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub user_id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub role: Option<Role>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub expires_at: Option<DateTime<Utc>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub expired: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub outcome: Option<&'static str>,
}

impl SessionSummary {
	fn signed_out() -> Self {
		Self {
			signed_in: false,
			user_id: None,
			email: None,
			role: None,
			expires_at: None,
			expired: None,
			outcome: None,
		}
	}

	fn of(session: &Session, now: DateTime<Utc>) -> Self {
		Self {
			signed_in: true,
			user_id: Some(session.user.id.clone()),
			email: session.user.email.clone(),
			role: Some(session.role()),
			expires_at: session.expires_at(),
			expired: Some(session.is_expired(now)),
			outcome: None,
		}
	}
}

pub async fn login(ctx: &CommandContext, email: &str, password: &str) -> Result<SessionSummary> {
	let sessions = ctx.session_context()?;
	let session = sessions.sign_in(email, password).await?;
	Ok(SessionSummary::of(&session, Utc::now()))
}

pub async fn signup(ctx: &CommandContext, email: String, password: String, full_name: Option<String>, role: Role) -> Result<serde_json::Value> {
	let sessions = ctx.session_context()?;
	let mut data = json!({ "role": role.as_str() });
	if let Some(name) = full_name {
		data["full_name"] = json!(name);
	}
	match sessions.sign_up(SignUpRequest { email, password, data }).await? {
		SignUpResponse::Session(session) => Ok(json!({
			"status": "signed_in",
			"session": SessionSummary::of(&session, Utc::now()),
		})),
		SignUpResponse::PendingConfirmation(user) => {
			info!(target = "estate.auth", "check your inbox to confirm the account");
			Ok(json!({
				"status": "pending_confirmation",
				"userId": user.id,
				"email": user.email,
			}))
		}
	}
}

pub async fn logout(ctx: &CommandContext) -> Result<serde_json::Value> {
	let signed_out = ctx.session_context()?.sign_out().await?;
	Ok(json!({ "signedOut": signed_out }))
}

/// Reads storage only; never refreshes.
pub fn status(ctx: &CommandContext) -> Result<SessionSummary> {
	let sessions = ctx.session_context()?;
	Ok(match sessions.current()? {
		Some(session) => SessionSummary::of(&session, Utc::now()),
		None => SessionSummary::signed_out(),
	})
}

pub async fn restore(ctx: &CommandContext, attempts: Option<u32>) -> Result<SessionSummary> {
	let mut ctx = ctx.clone();
	if let Some(attempts) = attempts {
		ctx.config.session.retry.max_attempts = attempts;
	}
	let sessions = ctx.session_context()?;
	let outcome = sessions.restore(ctx.cancel()).await?;
	let label = outcome.label();
	let mut summary = match outcome {
		RestoreOutcome::Valid(ref session) | RestoreOutcome::Refreshed(ref session) => SessionSummary::of(session, Utc::now()),
		RestoreOutcome::NoSession | RestoreOutcome::Removed => SessionSummary::signed_out(),
	};
	summary.outcome = Some(label);
	Ok(summary)
}

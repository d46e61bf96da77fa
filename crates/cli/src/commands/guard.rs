use estate_runtime::Access;
use serde_json::json;

use crate::context::CommandContext;
use crate::error::{EstateError, Result};

pub async fn execute(ctx: &CommandContext, route: &str) -> Result<serde_json::Value> {
	let sessions = ctx.session_context()?;
	match sessions.guard().authorize(route, ctx.cancel()).await? {
		Access::Granted { session, cached } => Ok(json!({
			"route": route,
			"access": "granted",
			"role": session.role(),
			"userId": session.user.id,
			"cached": cached,
		})),
		Access::Unauthenticated => Err(EstateError::NotSignedIn),
		Access::Forbidden { required, actual } => {
			let required: Vec<&str> = required.iter().map(|role| role.as_str()).collect();
			Err(EstateError::AccessDenied(format!(
				"{route} requires {}, signed in as {actual}",
				required.join(" or ")
			)))
		}
	}
}

//! Subscription checkout, portal and status.

use estate_protocol::{RedirectUrl, SubscriptionStatus};

use crate::context::CommandContext;
use crate::error::{EstateError, Result};

pub async fn checkout(ctx: &CommandContext, plan_id: &str) -> Result<RedirectUrl> {
	if plan_id.trim().is_empty() {
		return Err(EstateError::InvalidInput("plan id must not be empty".into()));
	}
	Ok(ctx.user_client().await?.create_checkout(plan_id).await?)
}

pub async fn portal(ctx: &CommandContext) -> Result<RedirectUrl> {
	Ok(ctx.user_client().await?.customer_portal().await?)
}

pub async fn subscription(ctx: &CommandContext) -> Result<SubscriptionStatus> {
	Ok(ctx.user_client().await?.check_subscription().await?)
}

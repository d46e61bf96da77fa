use estate::CreatedLink;
use serde_json::json;

use crate::context::CommandContext;
use crate::error::{EstateError, Result};

pub async fn create(ctx: &CommandContext, property_id: &str, broker_id: &str) -> Result<CreatedLink> {
	if property_id.is_empty() || broker_id.is_empty() {
		return Err(EstateError::InvalidInput("--property and --broker must not be empty".into()));
	}
	let links = ctx.share_links(ctx.user_client().await?)?;
	Ok(links.create(property_id, broker_id).await?)
}

/// Counts a visit the same way the redirect endpoint does.
pub async fn open(ctx: &CommandContext, code: &str) -> Result<serde_json::Value> {
	let links = ctx.share_links(ctx.client()?)?;
	let link = links.record_click(code).await?;
	let listing = links.listing_url(&link.property_id)?;
	Ok(json!({
		"code": link.code,
		"propertyId": link.property_id,
		"brokerId": link.broker_id,
		"clicks": link.click_count,
		"listingUrl": listing.as_str(),
	}))
}

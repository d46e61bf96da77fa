//! Trackable short links to property listings.

use std::sync::Arc;

use rand::Rng;
use rand::distr::Alphanumeric;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};
use url::Url;

use estate_protocol::{SharedLink, tables};
use estate_runtime::{Clock, SystemClock};

use crate::client::HostedClient;
use crate::error::{Error, Result};

pub const CODE_LEN: usize = 8;
const CREATE_ATTEMPTS: usize = 3;
const CLICK_ATTEMPTS: usize = 32;

pub fn generate_code() -> String {
	rand::rng().sample_iter(&Alphanumeric).take(CODE_LEN).map(char::from).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedLink {
	pub link: SharedLink,
	pub url: String,
}

pub struct ShareLinks {
	client: HostedClient,
	public_base: Url,
	clock: Arc<dyn Clock>,
}

impl ShareLinks {
	pub fn new(client: HostedClient, public_base: Url) -> Self {
		Self::with_clock(client, public_base, Arc::new(SystemClock))
	}

	pub fn with_clock(client: HostedClient, mut public_base: Url, clock: Arc<dyn Clock>) -> Self {
		if !public_base.path().ends_with('/') {
			let path = format!("{}/", public_base.path());
			public_base.set_path(&path);
		}
		Self {
			client,
			public_base,
			clock,
		}
	}

	pub fn share_url(&self, code: &str) -> Result<Url> {
		Ok(self.public_base.join(&format!("s/{code}"))?)
	}

	pub fn listing_url(&self, property_id: &str) -> Result<Url> {
		Ok(self.public_base.join(&format!("properties/{property_id}"))?)
	}

	/// Inserts a link with a fresh code, retrying on code collisions.
	pub async fn create(&self, property_id: &str, broker_id: &str) -> Result<CreatedLink> {
		let mut attempt = 0;
		loop {
			attempt += 1;
			let row = SharedLink {
				id: None,
				code: generate_code(),
				property_id: property_id.to_string(),
				broker_id: broker_id.to_string(),
				click_count: 0,
				last_clicked_at: None,
				created_at: Some(self.clock.now()),
			};
			let inserted = self.client.from(tables::SHARED_LINKS).insert::<_, SharedLink>(&[&row]).await;
			match inserted {
				Ok(mut rows) => {
					let link = if rows.is_empty() { row } else { rows.swap_remove(0) };
					let url = self.share_url(&link.code)?.to_string();
					info!(target = "estate.share", code = %link.code, property = property_id, broker = broker_id, "share link created");
					return Ok(CreatedLink { link, url });
				}
				Err(Error::Api { status: 409, .. }) if attempt < CREATE_ATTEMPTS => {
					debug!(target = "estate.share", code = %row.code, "share code collision; retrying");
				}
				Err(err) => return Err(err),
			}
		}
	}

	pub async fn resolve(&self, code: &str) -> Result<SharedLink> {
		self.client
			.from(tables::SHARED_LINKS)
			.eq("code", code)
			.single()
			.await
			.map_err(|err| match err {
				Error::NotFound(_) => Error::NotFound(format!("share link {code}")),
				other => other,
			})
	}

	/// Counts one visit and returns the updated link.
	///
	/// The write is conditional on the count that was read, so concurrent
	/// clicks re-read and try again instead of overwriting each other.
	pub async fn record_click(&self, code: &str) -> Result<SharedLink> {
		for _ in 0..CLICK_ATTEMPTS {
			let link = self.resolve(code).await?;
			let clicks = link.click_count + 1;
			let patch = json!({
				"click_count": clicks,
				"last_clicked_at": self.clock.now(),
			});
			let mut rows: Vec<SharedLink> = self
				.client
				.from(tables::SHARED_LINKS)
				.eq("code", code)
				.eq("click_count", link.click_count)
				.update(&patch)
				.await?;
			if !rows.is_empty() {
				debug!(target = "estate.share", code, clicks, "share link clicked");
				return Ok(rows.swap_remove(0));
			}
			debug!(target = "estate.share", code, "click count moved underneath us; retrying");
		}
		Err(Error::Api {
			status: 409,
			message: format!("share link {code} click count kept changing"),
		})
	}
}

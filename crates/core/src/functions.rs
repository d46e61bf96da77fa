//! Serverless function invocation.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::info;

use estate_protocol::{CheckoutRequest, RedirectUrl, ReminderReport, SubscriptionStatus, names};

use crate::client::HostedClient;
use crate::error::Result;

impl HostedClient {
	pub async fn invoke<B: Serialize + ?Sized, T: DeserializeOwned>(&self, name: &str, body: &B) -> Result<T> {
		self.post_json(&format!("functions/v1/{name}"), body).await
	}

	/// Starts a checkout for `plan_id`; the caller redirects to the returned URL.
	pub async fn create_checkout(&self, plan_id: &str) -> Result<RedirectUrl> {
		let redirect: RedirectUrl = self
			.invoke(
				names::CREATE_CHECKOUT,
				&CheckoutRequest {
					plan_id: plan_id.to_string(),
				},
			)
			.await?;
		info!(target = "estate.billing", plan_id, "checkout session created");
		Ok(redirect)
	}

	pub async fn customer_portal(&self) -> Result<RedirectUrl> {
		self.invoke(names::CUSTOMER_PORTAL, &json!({})).await
	}

	pub async fn check_subscription(&self) -> Result<SubscriptionStatus> {
		self.invoke(names::CHECK_SUBSCRIPTION, &json!({})).await
	}

	/// Runs the hosted reminder function remotely.
	pub async fn send_appointment_reminders(&self) -> Result<ReminderReport> {
		self.invoke(names::SEND_APPOINTMENT_REMINDERS, &json!({})).await
	}
}

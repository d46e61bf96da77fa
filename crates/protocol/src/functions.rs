//! Request and response bodies of the hosted serverless functions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Function names as deployed on the backend.
pub mod names {
	pub const CREATE_CHECKOUT: &str = "create-checkout";
	pub const CUSTOMER_PORTAL: &str = "customer-portal";
	pub const CHECK_SUBSCRIPTION: &str = "check-subscription";
	pub const SEND_APPOINTMENT_REMINDERS: &str = "send-appointment-reminders";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
	pub plan_id: String,
}

/// Redirect target returned by checkout and customer-portal functions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectUrl {
	pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionStatus {
	pub subscribed: bool,
	#[serde(default, alias = "planId")]
	pub plan_id: Option<String>,
	#[serde(default, alias = "subscriptionEnd")]
	pub subscription_end: Option<DateTime<Utc>>,
}

/// Summary of one appointment-reminder batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderReport {
	pub scanned: usize,
	pub sent: usize,
	pub failed: usize,
	#[serde(default, alias = "dry_run")]
	pub dry_run: bool,
}
